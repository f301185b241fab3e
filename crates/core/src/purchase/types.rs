//! Purchase line types.

use girder_shared::types::{PurchaseLineId, StockItemId, VoucherId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a purchase line buys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseLineKind {
    /// Stocked material; received into inventory on posting.
    Material,
    /// Labour.
    Labour,
    /// Services.
    Service,
    /// Anything else.
    Other,
}

impl PurchaseLineKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Material => "material",
            Self::Labour => "labour",
            Self::Service => "service",
            Self::Other => "other",
        }
    }

    /// Parses a kind from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "material" => Some(Self::Material),
            "labour" | "labor" => Some(Self::Labour),
            "service" => Some(Self::Service),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for PurchaseLineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line of a purchase voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    /// Line ID.
    pub id: PurchaseLineId,
    /// Owning purchase voucher.
    pub voucher_id: VoucherId,
    /// What the line buys.
    pub kind: PurchaseLineKind,
    /// Stock item received, for material lines.
    pub stock_item_id: Option<StockItemId>,
    /// Quantity bought.
    pub quantity: Decimal,
    /// Price per unit.
    pub unit_rate: Decimal,
    /// Description.
    pub description: Option<String>,
    /// Zero-based position within the voucher.
    pub position: u32,
}

impl PurchaseLine {
    /// Line amount, `None` past the decimal range.
    #[must_use]
    pub fn amount(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_rate)
    }

    /// Returns true if posting this line receives stock.
    #[must_use]
    pub fn receives_stock(&self) -> bool {
        self.kind == PurchaseLineKind::Material
            && self.stock_item_id.is_some()
            && self.quantity > Decimal::ZERO
    }
}

/// Caller-supplied purchase line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseLineInput {
    /// What the line buys.
    pub kind: PurchaseLineKind,
    /// Stock item, for material lines.
    pub stock_item_id: Option<StockItemId>,
    /// Quantity bought.
    pub quantity: Decimal,
    /// Price per unit.
    pub unit_rate: Decimal,
    /// Description.
    pub description: Option<String>,
}

impl PurchaseLineInput {
    /// A material line receiving `quantity` of `stock_item_id` at `unit_rate`.
    #[must_use]
    pub fn material(stock_item_id: StockItemId, quantity: Decimal, unit_rate: Decimal) -> Self {
        Self {
            kind: PurchaseLineKind::Material,
            stock_item_id: Some(stock_item_id),
            quantity,
            unit_rate,
            description: None,
        }
    }

    /// Materializes the input as a line of `voucher_id` at `position`.
    #[must_use]
    pub fn into_line(self, voucher_id: VoucherId, position: u32) -> PurchaseLine {
        PurchaseLine {
            id: PurchaseLineId::new(),
            voucher_id,
            kind: self.kind,
            stock_item_id: self.stock_item_id,
            quantity: self.quantity,
            unit_rate: self.unit_rate,
            description: self.description,
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_kind_parse() {
        assert_eq!(PurchaseLineKind::parse("MATERIAL"), Some(PurchaseLineKind::Material));
        assert_eq!(PurchaseLineKind::parse("labor"), Some(PurchaseLineKind::Labour));
        assert_eq!(PurchaseLineKind::parse("rent"), None);
    }

    #[test]
    fn test_only_material_lines_with_items_receive_stock() {
        let voucher_id = VoucherId::new();
        let material = PurchaseLineInput::material(StockItemId::new(), dec!(10), dec!(5))
            .into_line(voucher_id, 0);
        assert!(material.receives_stock());
        assert_eq!(material.amount(), Some(dec!(50)));

        let mut labour = material.clone();
        labour.kind = PurchaseLineKind::Labour;
        assert!(!labour.receives_stock());

        let mut unlinked = material.clone();
        unlinked.stock_item_id = None;
        assert!(!unlinked.receives_stock());

        let mut zero = material;
        zero.quantity = dec!(0);
        assert!(!zero.receives_stock());
    }
}
