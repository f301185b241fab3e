//! Inventory domain types.

use chrono::{DateTime, NaiveDate, Utc};
use girder_shared::types::{
    CompanyId, ProjectId, PurchaseLineId, StockItemId, StockMovementId, UserId, VendorId,
    VoucherId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a stock movement as seen by the costing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    /// Receipt into stock at a unit cost.
    In,
    /// Issue out of stock at the current average.
    Out,
    /// Set on-hand to a target quantity, optionally revaluing.
    Adjust,
    /// Move between projects. Persisted as an OUT leg and an IN leg.
    Transfer,
}

impl MovementType {
    /// Returns the string representation of the movement type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::Adjust => "adjust",
            Self::Transfer => "transfer",
        }
    }

    /// Parses a movement type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "in" => Some(Self::In),
            "out" => Some(Self::Out),
            "adjust" => Some(Self::Adjust),
            "transfer" => Some(Self::Transfer),
            _ => None,
        }
    }

    /// Kind recorded when the caller does not supply one.
    #[must_use]
    pub fn default_kind(&self) -> MovementKind {
        match self {
            Self::In => MovementKind::Purchase,
            Self::Out => MovementKind::Issue,
            Self::Adjust => MovementKind::Adjustment,
            Self::Transfer => MovementKind::Transfer,
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Business reason for a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Opening balance.
    Opening,
    /// Receipt from a vendor.
    Purchase,
    /// Issue to a project or site.
    Issue,
    /// Stock count correction.
    Adjustment,
    /// Damaged or lost material.
    Wastage,
    /// Inter-project transfer leg.
    Transfer,
    /// Material returned to stock, or a compensating movement.
    Return,
    /// Compensating issue for a reversed purchase receipt.
    PurchaseReversal,
}

impl MovementKind {
    /// Returns the string representation of the movement kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opening => "opening",
            Self::Purchase => "purchase",
            Self::Issue => "issue",
            Self::Adjustment => "adjustment",
            Self::Wastage => "wastage",
            Self::Transfer => "transfer",
            Self::Return => "return",
            Self::PurchaseReversal => "purchase_reversal",
        }
    }

    /// Parses a movement kind from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "opening" => Some(Self::Opening),
            "purchase" => Some(Self::Purchase),
            "issue" => Some(Self::Issue),
            "adjustment" => Some(Self::Adjustment),
            "wastage" => Some(Self::Wastage),
            "transfer" => Some(Self::Transfer),
            "return" => Some(Self::Return),
            "purchase_reversal" => Some(Self::PurchaseReversal),
            _ => None,
        }
    }

    /// Returns true if the kind can be recorded against `movement_type`.
    #[must_use]
    pub fn fits(&self, movement_type: MovementType) -> bool {
        match movement_type {
            MovementType::In => matches!(self, Self::Opening | Self::Purchase | Self::Return),
            MovementType::Out => matches!(self, Self::Issue | Self::Wastage | Self::Return),
            MovementType::Adjust => matches!(self, Self::Adjustment | Self::Wastage),
            MovementType::Transfer => matches!(self, Self::Transfer),
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stock keeping unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    /// Item ID.
    pub id: StockItemId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Display name.
    pub name: String,
    /// Unit of measure (bags, m3, tonnes).
    pub unit: String,
    /// On-hand at or below this level counts as low stock.
    pub reorder_level: Decimal,
    /// Whether the item accepts movements.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a stock item.
#[derive(Debug, Clone)]
pub struct NewStockItem {
    /// Display name.
    pub name: String,
    /// Unit of measure.
    pub unit: String,
    /// Reorder level.
    pub reorder_level: Decimal,
}

/// On-hand quantity and weighted-average unit cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPosition {
    /// On-hand quantity, never negative.
    pub qty: Decimal,
    /// Weighted-average unit cost, never negative.
    pub avg_cost: Decimal,
}

impl StockPosition {
    /// A position of `qty` units at `avg_cost`.
    #[must_use]
    pub fn new(qty: Decimal, avg_cost: Decimal) -> Self {
        Self { qty, avg_cost }
    }

    /// Inventory value of the position, `None` past the decimal range.
    #[must_use]
    pub fn value(&self) -> Option<Decimal> {
        self.qty.checked_mul(self.avg_cost)
    }
}

/// Persisted balance row for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockBalance {
    /// Owning company.
    pub company_id: CompanyId,
    /// Item.
    pub stock_item_id: StockItemId,
    /// Current position.
    pub position: StockPosition,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl StockBalance {
    /// An empty balance for an item that has never moved.
    #[must_use]
    pub fn empty(company_id: CompanyId, stock_item_id: StockItemId) -> Self {
        Self {
            company_id,
            stock_item_id,
            position: StockPosition::default(),
            updated_at: Utc::now(),
        }
    }
}

/// Optional linkage carried by a movement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementTags {
    /// Project the movement belongs to (transfer source for OUT legs).
    pub project_id: Option<ProjectId>,
    /// Vendor the goods came from.
    pub vendor_id: Option<VendorId>,
    /// Voucher that caused the movement.
    pub voucher_id: Option<VoucherId>,
    /// Purchase line that caused the movement.
    pub purchase_line_id: Option<PurchaseLineId>,
    /// Free-text note.
    pub note: Option<String>,
}

/// An immutable stock movement row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    /// Movement ID.
    pub id: StockMovementId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Item moved.
    pub stock_item_id: StockItemId,
    /// Direction. Transfers are stored as an OUT and an IN leg.
    pub movement_type: MovementType,
    /// Business reason.
    pub kind: MovementKind,
    /// Quantity moved; for ADJUST the target on-hand quantity.
    pub qty: Decimal,
    /// Cost the movement was valued at.
    pub unit_cost: Option<Decimal>,
    /// Business date.
    pub movement_date: NaiveDate,
    /// Linkage.
    pub tags: MovementTags,
    /// Shared by the two legs of a transfer.
    pub transfer_group: Option<StockMovementId>,
    /// The movement this one compensates.
    pub reverses_movement_id: Option<StockMovementId>,
    /// Approver of an adjustment.
    pub approved_by: Option<UserId>,
    /// Approval timestamp.
    pub approved_at: Option<DateTime<Utc>>,
    /// Recorder.
    pub created_by: UserId,
    /// Recording timestamp.
    pub created_at: DateTime<Utc>,
    /// Balance right after this movement.
    pub balance_after: StockPosition,
}

impl StockMovement {
    /// Returns true if this OUT compensates an earlier receipt at its historical cost.
    #[must_use]
    pub fn is_receipt_reversal(&self) -> bool {
        self.movement_type == MovementType::Out && self.reverses_movement_id.is_some()
    }
}

/// Caller-supplied movement.
#[derive(Debug, Clone)]
pub struct MovementRequest {
    /// Item to move.
    pub stock_item_id: StockItemId,
    /// Direction.
    pub movement_type: MovementType,
    /// Quantity; for ADJUST the target on-hand quantity.
    pub qty: Decimal,
    /// Required for IN; optional revaluation cost for ADJUST; ignored otherwise.
    pub unit_cost: Option<Decimal>,
    /// Business date.
    pub movement_date: NaiveDate,
    /// Business reason; defaults from the movement type.
    pub kind: Option<MovementKind>,
    /// Linkage. For transfers, `project_id` is the source project.
    pub tags: MovementTags,
    /// Destination project; transfers only.
    pub destination_project_id: Option<ProjectId>,
}

impl MovementRequest {
    /// A request of `movement_type` for `qty` units dated `movement_date`.
    #[must_use]
    pub fn new(
        stock_item_id: StockItemId,
        movement_type: MovementType,
        qty: Decimal,
        movement_date: NaiveDate,
    ) -> Self {
        Self {
            stock_item_id,
            movement_type,
            qty,
            unit_cost: None,
            movement_date,
            kind: None,
            tags: MovementTags::default(),
            destination_project_id: None,
        }
    }

    /// Sets the unit cost.
    #[must_use]
    pub fn with_unit_cost(mut self, unit_cost: Decimal) -> Self {
        self.unit_cost = Some(unit_cost);
        self
    }

    /// Sets the movement kind.
    #[must_use]
    pub fn with_kind(mut self, kind: MovementKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Sets the linkage tags.
    #[must_use]
    pub fn with_tags(mut self, tags: MovementTags) -> Self {
        self.tags = tags;
        self
    }

    /// Sets source and destination projects of a transfer.
    #[must_use]
    pub fn between_projects(mut self, from: ProjectId, to: ProjectId) -> Self {
        self.tags.project_id = Some(from);
        self.destination_project_id = Some(to);
        self
    }

    /// The kind that will be recorded.
    #[must_use]
    pub fn effective_kind(&self) -> MovementKind {
        self.kind.unwrap_or_else(|| self.movement_type.default_kind())
    }
}

/// Result of applying a movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementOutcome {
    /// Rows written: one, or two for a transfer.
    pub movements: Vec<StockMovement>,
    /// Balance after the movement.
    pub balance: StockBalance,
}

/// An item at or below its reorder level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockItem {
    /// The item.
    pub item: StockItem,
    /// Its current on-hand quantity.
    pub on_hand: Decimal,
}

/// Stored balance next to the balance re-derived from movement history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReconciliation {
    /// The persisted balance row.
    pub stored: StockPosition,
    /// The fold of all movements.
    pub replayed: StockPosition,
}

impl StockReconciliation {
    /// Returns true if the stored balance matches history.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.stored == self.replayed
    }
}
