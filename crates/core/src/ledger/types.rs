//! Ledger domain types: accounts, vouchers and ledger lines.
//!
//! Closed enums are parsed at the boundary with `parse` and rendered with
//! `as_str`, which is also the persisted representation.

use chrono::{DateTime, NaiveDate, Utc};
use girder_shared::types::{
    AccountId, CompanyId, LedgerLineId, ProjectId, UserId, VendorId, VoucherId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::payables::AllocationRequest;
use crate::purchase::{PurchaseLine, PurchaseLineInput};
use crate::workflow::VoucherStatus;

/// Account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Resources owned (cash, bank, inventory).
    Asset,
    /// Obligations (vendor payables).
    Liability,
    /// Owner's equity.
    Equity,
    /// Revenue accounts.
    Income,
    /// Cost accounts.
    Expense,
}

impl AccountType {
    /// Returns the string representation of the account type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Parses an account type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asset" => Some(Self::Asset),
            "liability" => Some(Self::Liability),
            "equity" => Some(Self::Equity),
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Returns true if the normal balance of this account type is a debit.
    #[must_use]
    pub fn is_debit_normal(&self) -> bool {
        matches!(self, Self::Asset | Self::Expense)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chart-of-accounts entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Account code, unique per company.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Only system accounts receive postings; the rest are grouping headers.
    pub is_system: bool,
    /// Whether the account is active.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Returns true if ledger lines may reference this account.
    #[must_use]
    pub fn accepts_postings(&self) -> bool {
        self.is_system && self.is_active
    }
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Account code, unique per company.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Whether the account receives postings.
    pub is_system: bool,
}

/// Mutable account fields. Name and type are frozen once a posted line references the account.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New account type.
    pub account_type: Option<AccountType>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// Voucher document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherType {
    /// Money received.
    Receipt,
    /// Money paid out, optionally allocated against vendor open items.
    Payment,
    /// General journal.
    Journal,
    /// Vendor purchase; material lines drive stock receipts on posting.
    Purchase,
    /// Transfers between cash and bank accounts.
    Contra,
}

impl VoucherType {
    /// Returns the string representation of the voucher type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Receipt => "receipt",
            Self::Payment => "payment",
            Self::Journal => "journal",
            Self::Purchase => "purchase",
            Self::Contra => "contra",
        }
    }

    /// Parses a voucher type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "receipt" => Some(Self::Receipt),
            "payment" => Some(Self::Payment),
            "journal" => Some(Self::Journal),
            "purchase" => Some(Self::Purchase),
            "contra" => Some(Self::Contra),
            _ => None,
        }
    }
}

impl fmt::Display for VoucherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a payment line was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash.
    Cash,
    /// Bank transfer.
    BankTransfer,
    /// Cheque.
    Cheque,
    /// Card.
    Card,
}

impl PaymentMethod {
    /// Returns the string representation of the payment method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::BankTransfer => "bank_transfer",
            Self::Cheque => "cheque",
            Self::Card => "card",
        }
    }

    /// Parses a payment method from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cash" => Some(Self::Cash),
            "bank_transfer" => Some(Self::BankTransfer),
            "cheque" => Some(Self::Cheque),
            "card" => Some(Self::Card),
            _ => None,
        }
    }
}

/// Optional analysis tags carried by a ledger line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTags {
    /// Project the line is booked against.
    pub project_id: Option<ProjectId>,
    /// Vendor the line concerns; required for payable lines.
    pub vendor_id: Option<VendorId>,
    /// Settlement method.
    pub payment_method: Option<PaymentMethod>,
}

/// Debit and credit amounts of a line, as seen by the balance validator.
pub trait LineAmounts {
    /// Debit amount (zero for credit lines).
    fn debit_amount(&self) -> Decimal;
    /// Credit amount (zero for debit lines).
    fn credit_amount(&self) -> Decimal;
}

/// One account movement within a voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLine {
    /// Line ID.
    pub id: LedgerLineId,
    /// Owning voucher.
    pub voucher_id: VoucherId,
    /// Account moved by this line.
    pub account_id: AccountId,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Analysis tags.
    pub tags: LineTags,
    /// Line narration.
    pub narration: Option<String>,
    /// Zero-based position within the voucher.
    pub position: u32,
}

impl LineAmounts for LedgerLine {
    fn debit_amount(&self) -> Decimal {
        self.debit
    }

    fn credit_amount(&self) -> Decimal {
        self.credit
    }
}

/// Caller-supplied ledger line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineInput {
    /// Account to move.
    pub account_id: AccountId,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Analysis tags.
    pub tags: LineTags,
    /// Line narration.
    pub narration: Option<String>,
}

impl LineInput {
    /// A debit line with no tags.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            tags: LineTags::default(),
            narration: None,
        }
    }

    /// A credit line with no tags.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            tags: LineTags::default(),
            narration: None,
        }
    }

    /// Sets the line tags.
    #[must_use]
    pub fn with_tags(mut self, tags: LineTags) -> Self {
        self.tags = tags;
        self
    }

    /// Materializes the input as a line of `voucher_id` at `position`.
    #[must_use]
    pub fn into_line(self, voucher_id: VoucherId, position: u32) -> LedgerLine {
        LedgerLine {
            id: LedgerLineId::new(),
            voucher_id,
            account_id: self.account_id,
            debit: self.debit,
            credit: self.credit,
            tags: self.tags,
            narration: self.narration,
            position,
        }
    }
}

impl LineAmounts for LineInput {
    fn debit_amount(&self) -> Decimal {
        self.debit
    }

    fn credit_amount(&self) -> Decimal {
        self.credit
    }
}

/// Voucher header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    /// Voucher ID.
    pub id: VoucherId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Sequential document number, unique per company.
    pub voucher_no: String,
    /// Document date.
    pub voucher_date: NaiveDate,
    /// Document type.
    pub voucher_type: VoucherType,
    /// Workflow status.
    pub status: VoucherStatus,
    /// Project the voucher is booked against.
    pub project_id: Option<ProjectId>,
    /// Counterparty vendor (purchases and payments).
    pub vendor_id: Option<VendorId>,
    /// Header narration.
    pub narration: Option<String>,
    /// Creator.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Submitter.
    pub submitted_by: Option<UserId>,
    /// Submission timestamp.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Approver.
    pub approved_by: Option<UserId>,
    /// Approval timestamp.
    pub approved_at: Option<DateTime<Utc>>,
    /// Poster; set only on posting.
    pub posted_by: Option<UserId>,
    /// Posting timestamp; set only on posting.
    pub posted_at: Option<DateTime<Utc>>,
    /// The voucher that reversed this one.
    pub reversed_by_voucher_id: Option<VoucherId>,
    /// The voucher this one reverses.
    pub reverses_voucher_id: Option<VoucherId>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a draft voucher.
#[derive(Debug, Clone)]
pub struct NewVoucher {
    /// Document type.
    pub voucher_type: VoucherType,
    /// Document date; also selects the numbering period.
    pub voucher_date: NaiveDate,
    /// Project the voucher is booked against.
    pub project_id: Option<ProjectId>,
    /// Counterparty vendor.
    pub vendor_id: Option<VendorId>,
    /// Header narration.
    pub narration: Option<String>,
    /// Ledger lines.
    pub lines: Vec<LineInput>,
    /// Purchase lines; purchase vouchers only.
    pub purchase_lines: Vec<PurchaseLineInput>,
    /// Open-item allocations; payment vouchers only.
    pub allocations: Vec<AllocationRequest>,
}

impl NewVoucher {
    /// A voucher of `voucher_type` dated `voucher_date` with the given lines.
    #[must_use]
    pub fn new(voucher_type: VoucherType, voucher_date: NaiveDate, lines: Vec<LineInput>) -> Self {
        Self {
            voucher_type,
            voucher_date,
            project_id: None,
            vendor_id: None,
            narration: None,
            lines,
            purchase_lines: Vec::new(),
            allocations: Vec::new(),
        }
    }

    /// Sets the counterparty vendor.
    #[must_use]
    pub fn with_vendor(mut self, vendor_id: VendorId) -> Self {
        self.vendor_id = Some(vendor_id);
        self
    }

    /// Sets the project.
    #[must_use]
    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Sets the header narration.
    #[must_use]
    pub fn with_narration(mut self, narration: impl Into<String>) -> Self {
        self.narration = Some(narration.into());
        self
    }

    /// Sets the purchase lines.
    #[must_use]
    pub fn with_purchase_lines(mut self, purchase_lines: Vec<PurchaseLineInput>) -> Self {
        self.purchase_lines = purchase_lines;
        self
    }

    /// Sets the open-item allocations.
    #[must_use]
    pub fn with_allocations(mut self, allocations: Vec<AllocationRequest>) -> Self {
        self.allocations = allocations;
        self
    }
}

/// Replacement content for a draft voucher.
#[derive(Debug, Clone, Default)]
pub struct DraftLines {
    /// New ledger lines.
    pub lines: Vec<LineInput>,
    /// New purchase lines.
    pub purchase_lines: Vec<PurchaseLineInput>,
}

/// A voucher with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherDocument {
    /// Header.
    pub voucher: Voucher,
    /// Ledger lines in position order.
    pub lines: Vec<LedgerLine>,
    /// Purchase lines in position order.
    pub purchase_lines: Vec<PurchaseLine>,
}

/// Debit and credit totals of a validated voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherTotals {
    /// Sum of debits.
    pub total_debit: Decimal,
    /// Sum of credits.
    pub total_credit: Decimal,
}

impl VoucherTotals {
    /// Absolute difference between debits and credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        (self.total_debit - self.total_credit).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AccountType::Asset, "asset")]
    #[case(AccountType::Liability, "liability")]
    #[case(AccountType::Equity, "equity")]
    #[case(AccountType::Income, "income")]
    #[case(AccountType::Expense, "expense")]
    fn test_account_type_round_trips(#[case] account_type: AccountType, #[case] s: &str) {
        assert_eq!(account_type.as_str(), s);
        assert_eq!(AccountType::parse(s), Some(account_type));
    }

    #[rstest]
    #[case("RECEIPT", Some(VoucherType::Receipt))]
    #[case("payment", Some(VoucherType::Payment))]
    #[case("Journal", Some(VoucherType::Journal))]
    #[case("purchase", Some(VoucherType::Purchase))]
    #[case("contra", Some(VoucherType::Contra))]
    #[case("sales", None)]
    fn test_voucher_type_parse(#[case] input: &str, #[case] expected: Option<VoucherType>) {
        assert_eq!(VoucherType::parse(input), expected);
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!(PaymentMethod::parse("bank_transfer"), Some(PaymentMethod::BankTransfer));
        assert_eq!(PaymentMethod::BankTransfer.as_str(), "bank_transfer");
        assert_eq!(PaymentMethod::parse("crypto"), None);
    }

    #[test]
    fn test_debit_normal_accounts() {
        assert!(AccountType::Asset.is_debit_normal());
        assert!(AccountType::Expense.is_debit_normal());
        assert!(!AccountType::Liability.is_debit_normal());
        assert!(!AccountType::Income.is_debit_normal());
    }

    #[test]
    fn test_header_accounts_do_not_accept_postings() {
        let mut account = Account {
            id: AccountId::new(),
            company_id: CompanyId::new(),
            code: "1000".to_string(),
            name: "Current Assets".to_string(),
            account_type: AccountType::Asset,
            is_system: false,
            is_active: true,
            created_at: Utc::now(),
        };
        assert!(!account.accepts_postings());

        account.is_system = true;
        assert!(account.accepts_postings());

        account.is_active = false;
        assert!(!account.accepts_postings());
    }

    #[test]
    fn test_line_input_into_line_keeps_amounts() {
        let voucher_id = VoucherId::new();
        let account_id = AccountId::new();
        let line = LineInput::credit(account_id, Decimal::new(1250, 2)).into_line(voucher_id, 3);

        assert_eq!(line.voucher_id, voucher_id);
        assert_eq!(line.account_id, account_id);
        assert_eq!(line.debit, Decimal::ZERO);
        assert_eq!(line.credit, Decimal::new(1250, 2));
        assert_eq!(line.position, 3);
    }
}
