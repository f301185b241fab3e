//! Voucher numbering.
//!
//! Numbers look like `{prefix}-{YYYYMM}-{seq:05}`, with the sequence running
//! per company and calendar month. The counter lives in the store and is
//! advanced inside the voucher-creating unit of work; this module owns the
//! period key, the format and the conflict error.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::error::ErrorKind;

/// Default voucher number prefix.
pub const DEFAULT_PREFIX: &str = "V";

/// Calendar month a voucher is numbered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeriodKey {
    year: i32,
    month: u32,
}

impl PeriodKey {
    /// The period containing `date`.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Year component.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Month component (1-12).
    #[must_use]
    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

/// Formats voucher numbers for one prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoucherNumbering {
    prefix: String,
}

impl Default for VoucherNumbering {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl VoucherNumbering {
    /// Numbering with the given prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The configured prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The voucher number for `sequence` within `period`.
    #[must_use]
    pub fn format(&self, period: PeriodKey, sequence: u32) -> String {
        format!("{}-{}-{:05}", self.prefix, period, sequence)
    }

    /// The sequence a voucher number was built from, whatever its prefix.
    ///
    /// The sequence is zero-padded to five digits but may run wider, so
    /// numbers order by this value rather than as text.
    #[must_use]
    pub fn sequence_of(voucher_no: &str) -> Option<u32> {
        voucher_no.rsplit_once('-')?.1.parse().ok()
    }
}

/// Errors raised while allocating voucher numbers.
#[derive(Debug, Error)]
pub enum NumberingError {
    /// The generated number already exists; a fresh number may succeed.
    #[error("Voucher number {voucher_no} already exists")]
    Collision {
        /// The colliding number.
        voucher_no: String,
        /// The sequence value it was built from.
        sequence: u32,
    },

    /// Every attempt collided.
    #[error("Could not allocate a voucher number after {attempts} attempts (last: {voucher_no})")]
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// The last colliding number.
        voucher_no: String,
    },
}

impl NumberingError {
    /// Returns the error category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::NumberingConflict
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Collision { .. } => "VOUCHER_NUMBER_COLLISION",
            Self::Exhausted { .. } => "VOUCHER_NUMBER_CONFLICT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(2026, 1, 1, "202601")]
    #[case(2026, 12, 31, "202612")]
    #[case(999, 3, 5, "099903")]
    fn test_period_key_display(
        #[case] year: i32,
        #[case] month: u32,
        #[case] day: u32,
        #[case] expected: &str,
    ) {
        let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
        assert_eq!(PeriodKey::from_date(date).to_string(), expected);
    }

    #[test]
    fn test_dates_in_same_month_share_period() {
        let a = PeriodKey::from_date(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        let b = PeriodKey::from_date(NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());
        let c = PeriodKey::from_date(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a < c);
    }

    #[test]
    fn test_format_pads_sequence() {
        let numbering = VoucherNumbering::new("JV");
        let period = PeriodKey::from_date(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        assert_eq!(numbering.format(period, 1), "JV-202601-00001");
        assert_eq!(numbering.format(period, 12_345), "JV-202601-12345");
        assert_eq!(numbering.format(period, 123_456), "JV-202601-123456");
    }

    #[test]
    fn test_default_prefix() {
        assert_eq!(VoucherNumbering::default().prefix(), "V");
    }

    #[test]
    fn test_errors_are_numbering_conflicts() {
        let err = NumberingError::Collision {
            voucher_no: "V-202601-00001".to_string(),
            sequence: 1,
        };
        assert_eq!(err.kind(), ErrorKind::NumberingConflict);
        assert_eq!(err.error_code(), "VOUCHER_NUMBER_COLLISION");

        let err = NumberingError::Exhausted {
            attempts: 3,
            voucher_no: "V-202601-00004".to_string(),
        };
        assert_eq!(err.error_code(), "VOUCHER_NUMBER_CONFLICT");
        assert!(err.to_string().contains("3 attempts"));
    }

    #[test]
    fn test_sequence_of_reads_past_the_padding() {
        let numbering = VoucherNumbering::default();
        let period = PeriodKey::from_date(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(
            VoucherNumbering::sequence_of(&numbering.format(period, 7)),
            Some(7)
        );
        assert_eq!(
            VoucherNumbering::sequence_of(&numbering.format(period, 100_000)),
            Some(100_000)
        );
        assert_eq!(VoucherNumbering::sequence_of("OPENING"), None);
    }
}
