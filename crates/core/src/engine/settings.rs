//! Engine tuning parsed from configuration.

use girder_shared::config::LedgerConfig;

use crate::numbering::VoucherNumbering;
use crate::workflow::{PostingPolicy, WorkflowError};

/// Attempts made when a voucher number collides.
pub const DEFAULT_NUMBERING_MAX_ATTEMPTS: u32 = 3;

/// Attempts made to append one audit record.
pub const DEFAULT_AUDIT_MAX_ATTEMPTS: u32 = 3;

/// Runtime settings of a [`super::LedgerEngine`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Voucher number format.
    pub numbering: VoucherNumbering,
    /// Attempts made to create a voucher when its number collides.
    pub numbering_max_attempts: u32,
    /// Attempts made to append an audit record.
    pub audit_max_attempts: u32,
    /// Which voucher types may skip approval.
    pub posting: PostingPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            numbering: VoucherNumbering::default(),
            numbering_max_attempts: DEFAULT_NUMBERING_MAX_ATTEMPTS,
            audit_max_attempts: DEFAULT_AUDIT_MAX_ATTEMPTS,
            posting: PostingPolicy::default(),
        }
    }
}

impl TryFrom<&LedgerConfig> for EngineSettings {
    type Error = WorkflowError;

    fn try_from(config: &LedgerConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            numbering: VoucherNumbering::new(config.voucher_prefix.clone()),
            numbering_max_attempts: config.numbering_max_attempts.max(1),
            audit_max_attempts: config.audit_max_attempts.max(1),
            posting: PostingPolicy::parse(&config.direct_post_voucher_types)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::VoucherType;

    #[test]
    fn test_from_config() {
        let config = LedgerConfig {
            voucher_prefix: "JV".to_string(),
            numbering_max_attempts: 0,
            audit_max_attempts: 4,
            direct_post_voucher_types: vec!["journal".to_string(), "CONTRA".to_string()],
        };

        let settings = EngineSettings::try_from(&config).unwrap();
        assert_eq!(settings.numbering.prefix(), "JV");
        assert_eq!(settings.numbering_max_attempts, 1);
        assert_eq!(settings.audit_max_attempts, 4);
        assert!(settings.posting.is_direct_post(VoucherType::Journal));
        assert!(settings.posting.is_direct_post(VoucherType::Contra));
        assert!(!settings.posting.is_direct_post(VoucherType::Purchase));
    }

    #[test]
    fn test_unknown_voucher_type_rejected() {
        let config = LedgerConfig {
            direct_post_voucher_types: vec!["invoice".to_string()],
            ..LedgerConfig::default()
        };

        assert!(matches!(
            EngineSettings::try_from(&config),
            Err(WorkflowError::UnknownVoucherType(name)) if name == "invoice"
        ));
    }

    #[test]
    fn test_default_requires_approval_for_everything() {
        let settings = EngineSettings::default();
        assert_eq!(settings.numbering.prefix(), "V");
        assert!(!settings.posting.is_direct_post(VoucherType::Journal));
    }
}
