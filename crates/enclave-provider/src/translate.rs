//! Conversions between configuration strings and API enum values.
//!
//! Parsing is case-insensitive but closed: anything outside the known
//! vocabulary is a typed error, never a silent default. Defaults apply only
//! where a value is absent altogether.

use thiserror::Error;

use enclave_client::types::{
    ApprovalMode, EnrolmentKeyType, PolicyAclProtocol, TrustRequirementId,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranslateError {
    #[error("'{0}' is not a valid enrolment key type; expected 'general' or 'ephemeral'")]
    KeyType(String),

    #[error("'{0}' is not a valid approval mode; expected 'automatic' or 'manual'")]
    ApprovalMode(String),

    #[error("'{0}' is not a valid protocol; expected 'any', 'tcp', 'udp' or 'icmp'")]
    Protocol(String),

    #[error("'{0}' is not a valid authority; expected 'portal' or 'azure'")]
    Authority(String),

    #[error("a user_authentication block with an authority of 'portal' or 'azure' is required")]
    MissingUserAuthentication,
}

/// Identity authority a trust requirement delegates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    Portal,
    Azure,
}

impl Authority {
    pub fn as_str(self) -> &'static str {
        match self {
            Authority::Portal => "portal",
            Authority::Azure => "azure",
        }
    }
}

/// Key type from configuration; unset means general-purpose.
pub fn parse_key_type(value: Option<&str>) -> Result<EnrolmentKeyType, TranslateError> {
    match value {
        None => Ok(EnrolmentKeyType::GeneralPurpose),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "general" => Ok(EnrolmentKeyType::GeneralPurpose),
            "ephemeral" => Ok(EnrolmentKeyType::Ephemeral),
            _ => Err(TranslateError::KeyType(v.to_string())),
        },
    }
}

/// Approval mode from configuration; unset means manual approval.
pub fn parse_approval_mode(value: Option<&str>) -> Result<ApprovalMode, TranslateError> {
    match value {
        None => Ok(ApprovalMode::Manual),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "automatic" => Ok(ApprovalMode::Automatic),
            "manual" => Ok(ApprovalMode::Manual),
            _ => Err(TranslateError::ApprovalMode(v.to_string())),
        },
    }
}

pub fn parse_protocol(value: &str) -> Result<PolicyAclProtocol, TranslateError> {
    match value.to_ascii_lowercase().as_str() {
        "any" => Ok(PolicyAclProtocol::Any),
        "tcp" => Ok(PolicyAclProtocol::Tcp),
        "udp" => Ok(PolicyAclProtocol::Udp),
        "icmp" => Ok(PolicyAclProtocol::Icmp),
        _ => Err(TranslateError::Protocol(value.to_string())),
    }
}

pub fn parse_authority(value: &str) -> Result<Authority, TranslateError> {
    match value.to_ascii_lowercase().as_str() {
        "portal" => Ok(Authority::Portal),
        "azure" => Ok(Authority::Azure),
        _ => Err(TranslateError::Authority(value.to_string())),
    }
}

/// Trust requirement ids in state are plain integers; wrap them for the wire
/// records.
pub fn to_trust_requirement_ids(ids: &[i64]) -> Vec<TrustRequirementId> {
    ids.iter().copied().map(TrustRequirementId).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocols_parse_case_insensitively() {
        for input in ["any", "TCP", "Udp", "icmp"] {
            assert!(parse_protocol(input).is_ok(), "{input} should parse");
        }
        assert_eq!(
            parse_protocol("sctp"),
            Err(TranslateError::Protocol("sctp".to_string()))
        );
    }

    #[test]
    fn key_type_defaults_to_general_purpose() {
        assert_eq!(parse_key_type(None), Ok(EnrolmentKeyType::GeneralPurpose));
        assert_eq!(parse_key_type(Some("General")), Ok(EnrolmentKeyType::GeneralPurpose));
        assert_eq!(parse_key_type(Some("ephemeral")), Ok(EnrolmentKeyType::Ephemeral));
        assert!(parse_key_type(Some("permanent")).is_err());
    }

    #[test]
    fn approval_mode_defaults_to_manual() {
        assert_eq!(parse_approval_mode(None), Ok(ApprovalMode::Manual));
        assert_eq!(parse_approval_mode(Some("AUTOMATIC")), Ok(ApprovalMode::Automatic));
        assert!(parse_approval_mode(Some("auto")).is_err());
    }

    #[test]
    fn authority_rejects_unknown_values() {
        assert_eq!(parse_authority("Portal"), Ok(Authority::Portal));
        assert_eq!(parse_authority("azure"), Ok(Authority::Azure));
        assert!(parse_authority("okta").is_err());
    }

    #[test]
    fn trust_requirement_ids_preserve_order() {
        let ids = to_trust_requirement_ids(&[3, 1, 2]);
        assert_eq!(
            ids,
            vec![TrustRequirementId(3), TrustRequirementId(1), TrustRequirementId(2)]
        );
    }
}
