//! Consent certification tokens (TrustedForm, Jornaya), buyer compliance
//! gating, and the lead quality score.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Certificate URLs issued by TrustedForm start with this prefix.
pub const TRUSTED_FORM_CERT_PREFIX: &str = "https://cert.trustedform.com/";

/// Upper bound of [`lead_quality_score`].
pub const MAX_QUALITY_SCORE: i32 = 100;

/// Contact fields that make a lead deliverable.
const CONTACT_FIELDS: &[&str] = &["first_name", "last_name", "email", "phone"];

/// Certification tokens captured client-side and attached to a lead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplianceTokens {
    pub trusted_form_cert_url: Option<String>,
    pub trusted_form_cert_id: Option<String>,
    pub jornaya_lead_id: Option<String>,
}

impl ComplianceTokens {
    pub fn has_trusted_form(&self) -> bool {
        non_blank(&self.trusted_form_cert_url) || non_blank(&self.trusted_form_cert_id)
    }

    pub fn has_jornaya(&self) -> bool {
        non_blank(&self.jornaya_lead_id)
    }

    /// Validate token shapes and derive a missing TrustedForm cert id from
    /// its URL.
    pub fn normalized(mut self) -> Result<Self, CoreError> {
        self.trusted_form_cert_url = trimmed(self.trusted_form_cert_url);
        self.trusted_form_cert_id = trimmed(self.trusted_form_cert_id);
        self.jornaya_lead_id = trimmed(self.jornaya_lead_id);

        if let Some(url) = &self.trusted_form_cert_url {
            let id = trusted_form_cert_id(url)?;
            if self.trusted_form_cert_id.is_none() {
                self.trusted_form_cert_id = Some(id);
            }
        }
        Ok(self)
    }
}

fn non_blank(v: &Option<String>) -> bool {
    v.as_deref().is_some_and(|s| !s.trim().is_empty())
}

fn trimmed(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Extract the certificate id (last path segment) from a TrustedForm URL.
pub fn trusted_form_cert_id(url: &str) -> Result<String, CoreError> {
    let rest = url.strip_prefix(TRUSTED_FORM_CERT_PREFIX).ok_or_else(|| {
        CoreError::Validation(format!(
            "TrustedForm certificate URL must start with {TRUSTED_FORM_CERT_PREFIX}"
        ))
    })?;
    let id = rest.split(['?', '#']).next().unwrap_or_default().trim_end_matches('/');
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CoreError::Validation(
            "TrustedForm certificate URL has no valid certificate id".to_string(),
        ));
    }
    Ok(id.to_string())
}

// ---------------------------------------------------------------------------
// Buyer requirements
// ---------------------------------------------------------------------------

/// Per-buyer-config compliance requirements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceRequirements {
    pub requires_trusted_form: bool,
    pub requires_jornaya: bool,
}

impl ComplianceRequirements {
    /// Names of requirements the tokens do not satisfy.
    pub fn unmet(&self, tokens: &ComplianceTokens) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.requires_trusted_form && !tokens.has_trusted_form() {
            missing.push("trusted_form");
        }
        if self.requires_jornaya && !tokens.has_jornaya() {
            missing.push("jornaya");
        }
        missing
    }

    pub fn is_satisfied_by(&self, tokens: &ComplianceTokens) -> bool {
        self.unmet(tokens).is_empty()
    }
}

// ---------------------------------------------------------------------------
// Quality score
// ---------------------------------------------------------------------------

/// Score a lead from 0 to 100.
///
/// | signal                        | points |
/// |-------------------------------|--------|
/// | TrustedForm certificate       | 25     |
/// | Jornaya lead id               | 25     |
/// | TCPA consent given            | 20     |
/// | each contact field (max 4)    | 5      |
/// | homeowner                     | 10     |
pub fn lead_quality_score(
    tokens: &ComplianceTokens,
    tcpa_consent: bool,
    owns_home: Option<bool>,
    form_data: &serde_json::Value,
) -> i32 {
    let mut score = 0;
    if tokens.has_trusted_form() {
        score += 25;
    }
    if tokens.has_jornaya() {
        score += 25;
    }
    if tcpa_consent {
        score += 20;
    }
    let contact_fields = CONTACT_FIELDS
        .iter()
        .filter(|f| {
            form_data
                .get(**f)
                .and_then(|v| v.as_str())
                .is_some_and(|s| !s.trim().is_empty())
        })
        .count() as i32;
    score += contact_fields * 5;
    if owns_home == Some(true) {
        score += 10;
    }
    score.min(MAX_QUALITY_SCORE)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn full_tokens() -> ComplianceTokens {
        ComplianceTokens {
            trusted_form_cert_url: Some(format!("{TRUSTED_FORM_CERT_PREFIX}abc123")),
            trusted_form_cert_id: None,
            jornaya_lead_id: Some("LEADID-1".into()),
        }
    }

    #[test]
    fn cert_id_is_derived_from_url() {
        let tokens = full_tokens().normalized().unwrap();
        assert_eq!(tokens.trusted_form_cert_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn cert_url_must_be_trusted_form() {
        let tokens = ComplianceTokens {
            trusted_form_cert_url: Some("https://evil.example.com/abc".into()),
            ..Default::default()
        };
        assert!(tokens.normalized().is_err());
    }

    #[test]
    fn cert_id_ignores_query() {
        let id = trusted_form_cert_id(&format!("{TRUSTED_FORM_CERT_PREFIX}f00d?shared_token=x")).unwrap();
        assert_eq!(id, "f00d");
    }

    #[test]
    fn blank_tokens_are_dropped() {
        let tokens = ComplianceTokens {
            jornaya_lead_id: Some("   ".into()),
            ..Default::default()
        }
        .normalized()
        .unwrap();
        assert!(tokens.jornaya_lead_id.is_none());
        assert!(!tokens.has_jornaya());
    }

    #[test]
    fn requirements_report_missing_tokens() {
        let req = ComplianceRequirements {
            requires_trusted_form: true,
            requires_jornaya: true,
        };
        assert_eq!(req.unmet(&ComplianceTokens::default()), vec!["trusted_form", "jornaya"]);
        assert!(req.is_satisfied_by(&full_tokens()));
        assert!(ComplianceRequirements::default().is_satisfied_by(&ComplianceTokens::default()));
    }

    #[test]
    fn quality_score_caps_at_100() {
        let form = json!({ "first_name": "A", "last_name": "B", "email": "a@b.c", "phone": "555" });
        assert_eq!(lead_quality_score(&full_tokens(), true, Some(true), &form), 100);
    }

    #[test]
    fn quality_score_of_bare_lead() {
        assert_eq!(
            lead_quality_score(&ComplianceTokens::default(), false, None, &json!({})),
            0
        );
        assert_eq!(
            lead_quality_score(&ComplianceTokens::default(), true, Some(true), &json!({ "email": "x@y.z" })),
            35
        );
    }
}
