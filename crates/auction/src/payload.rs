//! PING and POST payload construction.
//!
//! Both start from the lead's flat field map. PING bodies carry no contact
//! details; POST bodies carry everything plus the compliance tokens, the
//! ping token, and the winning amount.

use leadbid_core::templates::{apply_field_mappings, render_template, strip_pii, FieldMap};
use leadbid_db::models::lead::Lead;
use serde_json::{json, Value};

use crate::registry::BuyerAuctionConfig;

/// Form keys checked, in order, for the lead's estimated job value.
const ESTIMATED_VALUE_KEYS: &[&str] = &["estimated_value", "estimatedValue", "project_value"];

/// Estimated job value from the form answers, if any.
pub fn estimated_value(form_data: &Value) -> Option<f64> {
    ESTIMATED_VALUE_KEYS.iter().find_map(|key| match form_data.get(*key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches('$').replace(',', "").parse().ok(),
        _ => None,
    })
}

/// Flat field map for a lead: form answers overlaid with lead columns.
pub fn lead_fields(lead: &Lead) -> FieldMap {
    let mut fields = lead.form_data.as_object().cloned().unwrap_or_default();
    fields.insert("lead_id".into(), json!(lead.id));
    fields.insert("service_type_id".into(), json!(lead.service_type_id));
    fields.insert("zip_code".into(), json!(lead.zip_code));
    fields.insert("owns_home".into(), json!(lead.owns_home));
    fields.insert("timeframe".into(), json!(lead.timeframe));
    fields.insert("tcpa_consent".into(), json!(lead.tcpa_consent));
    fields.insert("lead_quality_score".into(), json!(lead.lead_quality_score));
    if let Some(value) = estimated_value(&lead.form_data) {
        fields.insert("estimated_value".into(), json!(value));
    }

    let tokens = lead.compliance_tokens();
    fields.insert("has_trusted_form".into(), json!(tokens.has_trusted_form()));
    fields.insert("has_jornaya".into(), json!(tokens.has_jornaya()));
    fields
}

/// Body of the PING sent to `config`'s buyer.
pub fn build_ping_payload(config: &BuyerAuctionConfig, lead: &Lead) -> Value {
    let mut fields = lead_fields(lead);
    strip_pii(&mut fields);
    let mapped = apply_field_mappings(&fields, &config.field_mappings);
    render_template(&config.ping_template, &mapped)
}

/// Body of the POST sent to the winning buyer.
pub fn build_post_payload(
    config: &BuyerAuctionConfig,
    lead: &Lead,
    ping_token: Option<&str>,
    bid_amount: f64,
) -> Value {
    let mut fields = lead_fields(lead);
    fields.insert("trusted_form_cert_url".into(), json!(lead.trusted_form_cert_url));
    fields.insert("trusted_form_cert_id".into(), json!(lead.trusted_form_cert_id));
    fields.insert("jornaya_lead_id".into(), json!(lead.jornaya_lead_id));
    fields.insert("tcpa_consent_text".into(), json!(lead.tcpa_consent_text));
    fields.insert("ping_id".into(), json!(ping_token));
    fields.insert("bid_amount".into(), json!(bid_amount));
    let mapped = apply_field_mappings(&fields, &config.field_mappings);
    render_template(&config.post_template, &mapped)
}
