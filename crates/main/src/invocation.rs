//! Envelope handling for function-style invocations.
//!
//! Three event shapes carry a payload: a direct call `{"data": <payload>}`, an HTTP gateway
//! envelope `{"body": "<json>", "isBase64Encoded": bool}` whose decoded body holds the same
//! `data` key, and a bare payload.

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{error, info};
use serde::Serialize;
use serde_json::Value;
use waste_report::{ReportPayload, ReportRenderer};

/// Unwraps `event` down to the payload object.
pub fn extract_payload(event: Value) -> Result<Value> {
    let Value::Object(mut fields) = event else {
        bail!("invocation event must be a JSON object");
    };

    if let Some(body) = fields.remove("body") {
        let encoded = fields
            .get("isBase64Encoded")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let body = match body {
            Value::String(text) if encoded => {
                let bytes = STANDARD
                    .decode(text.trim())
                    .context("request body is not valid base64")?;
                serde_json::from_slice(&bytes).context("decoded request body is not JSON")?
            }
            Value::String(text) => {
                serde_json::from_str(&text).context("request body is not JSON")?
            }
            other => other,
        };
        return extract_payload(body);
    }

    match fields.remove("data") {
        Some(data) => Ok(data),
        None => Ok(Value::Object(fields)),
    }
}

/// Result reported back to the caller.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InvocationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InvocationResponse {
    fn failure(message: String) -> Self {
        Self {
            success: false,
            pdf_base64: None,
            filename: None,
            error: Some(message),
        }
    }
}

/// Renders the payload carried by `event`; failures become an unsuccessful response.
pub fn handle(renderer: &ReportRenderer, event: Value) -> InvocationResponse {
    let rendered = extract_payload(event)
        .and_then(|payload| ReportPayload::from_value(payload).context("invalid report payload"))
        .and_then(|payload| renderer.render(&payload).context("report rendering failed"));

    match rendered {
        Ok(report) => {
            info!("Rendered {} ({} pages)", report.filename, report.page_count);
            InvocationResponse {
                success: true,
                pdf_base64: Some(STANDARD.encode(&report.bytes)),
                filename: Some(report.filename),
                error: None,
            }
        }
        Err(err) => {
            error!("Invocation failed: {:#}", err);
            InvocationResponse::failure(format!("{:#}", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use waste_report::{FontResolver, ReportBuilder};

    fn payload() -> Value {
        json!({
            "users": "ops@example.com",
            "location": "North Depot",
            "date_from": "2024-01-01",
            "date_to": "2024-03-31"
        })
    }

    #[test]
    fn direct_invocation_unwraps_data() {
        assert_eq!(extract_payload(json!({ "data": payload() })).unwrap(), payload());
    }

    #[test]
    fn bare_payload_passes_through() {
        assert_eq!(extract_payload(payload()).unwrap(), payload());
    }

    #[test]
    fn gateway_bodies_are_decoded() {
        let body = json!({ "data": payload() }).to_string();
        let plain = json!({ "body": body, "isBase64Encoded": false });
        assert_eq!(extract_payload(plain).unwrap(), payload());

        let encoded = json!({ "body": STANDARD.encode(&body), "isBase64Encoded": true });
        assert_eq!(extract_payload(encoded).unwrap(), payload());
    }

    #[test]
    fn malformed_bodies_are_reported() {
        let err = extract_payload(json!({ "body": "%%%", "isBase64Encoded": true })).unwrap_err();
        assert!(format!("{:#}", err).contains("base64"));
        assert!(extract_payload(json!([1, 2, 3])).is_err());
    }

    #[test]
    fn responses_carry_the_document_or_the_error() {
        let renderer = ReportBuilder::new()
            .with_font_resolver(FontResolver::builtin_only())
            .build();

        let ok = handle(&renderer, json!({ "data": payload() }));
        assert!(ok.success);
        let bytes = STANDARD.decode(ok.pdf_base64.unwrap()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(ok.filename.unwrap().starts_with("waste_report_north_depot_"));

        let failed = handle(&renderer, json!({ "data": { "location": "North Depot" } }));
        assert!(!failed.success);
        assert!(failed.error.unwrap().contains("invalid report payload"));
        let serialized = serde_json::to_value(InvocationResponse::failure("boom".into())).unwrap();
        assert_eq!(serialized, json!({ "success": false, "error": "boom" }));
    }
}
