//! # Structured Requests
//!
//! The single request/response primitive behind every skill: derive the
//! declared shape from the output type, dispatch under a deadline, decode,
//! validate. Anything that does not decode is a schema violation; nothing
//! is defaulted.

use std::time::Duration;

use schemars::generate::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ForgeError, Operation};
use crate::models::ModelConfig;
use crate::service::{GenerationRequest, GenerativeService};

/// A response shape the factory can request
pub trait StructuredOutput: DeserializeOwned + JsonSchema {
    /// Semantic checks beyond the shape itself
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// JSON schema for `T` with sub-schemas inlined
pub fn response_schema<T: JsonSchema>() -> Value {
    let mut settings = SchemaSettings::draft2020_12();
    settings.inline_subschemas = true;
    let mut value = settings
        .into_generator()
        .into_root_schema_for::<T>()
        .to_value();
    if let Value::Object(map) = &mut value {
        map.remove("$schema");
        map.remove("title");
    }
    value
}

/// Models sometimes wrap JSON in a Markdown fence
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    match rest.find('\n') {
        Some(idx) if !rest[..idx].trim_start().starts_with(['{', '[']) => rest[idx + 1..].trim(),
        _ => rest.trim(),
    }
}

/// Decode and validate a raw response
pub fn decode<T: StructuredOutput>(operation: Operation, raw: &str) -> Result<T, ForgeError> {
    let value: T = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| ForgeError::schema(operation, e.to_string()))?;
    value
        .validate()
        .map_err(|detail| ForgeError::schema(operation, detail))?;
    Ok(value)
}

/// Run one structured request against the service
pub async fn request<T: StructuredOutput>(
    service: &dyn GenerativeService,
    operation: Operation,
    model: &ModelConfig,
    prompt: String,
    timeout: Duration,
) -> Result<T, ForgeError> {
    let request = GenerationRequest {
        operation,
        model: model.model.clone(),
        thinking_budget: model.thinking_budget,
        prompt,
        schema: response_schema::<T>(),
    };

    tracing::debug!(
        %operation,
        model = %request.model,
        prompt_len = request.prompt.len(),
        "Dispatching structured request"
    );

    let raw = tokio::time::timeout(timeout, service.generate(&request))
        .await
        .map_err(|_| ForgeError::timeout(operation, timeout))??;

    decode(operation, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{ScriptedReply, ScriptedService};
    use schemars::JsonSchema;
    use serde::Deserialize;
    use tokio_test::assert_err;

    #[derive(Debug, Deserialize, JsonSchema, PartialEq)]
    struct Verdict {
        ok: bool,
        reason: String,
    }

    impl StructuredOutput for Verdict {
        fn validate(&self) -> Result<(), String> {
            if self.reason.is_empty() {
                Err("reason is empty".to_string())
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_schema_lists_required_fields() {
        let schema = response_schema::<Verdict>();
        assert!(schema.get("$schema").is_none());
        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&Value::from("ok")));
        assert!(required.contains(&Value::from("reason")));
    }

    #[test]
    fn test_decode_strips_fence() {
        let raw = "```json\n{\"ok\": true, \"reason\": \"fine\"}\n```";
        let verdict: Verdict = decode(Operation::Audit, raw).unwrap();
        assert!(verdict.ok);
    }

    #[test]
    fn test_decode_missing_field_is_schema_violation() {
        let err = decode::<Verdict>(Operation::Audit, r#"{"ok": true}"#).unwrap_err();
        match err {
            ForgeError::SchemaViolation { operation, detail } => {
                assert_eq!(operation, Operation::Audit);
                assert!(detail.contains("reason"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validation_failure_is_schema_violation() {
        let err = decode::<Verdict>(Operation::Audit, r#"{"ok": true, "reason": ""}"#);
        assert!(matches!(err, Err(ForgeError::SchemaViolation { .. })));
    }

    #[tokio::test]
    async fn test_request_times_out_as_service_error() {
        let service = ScriptedService::new().reply(Operation::Audit, ScriptedReply::Hang);
        let result = request::<Verdict>(
            &service,
            Operation::Audit,
            &ModelConfig::default(),
            "p".to_string(),
            Duration::from_millis(20),
        )
        .await;
        let err = assert_err!(result);
        assert!(matches!(
            err,
            ForgeError::Service {
                operation: Operation::Audit,
                ..
            }
        ));
    }
}
