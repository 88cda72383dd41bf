use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Error context information
///
/// Carries correlation identifiers only. Patient identifiers must be
/// tokenised before they are attached here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorContext {
    pub request_id: Option<String>,
    pub claim_id: Option<String>,
    pub operation: Option<String>,
    pub additional: BTreeMap<String, String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_claim_id(mut self, claim_id: impl Into<String>) -> Self {
        self.claim_id = Some(claim_id.into());
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn add_context<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.additional.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_fields() {
        let ctx = ErrorContext::new()
            .with_request_id("req-1")
            .with_claim_id("CLM000001")
            .with_operation("validate")
            .add_context("stage", "intake");

        assert_eq!(ctx.request_id.as_deref(), Some("req-1"));
        assert_eq!(ctx.claim_id.as_deref(), Some("CLM000001"));
        assert_eq!(ctx.operation.as_deref(), Some("validate"));
        assert_eq!(ctx.additional.get("stage").map(String::as_str), Some("intake"));
    }
}
