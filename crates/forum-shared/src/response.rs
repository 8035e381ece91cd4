//! JSON body of every error answer, shaped after RFC 7807 problem details.

use serde::{Deserialize, Serialize};

/// A single rejected input, e.g. `{"field": "titulo", "message": "must not be blank"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `about:blank`; `title` carries the meaning.
    #[serde(rename = "type")]
    pub error_type: String,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl ErrorResponse {
    pub fn new(status: u16, title: impl Into<String>) -> Self {
        Self {
            error_type: "about:blank".into(),
            title: title.into(),
            status,
            detail: None,
            errors: vec![],
        }
    }

    pub fn with_detail(self, detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..self
        }
    }

    pub fn with_errors(self, errors: Vec<FieldError>) -> Self {
        Self { errors, ..self }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(400, "Bad Request").with_detail(detail)
    }

    /// 400 listing every offending field at once.
    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::new(400, "Validation Failed").with_errors(errors)
    }

    /// No detail; the cause is logged server-side.
    pub fn internal_error() -> Self {
        Self::new(500, "Internal Server Error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_fields_are_omitted() {
        let json = serde_json::to_value(ErrorResponse::internal_error()).unwrap();
        assert_eq!(json["type"], "about:blank");
        assert!(json.get("detail").is_none());
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn test_validation_carries_fields() {
        let body = ErrorResponse::validation(vec![FieldError::new("titulo", "must not be blank")]);
        let json = serde_json::to_value(body).unwrap();
        assert_eq!(json["status"], 400);
        assert_eq!(json["errors"][0]["field"], "titulo");
    }
}
