//! Attempt submission payload.

use serde::{Deserialize, Serialize};

/// Body of `POST /assignments/{id}/attempts`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttemptRequest {
    /// The mongosh expression submitted for grading, e.g. `db.users.find({})`.
    pub code: String,
}

impl AttemptRequest {
    /// Wraps a query expression, dropping surrounding whitespace.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self {
            code: code.as_ref().trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_request_trims_code() {
        let request = AttemptRequest::new("  db.users.find({})\n");
        assert_eq!(request.code, "db.users.find({})");
    }

    #[test]
    fn test_attempt_request_serializes_code_field() {
        let json = serde_json::to_value(AttemptRequest::new("db.orders.aggregate([])")).unwrap();
        assert_eq!(json, serde_json::json!({ "code": "db.orders.aggregate([])" }));
    }
}
