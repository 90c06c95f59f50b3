//! GraphQL request envelope.

use serde::Serialize;
use serde_json::Value;

/// A GraphQL operation ready to be POSTed.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
    pub query: &'static str,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub variables: Value,
    pub operation_name: &'static str,
}

impl GraphqlRequest {
    #[inline]
    pub fn new(operation_name: &'static str, query: &'static str) -> Self {
        Self {
            query,
            variables: Value::Null,
            operation_name,
        }
    }

    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = variables;
        self
    }

    /// Wraps a mutation input as `{"input": ...}`.
    pub fn with_input<T: Serialize>(self, input: &T) -> crate::Result<Self> {
        let input = serde_json::to_value(input)?;
        Ok(self.with_variables(serde_json::json!({ "input": input })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = GraphqlRequest::new("GetPost", "query GetPost($id: ID!) { getPost(id: $id) { id } }")
            .with_variables(serde_json::json!({ "id": "p1" }));
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["operationName"], "GetPost");
        assert_eq!(body["variables"]["id"], "p1");
    }

    #[test]
    fn test_null_variables_are_omitted() {
        let req = GraphqlRequest::new("OnCreatePost", "subscription OnCreatePost { onCreatePost { id } }");
        let body = serde_json::to_value(&req).unwrap();
        assert!(body.get("variables").is_none());
    }
}
