//! GraphQL response envelope.

use crate::error::{GraphqlError, Result};
use crate::protocol::documents::CONFLICT_ERROR_TYPE;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// One entry of the `errors` array.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub path: Vec<Value>,
}

/// `{data, errors}` as returned by the backend.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<ResponseError>,
}

impl GraphqlResponse {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Turns `errors` into a [`GraphqlError`]. `id` names the post the
    /// operation targeted, for conflict reporting.
    pub fn check(&self, id: Option<&str>) -> Result<()> {
        let Some(first) = self.errors.first() else {
            return Ok(());
        };
        if self
            .errors
            .iter()
            .any(|e| e.error_type.as_deref() == Some(CONFLICT_ERROR_TYPE))
        {
            return Err(GraphqlError::Conflict(id.unwrap_or_default().to_string()));
        }
        Err(GraphqlError::Graphql(first.message.clone()))
    }

    /// Extracts `data.<field>`. A JSON `null` becomes `None`.
    pub fn field<T: DeserializeOwned>(&self, field: &str) -> Result<Option<T>> {
        match self.data.as_ref().and_then(|d| d.get(field)) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(T::deserialize(value)?)),
        }
    }

    /// Like [`field`](Self::field) but a missing value is an error.
    pub fn required<T: DeserializeOwned>(&self, field: &str) -> Result<T> {
        self.field(field)?
            .ok_or_else(|| GraphqlError::Graphql(format!("response has no `{}`", field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Post;

    #[test]
    fn test_conflict_error_type_maps_to_conflict() {
        let body = br#"{"data": {"createPost": null}, "errors": [
            {"message": "The conditional request failed", "errorType": "DynamoDB:ConditionalCheckFailedException"}
        ]}"#;
        let resp = GraphqlResponse::from_slice(body).unwrap();
        assert_eq!(resp.check(Some("p1")), Err(GraphqlError::Conflict("p1".into())));
    }

    #[test]
    fn test_other_errors_map_to_graphql() {
        let body = br#"{"errors": [{"message": "boom"}]}"#;
        let resp = GraphqlResponse::from_slice(body).unwrap();
        assert_eq!(resp.check(None), Err(GraphqlError::Graphql("boom".into())));
    }

    #[test]
    fn test_null_field_is_none() {
        let resp = GraphqlResponse::from_slice(br#"{"data": {"getPost": null}}"#).unwrap();
        assert!(resp.check(None).is_ok());
        assert_eq!(resp.field::<Post>("getPost").unwrap(), None);
        assert!(resp.required::<Post>("getPost").is_err());
    }
}
