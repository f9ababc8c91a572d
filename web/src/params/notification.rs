use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

/// A notification pushed by another service.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct EmitParams {
    #[serde(rename = "type")]
    pub(crate) event_type: Option<String>,
    #[schema(value_type = Object)]
    pub(crate) data: Option<Value>,
}

impl EmitParams {
    /// The trimmed event type, or `None` when missing or blank.
    pub(crate) fn event_type(&self) -> Option<&str> {
        self.event_type
            .as_deref()
            .map(str::trim)
            .filter(|event_type| !event_type.is_empty())
    }

    /// `data` with `null` and absent both treated as an empty object.
    pub(crate) fn data(self) -> Value {
        match self.data {
            None | Some(Value::Null) => json!({}),
            Some(data) => data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: Value) -> EmitParams {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_blank_or_missing_type_is_rejected() {
        assert!(parse(json!({"data": {}})).event_type().is_none());
        assert!(parse(json!({"type": "   "})).event_type().is_none());
        assert_eq!(
            parse(json!({"type": " order_created "})).event_type(),
            Some("order_created")
        );
    }

    #[test]
    fn test_data_defaults_to_empty_object() {
        assert_eq!(parse(json!({"type": "x"})).data(), json!({}));
        assert_eq!(parse(json!({"type": "x", "data": null})).data(), json!({}));
        assert_eq!(
            parse(json!({"type": "x", "data": {"orderId": "o-1"}})).data(),
            json!({"orderId": "o-1"})
        );
    }
}
