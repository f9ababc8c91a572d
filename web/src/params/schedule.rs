use domain::schedule::NewSlot;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateParams {
    pub(crate) instructor_id: Option<String>,
    /// `driving lesson` or `driving test`
    pub(crate) class_type: Option<String>,
    #[schema(example = "2025-03-10")]
    pub(crate) date: Option<String>,
    #[schema(example = "09:00")]
    pub(crate) start: Option<String>,
    #[schema(example = "10:00")]
    pub(crate) end: Option<String>,
    pub(crate) status: Option<String>,
    pub(crate) student_id: Option<String>,
    pub(crate) student_name: Option<String>,
    pub(crate) payment_method: Option<String>,
    pub(crate) amount: Option<f64>,
}

impl From<CreateParams> for NewSlot {
    fn from(params: CreateParams) -> Self {
        NewSlot {
            instructor_id: params.instructor_id.unwrap_or_default(),
            class_type: params.class_type.unwrap_or_default(),
            date: params.date.unwrap_or_default(),
            start: params.start.unwrap_or_default(),
            end: params.end.unwrap_or_default(),
            status: params.status,
            student_id: params.student_id,
            student_name: params.student_name,
            payment_method: params.payment_method,
            amount: params.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_camel_case_body_maps_onto_new_slot() {
        let params: CreateParams = serde_json::from_value(json!({
            "instructorId": "65f0aaaa0000000000000001",
            "classType": "driving test",
            "date": "2025-03-10",
            "start": "09:00",
            "end": "10:00",
            "paymentMethod": "online",
        }))
        .unwrap();

        let slot = NewSlot::from(params);
        assert_eq!(slot.instructor_id, "65f0aaaa0000000000000001");
        assert_eq!(slot.class_type, "driving test");
        assert_eq!(slot.payment_method.as_deref(), Some("online"));
        assert!(slot.status.is_none());
    }

    #[test]
    fn test_missing_fields_become_empty_strings() {
        let params: CreateParams = serde_json::from_value(json!({})).unwrap();
        let slot = NewSlot::from(params);
        assert!(slot.instructor_id.is_empty());
        assert!(slot.date.is_empty());
    }
}
