use domain::certificate::NewCertificate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateParams {
    pub(crate) student_id: Option<String>,
    pub(crate) class_id: Option<String>,
    /// Assigned automatically when omitted.
    pub(crate) number: Option<i64>,
    pub(crate) class_type: Option<String>,
}

impl From<CreateParams> for NewCertificate {
    fn from(params: CreateParams) -> Self {
        NewCertificate {
            student_id: params.student_id.unwrap_or_default(),
            class_id: params.class_id.unwrap_or_default(),
            number: params.number,
            class_type: params.class_type,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct IndexParams {
    pub(crate) student_id: String,
}
