use serde::Serialize;
pub(crate) mod certificate_controller;
pub(crate) mod health_check_controller;
pub(crate) mod instructor_controller;
pub(crate) mod lesson_controller;
pub(crate) mod notification_controller;
pub(crate) mod order_controller;
pub(crate) mod ticket_class_controller;

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status_code: u16, data: T) -> Self {
        Self {
            status_code,
            data: Some(data),
        }
    }
}
