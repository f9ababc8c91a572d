use domain::emails::EmailStats;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct EmitResponse {
    pub(crate) success: bool,
}

/// Live relay counters.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatsResponse {
    /// Open SSE connections across every channel
    pub(crate) connections: usize,
    pub(crate) admin_emails_enabled: bool,
    /// All zero when admin emails are disabled
    pub(crate) emails: EmailStats,
}
