pub(crate) mod json_body;
pub(crate) mod query_params;

pub(crate) use json_body::JsonBody;
pub(crate) use query_params::QueryParams;
