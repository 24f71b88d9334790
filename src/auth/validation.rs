use crate::core::types::AccessToken;

/// Query of `GET /validate`.
#[derive(Debug, Clone, Default)]
#[derive(serde::Deserialize)]
pub struct ValidationRequest {
    pub access_token: Option<AccessToken>,
}
