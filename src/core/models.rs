use std::collections::HashMap;
use std::time::Duration;

use super::types::*;

/// The single client this server is registered with.
#[derive(Debug, Clone)]
pub struct ClientCredential {
    pub id: ClientId,
    pub secret: ClientSecret,
    pub redirect_uri: RedirectUri,
    pub response_type: String,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInSession {
    pub token: LoginToken,
    pub redirect_uri: RedirectUri,
    pub state: String,
    #[serde(rename = "expires")]
    pub expires_at: Timestamp,
}

impl Expire for SignInSession {
    fn expires_at(&self) -> Timestamp {
        self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AuthorizationRecord {
    pub username: String,
    #[serde(rename = "clientID")]
    pub client_id: ClientId,
    #[serde(rename = "expires")]
    pub expires_at: Timestamp,
}

impl AuthorizationRecord {
    pub fn new(username: String, client_id: ClientId, lifetime: Duration) -> Self {
        Self {
            username,
            client_id,
            expires_at: expiry_after(lifetime),
        }
    }
}

impl Expire for AuthorizationRecord {
    fn expires_at(&self) -> Timestamp {
        self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AccessRecord {
    pub username: String,
    #[serde(rename = "clientID")]
    pub client_id: ClientId,
    #[serde(rename = "expiration")]
    pub expires_at: Timestamp,
}

impl AccessRecord {
    pub fn new(username: String, client_id: ClientId, lifetime: Duration) -> Self {
        Self {
            username,
            client_id,
            expires_at: expiry_after(lifetime),
        }
    }
}

impl Expire for AccessRecord {
    fn expires_at(&self) -> Timestamp {
        self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct RefreshRecord {
    pub username: String,
    #[serde(rename = "clientID")]
    pub client_id: ClientId,
}

/// Static `username -> password` table. Entries are either plain passwords or
/// Argon2 encoded hashes.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct Credentials(pub HashMap<String, String>);

impl Credentials {
    pub fn get(&self, username: &str) -> Option<&str> {
        self.0.get(username).map(String::as_str)
    }
}
