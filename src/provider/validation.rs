use crate::auth::{ErrorKind, ValidationRequest};
use crate::core::models::AccessRecord;
use crate::core::types::{AccessToken, Expire};
use crate::db::Store;

use super::{Error, OAuth2Provider};

use tracing::{event, Level};

impl OAuth2Provider {
    /// `GET /validate`.
    #[tracing::instrument(skip_all)]
    pub async fn validation_request(&self, req: ValidationRequest) -> Result<AccessRecord, Error> {
        let token = req.access_token.ok_or(ErrorKind::InvalidToken)?;
        self.lookup(&token).await
    }

    /// Resolves an access token to its record. Expired records are refused
    /// just like unknown ones.
    pub async fn lookup(&self, token: &AccessToken) -> Result<AccessRecord, Error> {
        let record = self
            .store
            .access
            .get(&self.hasher.digest(token))
            .await?
            .ok_or_else(|| {
                event!(Level::WARN, "Invalid token");
                ErrorKind::InvalidToken
            })?;

        if record.is_expired() {
            event!(Level::WARN, expired = %record.expires_at, "Expired token");
            return Err(ErrorKind::InvalidToken.into());
        }

        if !self.is_registered_client(&record.client_id) {
            return Err(ErrorKind::InvalidToken.into());
        }

        event!(Level::DEBUG, username = %record.username, "Valid token");
        Ok(record)
    }
}
