use crate::auth::{AccessTokenResponse, ErrorKind, Grant, TokenRequest, TokenType};
use crate::core::models::{AccessRecord, AuthorizationRecord, RefreshRecord};
use crate::core::types::{AccessToken, AuthCode, Expire, RefreshToken};
use crate::db::Store;
use crate::util::random::FromRandom;

use super::{Error, OAuth2Provider};

use tracing::{event, Level};

impl OAuth2Provider {
    /// `POST /exchange`: trades an authorization code or a refresh token for
    /// an access token.
    #[tracing::instrument(skip_all, fields(client_id = ?req.client_id))]
    pub async fn access_token_request(
        &self,
        req: TokenRequest,
    ) -> Result<AccessTokenResponse, Error> {
        event!(Level::TRACE, "Handling access token request");
        let grant = req
            .validate(&self.client.id, &self.client.secret)
            .map_err(|kind| {
                event!(Level::WARN, error = %kind, "Rejected token request");
                kind
            })?;

        event!(Level::TRACE, grant_type = grant.grant_type().as_str(), "Dispatching grant");
        match grant {
            Grant::AuthorizationCode(code) => self.authorization_code_grant(&code).await,
            Grant::RefreshToken(token) => self.refresh_token_grant(&token).await,
        }
    }

    async fn authorization_code_grant(&self, code: &AuthCode) -> Result<AccessTokenResponse, Error> {
        let key = self.hasher.digest(code);

        let record = self.store.codes.get(&key).await?.ok_or_else(|| {
            event!(Level::WARN, "Invalid authorization code");
            ErrorKind::InvalidGrant
        })?;

        if record.is_expired() {
            event!(Level::WARN, expired = %record.expires_at, "Authorization code has expired");
            return Err(ErrorKind::ExpiredGrant.into());
        }

        // Whoever takes the record first redeems the code.
        let record = self
            .store
            .codes
            .take(&key)
            .await?
            .ok_or(ErrorKind::InvalidGrant)?;

        if !self.is_registered_client(&record.client_id) {
            return Err(ErrorKind::InvalidGrant.into());
        }

        match self.mint_token_pair(&record).await {
            Ok(response) => {
                event!(Level::DEBUG, "Access and refresh tokens issued");
                Ok(response)
            }
            Err(e) => {
                // The code stays redeemable when the exchange could not complete.
                if let Err(restore) = self.store.codes.insert(key, record).await {
                    event!(Level::ERROR, error = %restore, "Failed to restore authorization code");
                }
                Err(e)
            }
        }
    }

    /// Stores an access record and a refresh record for the same identity.
    /// Neither is left behind when the other cannot be written.
    async fn mint_token_pair(
        &self,
        record: &AuthorizationRecord,
    ) -> Result<AccessTokenResponse, Error> {
        let access_token = self.mint_access_token(record.username.clone()).await?;

        let refresh_token = RefreshToken::from_random();
        let refresh = RefreshRecord {
            username: record.username.clone(),
            client_id: record.client_id.clone(),
        };
        let inserted = self
            .store
            .refresh
            .insert(self.hasher.digest(&refresh_token), refresh)
            .await;

        if let Err(e) = inserted {
            let access_key = self.hasher.digest(&access_token);
            if let Err(rollback) = self.store.access.delete(&access_key).await {
                event!(Level::ERROR, error = %rollback, "Failed to roll back access token");
            }
            return Err(e.into());
        }

        Ok(self.token_response(access_token, Some(refresh_token)))
    }

    async fn refresh_token_grant(&self, token: &RefreshToken) -> Result<AccessTokenResponse, Error> {
        let record = self
            .store
            .refresh
            .get(&self.hasher.digest(token))
            .await?
            .ok_or_else(|| {
                event!(Level::WARN, "Invalid refresh token");
                ErrorKind::InvalidGrant
            })?;

        if !self.is_registered_client(&record.client_id) {
            return Err(ErrorKind::InvalidGrant.into());
        }

        let access_token = self.mint_access_token(record.username).await?;

        event!(Level::DEBUG, "Access token refreshed");
        Ok(self.token_response(access_token, None))
    }

    async fn mint_access_token(&self, username: String) -> Result<AccessToken, Error> {
        let token = AccessToken::from_random();
        let record = AccessRecord::new(
            username,
            self.client.id.clone(),
            self.lifetimes.access_token,
        );

        self.store
            .access
            .insert(self.hasher.digest(&token), record)
            .await?;
        Ok(token)
    }

    fn token_response(
        &self,
        access_token: AccessToken,
        refresh_token: Option<RefreshToken>,
    ) -> AccessTokenResponse {
        AccessTokenResponse {
            token_type: TokenType::Bearer,
            access_token,
            refresh_token,
            expires_in: self.lifetimes.access_token.as_secs(),
        }
    }
}
