use crate::auth::{
    AuthorizationCodeResponse, AuthorizationRequest, ErrorKind, LoginRequest, Redirect,
};
use crate::core::models::AuthorizationRecord;
use crate::core::types::{AuthCode, LoginToken, Password};
use crate::db::Store;
use crate::util::random::FromRandom;

use super::{Error, OAuth2Provider};

use tracing::{event, Level};

impl OAuth2Provider {
    /// `GET /auth`: validates the request against the registered client and
    /// opens a sign-in session for it.
    #[tracing::instrument(skip_all)]
    pub async fn authorization_request(
        &self,
        req: AuthorizationRequest,
    ) -> Result<LoginToken, Error> {
        let params = req
            .validate(
                &self.client.id,
                &self.client.response_type,
                &self.client.redirect_uri,
            )
            .map_err(|kind| {
                event!(Level::WARN, "Rejected authorization request");
                kind
            })?;

        self.create_session(params).await
    }

    /// True when the login token names a live session (without consuming
    /// it), the user exists and the password matches.
    pub async fn validate_login(&self, req: &LoginRequest) -> Result<bool, Error> {
        let (token, username, password) = match req {
            LoginRequest {
                login_token: Some(token),
                username: Some(username),
                password: Some(password),
            } => (token, username, password),
            _ => return Ok(false),
        };

        if !self.session_exists(token).await? {
            event!(Level::DEBUG, "Login token does not name a live session");
            return Ok(false);
        }

        let valid = match self.credentials.get(username) {
            Some(stored) => self
                .hasher
                .check_password(&Password(password.clone()), stored),
            None => false,
        };
        Ok(valid)
    }

    /// `GET /login`: completes a sign-in flow and hands back the redirect
    /// carrying the authorization code.
    #[tracing::instrument(skip_all)]
    pub async fn login_request(
        &self,
        req: LoginRequest,
    ) -> Result<Redirect<AuthorizationCodeResponse>, Error> {
        if !self.validate_login(&req).await? {
            event!(Level::WARN, "The login credentials were invalid");
            return Err(ErrorKind::InvalidCredentials.into());
        }

        let (token, username) = match (req.login_token, req.username) {
            (Some(token), Some(username)) => (token, username),
            _ => return Err(ErrorKind::InvalidCredentials.into()),
        };

        // A concurrent login with the same token may have won the session.
        let session = self
            .resolve_and_consume(&token)
            .await?
            .ok_or(ErrorKind::InvalidCredentials)?;

        let code = match self.issue(username).await {
            Ok((code, _)) => code,
            Err(e) => {
                self.restore_session(session).await;
                return Err(e);
            }
        };

        Ok(Redirect::new(
            session.redirect_uri,
            AuthorizationCodeResponse {
                code,
                state: session.state,
            },
        ))
    }

    /// Stores a fresh authorization record under a random code.
    #[tracing::instrument(skip(self))]
    pub async fn issue(&self, username: String) -> Result<(AuthCode, AuthorizationRecord), Error> {
        let record = AuthorizationRecord::new(
            username,
            self.client.id.clone(),
            self.lifetimes.auth_code,
        );
        let code = AuthCode::from_random();

        self.store
            .codes
            .insert(self.hasher.digest(&code), record.clone())
            .await?;

        event!(
            Level::DEBUG,
            expires = %record.expires_at,
            "Issued authorization code"
        );
        Ok((code, record))
    }
}
