use crate::auth::SessionParams;
use crate::core::models::SignInSession;
use crate::core::types::{expiry_after, Expire, LoginToken};
use crate::db::Store;
use crate::util::random::FromRandom;

use super::{Error, OAuth2Provider};

use tracing::{event, Level};

impl OAuth2Provider {
    /// Starts a sign-in flow. The returned token is the only secret that
    /// authorizes completing it.
    #[tracing::instrument(skip_all)]
    pub async fn create_session(&self, params: SessionParams) -> Result<LoginToken, Error> {
        let token = LoginToken::from_random();
        let session = SignInSession {
            token: token.clone(),
            redirect_uri: params.redirect_uri,
            state: params.state,
            expires_at: expiry_after(self.lifetimes.session),
        };

        self.store
            .sessions
            .insert(self.hasher.digest(&token), session)
            .await?;

        event!(Level::DEBUG, "Created sign-in session");
        Ok(token)
    }

    /// Expired sessions count as absent.
    pub async fn session_exists(&self, token: &LoginToken) -> Result<bool, Error> {
        let session = self.store.sessions.get(&self.hasher.digest(token)).await?;
        Ok(matches!(session, Some(s) if !s.is_expired()))
    }

    /// Removes the session before returning it, so a token resolves at most
    /// once even under concurrent logins. An expired session is removed but
    /// not returned.
    pub async fn resolve_and_consume(
        &self,
        token: &LoginToken,
    ) -> Result<Option<SignInSession>, Error> {
        let session = self.store.sessions.take(&self.hasher.digest(token)).await?;
        match session {
            Some(s) if s.is_expired() => {
                event!(Level::DEBUG, expired = %s.expires_at, "Sign-in session has expired");
                Ok(None)
            }
            Some(s) => Ok(Some(s)),
            None => {
                event!(Level::DEBUG, "Sign-in session not found");
                Ok(None)
            }
        }
    }

    /// Puts a consumed session back after the login it was consumed for
    /// failed to complete.
    pub(super) async fn restore_session(&self, session: SignInSession) {
        let key = self.hasher.digest(&session.token);
        if let Err(e) = self.store.sessions.insert(key, session).await {
            event!(Level::ERROR, error = %e, "Failed to restore sign-in session");
        }
    }
}
