use crate::auth::{AuthorizationRequest, LoginRequest, Redirect, SignInRedirect, ValidationRequest};
use crate::core::types::RedirectUri;
use crate::provider::OAuth2Provider;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{event, Level};
use warp::{Filter, Rejection, Reply};

use super::encoding::error::handle_reject;
use super::encoding::reply::{json_encode, reply};
use super::encoding::{optional_query, token_request};

#[derive(Debug, Clone)]
pub struct Server {
    provider: Arc<OAuth2Provider>,
    signin_path: RedirectUri,
}

impl Server {
    pub fn new(provider: Arc<OAuth2Provider>, signin_path: RedirectUri) -> Self {
        Self {
            provider,
            signin_path,
        }
    }

    pub fn routes(&self) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let provider = Arc::clone(&self.provider);
        let with_provider = warp::any().map(move || Arc::clone(&provider));
        let signin_path = self.signin_path.clone();

        let auth = warp::path!("auth")
            .and(warp::get())
            .and(with_provider.clone())
            .and(optional_query::<AuthorizationRequest>())
            .and_then(move |provider: Arc<OAuth2Provider>, req| {
                let signin_path = signin_path.clone();
                async move {
                    let result = provider
                        .authorization_request(req)
                        .await
                        .map(|login_token| Redirect::new(signin_path, SignInRedirect { login_token }));
                    reply(result)
                }
            });

        let login = warp::path!("login")
            .and(warp::get())
            .and(with_provider.clone())
            .and(optional_query::<LoginRequest>())
            .and_then(|provider: Arc<OAuth2Provider>, req| async move {
                reply(provider.login_request(req).await)
            });

        let exchange = warp::path!("exchange")
            .and(warp::post())
            .and(with_provider.clone())
            .and(token_request())
            .and_then(|provider: Arc<OAuth2Provider>, req| async move {
                json_encode(provider.access_token_request(req).await)
            });

        let validate = warp::path!("validate")
            .and(warp::get())
            .and(with_provider)
            .and(optional_query::<ValidationRequest>())
            .and_then(|provider: Arc<OAuth2Provider>, req| async move {
                json_encode(provider.validation_request(req).await)
            });

        auth.or(login)
            .or(exchange)
            .or(validate)
            .recover(handle_reject)
            .with(warp::log("kagi::http"))
    }

    /// Serves until `shutdown` resolves, then lets in-flight requests finish.
    pub async fn serve(
        self,
        addr: SocketAddr,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), warp::Error> {
        let (bound, server) =
            warp::serve(self.routes()).try_bind_with_graceful_shutdown(addr, shutdown)?;

        event!(Level::INFO, address = %bound, "Listening");
        server.await;
        Ok(())
    }
}
