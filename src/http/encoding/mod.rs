pub mod error;
pub mod reply;

use crate::auth::{ClientCredentials, ErrorKind, TokenRequest};
use crate::core::types::{ClientId, ClientSecret};
use http_basic_auth::Credential as BasicCredentials;
use std::convert::Infallible;
use warp::{Filter, Rejection};

use self::error::AuthRejection;

const MAX_FORM_BYTES: u64 = 16 * 1024;

impl From<BasicCredentials> for ClientCredentials {
    fn from(credentials: BasicCredentials) -> Self {
        Self {
            client_id: ClientId(credentials.user_id),
            client_secret: ClientSecret(credentials.password),
        }
    }
}

/// Client credentials from an `Authorization: Basic` header, if one parses.
pub fn basic_credentials(
) -> impl Filter<Extract = (Option<ClientCredentials>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").map(|header: Option<String>| {
        header
            .and_then(|h| h.parse::<BasicCredentials>().ok())
            .map(ClientCredentials::from)
    })
}

/// Form body of a token request, with client credentials taken from the
/// body first and the Basic header second.
pub fn token_request() -> impl Filter<Extract = (TokenRequest,), Error = Rejection> + Clone {
    let form = warp::body::content_length_limit(MAX_FORM_BYTES)
        .and(warp::body::form::<TokenRequest>())
        .or_else(|_| async move {
            Err::<(TokenRequest,), _>(warp::reject::custom(AuthRejection::from(
                ErrorKind::MalformedRequest,
            )))
        });

    basic_credentials()
        .and(form)
        .map(|basic, req: TokenRequest| req.with_basic_credentials(basic))
}

/// Like `warp::query`, but a request without any query string decodes to
/// `T::default()` instead of being rejected.
pub fn optional_query<T>() -> impl Filter<Extract = (T,), Error = Infallible> + Clone
where
    T: serde::de::DeserializeOwned + Default + Send + 'static,
{
    warp::query::<T>().or(warp::any().map(T::default)).unify()
}
