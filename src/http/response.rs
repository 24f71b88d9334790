use crate::auth::Redirect;
use crate::core::types::RedirectUri;

use url::Url;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};

/// Appends `params` to the query of `uri`, keeping any query it already has.
/// Relative URIs (such as the sign-in page path) are extended textually.
pub fn append_params(
    uri: &RedirectUri,
    params: impl serde::Serialize,
) -> Result<String, serde_urlencoded::ser::Error> {
    let new_qs = serde_urlencoded::to_string(params)?;

    match Url::parse(&uri.0) {
        Ok(mut url) => {
            let pairs = form_urlencoded::parse(new_qs.as_bytes());
            url.query_pairs_mut().extend_pairs(pairs);
            Ok(url.into())
        }
        Err(_) => {
            let separator = if uri.0.contains('?') { '&' } else { '?' };
            Ok(format!("{}{}{}", uri.0, separator, new_qs))
        }
    }
}

impl<T: serde::Serialize + Send> Reply for Redirect<T> {
    fn into_response(self) -> Response {
        match append_params(&self.uri, &self.params) {
            Ok(location) => {
                warp::reply::with_header(StatusCode::FOUND, "location", location).into_response()
            }
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}
