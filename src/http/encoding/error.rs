use crate::auth::ErrorKind;
use crate::provider::Error;

use tracing::{event, Level};
use warp::http::StatusCode;
use warp::{Rejection, Reply};

#[derive(Debug)]
pub struct AuthRejection(pub Error);

impl warp::reject::Reject for AuthRejection {}

impl From<Error> for AuthRejection {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl From<ErrorKind> for AuthRejection {
    fn from(kind: ErrorKind) -> Self {
        Self(kind.into())
    }
}

pub fn status(kind: ErrorKind) -> StatusCode {
    use ErrorKind::*;

    match kind {
        MalformedRequest | UnsupportedGrantType => StatusCode::BAD_REQUEST,
        InvalidCredentials | InvalidGrant | ExpiredGrant | InvalidToken => StatusCode::FORBIDDEN,
    }
}

fn text(status: StatusCode, message: &str) -> warp::reply::Response {
    let body = match status.canonical_reason() {
        Some(reason) => format!("{} {}: {}", status.as_u16(), reason, message),
        None => format!("{}: {}", status.as_u16(), message),
    };
    warp::reply::with_status(body, status).into_response()
}

pub async fn handle_reject(err: Rejection) -> Result<impl Reply, Rejection> {
    match err.find::<AuthRejection>() {
        Some(AuthRejection(Error::Rejected(kind))) => Ok(text(status(*kind), kind.description())),
        Some(AuthRejection(e @ Error::Store(_))) => {
            event!(Level::ERROR, error = %e, "Request failed");
            Ok(text(
                StatusCode::INTERNAL_SERVER_ERROR,
                "the request could not be completed",
            ))
        }
        None => Err(err),
    }
}
