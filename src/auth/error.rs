use std::fmt;

/// Every way a protocol step can refuse a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedRequest,
    InvalidCredentials,
    InvalidGrant,
    ExpiredGrant,
    UnsupportedGrantType,
    InvalidToken,
}

impl ErrorKind {
    pub fn description(&self) -> &'static str {
        use ErrorKind::*;

        match self {
            MalformedRequest => "malformed request",
            InvalidCredentials => "the login credentials were not valid",
            InvalidGrant => "invalid authorization code or refresh token",
            ExpiredGrant => "authorization code has expired",
            UnsupportedGrantType => "unrecognized grant type",
            InvalidToken => "the access token was not valid",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl std::error::Error for ErrorKind {}
