use crate::core::types::{AuthCode, ClientId, LoginToken, RedirectUri};

use super::error::ErrorKind;

/// Query of `GET /auth`. Fields stay optional so that an absent parameter is
/// a validation failure rather than a decoding failure.
#[derive(Debug, Clone, Default)]
#[derive(serde::Deserialize)]
pub struct AuthorizationRequest {
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub state: Option<String>,
    pub response_type: Option<String>,
}

/// What a validated authorization request hands to the session manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    pub redirect_uri: RedirectUri,
    pub state: String,
}

impl AuthorizationRequest {
    /// Succeeds only when all four parameters are present and `client_id`,
    /// `response_type` and `redirect_uri` equal the expected values. `state`
    /// is opaque.
    pub fn validate(
        self,
        expected_client_id: &ClientId,
        expected_response_type: &str,
        expected_redirect_uri: &RedirectUri,
    ) -> Result<SessionParams, ErrorKind> {
        match self {
            AuthorizationRequest {
                client_id: Some(client_id),
                redirect_uri: Some(redirect_uri),
                state: Some(state),
                response_type: Some(response_type),
            } if client_id == expected_client_id.0
                && response_type == expected_response_type
                && redirect_uri == expected_redirect_uri.0 =>
            {
                Ok(SessionParams {
                    redirect_uri: RedirectUri(redirect_uri),
                    state,
                })
            }
            _ => Err(ErrorKind::MalformedRequest),
        }
    }
}

#[derive(Debug)]
#[derive(serde::Serialize)]
pub struct SignInRedirect {
    pub login_token: LoginToken,
}

/// Query of `GET /login`.
#[derive(Debug, Clone, Default)]
#[derive(serde::Deserialize)]
pub struct LoginRequest {
    pub login_token: Option<LoginToken>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug)]
#[derive(serde::Serialize)]
pub struct AuthorizationCodeResponse {
    pub code: AuthCode,
    pub state: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected() -> (ClientId, &'static str, RedirectUri) {
        (
            ClientId("C".to_string()),
            "code",
            RedirectUri("https://oauth-redirect.example.com/r/project".to_string()),
        )
    }

    fn request() -> AuthorizationRequest {
        AuthorizationRequest {
            client_id: Some("C".to_string()),
            redirect_uri: Some("https://oauth-redirect.example.com/r/project".to_string()),
            state: Some("S".to_string()),
            response_type: Some("code".to_string()),
        }
    }

    fn validate(req: AuthorizationRequest) -> Result<SessionParams, ErrorKind> {
        let (id, response_type, uri) = expected();
        req.validate(&id, response_type, &uri)
    }

    #[test]
    fn accepts_matching_request() {
        let params = validate(request()).unwrap();
        assert_eq!(params.state, "S");
        assert_eq!(params.redirect_uri, expected().2);
    }

    #[test]
    fn state_is_never_compared() {
        let req = AuthorizationRequest {
            state: Some(String::new()),
            ..request()
        };
        assert!(validate(req).is_ok());
    }

    #[test]
    fn rejects_any_missing_parameter() {
        let cases = [
            AuthorizationRequest {
                client_id: None,
                ..request()
            },
            AuthorizationRequest {
                redirect_uri: None,
                ..request()
            },
            AuthorizationRequest {
                state: None,
                ..request()
            },
            AuthorizationRequest {
                response_type: None,
                ..request()
            },
        ];
        for req in cases {
            assert_eq!(validate(req), Err(ErrorKind::MalformedRequest));
        }
    }

    #[test]
    fn rejects_mismatched_values() {
        let cases = [
            AuthorizationRequest {
                client_id: Some("D".to_string()),
                ..request()
            },
            AuthorizationRequest {
                redirect_uri: Some("https://evil.example.com/".to_string()),
                ..request()
            },
            AuthorizationRequest {
                response_type: Some("token".to_string()),
                ..request()
            },
        ];
        for req in cases {
            assert_eq!(validate(req), Err(ErrorKind::MalformedRequest));
        }
    }

    #[test]
    fn decodes_from_query_string() {
        let req: AuthorizationRequest =
            serde_urlencoded::from_str("client_id=C&state=S%20x&response_type=code").unwrap();
        assert_eq!(req.state.as_deref(), Some("S x"));
        assert_eq!(req.redirect_uri, None);
    }
}
