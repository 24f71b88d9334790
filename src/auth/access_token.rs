use crate::core::types::{AccessToken, AuthCode, ClientId, ClientSecret, GrantType, RefreshToken};

use super::error::ErrorKind;
use super::ClientCredentials;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Bearer,
}

/// Form body of `POST /exchange`.
#[derive(Debug, Clone, Default)]
#[derive(serde::Deserialize)]
pub struct TokenRequest {
    pub client_id: Option<ClientId>,
    pub client_secret: Option<ClientSecret>,
    pub grant_type: Option<String>,
    pub code: Option<AuthCode>,
    pub refresh_token: Option<RefreshToken>,
}

/// A token request that passed entry validation, dispatched on its grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    AuthorizationCode(AuthCode),
    RefreshToken(RefreshToken),
}

impl Grant {
    pub fn grant_type(&self) -> GrantType {
        match self {
            Self::AuthorizationCode(_) => GrantType::AuthorizationCode,
            Self::RefreshToken(_) => GrantType::RefreshToken,
        }
    }
}

impl TokenRequest {
    /// Fills client credentials the body did not carry from an HTTP Basic
    /// `Authorization` header.
    pub fn with_basic_credentials(mut self, credentials: Option<ClientCredentials>) -> Self {
        if let Some(c) = credentials {
            self.client_id = self.client_id.or(Some(c.client_id));
            self.client_secret = self.client_secret.or(Some(c.client_secret));
        }
        self
    }

    /// Entry validation followed by grant-type dispatch. `client_id` and
    /// `client_secret` must match exactly; `grant_type` only has to be present
    /// before it is dispatched.
    pub fn validate(
        self,
        expected_client_id: &ClientId,
        expected_client_secret: &ClientSecret,
    ) -> Result<Grant, ErrorKind> {
        let grant_type = match (&self.client_id, &self.client_secret, self.grant_type) {
            (Some(id), Some(secret), Some(grant_type))
                if id == expected_client_id && secret == expected_client_secret =>
            {
                grant_type
            }
            _ => return Err(ErrorKind::MalformedRequest),
        };

        match grant_type.parse::<GrantType>() {
            Ok(GrantType::AuthorizationCode) => self
                .code
                .map(Grant::AuthorizationCode)
                .ok_or(ErrorKind::MalformedRequest),
            Ok(GrantType::RefreshToken) => self
                .refresh_token
                .map(Grant::RefreshToken)
                .ok_or(ErrorKind::MalformedRequest),
            Err(_) => Err(ErrorKind::UnsupportedGrantType),
        }
    }
}

#[derive(Debug)]
#[derive(serde::Serialize)]
pub struct AccessTokenResponse {
    pub token_type: TokenType,
    pub access_token: AccessToken,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<RefreshToken>,
    pub expires_in: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> (ClientId, ClientSecret) {
        (ClientId("C".to_string()), ClientSecret("SECRET".to_string()))
    }

    fn request(grant_type: &str) -> TokenRequest {
        TokenRequest {
            client_id: Some(ClientId("C".to_string())),
            client_secret: Some(ClientSecret("SECRET".to_string())),
            grant_type: Some(grant_type.to_string()),
            code: Some(AuthCode("abc".to_string())),
            refresh_token: Some(RefreshToken("def".to_string())),
        }
    }

    fn validate(req: TokenRequest) -> Result<Grant, ErrorKind> {
        let (id, secret) = client();
        req.validate(&id, &secret)
    }

    #[test]
    fn dispatches_on_grant_type() {
        assert_eq!(
            validate(request("authorization_code")),
            Ok(Grant::AuthorizationCode(AuthCode("abc".to_string())))
        );
        assert_eq!(
            validate(request("refresh_token")),
            Ok(Grant::RefreshToken(RefreshToken("def".to_string())))
        );
    }

    #[test]
    fn unknown_grant_type_is_unsupported() {
        assert_eq!(
            validate(request("client_credentials")),
            Err(ErrorKind::UnsupportedGrantType)
        );
    }

    #[test]
    fn client_must_authenticate_before_dispatch() {
        let req = TokenRequest {
            client_secret: Some(ClientSecret("wrong".to_string())),
            ..request("nonsense")
        };
        assert_eq!(validate(req), Err(ErrorKind::MalformedRequest));

        let req = TokenRequest {
            client_id: None,
            ..request("authorization_code")
        };
        assert_eq!(validate(req), Err(ErrorKind::MalformedRequest));

        let req = TokenRequest {
            grant_type: None,
            ..request("authorization_code")
        };
        assert_eq!(validate(req), Err(ErrorKind::MalformedRequest));
    }

    #[test]
    fn grant_without_its_token_is_malformed() {
        let req = TokenRequest {
            code: None,
            ..request("authorization_code")
        };
        assert_eq!(validate(req), Err(ErrorKind::MalformedRequest));

        let req = TokenRequest {
            refresh_token: None,
            ..request("refresh_token")
        };
        assert_eq!(validate(req), Err(ErrorKind::MalformedRequest));
    }

    #[test]
    fn basic_credentials_fill_missing_fields_only() {
        let req = TokenRequest {
            client_id: None,
            client_secret: None,
            ..request("authorization_code")
        }
        .with_basic_credentials(Some(ClientCredentials {
            client_id: ClientId("C".to_string()),
            client_secret: ClientSecret("SECRET".to_string()),
        }));
        assert!(validate(req).is_ok());

        let req = request("authorization_code").with_basic_credentials(Some(ClientCredentials {
            client_id: ClientId("D".to_string()),
            client_secret: ClientSecret("other".to_string()),
        }));
        assert_eq!(req.client_id, Some(ClientId("C".to_string())));
    }

    #[test]
    fn refresh_response_omits_refresh_token() {
        let response = AccessTokenResponse {
            token_type: TokenType::Bearer,
            access_token: AccessToken("a".to_string()),
            refresh_token: None,
            expires_in: 1800,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"token_type": "bearer", "access_token": "a", "expires_in": 1800})
        );
    }
}
