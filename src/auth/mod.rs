use crate::core::types::{ClientId, ClientSecret, RedirectUri};

pub mod access_token;
pub mod authorization;
pub mod error;
pub mod validation;

pub use access_token::*;
pub use authorization::*;
pub use error::ErrorKind;
pub use validation::*;

#[derive(Debug, Clone)]
#[derive(serde::Deserialize)]
pub struct ClientCredentials {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
}

#[derive(Debug, Clone)]
pub struct Redirect<T> {
    pub uri: RedirectUri,
    pub params: T,
}

impl<T> Redirect<T> {
    pub fn new(uri: RedirectUri, params: T) -> Self {
        Redirect { uri, params }
    }
}
