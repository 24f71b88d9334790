use crate::core::types::{AccessToken, AuthCode, LoginToken, RefreshToken};

use super::hash::Salt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

/// 256 bits, 43 characters once encoded.
pub const TOKEN_BYTES: usize = 32;

const SALT_BYTES: usize = 16;

pub trait FromRandom {
    fn from_random() -> Self;
}

impl FromRandom for LoginToken {
    fn from_random() -> Self {
        LoginToken(random_string(TOKEN_BYTES))
    }
}

impl FromRandom for AuthCode {
    fn from_random() -> Self {
        AuthCode(random_string(TOKEN_BYTES))
    }
}

impl FromRandom for AccessToken {
    fn from_random() -> Self {
        AccessToken(random_string(TOKEN_BYTES))
    }
}

impl FromRandom for RefreshToken {
    fn from_random() -> Self {
        RefreshToken(random_string(TOKEN_BYTES))
    }
}

impl FromRandom for Salt {
    fn from_random() -> Self {
        Salt(random_string(SALT_BYTES))
    }
}

fn random_string(size: usize) -> String {
    use rand::RngCore;

    let mut bytes = vec![0u8; size];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
