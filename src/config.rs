use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use tracing::{event, Level};

use crate::core::models::{ClientCredential, Credentials};
use crate::core::types::{ClientId, ClientSecret, RedirectUri};
use crate::provider::Lifetimes;

pub const CREDENTIALS_FILE: &str = "validLoginCredentials.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("expected redirect URI {uri:?} is not an absolute URL: {source}")]
    RedirectUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Parser, Debug, Clone)]
#[clap(
    name = "kagid",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS")
)]
pub struct Options {
    #[clap(long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: IpAddr,
    #[clap(long, env = "PORT", default_value = "8443")]
    pub port: u16,
    #[clap(long, env = "SETTINGS_FILE", default_value = "settings.json")]
    pub settings_file: PathBuf,
    #[clap(long, env = "DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,
    /// Defaults to `validLoginCredentials.json` inside the data directory.
    #[clap(long, env = "CREDENTIALS_FILE")]
    pub credentials_file: Option<PathBuf>,
    /// Secret mixed into Argon2 password hashes.
    #[clap(long, env = "HASH_SECRET")]
    pub hash_secret: Option<String>,
    /// Authorization code lifetime, in seconds.
    #[clap(long, env = "AUTH_CODE_LIFETIME", default_value = "600")]
    pub auth_code_lifetime: u64,
    /// Access token lifetime, in seconds.
    #[clap(long, env = "ACCESS_TOKEN_LIFETIME", default_value = "1800")]
    pub access_token_lifetime: u64,
    /// Sign-in session lifetime, in seconds.
    #[clap(long, env = "SESSION_LIFETIME", default_value = "600")]
    pub session_lifetime: u64,
    /// Where `/auth` sends the user agent to sign in.
    #[clap(long, env = "SIGNIN_PATH", default_value = "/signin")]
    pub signin_path: String,
    /// Seconds between expired-record sweeps.
    #[clap(long, env = "CLEAN_UP_INTERVAL", default_value = "15")]
    pub clean_up_interval: u64,
}

impl Options {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn lifetimes(&self) -> Lifetimes {
        Lifetimes {
            auth_code: Duration::from_secs(self.auth_code_lifetime),
            access_token: Duration::from_secs(self.access_token_lifetime),
            session: Duration::from_secs(self.session_lifetime),
        }
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join(CREDENTIALS_FILE))
    }

    pub fn clean_up_period(&self) -> Duration {
        Duration::from_secs(self.clean_up_interval.max(1))
    }
}

/// The settings file: identity of the single registered client.
#[derive(Debug, Clone)]
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub expected_response_type: String,
    pub project_id: String,
    pub expected_redirect_uri_host: String,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        read_json(path)
    }

    pub fn expected_redirect_uri(&self) -> RedirectUri {
        RedirectUri(format!(
            "{}{}",
            self.expected_redirect_uri_host, self.project_id
        ))
    }

    pub fn client(&self) -> Result<ClientCredential, ConfigError> {
        let redirect_uri = self.expected_redirect_uri();
        url::Url::parse(&redirect_uri.0).map_err(|source| ConfigError::RedirectUri {
            uri: redirect_uri.0.clone(),
            source,
        })?;

        Ok(ClientCredential {
            id: self.client_id.clone(),
            secret: self.client_secret.clone(),
            redirect_uri,
            response_type: self.expected_response_type.clone(),
        })
    }
}

/// Loads the credential table. A missing file yields an empty table.
pub fn load_credentials(path: &Path) -> Result<Credentials, ConfigError> {
    if !path.exists() {
        event!(
            Level::WARN,
            path = %path.display(),
            "No credential table found, nobody will be able to sign in"
        );
        return Ok(Credentials::default());
    }
    read_json(path)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}
