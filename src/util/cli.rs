use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::{self, ConfigError};
use crate::core::models::Credentials;
use crate::core::types::{HashedPassword, Password};
use crate::util::hash::HashingService;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode credential table: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to hash password: {0}")]
    Hash(#[from] argon2::Error),
    #[error("HASH_SECRET must be set to hash passwords")]
    MissingSecret,
    #[error("no such user: {0}")]
    UnknownUser(String),
}

#[derive(Parser, Debug)]
#[clap(
    name = "kagi-util",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS")
)]
pub struct Options {
    #[clap(long, env = "CREDENTIALS_FILE", default_value = "data/validLoginCredentials.json")]
    credentials_file: PathBuf,
    #[clap(long, env = "HASH_SECRET")]
    hash_secret: Option<String>,
    #[clap(subcommand)]
    command: SubCommand,
}

#[derive(Parser, Debug)]
enum SubCommand {
    HashPassword(HashPassword),
    AddUser(AddUser),
    RemoveUser(RemoveUser),
    ListUsers(ListUsers),
}

/// Print the Argon2 hash of a password.
#[derive(Parser, Debug)]
struct HashPassword {
    #[clap(short, long)]
    password: String,
}

/// Add a user, or replace their password.
#[derive(Parser, Debug)]
struct AddUser {
    #[clap(short, long)]
    username: String,
    #[clap(short, long)]
    password: String,
    /// Store an Argon2 hash instead of the plaintext password.
    #[clap(long)]
    hash: bool,
}

#[derive(Parser, Debug)]
struct RemoveUser {
    #[clap(short, long)]
    username: String,
}

#[derive(Parser, Debug)]
struct ListUsers;

fn get_hasher(opts: &Options) -> Result<HashingService, CliError> {
    opts.hash_secret
        .clone()
        .map(HashingService::with_secret_key)
        .ok_or(CliError::MissingSecret)
}

fn hash_password(hasher: &HashingService, password: &str) -> Result<String, CliError> {
    let hashed: HashedPassword = hasher.hash(&Password(password.to_string()))?;
    Ok(hashed.0)
}

fn save_credentials(path: &Path, credentials: &Credentials) -> Result<(), CliError> {
    let body = serde_json::to_string_pretty(credentials)?;
    std::fs::write(path, body).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn add_user(c: &AddUser, opts: &Options) -> Result<String, CliError> {
    let password = if c.hash {
        hash_password(&get_hasher(opts)?, &c.password)?
    } else {
        c.password.clone()
    };

    let mut credentials = config::load_credentials(&opts.credentials_file)?;
    credentials.0.insert(c.username.clone(), password);
    save_credentials(&opts.credentials_file, &credentials)?;

    Ok(format!("Added {}", c.username))
}

fn remove_user(c: &RemoveUser, opts: &Options) -> Result<String, CliError> {
    let mut credentials = config::load_credentials(&opts.credentials_file)?;
    if credentials.0.remove(&c.username).is_none() {
        return Err(CliError::UnknownUser(c.username.clone()));
    }
    save_credentials(&opts.credentials_file, &credentials)?;

    Ok(format!("Removed {}", c.username))
}

fn list_users(opts: &Options) -> Result<String, CliError> {
    let credentials = config::load_credentials(&opts.credentials_file)?;
    let mut users: Vec<_> = credentials.0.keys().cloned().collect();
    users.sort();
    Ok(users.join("\n"))
}

/// Runs one subcommand and returns what it wants printed.
pub fn run_cli_action(opts: Options) -> Result<String, CliError> {
    use SubCommand::*;

    match &opts.command {
        HashPassword(c) => hash_password(&get_hasher(&opts)?, &c.password),
        AddUser(c) => add_user(c, &opts),
        RemoveUser(c) => remove_user(c, &opts),
        ListUsers(_) => list_users(&opts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(file: &Path, args: &[&str]) -> Result<String, CliError> {
        let file = file.to_string_lossy().to_string();
        let mut argv = vec!["kagi-util", "--credentials-file", file.as_str(), "--hash-secret", "k"];
        argv.extend_from_slice(args);
        run_cli_action(Options::parse_from(argv))
    }

    #[test]
    fn manages_credential_table() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("users.json");

        run(&file, &["add-user", "-u", "bob", "-p", "pw2"]).unwrap();
        run(&file, &["add-user", "-u", "alice", "-p", "pw1"]).unwrap();
        assert_eq!(run(&file, &["list-users"]).unwrap(), "alice\nbob");

        let credentials = config::load_credentials(&file).unwrap();
        assert_eq!(credentials.get("alice"), Some("pw1"));

        run(&file, &["remove-user", "-u", "bob"]).unwrap();
        assert_eq!(run(&file, &["list-users"]).unwrap(), "alice");
        assert!(matches!(
            run(&file, &["remove-user", "-u", "bob"]),
            Err(CliError::UnknownUser(_))
        ));
    }

    #[test]
    fn hashed_user_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("users.json");

        run(&file, &["add-user", "-u", "dora", "-p", "s3cret", "--hash"]).unwrap();

        let credentials = config::load_credentials(&file).unwrap();
        let stored = credentials.get("dora").unwrap();
        assert!(stored.starts_with("$argon2"));

        let hasher = HashingService::with_secret_key("k".to_string());
        assert!(hasher.check_password(&Password("s3cret".to_string()), stored));
    }
}
