//! Command implementations.

pub mod account;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;

use std::io::BufRead;
use std::sync::Arc;

use secrecy::SecretString;
use shopaholic_storefront::StorefrontSession;
use shopaholic_storefront::api::{ApiClient, ApiError};
use shopaholic_storefront::config::{ConfigError, StorefrontConfig};
use shopaholic_storefront::storage::{FileStorage, StorageError};
use shopaholic_storefront::SessionError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Local state could not be read or written.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Session operation failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Reading from the terminal failed.
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// The catalog could not be loaded.
    #[error("Catalog unavailable; see the log for details")]
    CatalogUnavailable,

    /// Arguments were rejected.
    #[error("{0}")]
    Invalid(String),
}

/// Everything a command needs: configuration, storage, API client and the
/// session restored from storage.
pub struct Context {
    pub storage: FileStorage,
    pub api: ApiClient,
    pub session: StorefrontSession,
}

impl Context {
    /// Load configuration and open the persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing or invalid, or the
    /// storage directory cannot be opened.
    pub fn from_env() -> Result<Self, CommandError> {
        let config = StorefrontConfig::from_env()?;
        let storage = FileStorage::open_with_capacity(&config.storage_dir, config.sync_capacity)?;
        let api = ApiClient::new(&config.api)?;
        let session = StorefrontSession::open(Arc::new(storage.clone()));
        tracing::debug!(
            storage_dir = %storage.dir().display(),
            api = %api.base_url(),
            "Command context ready"
        );
        Ok(Self {
            storage,
            api,
            session,
        })
    }

    /// Load the catalog into the session, failing if the backend cannot be
    /// reached.
    pub async fn load_catalog(&mut self, category: Option<&str>) -> Result<(), CommandError> {
        if self.session.refresh_catalog(&self.api, category).await {
            Ok(())
        } else {
            Err(CommandError::CatalogUnavailable)
        }
    }
}

/// Use `given`, or read one line from stdin when it is absent.
///
/// # Errors
///
/// Returns an error if stdin cannot be read or the secret is blank.
pub fn secret_or_stdin(given: Option<String>, what: &str) -> Result<SecretString, CommandError> {
    let raw = match given {
        Some(raw) => raw,
        None => {
            tracing::info!("Reading {what} from stdin");
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line
        }
    };
    let trimmed = raw.trim_end_matches(['\r', '\n']);
    if trimmed.is_empty() {
        return Err(CommandError::Invalid(format!("{what} must not be empty")));
    }
    Ok(SecretString::from(trimmed.to_owned()))
}
