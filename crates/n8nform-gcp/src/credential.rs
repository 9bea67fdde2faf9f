//! Service account key provisioning
//!
//! Every call mints a fresh key for the Compute Engine default service
//! account and overwrites the key file. Keys are never reused, so repeated
//! runs leave additional keys on the account.

use crate::error::{GcpError, Result};
use crate::executor::CommandExecutor;
use crate::gcloud::Gcloud;
use std::path::PathBuf;
use tracing::info;

/// Display name gcloud gives the default compute identity
pub const DEFAULT_COMPUTE_ACCOUNT: &str = "Compute Engine default service account";

/// Key issued for a service account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCredential {
    pub account_email: String,
    pub key_file_path: PathBuf,
}

pub struct CredentialProvisioner<'a, E> {
    gcloud: &'a Gcloud<E>,
    key_path: PathBuf,
}

impl<'a, E: CommandExecutor> CredentialProvisioner<'a, E> {
    /// `key_path` is overwritten on every call to [`provision`](Self::provision)
    pub fn new(gcloud: &'a Gcloud<E>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            gcloud,
            key_path: key_path.into(),
        }
    }

    /// Email of the default compute identity, if the project has one.
    ///
    /// Matched on display name; list order is not meaningful.
    pub async fn find_default_account(&self) -> Result<Option<String>> {
        let accounts = self.gcloud.list_service_accounts().await?;
        Ok(accounts
            .into_iter()
            .find(|a| {
                a.display_name
                    .as_deref()
                    .is_some_and(|name| name.contains(DEFAULT_COMPUTE_ACCOUNT))
            })
            .map(|a| a.email))
    }

    /// Issue a new key for the default compute identity
    pub async fn provision(&self) -> Result<ServiceCredential> {
        let email = self
            .find_default_account()
            .await?
            .ok_or_else(|| GcpError::MissingCredential(DEFAULT_COMPUTE_ACCOUNT.to_string()))?;

        // gcloud does not create missing parent directories
        if let Some(parent) = self.key_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        self.gcloud
            .create_service_account_key(&self.key_path, &email)
            .await?;

        info!(account = %email, key = %self.key_path.display(), "Issued service account key");

        Ok(ServiceCredential {
            account_email: email,
            key_file_path: self.key_path.clone(),
        })
    }
}
