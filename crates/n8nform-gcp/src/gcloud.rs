//! gcloud CLI wrapper
//!
//! Wraps the handful of gcloud commands n8nform depends on. Each method maps
//! a non-zero exit to the error variant of its own command.

use crate::error::{GcpError, Result};
use crate::executor::{CommandExecutor, CommandOutput, ProcessExecutor};
use serde::Deserialize;
use std::path::Path;

/// gcloud CLI wrapper
pub struct Gcloud<E = ProcessExecutor> {
    program: String,
    executor: E,
}

impl Gcloud<ProcessExecutor> {
    pub fn new(program: impl Into<String>) -> Self {
        Self::with_executor(program, ProcessExecutor)
    }
}

impl<E: CommandExecutor> Gcloud<E> {
    pub fn with_executor(program: impl Into<String>, executor: E) -> Self {
        Self {
            program: program.into(),
            executor,
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        self.executor.execute(&self.program, args).await
    }

    /// Run a command, treating a non-zero exit as `CommandFailed`
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args).await?;
        if !output.is_success() {
            return Err(GcpError::CommandFailed {
                command: args.iter().take(3).copied().collect::<Vec<_>>().join(" "),
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    /// Active project from the local gcloud configuration
    pub async fn config_project(&self) -> Result<String> {
        let output = self.run(&["config", "get-value", "project"]).await?;
        if !output.is_success() {
            return Err(GcpError::ProjectResolution(output.stderr.trim().to_string()));
        }
        Ok(output.stdout.trim().to_string())
    }

    /// List service accounts of the active project
    pub async fn list_service_accounts(&self) -> Result<Vec<ServiceAccountInfo>> {
        let output = self
            .run_command(&["iam", "service-accounts", "list", "--format=json"])
            .await?;
        parse_list(&output)
    }

    /// Mint a new key for a service account, overwriting `key_path`
    pub async fn create_service_account_key(&self, key_path: &Path, email: &str) -> Result<()> {
        let key_path = key_path.to_string_lossy().into_owned();
        self.run_command(&[
            "iam",
            "service-accounts",
            "keys",
            "create",
            key_path.as_str(),
            "--iam-account",
            email,
        ])
        .await?;
        Ok(())
    }

    /// List regional addresses filtered by name and region
    pub async fn list_addresses(&self, name: &str, region: &str) -> Result<Vec<AddressInfo>> {
        let filter = format!("--filter=NAME={} AND region:{}", name, region);
        let output = self
            .run(&["compute", "addresses", "list", filter.as_str(), "--format=json"])
            .await?;
        if !output.is_success() {
            return Err(GcpError::ListAddressesFailed(output.stderr.trim().to_string()));
        }
        parse_list(&output.stdout)
    }

    /// Reserve a regional address. The assigned value is not part of the
    /// response; describe the address afterwards.
    pub async fn create_address(&self, name: &str, region: &str, network_tier: &str) -> Result<()> {
        let output = self
            .run(&[
                "compute",
                "addresses",
                "create",
                name,
                "--region",
                region,
                "--network-tier",
                network_tier,
            ])
            .await?;
        if !output.is_success() {
            return Err(GcpError::CreateAddressFailed(output.stderr.trim().to_string()));
        }
        Ok(())
    }

    /// Describe one regional address
    pub async fn describe_address(&self, name: &str, region: &str) -> Result<AddressInfo> {
        let output = self
            .run(&[
                "compute",
                "addresses",
                "describe",
                name,
                "--region",
                region,
                "--format=json",
            ])
            .await?;
        if !output.is_success() {
            return Err(GcpError::DescribeAddressFailed(
                output.stderr.trim().to_string(),
            ));
        }
        Ok(serde_json::from_str(&output.stdout)?)
    }

    /// Whether a firewall rule exists. Any failure to describe it counts as absent.
    pub async fn firewall_rule_exists(&self, rule: &str, project: &str) -> Result<bool> {
        let output = self
            .run(&[
                "compute",
                "firewall-rules",
                "describe",
                rule,
                "--project",
                project,
                "--format=json",
            ])
            .await?;
        if !output.is_success() {
            tracing::debug!(rule, stderr = %output.stderr.trim(), "Firewall rule not found");
        }
        Ok(output.is_success())
    }
}

fn parse_list<T: serde::de::DeserializeOwned>(output: &str) -> Result<Vec<T>> {
    if output.trim().is_empty() || output.trim() == "[]" {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(output)?)
}

/// Service account from `gcloud iam service-accounts list`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccountInfo {
    pub email: String,

    #[serde(default)]
    pub display_name: Option<String>,
}

/// Address from `gcloud compute addresses list/describe`
#[derive(Debug, Clone, Deserialize)]
pub struct AddressInfo {
    pub name: String,

    /// Region URL, e.g. `https://www.googleapis.com/compute/v1/projects/p/regions/us-west1`
    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub address: Option<String>,
}

impl AddressInfo {
    /// Last path segment of the region URL
    pub fn region_name(&self) -> Option<&str> {
        self.region.as_deref().and_then(|r| r.rsplit('/').next())
    }
}
