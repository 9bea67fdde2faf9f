//! Deployment model

use crate::naming::normalize_hostname;
use serde::Serialize;

/// Filename of the service account key, next to the generated artifacts
pub const CREDENTIALS_FILE: &str = "service-account-key.json";

/// Port n8n listens on inside the VM
pub const N8N_PORT: u16 = 5678;

/// Port the API container is published on
pub const API_PORT: u16 = 8000;

/// Static IP used by template-only runs
pub const PLACEHOLDER_STATIC_IP: &str = "YOUR_STATIC_IP";

/// How secret material reaches the infra description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretMode {
    /// Embedded literally in setup.tf
    #[default]
    Inline,
    /// Declared as a sensitive Terraform variable, supplied at apply time
    Injected,
}

/// Customized n8n image built on the VM
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomImage {
    /// Alpine package added on top of the stock image
    pub extra_package: String,
}

impl CustomImage {
    /// Tag given to the locally built image
    pub const TAG: &'static str = "n8nform/n8n-custom:latest";
}

/// Fully resolved parameters for one deployment.
///
/// Every generated artifact is a pure function of this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentConfig {
    pub project_id: String,
    pub hostname: String,
    pub region: String,
    pub n8n_image: String,
    pub api_image: String,
    /// `user:ssh-rsa AAAA...`
    pub ssh_key: String,
    pub static_ip: String,
    /// Credential key path as referenced from setup.tf
    pub credentials_file: String,
    pub machine_type: String,
    pub boot_image: String,
    pub disk_size_gb: u32,
    pub network_tier: String,
    /// Firewall rule name, when setup.tf has to declare it
    pub firewall_rule: Option<String>,
    pub custom_image: Option<CustomImage>,
    pub secret_mode: SecretMode,
}

impl DeploymentConfig {
    /// Public webhook base URL
    pub fn webhook_url(&self) -> String {
        format!("https://{}/", self.hostname)
    }

    /// Instance, address and tunnel name
    pub fn address_name(&self) -> String {
        normalize_hostname(&self.hostname)
    }

    /// Zone the instance is placed in
    pub fn zone(&self) -> String {
        format!("{}-a", self.region)
    }

    /// Login user taken from the `user:key` SSH string
    pub fn ssh_user(&self) -> &str {
        self.ssh_key
            .split_once(':')
            .map(|(user, _)| user)
            .unwrap_or(self.ssh_key.as_str())
    }
}

/// A rendered text file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub filename: String,
    pub content: String,
    pub executable: bool,
}

/// The fixed set of artifacts n8nform knows how to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Terraform description of the instance
    Infra,
    /// Installs Docker and starts the stack
    Bootstrap,
    /// Cloudflare Tunnel setup
    Tunnel,
    Compose,
    /// systemd unit wrapping the composition
    Unit,
    Updater,
    Dockerfile,
    Entrypoint,
}

impl ArtifactKind {
    pub fn filename(&self) -> &'static str {
        match self {
            Self::Infra => "setup.tf",
            Self::Bootstrap => "setup_server.sh",
            Self::Tunnel => "setup_cloudflare.sh",
            Self::Compose => "docker-compose.yml",
            Self::Unit => "docker-compose.service",
            Self::Updater => "update.sh",
            Self::Dockerfile => "Dockerfile",
            Self::Entrypoint => "custom-entrypoint.sh",
        }
    }

    pub fn is_executable(&self) -> bool {
        matches!(
            self,
            Self::Bootstrap | Self::Tunnel | Self::Updater | Self::Entrypoint
        )
    }

    /// Directory the artifact is installed into on the VM
    pub fn remote_dir(&self) -> &'static str {
        match self {
            Self::Unit => "/etc/systemd/system",
            _ => REMOTE_DIR,
        }
    }
}

/// Directory holding the stack on the VM
pub const REMOTE_DIR: &str = "/opt";

#[cfg(test)]
pub(crate) fn sample_config() -> DeploymentConfig {
    DeploymentConfig {
        project_id: "demo-project".to_string(),
        hostname: "n8n.example.com".to_string(),
        region: "us-west1".to_string(),
        n8n_image: "n8nio/n8n".to_string(),
        api_image: "tiangolo/uvicorn-gunicorn-fastapi:python3.11".to_string(),
        ssh_key: "deploy:ssh-rsa AAAAB3Nza".to_string(),
        static_ip: "34.1.2.3".to_string(),
        credentials_file: CREDENTIALS_FILE.to_string(),
        machine_type: "e2-micro".to_string(),
        boot_image: "ubuntu-os-cloud/ubuntu-2204-lts".to_string(),
        disk_size_gb: 60,
        network_tier: "STANDARD".to_string(),
        firewall_rule: None,
        custom_image: None,
        secret_mode: SecretMode::Inline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_fields() {
        let config = sample_config();
        assert_eq!(config.webhook_url(), "https://n8n.example.com/");
        assert_eq!(config.address_name(), "n8n-example-com");
        assert_eq!(config.zone(), "us-west1-a");
        assert_eq!(config.ssh_user(), "deploy");
    }

    #[test]
    fn test_remote_layout() {
        assert_eq!(ArtifactKind::Unit.remote_dir(), "/etc/systemd/system");
        assert_eq!(ArtifactKind::Compose.remote_dir(), "/opt");
        assert!(ArtifactKind::Bootstrap.is_executable());
        assert!(!ArtifactKind::Compose.is_executable());
    }
}
