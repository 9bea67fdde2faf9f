//! Settings for n8nform
//!
//! Settings are read once per run from a YAML file and then handed to the
//! rest of the pipeline by reference. Every field has a default, so a run
//! with nothing but `--hostname` and `--ssh-key` on the command line works.

pub mod error;

pub use error::*;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming a settings file directly
pub const CONFIG_ENV: &str = "N8NFORM_CONFIG";

const CANDIDATES: [&str; 3] = ["n8nform.local.yaml", "n8nform.yaml", ".n8nform.yaml"];

/// Sequences that end or interpolate inside an HCL quoted string
const HCL_UNSAFE: [&str; 5] = ["\"", "\\", "${", "%{", "\n"];

/// User-facing settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Public hostname of the n8n instance, e.g. `n8n.example.com`
    pub hostname: String,
    pub region: String,
    pub n8n_image: String,
    pub api_image: String,
    /// `user:ssh-rsa AAAA...`
    pub ssh_key: String,
    pub machine_type: String,
    pub boot_image: String,
    pub disk_size_gb: u32,
    pub network_tier: String,
    pub firewall_rule: String,
    /// gcloud binary to invoke
    pub gcloud: String,
    /// Build a customized n8n image on the VM instead of running the stock one
    pub custom_image: Option<CustomImageSettings>,
    /// Keep the SSH key out of setup.tf and read it from `TF_VAR_ssh_keys`
    pub inject_secrets: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomImageSettings {
    pub extra_package: String,
}

impl Default for CustomImageSettings {
    fn default() -> Self {
        Self {
            extra_package: "ffmpeg".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            region: "us-west1".to_string(),
            n8n_image: "n8nio/n8n".to_string(),
            api_image: "tiangolo/uvicorn-gunicorn-fastapi:python3.11".to_string(),
            ssh_key: String::new(),
            machine_type: "e2-micro".to_string(),
            boot_image: "ubuntu-os-cloud/ubuntu-2204-lts".to_string(),
            disk_size_gb: 60,
            network_tier: "STANDARD".to_string(),
            firewall_rule: "allow-n8n-port".to_string(),
            gcloud: "gcloud".to_string(),
            custom_image: None,
            inject_secrets: false,
        }
    }
}

impl Settings {
    /// Parse settings from YAML text
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check the settings a run depends on.
    ///
    /// The SSH key is only needed when the infra description is rendered.
    pub fn validate(&self, require_ssh_key: bool) -> Result<()> {
        let hostname = self.hostname.trim();
        if hostname.is_empty() {
            return Err(ConfigError::Invalid(
                "hostname is required (set `hostname` or pass --hostname)".to_string(),
            ));
        }
        if hostname.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "hostname must not contain whitespace: {:?}",
                self.hostname
            )));
        }
        if self.region.trim().is_empty() {
            return Err(ConfigError::Invalid("region must not be empty".to_string()));
        }
        if self.disk_size_gb == 0 {
            return Err(ConfigError::Invalid(
                "disk_size_gb must be greater than zero".to_string(),
            ));
        }
        if require_ssh_key {
            match self.ssh_key.split_once(':') {
                Some((user, key)) if !user.is_empty() && !key.trim().is_empty() => {}
                _ => {
                    return Err(ConfigError::Invalid(
                        "ssh_key must look like `user:ssh-rsa AAAA...`".to_string(),
                    ));
                }
            }
            // setup.tf embeds the key in an HCL string literal
            if let Some(bad) = HCL_UNSAFE.iter().find(|s| self.ssh_key.contains(*s)) {
                return Err(ConfigError::Invalid(format!(
                    "ssh_key must not contain {:?}",
                    bad
                )));
            }
        }
        Ok(())
    }
}

/// Per-user config directory for n8nform
pub fn get_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("n8nform"))
}

/// Find the settings file.
///
/// Search order:
/// 1. `N8NFORM_CONFIG`
/// 2. current directory: n8nform.local.yaml, n8nform.yaml, .n8nform.yaml
/// 3. `~/.config/n8nform/config.yaml`
pub fn find_settings_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::MissingFile(path));
    }

    let current_dir = std::env::current_dir()?;
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    if let Ok(config_dir) = get_config_dir() {
        let global = config_dir.join("config.yaml");
        if global.exists() {
            return Ok(global);
        }
    }

    Err(ConfigError::SettingsFileNotFound)
}

/// Load settings from an explicit path, or discover them.
///
/// An explicit path must exist. When discovery finds nothing the built-in
/// defaults are returned.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let path = match explicit {
        Some(path) if path.exists() => path.to_path_buf(),
        Some(path) => return Err(ConfigError::MissingFile(path.to_path_buf())),
        None => match find_settings_file() {
            Ok(path) => path,
            Err(ConfigError::SettingsFileNotFound) => {
                debug!("No settings file found, using defaults");
                return Ok(Settings::default());
            }
            Err(e) => return Err(e),
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let settings = Settings::from_yaml(&content, &path)?;
    info!(path = %path.display(), "Loaded settings");
    Ok(settings)
}
