//! Artifact generation
//!
//! Renders the built-in templates against a `DeploymentConfig`. Rendering is
//! pure: the same config always yields byte-identical artifacts, and no
//! artifact reads another artifact's output.

use crate::error::{CoreError, Result};
use crate::model::{
    API_PORT, ArtifactKind, CustomImage, DeploymentConfig, GeneratedArtifact, N8N_PORT,
    REMOTE_DIR, SecretMode,
};
use crate::templates;
use serde::Serialize;
use tera::{Context, Tera};
use tracing::debug;

/// Where provisioners stage uploads before they are moved into place
const STAGING_DIR: &str = "/tmp/n8nform";

/// Which artifacts a run produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// Everything, including the infra description
    Full,
    /// Text artifacts only, no infra description
    TemplateOnly,
}

#[derive(Debug, Serialize)]
struct Upload {
    filename: &'static str,
    remote_dir: &'static str,
    mode: &'static str,
}

/// Template context, one field per placeholder
#[derive(Debug, Serialize)]
struct TemplateContext<'a> {
    project_id: &'a str,
    hostname: &'a str,
    webhook_url: String,
    region: &'a str,
    zone: String,
    address_name: String,
    n8n_image: &'a str,
    api_image: &'a str,
    ssh_key: &'a str,
    ssh_user: &'a str,
    inject_ssh_keys: bool,
    static_ip: &'a str,
    credentials_file: &'a str,
    machine_type: &'a str,
    boot_image: &'a str,
    disk_size_gb: u32,
    network_tier: &'a str,
    firewall_rule: Option<&'a str>,
    custom_image: Option<&'a CustomImage>,
    custom_image_tag: &'static str,
    n8n_port: u16,
    api_port: u16,
    remote_dir: &'static str,
    staging_dir: &'static str,
    local_files_dir: String,
    compose_path: String,
    unit_name: &'static str,
    bootstrap_script: &'static str,
    tunnel_script: &'static str,
    dockerfile: &'static str,
    entrypoint_script: &'static str,
    uploads: Vec<Upload>,
}

impl<'a> TemplateContext<'a> {
    fn new(config: &'a DeploymentConfig, uploads: Vec<Upload>) -> Self {
        Self {
            project_id: &config.project_id,
            hostname: &config.hostname,
            webhook_url: config.webhook_url(),
            region: &config.region,
            zone: config.zone(),
            address_name: config.address_name(),
            n8n_image: &config.n8n_image,
            api_image: &config.api_image,
            ssh_key: &config.ssh_key,
            ssh_user: config.ssh_user(),
            inject_ssh_keys: config.secret_mode == SecretMode::Injected,
            static_ip: &config.static_ip,
            credentials_file: &config.credentials_file,
            machine_type: &config.machine_type,
            boot_image: &config.boot_image,
            disk_size_gb: config.disk_size_gb,
            network_tier: &config.network_tier,
            firewall_rule: config.firewall_rule.as_deref(),
            custom_image: config.custom_image.as_ref(),
            custom_image_tag: CustomImage::TAG,
            n8n_port: N8N_PORT,
            api_port: API_PORT,
            remote_dir: REMOTE_DIR,
            staging_dir: STAGING_DIR,
            local_files_dir: format!("{}/local-files", REMOTE_DIR),
            compose_path: format!("{}/{}", REMOTE_DIR, ArtifactKind::Compose.filename()),
            unit_name: ArtifactKind::Unit.filename(),
            bootstrap_script: ArtifactKind::Bootstrap.filename(),
            tunnel_script: ArtifactKind::Tunnel.filename(),
            dockerfile: ArtifactKind::Dockerfile.filename(),
            entrypoint_script: ArtifactKind::Entrypoint.filename(),
            uploads,
        }
    }
}

/// Renders deployment artifacts
pub struct ArtifactTemplateGenerator {
    tera: Tera,
}

impl ArtifactTemplateGenerator {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_templates(vec![
            (ArtifactKind::Infra.filename(), templates::INFRA),
            (ArtifactKind::Bootstrap.filename(), templates::BOOTSTRAP),
            (ArtifactKind::Tunnel.filename(), templates::TUNNEL),
            (ArtifactKind::Compose.filename(), templates::COMPOSE),
            (ArtifactKind::Unit.filename(), templates::UNIT),
            (ArtifactKind::Updater.filename(), templates::UPDATER),
            (ArtifactKind::Dockerfile.filename(), templates::DOCKERFILE),
            (ArtifactKind::Entrypoint.filename(), templates::ENTRYPOINT),
        ])
        .map_err(|e| CoreError::TemplateRender {
            template: "built-in templates".to_string(),
            message: extract_tera_error_detail(&e),
        })?;
        Ok(Self { tera })
    }

    /// Artifacts produced for a config in the given mode, in write order
    pub fn kinds(config: &DeploymentConfig, mode: GenerationMode) -> Vec<ArtifactKind> {
        let mut kinds = Vec::with_capacity(8);
        if mode == GenerationMode::Full {
            kinds.push(ArtifactKind::Infra);
        }
        kinds.extend([
            ArtifactKind::Bootstrap,
            ArtifactKind::Tunnel,
            ArtifactKind::Compose,
            ArtifactKind::Unit,
            ArtifactKind::Updater,
        ]);
        if config.custom_image.is_some() {
            kinds.extend([ArtifactKind::Dockerfile, ArtifactKind::Entrypoint]);
        }
        kinds
    }

    /// Render every artifact for the mode
    pub fn render_all(
        &self,
        config: &DeploymentConfig,
        mode: GenerationMode,
    ) -> Result<Vec<GeneratedArtifact>> {
        Self::kinds(config, mode)
            .into_iter()
            .map(|kind| self.render(kind, config))
            .collect()
    }

    /// Render a single artifact
    pub fn render(&self, kind: ArtifactKind, config: &DeploymentConfig) -> Result<GeneratedArtifact> {
        if matches!(kind, ArtifactKind::Dockerfile | ArtifactKind::Entrypoint)
            && config.custom_image.is_none()
        {
            return Err(CoreError::InvalidConfig(format!(
                "{} requires a custom image definition",
                kind.filename()
            )));
        }

        let uploads = if kind == ArtifactKind::Infra {
            Self::kinds(config, GenerationMode::TemplateOnly)
                .into_iter()
                .map(|k| Upload {
                    filename: k.filename(),
                    remote_dir: k.remote_dir(),
                    mode: if k.is_executable() { "0755" } else { "0644" },
                })
                .collect()
        } else {
            Vec::new()
        };

        let template = kind.filename();
        let context = Context::from_serialize(TemplateContext::new(config, uploads)).map_err(
            |e| CoreError::TemplateRender {
                template: template.to_string(),
                message: extract_tera_error_detail(&e),
            },
        )?;
        let content =
            self.tera
                .render(template, &context)
                .map_err(|e| CoreError::TemplateRender {
                    template: template.to_string(),
                    message: extract_tera_error_detail(&e),
                })?;

        debug!(artifact = template, bytes = content.len(), "Rendered artifact");

        Ok(GeneratedArtifact {
            filename: template.to_string(),
            content,
            executable: kind.is_executable(),
        })
    }
}

/// Flatten a Tera error and its sources into one line
fn extract_tera_error_detail(error: &tera::Error) -> String {
    let mut detail = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}
