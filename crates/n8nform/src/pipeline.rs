//! Provisioning pipeline
//!
//! project → credential → static address → firewall probe → render → write.
//! Each stage runs to completion before the next one starts, and any failure
//! aborts the run. Artifacts are rendered in memory first, so nothing is
//! written unless every earlier stage succeeded.

use crate::stage::{Stage, StageLogger};
use anyhow::{Context, Result};
use n8nform_config::Settings;
use n8nform_core::{
    ArtifactTemplateGenerator, ArtifactWriter, CREDENTIALS_FILE, CustomImage, DeploymentConfig,
    GenerationMode, PLACEHOLDER_STATIC_IP, SecretMode,
};
use n8nform_gcp::{
    CommandExecutor, CredentialProvisioner, FirewallRuleProbe, Gcloud, ProjectResolver,
    StaticAddressReconciler,
};
use std::fmt::Display;
use std::path::PathBuf;

/// Values resolved from the cloud side
#[derive(Debug, Clone)]
pub struct Resolved {
    pub project_id: String,
    pub static_ip: String,
    pub firewall_rule: Option<String>,
}

/// Close the current stage according to `result`
fn finish<T, E: Display>(
    logger: &mut StageLogger,
    result: std::result::Result<T, E>,
    message: impl FnOnce(&T) -> String,
) -> std::result::Result<T, E> {
    match &result {
        Ok(value) => logger.success(Some(&message(value))),
        Err(e) => logger.failed(&e.to_string()),
    }
    result
}

/// Assemble the deployment config from settings and resolved values
pub fn assemble(settings: &Settings, resolved: Resolved) -> DeploymentConfig {
    DeploymentConfig {
        project_id: resolved.project_id,
        hostname: settings.hostname.trim().to_string(),
        region: settings.region.clone(),
        n8n_image: settings.n8n_image.clone(),
        api_image: settings.api_image.clone(),
        ssh_key: settings.ssh_key.clone(),
        static_ip: resolved.static_ip,
        credentials_file: CREDENTIALS_FILE.to_string(),
        machine_type: settings.machine_type.clone(),
        boot_image: settings.boot_image.clone(),
        disk_size_gb: settings.disk_size_gb,
        network_tier: settings.network_tier.clone(),
        firewall_rule: resolved.firewall_rule,
        custom_image: settings.custom_image.as_ref().map(|c| CustomImage {
            extra_package: c.extra_package.clone(),
        }),
        secret_mode: if settings.inject_secrets {
            SecretMode::Injected
        } else {
            SecretMode::Inline
        },
    }
}

/// Config for template-only runs.
///
/// Only setup.tf reads the project and the SSH key, and template-only runs
/// never render it, so the static IP is the only placeholder that shows.
pub fn placeholder_config(settings: &Settings) -> DeploymentConfig {
    assemble(
        settings,
        Resolved {
            project_id: String::new(),
            static_ip: PLACEHOLDER_STATIC_IP.to_string(),
            firewall_rule: None,
        },
    )
}

/// Full run: resolve cloud resources, then render and write every artifact
pub async fn run_full<E: CommandExecutor>(
    settings: &Settings,
    gcloud: &Gcloud<E>,
    writer: &ArtifactWriter,
    logger: &mut StageLogger,
) -> Result<Vec<PathBuf>> {
    logger.start(Stage::ResolveProject);
    let project = finish(logger, ProjectResolver::new(gcloud).resolve().await, |p| {
        format!("project {}", p.id)
    })
    .context("failed to resolve the active GCP project")?;

    logger.start(Stage::ProvisionCredential);
    let key_path = writer.path_for(CREDENTIALS_FILE);
    let credential = finish(
        logger,
        CredentialProvisioner::new(gcloud, key_path).provision().await,
        |c| format!("key issued for {}", c.account_email),
    )
    .context("failed to issue a service account key")?;
    logger.detail(&format!("key file: {}", credential.key_file_path.display()));

    logger.start(Stage::ReconcileAddress);
    let address = finish(
        logger,
        StaticAddressReconciler::new(gcloud, settings.network_tier.as_str())
            .reconcile(settings.hostname.trim(), &settings.region)
            .await,
        |a| {
            if a.created {
                format!("reserved {} = {}", a.name, a.value)
            } else {
                format!("using existing {} = {}", a.name, a.value)
            }
        },
    )
    .context("failed to resolve the static address")?;

    logger.start(Stage::CheckFirewall);
    let firewall_rule = finish(
        logger,
        FirewallRuleProbe::new(gcloud)
            .rule_to_declare(&settings.firewall_rule, &project.id)
            .await,
        |rule| match rule {
            Some(name) => format!("{} will be declared in setup.tf", name),
            None => format!("{} already exists", settings.firewall_rule),
        },
    )
    .context("failed to check the firewall rule")?;

    let config = assemble(
        settings,
        Resolved {
            project_id: project.id,
            static_ip: address.value,
            firewall_rule,
        },
    );

    render_and_write(&config, GenerationMode::Full, writer, logger)
}

/// Template-only run: no gcloud calls, placeholders for cloud values
pub fn run_template_only(
    settings: &Settings,
    writer: &ArtifactWriter,
    logger: &mut StageLogger,
) -> Result<Vec<PathBuf>> {
    for stage in [
        Stage::ResolveProject,
        Stage::ProvisionCredential,
        Stage::ReconcileAddress,
        Stage::CheckFirewall,
    ] {
        logger.skipped(stage, "template-only run");
    }

    let config = placeholder_config(settings);
    render_and_write(&config, GenerationMode::TemplateOnly, writer, logger)
}

fn render_and_write(
    config: &DeploymentConfig,
    mode: GenerationMode,
    writer: &ArtifactWriter,
    logger: &mut StageLogger,
) -> Result<Vec<PathBuf>> {
    logger.start(Stage::RenderArtifacts);
    let artifacts = finish(
        logger,
        ArtifactTemplateGenerator::new().and_then(|g| g.render_all(config, mode)),
        |a| format!("rendered {} artifacts", a.len()),
    )
    .context("failed to render artifacts")?;

    logger.start(Stage::WriteArtifacts);
    let paths = finish(logger, writer.write_all(&artifacts), |_| {
        format!("wrote to {}", writer.base_dir().display())
    })
    .context("failed to write artifacts")?;

    for path in &paths {
        logger.detail(&path.display().to_string());
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use n8nform_gcp::CommandOutput;
    use n8nform_gcp::testing::ScriptedExecutor;
    use std::fs;

    const ACCOUNTS: &str = r#"[{"email": "123-compute@developer.gserviceaccount.com",
        "displayName": "Compute Engine default service account"}]"#;

    const ADDRESS: &str = r#"[{"name": "n8n-example-com",
        "region": "https://www.googleapis.com/compute/v1/projects/demo/regions/us-west1",
        "status": "RESERVED", "address": "34.1.2.3"}]"#;

    fn settings() -> Settings {
        Settings {
            hostname: "n8n.example.com".to_string(),
            ssh_key: "deploy:ssh-rsa AAAAB3Nza".to_string(),
            ..Settings::default()
        }
    }

    fn base_executor() -> ScriptedExecutor {
        ScriptedExecutor::new()
            .on(
                &["config", "get-value", "project"],
                CommandOutput::success("demo\n"),
            )
            .on(
                &["iam", "service-accounts", "list"],
                CommandOutput::success(ACCOUNTS),
            )
            .on(
                &["iam", "service-accounts", "keys", "create"],
                CommandOutput::success(""),
            )
    }

    fn written(dir: &std::path::Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().to_string())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_full_run_writes_all_artifacts() {
        let temp_dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(temp_dir.path());
        let gcloud = Gcloud::with_executor(
            "gcloud",
            base_executor()
                .on(
                    &["compute", "addresses", "list"],
                    CommandOutput::success(ADDRESS),
                )
                .on(
                    &["compute", "firewall-rules", "describe"],
                    CommandOutput::failure(1, "not found"),
                ),
        );

        let paths = run_full(&settings(), &gcloud, &writer, &mut StageLogger::new())
            .await
            .unwrap();

        assert_eq!(paths.len(), 6);
        assert_eq!(
            written(temp_dir.path()),
            vec![
                "docker-compose.service",
                "docker-compose.yml",
                "setup.tf",
                "setup_cloudflare.sh",
                "setup_server.sh",
                "update.sh",
            ]
        );

        let tf = fs::read_to_string(temp_dir.path().join("setup.tf")).unwrap();
        assert!(tf.contains(r#"project     = "demo""#));
        assert!(tf.contains(r#"nat_ip       = "34.1.2.3""#));
        assert!(tf.contains(r#"name    = "allow-n8n-port""#));

        // the key lands next to the artifacts
        let key_path = writer.path_for(CREDENTIALS_FILE);
        let key_call = gcloud
            .executor()
            .calls()
            .into_iter()
            .find(|c| c.get(2).map(String::as_str) == Some("keys"))
            .unwrap();
        assert_eq!(key_call[4], key_path.to_string_lossy());

        assert_eq!(gcloud.executor().count(&["compute", "addresses", "create"]), 0);
    }

    #[tokio::test]
    async fn test_listing_failure_writes_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(temp_dir.path());
        let gcloud = Gcloud::with_executor(
            "gcloud",
            base_executor().on(
                &["compute", "addresses", "list"],
                CommandOutput::failure(1, "permission denied"),
            ),
        );
        let mut logger = StageLogger::new();

        let result = run_full(&settings(), &gcloud, &writer, &mut logger).await;

        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("listing static addresses failed"));
        assert!(written(temp_dir.path()).is_empty());
        assert!(!logger.all_success());
        assert_eq!(
            gcloud
                .executor()
                .count(&["compute", "firewall-rules", "describe"]),
            0
        );
    }

    #[tokio::test]
    async fn test_missing_credential_is_fatal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(temp_dir.path());
        let gcloud = Gcloud::with_executor(
            "gcloud",
            ScriptedExecutor::new()
                .on(
                    &["config", "get-value", "project"],
                    CommandOutput::success("demo"),
                )
                .on(
                    &["iam", "service-accounts", "list"],
                    CommandOutput::success("[]"),
                ),
        );

        let result = run_full(&settings(), &gcloud, &writer, &mut StageLogger::new()).await;

        assert!(result.is_err());
        assert_eq!(gcloud.executor().count(&["compute"]), 0);
        assert!(written(temp_dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_project_failure_stops_everything() {
        let temp_dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(temp_dir.path());
        let gcloud = Gcloud::with_executor(
            "gcloud",
            ScriptedExecutor::new().on(
                &["config", "get-value", "project"],
                CommandOutput::success(""),
            ),
        );

        let result = run_full(&settings(), &gcloud, &writer, &mut StageLogger::new()).await;

        assert!(result.is_err());
        assert_eq!(gcloud.executor().calls().len(), 1);
    }

    #[test]
    fn test_template_only_run() {
        let temp_dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(temp_dir.path());
        let settings = Settings {
            ssh_key: String::new(),
            ..settings()
        };

        let paths = run_template_only(&settings, &writer, &mut StageLogger::new()).unwrap();

        assert_eq!(paths.len(), 5);
        assert!(!temp_dir.path().join("setup.tf").exists());
        let tunnel = fs::read_to_string(temp_dir.path().join("setup_cloudflare.sh")).unwrap();
        assert!(tunnel.contains(PLACEHOLDER_STATIC_IP));
        let compose = fs::read_to_string(temp_dir.path().join("docker-compose.yml")).unwrap();
        assert!(compose.contains("N8N_HOST=n8n.example.com"));
    }

    #[test]
    fn test_assemble_maps_settings() {
        let settings = Settings {
            inject_secrets: true,
            custom_image: Some(n8nform_config::CustomImageSettings {
                extra_package: "ffmpeg".to_string(),
            }),
            ..settings()
        };
        let config = assemble(
            &settings,
            Resolved {
                project_id: "demo".to_string(),
                static_ip: "34.1.2.3".to_string(),
                firewall_rule: None,
            },
        );
        assert_eq!(config.secret_mode, SecretMode::Injected);
        assert_eq!(
            config.custom_image.as_ref().map(|c| c.extra_package.as_str()),
            Some("ffmpeg")
        );
        assert_eq!(config.credentials_file, CREDENTIALS_FILE);
        assert_eq!(config.webhook_url(), "https://n8n.example.com/");
    }
}
