mod pipeline;
mod stage;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use n8nform_config::Settings;
use n8nform_core::ArtifactWriter;
use n8nform_gcp::Gcloud;
use stage::StageLogger;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "n8nform")]
#[command(version)]
#[command(
    about = "Provision a GCP VM for n8n: reserve its static IP and render setup.tf, compose, systemd and tunnel scripts"
)]
struct Cli {
    /// Settings file (defaults to n8nform.yaml discovery)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where artifacts are written (defaults to the directory of this executable)
    #[arg(short, long, env = "N8NFORM_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Public hostname, e.g. n8n.example.com
    #[arg(long, env = "N8NFORM_HOSTNAME")]
    hostname: Option<String>,

    /// GCP region
    #[arg(long, env = "N8NFORM_REGION")]
    region: Option<String>,

    /// SSH key for the instance metadata, `user:ssh-rsa AAAA...`
    #[arg(long, env = "N8NFORM_SSH_KEY")]
    ssh_key: Option<String>,

    /// gcloud binary
    #[arg(long, env = "N8NFORM_GCLOUD")]
    gcloud: Option<String>,

    /// Keep the SSH key out of setup.tf (supply it as TF_VAR_ssh_keys)
    #[arg(long)]
    inject_secrets: bool,

    /// Only render the text artifacts with placeholders, without calling gcloud
    #[arg(long)]
    template_only: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(hostname) = &self.hostname {
            settings.hostname = hostname.clone();
        }
        if let Some(region) = &self.region {
            settings.region = region.clone();
        }
        if let Some(ssh_key) = &self.ssh_key {
            settings.ssh_key = ssh_key.clone();
        }
        if let Some(gcloud) = &self.gcloud {
            settings.gcloud = gcloud.clone();
        }
        if self.inject_secrets {
            settings.inject_secrets = true;
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut settings =
        n8nform_config::load_settings(cli.config.as_deref()).context("failed to load settings")?;
    cli.apply_overrides(&mut settings);
    settings.validate(!cli.template_only)?;
    debug!(
        hostname = %settings.hostname,
        region = %settings.region,
        template_only = cli.template_only,
        "Settings resolved"
    );

    let writer = match &cli.output_dir {
        Some(dir) => ArtifactWriter::new(dir),
        None => ArtifactWriter::beside_executable()?,
    };

    println!(
        "{} {} ({})",
        "n8nform".bold(),
        settings.hostname.trim().cyan(),
        if cli.template_only {
            "template-only"
        } else {
            "full run"
        }
    );

    let mut logger = StageLogger::new();
    let result = if cli.template_only {
        pipeline::run_template_only(&settings, &writer, &mut logger)
    } else {
        let gcloud = Gcloud::new(settings.gcloud.as_str());
        pipeline::run_full(&settings, &gcloud, &writer, &mut logger).await
    };
    logger.print_summary(settings.hostname.trim());

    result?;

    if !cli.template_only && logger.all_success() {
        println!();
        println!("Next steps:");
        println!("  cd {}", writer.base_dir().display());
        if settings.inject_secrets {
            println!("  export TF_VAR_ssh_keys='{}'", "<user:ssh-rsa ...>".dimmed());
        }
        println!("  terraform init && terraform apply");
    }

    Ok(())
}
