//! Stage progress output
//!
//! Prints one line per pipeline stage with a timestamp and duration, and a
//! summary at the end of the run.

use chrono::Local;
use colored::Colorize;
use std::time::{Duration, Instant};

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolveProject,
    ProvisionCredential,
    ReconcileAddress,
    CheckFirewall,
    RenderArtifacts,
    WriteArtifacts,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ResolveProject => "resolve project",
            Self::ProvisionCredential => "issue service account key",
            Self::ReconcileAddress => "reconcile static address",
            Self::CheckFirewall => "check firewall rule",
            Self::RenderArtifacts => "render artifacts",
            Self::WriteArtifacts => "write artifacts",
        }
    }
}

#[derive(Debug, Clone)]
pub enum StageResult {
    Success {
        duration: Duration,
        message: Option<String>,
    },
    Skipped {
        reason: String,
    },
    Failed {
        error: String,
        duration: Duration,
    },
}

impl StageResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Skipped { .. })
    }

    /// What happened, as shown in the summary
    pub fn describe(&self) -> &str {
        match self {
            Self::Success {
                message: Some(message),
                ..
            } => message.as_str(),
            Self::Success { message: None, .. } => "done",
            Self::Skipped { reason } => reason.as_str(),
            Self::Failed { error, .. } => error.as_str(),
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::Success { duration, .. } | Self::Failed { duration, .. } => Some(*duration),
            Self::Skipped { .. } => None,
        }
    }
}

pub struct StageLogger {
    start_time: Instant,
    results: Vec<(Stage, StageResult)>,
    current: Option<(Stage, Instant)>,
}

impl StageLogger {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            results: Vec::new(),
            current: None,
        }
    }

    fn timestamp() -> String {
        Local::now().format("%H:%M:%S").to_string()
    }

    pub fn start(&mut self, stage: Stage) {
        println!("[{}] {} {}", Self::timestamp().dimmed(), "▶".cyan(), stage.name());
        self.current = Some((stage, Instant::now()));
    }

    pub fn success(&mut self, message: Option<&str>) {
        if let Some((stage, start)) = self.current.take() {
            let duration = start.elapsed();
            let text = message.unwrap_or(stage.name());
            println!(
                "[{}] {} {} ({})",
                Self::timestamp().dimmed(),
                "✓".green().bold(),
                text,
                format_duration(duration).dimmed()
            );
            self.results.push((
                stage,
                StageResult::Success {
                    duration,
                    message: message.map(String::from),
                },
            ));
        }
    }

    pub fn skipped(&mut self, stage: Stage, reason: &str) {
        println!(
            "[{}] {} {} ({})",
            Self::timestamp().dimmed(),
            "⏭".yellow(),
            stage.name(),
            reason.dimmed()
        );
        self.results.push((
            stage,
            StageResult::Skipped {
                reason: reason.to_string(),
            },
        ));
    }

    pub fn failed(&mut self, error: &str) {
        if let Some((stage, start)) = self.current.take() {
            let duration = start.elapsed();
            println!(
                "[{}] {} {}: {}",
                Self::timestamp().dimmed(),
                "✗".red().bold(),
                stage.name(),
                error.red()
            );
            self.results
                .push((stage, StageResult::Failed { error: error.to_string(), duration }));
        }
    }

    pub fn detail(&self, message: &str) {
        println!("[{}]   → {}", Self::timestamp().dimmed(), message.cyan());
    }

    #[cfg(test)]
    pub fn results(&self) -> &[(Stage, StageResult)] {
        &self.results
    }

    pub fn all_success(&self) -> bool {
        self.results.iter().all(|(_, result)| result.is_success())
    }

    pub fn print_summary(&self, hostname: &str) {
        let total = self.start_time.elapsed();
        let errors = self
            .results
            .iter()
            .filter(|(_, result)| !result.is_success())
            .count();
        let slowest = self
            .results
            .iter()
            .filter_map(|(stage, result)| result.duration().map(|d| (stage, d)))
            .max_by_key(|(_, d)| *d);

        println!();
        println!("{}", "═".repeat(44));
        println!("Summary: {}", hostname.cyan().bold());
        println!("{}", "─".repeat(44));
        for (stage, result) in &self.results {
            let icon = match result {
                StageResult::Success { .. } => "✓".green(),
                StageResult::Skipped { .. } => "⏭".yellow(),
                StageResult::Failed { .. } => "✗".red(),
            };
            println!("{} {:<26} {}", icon, stage.name(), result.describe());
        }
        println!("{}", "─".repeat(44));
        println!("Total time:    {}", format_duration(total).green());
        if let Some((stage, duration)) = slowest {
            println!("Slowest stage: {} ({})", stage.name(), format_duration(duration));
        }
        if errors > 0 {
            println!("Errors:        {}", errors.to_string().red().bold());
        } else {
            println!("Errors:        {}", "0".green());
        }
        println!("{}", "═".repeat(44));
    }
}

impl Default for StageLogger {
    fn default() -> Self {
        Self::new()
    }
}

fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        format!("{}m{}s", ms / 60_000, (ms % 60_000) / 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m5s");
    }

    #[test]
    fn test_failed_stage_is_recorded() {
        let mut logger = StageLogger::new();
        logger.start(Stage::ResolveProject);
        logger.success(Some("project demo"));
        logger.start(Stage::ReconcileAddress);
        logger.failed("listing static addresses failed");

        assert_eq!(logger.results().len(), 2);
        assert!(!logger.all_success());
        assert!(matches!(
            logger.results()[1],
            (Stage::ReconcileAddress, StageResult::Failed { .. })
        ));
    }

    #[test]
    fn test_summary_describes_each_stage() {
        let mut logger = StageLogger::new();
        logger.skipped(Stage::ResolveProject, "template-only run");
        logger.start(Stage::RenderArtifacts);
        logger.success(None);
        logger.start(Stage::WriteArtifacts);
        logger.failed("permission denied");

        let described: Vec<&str> = logger
            .results()
            .iter()
            .map(|(_, result)| result.describe())
            .collect();
        assert_eq!(described, vec!["template-only run", "done", "permission denied"]);
    }

    #[test]
    fn test_skipped_counts_as_success() {
        let mut logger = StageLogger::new();
        logger.skipped(Stage::ResolveProject, "template-only run");
        assert!(logger.all_success());
    }
}
