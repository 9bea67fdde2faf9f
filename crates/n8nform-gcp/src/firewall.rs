//! Firewall rule probe

use crate::error::Result;
use crate::executor::CommandExecutor;
use crate::gcloud::Gcloud;
use tracing::info;

/// Checks whether the rule opening the n8n port is already in place
pub struct FirewallRuleProbe<'a, E> {
    gcloud: &'a Gcloud<E>,
}

impl<'a, E: CommandExecutor> FirewallRuleProbe<'a, E> {
    pub fn new(gcloud: &'a Gcloud<E>) -> Self {
        Self { gcloud }
    }

    /// Rule name setup.tf has to declare, or `None` when it already exists
    pub async fn rule_to_declare(&self, rule: &str, project: &str) -> Result<Option<String>> {
        if self.gcloud.firewall_rule_exists(rule, project).await? {
            info!(rule, "Firewall rule already exists");
            Ok(None)
        } else {
            info!(rule, "Firewall rule missing, setup.tf will declare it");
            Ok(Some(rule.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::CommandOutput;
    use crate::testing::ScriptedExecutor;

    #[tokio::test]
    async fn test_existing_rule_is_not_declared() {
        let gcloud = Gcloud::with_executor(
            "gcloud",
            ScriptedExecutor::new().on(
                &["compute", "firewall-rules", "describe"],
                CommandOutput::success("{}"),
            ),
        );
        let probe = FirewallRuleProbe::new(&gcloud);
        assert_eq!(probe.rule_to_declare("allow-n8n-port", "demo").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_rule_is_declared() {
        let gcloud = Gcloud::with_executor(
            "gcloud",
            ScriptedExecutor::new().on(
                &["compute", "firewall-rules", "describe"],
                CommandOutput::failure(1, "was not found"),
            ),
        );
        let probe = FirewallRuleProbe::new(&gcloud);
        assert_eq!(
            probe.rule_to_declare("allow-n8n-port", "demo").await.unwrap(),
            Some("allow-n8n-port".to_string())
        );
        assert_eq!(
            gcloud.executor().calls()[0],
            vec![
                "compute",
                "firewall-rules",
                "describe",
                "allow-n8n-port",
                "--project",
                "demo",
                "--format=json",
            ]
        );
    }
}
