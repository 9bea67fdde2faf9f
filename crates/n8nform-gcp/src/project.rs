//! Active project resolution

use crate::error::{GcpError, Result};
use crate::executor::CommandExecutor;
use crate::gcloud::Gcloud;
use tracing::info;

/// Cloud project every later lookup is scoped to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudProject {
    pub id: String,
}

/// Reads the active project from the gcloud configuration
pub struct ProjectResolver<'a, E> {
    gcloud: &'a Gcloud<E>,
}

impl<'a, E: CommandExecutor> ProjectResolver<'a, E> {
    pub fn new(gcloud: &'a Gcloud<E>) -> Self {
        Self { gcloud }
    }

    pub async fn resolve(&self) -> Result<CloudProject> {
        let id = self.gcloud.config_project().await?;
        // gcloud prints "(unset)" on some versions when no project is configured
        if id.is_empty() || id == "(unset)" {
            return Err(GcpError::ProjectResolution(
                "no active project; run `gcloud config set project <id>`".to_string(),
            ));
        }
        info!(project = %id, "Resolved active project");
        Ok(CloudProject { id })
    }
}
