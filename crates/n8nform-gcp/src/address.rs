//! Static address reconciliation
//!
//! Get-or-create for the regional address the instance is bound to. There
//! is no lock between the list and the create call; a single operator runs
//! this once per hostname.

use crate::error::{GcpError, Result};
use crate::executor::CommandExecutor;
use crate::gcloud::{AddressInfo, Gcloud};
use n8nform_core::normalize_hostname;
use tracing::info;

/// Reservation state reported by gcloud
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressStatus {
    Reserved,
    InUse,
    Reserving,
    Other(String),
}

impl AddressStatus {
    fn parse(status: Option<&str>) -> Self {
        match status {
            Some("RESERVED") => Self::Reserved,
            Some("IN_USE") => Self::InUse,
            Some("RESERVING") => Self::Reserving,
            Some(other) => Self::Other(other.to_string()),
            None => Self::Other(String::new()),
        }
    }
}

/// A resolved regional address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAddress {
    pub name: String,
    pub region: String,
    pub value: String,
    pub status: AddressStatus,
    /// Whether this run reserved the address
    pub created: bool,
}

pub struct StaticAddressReconciler<'a, E> {
    gcloud: &'a Gcloud<E>,
    network_tier: String,
}

impl<'a, E: CommandExecutor> StaticAddressReconciler<'a, E> {
    pub fn new(gcloud: &'a Gcloud<E>, network_tier: impl Into<String>) -> Self {
        Self {
            gcloud,
            network_tier: network_tier.into(),
        }
    }

    /// Return the address for `hostname` in `region`, reserving it if needed.
    ///
    /// An existing address is returned whatever its status; nothing is
    /// created or described in that case.
    pub async fn reconcile(&self, hostname: &str, region: &str) -> Result<StaticAddress> {
        let name = normalize_hostname(hostname);

        let existing = self.gcloud.list_addresses(&name, region).await?;
        if let Some(found) = existing
            .into_iter()
            .find(|a| a.name == name && a.region_name().is_none_or(|r| r == region))
        {
            info!(address = %name, region, "Static address already exists");
            return into_static_address(found, region, false);
        }

        info!(address = %name, region, tier = %self.network_tier, "Reserving static address");
        self.gcloud
            .create_address(&name, region, &self.network_tier)
            .await?;

        let described = self.gcloud.describe_address(&name, region).await?;
        into_static_address(described, region, true)
    }
}

fn into_static_address(info: AddressInfo, region: &str, created: bool) -> Result<StaticAddress> {
    let value = info
        .address
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            GcpError::ResourceNotFound(format!("address value for {} in {}", info.name, region))
        })?;

    Ok(StaticAddress {
        status: AddressStatus::parse(info.status.as_deref()),
        name: info.name,
        region: region.to_string(),
        value,
        created,
    })
}
