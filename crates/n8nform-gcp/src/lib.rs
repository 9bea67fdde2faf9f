//! Google Cloud resources for n8nform
//!
//! Resolves everything setup.tf needs from the cloud side:
//!
//! - the active project
//! - a fresh key for the Compute Engine default service account
//! - the regional static address named after the hostname (get-or-create)
//! - whether the firewall rule for the n8n port already exists
//!
//! # Requirements
//!
//! - `gcloud` CLI must be installed and authenticated
//!
//! # Example
//!
//! ```ignore
//! use n8nform_gcp::{Gcloud, ProjectResolver, StaticAddressReconciler};
//!
//! let gcloud = Gcloud::new("gcloud");
//! let project = ProjectResolver::new(&gcloud).resolve().await?;
//! let address = StaticAddressReconciler::new(&gcloud, "STANDARD")
//!     .reconcile("n8n.example.com", "us-west1")
//!     .await?;
//! ```

pub mod address;
pub mod credential;
pub mod error;
pub mod executor;
pub mod firewall;
pub mod gcloud;
pub mod project;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use address::{AddressStatus, StaticAddress, StaticAddressReconciler};
pub use credential::{CredentialProvisioner, DEFAULT_COMPUTE_ACCOUNT, ServiceCredential};
pub use error::{GcpError, Result};
pub use executor::{CommandExecutor, CommandOutput, ProcessExecutor};
pub use firewall::FirewallRuleProbe;
pub use gcloud::{AddressInfo, Gcloud, ServiceAccountInfo};
pub use project::{CloudProject, ProjectResolver};
