//! n8nform core
//!
//! The deployment model and everything that turns it into files:
//!
//! - [`DeploymentConfig`]: the resolved parameters of one deployment
//! - [`ArtifactTemplateGenerator`]: renders setup.tf, the bootstrap, tunnel and
//!   update scripts, the compose file, the systemd unit and the optional
//!   custom image files
//! - [`ArtifactWriter`]: writes the rendered artifacts to disk
//!
//! # Example
//!
//! ```ignore
//! use n8nform_core::{ArtifactTemplateGenerator, ArtifactWriter, GenerationMode};
//!
//! let generator = ArtifactTemplateGenerator::new()?;
//! let artifacts = generator.render_all(&config, GenerationMode::Full)?;
//! ArtifactWriter::beside_executable()?.write_all(&artifacts)?;
//! ```

pub mod error;
pub mod generator;
pub mod model;
pub mod naming;
pub mod templates;
pub mod writer;

pub use error::{CoreError, Result};
pub use generator::{ArtifactTemplateGenerator, GenerationMode};
pub use model::{
    ArtifactKind, CREDENTIALS_FILE, CustomImage, DeploymentConfig, GeneratedArtifact,
    PLACEHOLDER_STATIC_IP, SecretMode,
};
pub use naming::normalize_hostname;
pub use writer::ArtifactWriter;
