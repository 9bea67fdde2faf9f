//! Artifact persistence

use crate::error::{CoreError, Result};
use crate::model::GeneratedArtifact;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes artifacts into a fixed base directory, overwriting existing files
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    base_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Writer rooted at the directory of the running executable, so output
    /// does not depend on where the tool is invoked from
    pub fn beside_executable() -> Result<Self> {
        let exe = std::env::current_exe().map_err(|e| CoreError::Io {
            path: PathBuf::from("<current executable>"),
            message: e.to_string(),
        })?;
        let dir = exe.parent().ok_or_else(|| CoreError::Io {
            path: exe.clone(),
            message: "executable has no parent directory".to_string(),
        })?;
        Ok(Self::new(dir))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path an artifact with this filename is written to
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.base_dir.join(filename)
    }

    /// Write one artifact, truncating any previous content
    pub fn write(&self, artifact: &GeneratedArtifact) -> Result<PathBuf> {
        let io_err = |path: &Path, e: std::io::Error| CoreError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        std::fs::create_dir_all(&self.base_dir).map_err(|e| io_err(&self.base_dir, e))?;

        let path = self.path_for(&artifact.filename);
        std::fs::write(&path, &artifact.content).map_err(|e| io_err(&path, e))?;

        #[cfg(unix)]
        if artifact.executable {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .map_err(|e| io_err(&path, e))?;
        }

        info!(path = %path.display(), bytes = artifact.content.len(), "Wrote artifact");
        Ok(path)
    }

    pub fn write_all(&self, artifacts: &[GeneratedArtifact]) -> Result<Vec<PathBuf>> {
        artifacts.iter().map(|a| self.write(a)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn artifact(name: &str, content: &str, executable: bool) -> GeneratedArtifact {
        GeneratedArtifact {
            filename: name.to_string(),
            content: content.to_string(),
            executable,
        }
    }

    #[test]
    fn test_write_overwrites() {
        let temp_dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(temp_dir.path());

        writer
            .write(&artifact("docker-compose.yml", "first version\nwith two lines\n", false))
            .unwrap();
        let path = writer
            .write(&artifact("docker-compose.yml", "second", false))
            .unwrap();

        assert_eq!(fs::read_to_string(path).unwrap(), "second");
    }

    #[test]
    fn test_write_creates_base_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(temp_dir.path().join("out").join("nested"));

        let paths = writer
            .write_all(&[
                artifact("a.txt", "a", false),
                artifact("b.txt", "b", false),
            ])
            .unwrap();

        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.exists()));
    }

    #[cfg(unix)]
    #[test]
    fn test_scripts_are_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(temp_dir.path());

        let script = writer
            .write(&artifact("setup_server.sh", "#!/bin/bash\n", true))
            .unwrap();
        let unit = writer
            .write(&artifact("docker-compose.service", "[Unit]\n", false))
            .unwrap();

        let mode = fs::metadata(script).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
        let mode = fs::metadata(unit).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0);
    }

    #[test]
    fn test_write_into_file_path_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let writer = ArtifactWriter::new(&blocker);
        let result = writer.write(&artifact("x", "y", false));
        assert!(matches!(result, Err(CoreError::Io { .. })));
    }

    #[test]
    fn test_beside_executable() {
        let writer = ArtifactWriter::beside_executable().unwrap();
        let exe = std::env::current_exe().unwrap();
        assert_eq!(Some(writer.base_dir()), exe.parent());
    }
}
