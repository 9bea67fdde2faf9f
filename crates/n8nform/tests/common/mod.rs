use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("out")).unwrap();
        Self { root }
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    pub fn out_dir(&self) -> PathBuf {
        self.root.path().join("out")
    }

    /// Write n8nform.yaml and return its path
    pub fn write_settings(&self, content: &str) -> PathBuf {
        let path = self.root.path().join("n8nform.yaml");
        fs::write(&path, content).unwrap();
        path
    }

    /// Files currently in the output directory, sorted
    pub fn written(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.out_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    /// Install a fake gcloud shell script and return its path
    #[cfg(unix)]
    #[allow(dead_code)]
    pub fn fake_gcloud(&self, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.root.path().join("gcloud");
        fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}
