use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Writes a small fake PDF named `name` into a fresh temp dir
#[allow(dead_code)]
pub fn temp_document(name: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let path = temp_dir.path().join(name);
    fs::write(&path, b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n%%EOF\n").expect("failed to write pdf");
    (temp_dir, path)
}

/// Config pointing the client at `base_url`
#[allow(dead_code)]
pub fn backend_config(base_url: &str) -> String {
    format!(
        "backend:\n  base_url: {}\n  timeout_seconds: 5\n",
        base_url
    )
}
