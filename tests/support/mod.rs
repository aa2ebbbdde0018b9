//! Shared test utilities.

use std::path::Path;

use tempfile::TempDir;

/// Services that ship a `config.ini.example` template.
pub const SERVICE_DIRECTORIES: [&str; 4] = ["users", "wikis", "notifications", "frontend"];

/// Creates a temporary directory for filesystem tests.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
pub fn create_temp_dir() -> TempDir {
    TempDir::new().unwrap_or_else(|error| panic!("failed to create temporary directory: {error}"))
}

/// Lays out a Wikifeat home with every template the installer reads.
///
/// # Panics
///
/// Panics if a directory or file cannot be written.
pub fn seed_wikifeat_home(root: &Path) {
    for service in SERVICE_DIRECTORIES {
        let directory = root.join(service);
        std::fs::create_dir_all(&directory)
            .unwrap_or_else(|error| panic!("failed to create {service}: {error}"));
        std::fs::write(
            directory.join("config.ini.example"),
            "[Service]\nnodeId = xx1\n\n[Database]\ndbAddr = localhost\n",
        )
        .unwrap_or_else(|error| panic!("failed to write {service} template: {error}"));
    }
    let plugins = root.join("frontend").join("plugins");
    std::fs::create_dir_all(&plugins)
        .unwrap_or_else(|error| panic!("failed to create plugins directory: {error}"));
    std::fs::write(plugins.join("plugins.ini.example"), "[Plugins]\n")
        .unwrap_or_else(|error| panic!("failed to write plugins template: {error}"));
    std::fs::write(root.join("frontend").join("index.html.template"), "<html></html>\n")
        .unwrap_or_else(|error| panic!("failed to write index template: {error}"));
}
