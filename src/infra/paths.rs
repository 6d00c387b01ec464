// src/infra/paths.rs — Path management
//
// All paths respect the PROMPTTUNE_HOME environment variable for isolation.
// When PROMPTTUNE_HOME is set, config and data live under that directory.
// When unset, config uses ~/.prompttune/ and data uses the platform data dir.

use directories::ProjectDirs;
use std::path::PathBuf;
use std::sync::OnceLock;

static PROJECT_DIRS: OnceLock<ProjectDirs> = OnceLock::new();

fn project_dirs() -> &'static ProjectDirs {
    PROJECT_DIRS.get_or_init(|| {
        ProjectDirs::from("", "", "prompttune").expect("Could not determine home directory")
    })
}

fn prompttune_home() -> Option<PathBuf> {
    std::env::var_os("PROMPTTUNE_HOME").map(PathBuf::from)
}

/// Configuration directory: $PROMPTTUNE_HOME/ or ~/.prompttune/
pub fn config_dir() -> PathBuf {
    if let Some(home) = prompttune_home() {
        return home;
    }
    dirs_home().join(".prompttune")
}

/// Data directory: $PROMPTTUNE_HOME/data/ or the platform-local data dir.
pub fn data_dir() -> PathBuf {
    if let Some(home) = prompttune_home() {
        return home.join("data");
    }
    project_dirs().data_local_dir().to_path_buf()
}

pub fn dirs_home() -> PathBuf {
    directories::BaseDirs::new()
        .expect("Could not determine home directory")
        .home_dir()
        .to_path_buf()
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Durable best-instruction record
pub fn best_record_path() -> PathBuf {
    data_dir().join("best_prompt.txt")
}
