use std::path::PathBuf;

/// Overrides the data directory when `--data-dir` is not given.
pub const DATA_DIR_ENV: &str = "PORTAL_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Flag first, then `PORTAL_DATA_DIR`, then the platform data directory.
    pub fn resolve(flag: Option<PathBuf>) -> Self {
        let env = std::env::var_os(DATA_DIR_ENV).map(PathBuf::from);
        Self::resolve_from(flag, env)
    }

    fn resolve_from(flag: Option<PathBuf>, env: Option<PathBuf>) -> Self {
        let data_dir = flag
            .or(env)
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(Self::default_data_dir);
        Self { data_dir }
    }

    fn default_data_dir() -> PathBuf {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "portal") {
            proj_dirs.data_dir().join("data")
        } else {
            PathBuf::from("data")
        }
    }
}
