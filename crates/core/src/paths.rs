use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Paths {
    pub base: PathBuf,
}

impl Paths {
    pub fn new() -> Self {
        let base = dirs::home_dir()
            .map(|h| h.join(".wemportal-exporter"))
            .unwrap_or_else(|| PathBuf::from(".wemportal-exporter"));
        Self { base }
    }

    pub fn with_base(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.json")
    }

    /// Parent of the throwaway Chrome profiles, one per launched session.
    pub fn profiles_dir(&self) -> PathBuf {
        self.base.join("profiles")
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}
