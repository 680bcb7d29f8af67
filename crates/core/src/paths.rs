use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Paths {
    pub base: PathBuf,
}

impl Paths {
    pub fn new() -> Self {
        let base = dirs::home_dir()
            .map(|h| h.join(".pagelens"))
            .unwrap_or_else(|| PathBuf::from(".pagelens"));
        Self { base }
    }

    pub fn with_base(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.json")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.base.join("reports")
    }

    pub fn screenshots_dir(&self) -> PathBuf {
        self.base.join("screenshots")
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.base)?;
        std::fs::create_dir_all(self.reports_dir())?;
        std::fs::create_dir_all(self.screenshots_dir())?;
        Ok(())
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_layout() {
        let paths = Paths::with_base(PathBuf::from("/tmp/pagelens-test"));
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/pagelens-test/config.json"));
        assert_eq!(paths.reports_dir(), PathBuf::from("/tmp/pagelens-test/reports"));
        assert_eq!(paths.screenshots_dir(), PathBuf::from("/tmp/pagelens-test/screenshots"));
    }
}
