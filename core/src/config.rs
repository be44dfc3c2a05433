use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    /// How long a writer waits on a locked database before failing Transient.
    pub busy_timeout_ms: u64,
    pub max_complaint_chars: usize,
    pub max_comment_chars: usize,
    /// Municipality names seeded into the registry at startup.
    pub municipalities: Vec<String>,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            max_complaint_chars: 2_000,
            max_comment_chars: 1_000,
            municipalities: Vec::new(),
        }
    }
}

impl DeskConfig {
    /// Load from a JSON file such as `data/desk.json`.
    /// In tests, use DeskConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: DeskConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Config with hardcoded defaults for use in tests.
    pub fn default_test() -> Self {
        Self {
            municipalities: vec!["Kadıköy".into(), "Beşiktaş".into()],
            ..Self::default()
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.max_complaint_chars > 0, "max_complaint_chars must be > 0");
        anyhow::ensure!(self.max_comment_chars > 0, "max_comment_chars must be > 0");
        for name in &self.municipalities {
            anyhow::ensure!(!name.trim().is_empty(), "municipality names must be non-empty");
        }
        Ok(())
    }
}
