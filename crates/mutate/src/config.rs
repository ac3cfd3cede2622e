use serde::Deserialize;

/// Engine settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Install the tree watcher when the engine is created.
    pub watch_on_start: bool,
    /// Re-serialize folded content through the host parser, so the virtual
    /// value compares equal to what the tree reports after the write.
    pub canonicalize_content: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            watch_on_start: true,
            canonicalize_content: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: EngineConfig = toml::from_str("watch_on_start = false").unwrap();
        assert!(!config.watch_on_start);
        assert!(config.canonicalize_content);
    }
}
