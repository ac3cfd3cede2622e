use anyhow::{Context, Result};
use mutate::{Declarative, EngineConfig};
use serde::Deserialize;
use std::path::Path;

/// A directive file.
///
/// ```toml
/// [engine]
/// canonicalize_content = true
///
/// [[directive]]
/// selector = "h1"
/// attribute = "html"
/// action = "set"
/// value = "Hello"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct DirectiveFile {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default, rename = "directive")]
    pub directives: Vec<Declarative>,
}

impl DirectiveFile {
    pub fn parse(source: &str) -> Result<Self> {
        toml::from_str(source).context("invalid directive file")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&source).with_context(|| format!("parsing {}", path.display()))
    }
}
