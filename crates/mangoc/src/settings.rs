use anyhow::{Context, Result as AnyResult};
use mango::CompileOptions;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::Error;

/// `mangoc` settings, read from TOML:
///
/// ```toml
/// [compiler]
/// max_depth = 32
/// like = "wildcard"
///
/// [output]
/// pretty = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub compiler: CompileOptions,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub pretty: bool,
}

impl Settings {
    /// Load settings from `path`; no path or a missing file means defaults.
    #[tracing::instrument(skip_all)]
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let Some(settings) = read_toml_opt::<_, Settings>(path)
            .map_err(|err| Error::Config(format!("{err:#}")))?
        else {
            tracing::debug!(path = %path.display(), "no settings file; using defaults");
            return Ok(Self::default());
        };

        if settings.compiler.max_depth == 0 {
            return Err(Error::Config(format!(
                "compiler.max_depth must be at least 1 in {}",
                path.display()
            )));
        }

        tracing::debug!(?settings, "settings loaded");
        Ok(settings)
    }
}

/// Read TOML into type (Ok(None) if missing).
fn read_toml_opt<P: AsRef<Path>, T: serde::de::DeserializeOwned>(path: P) -> AnyResult<Option<T>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = toml::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
    Ok(Some(value))
}
