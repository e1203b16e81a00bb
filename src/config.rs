//! Site configuration from an optional `leafpress.toml`.
//!
//! The file only fixes where the three trees live, so a site checkout can
//! be built with a bare `leafpress build`. Command-line flags override the
//! file; built-in defaults apply when neither says anything.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "leafpress.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}", path = .0.display(), source = .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("TOML error in {path}: {source}", path = .0.display(), source = .1)]
    Parse(PathBuf, #[source] toml::de::Error),
}

/// Tree locations, relative to the working directory unless absolute.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// The markdown content tree.
    pub content: PathBuf,
    /// The HTML view template tree.
    pub templates: PathBuf,
    /// Where the rendered site is written.
    pub output: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            content: PathBuf::from("content"),
            templates: PathBuf::from("templates"),
            output: PathBuf::from("dist"),
        }
    }
}

impl SiteConfig {
    /// Load `leafpress.toml` from `dir`; a missing file is simply the
    /// defaults, a present-but-broken file is an error.
    pub fn load_or_default(dir: &Path) -> Result<SiteConfig, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(SiteConfig::default());
        }
        let text = fs::read_to_string(&path).map_err(|e| ConfigError::Io(path.clone(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse(path, e))
    }
}

/// A documented stock configuration, printed by `leafpress gen-config`.
pub fn stock_config_toml() -> &'static str {
    r#"# leafpress site configuration.
#
# All three locations are optional and resolve relative to the directory
# leafpress runs in. The values below are the built-in defaults.

# The markdown content tree. Documents ending in .md are rendered; empty
# .md files become listings of their non-empty siblings; everything else
# is copied through unchanged. Files whose name starts with "_" are
# skipped.
#content = "content"

# The HTML view template tree. Documents ending in .html define views
# (<content-view> / <collection-view> regions with {{title}} and
# {{content}} placeholders); everything else is copied through unchanged.
#templates = "templates"

# Where the rendered site is written.
#output = "dist"
"#
}
