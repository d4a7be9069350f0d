// This file's job is to parse patcher.yaml, the optional override file for
// the built-in configuration.

use serde::Deserialize;

/// The contents of patcher.yaml. Every key is optional; a missing key keeps
/// the built-in default.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct YamlConfig {
    pub target_dir_name: Option<String>,
    pub addon_name: Option<String>,
    /// Relative path, '/' separated.
    pub binary_marker: Option<String>,
    /// Relative path, '/' separated.
    pub product_metadata: Option<String>,
    /// Relative path, '/' separated.
    pub addon_version_file: Option<String>,
    pub search_depth: Option<usize>,
    pub patcher_version: Option<String>,
    pub addon_base_url: Option<String>,
    pub patcher_base_url: Option<String>,
    pub releases_url: Option<String>,
    pub auth_token: Option<String>,
}

impl YamlConfig {
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        // An empty file is a valid "no overrides" file.
        if yaml.trim().is_empty() {
            return Ok(YamlConfig::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }
}
