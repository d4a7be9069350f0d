// This file handles the configuration for the patcher library.
//
// Unlike a process-wide config, PatcherConfig is a plain value: it is built
// once (defaults, optionally overridden by patcher.yaml) and handed to every
// component that needs it.

use std::path::{Path, PathBuf};

use crate::yaml::YamlConfig;
use crate::PatchError;

const DEFAULT_TARGET_DIR_NAME: &str = "Hearthstone";
const DEFAULT_ADDON_NAME: &str = "Hearthstone Access";
const DEFAULT_BINARY_MARKER: &str = "Hearthstone_Data/Managed/Assembly-CSharp.dll";
const DEFAULT_PRODUCT_METADATA: &str = ".product.db";
const DEFAULT_ADDON_VERSION_FILE: &str = "Accessibility/hsa-version";
// More than enough for most installs; the walk grows steeply beyond this.
const DEFAULT_SEARCH_DEPTH: usize = 3;
const DEFAULT_ADDON_BASE_URL: &str =
    "https://raw.githubusercontent.com/HearthstoneAccess/HearthstoneAccess";
const DEFAULT_PATCHER_BASE_URL: &str = "https://raw.githubusercontent.com/HearthstoneAccess/Patcher";
const DEFAULT_RELEASES_URL: &str = "https://github.com/HearthstoneAccess/Patcher/releases";

/// The version of this patcher, compared against the remote patcher marker.
pub const PATCHER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Remote file names, relative to their base urls.
pub const PATCHER_VERSION_FILE_NAME: &str = "patcher-version";
pub const ADDON_VERSION_FILE_NAME: &str = "hsa-version";
pub const PACKAGE_FILE_NAME: &str = "patch.zip";
const PATCHER_BRANCH: &str = "master";

/// Everything the patcher needs to know about the application it patches
/// and where the add-on is published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatcherConfig {
    /// Name of the installation directory, matched case-insensitively.
    /// Also used as the application's display name.
    pub target_dir_name: String,
    /// Display name of the add-on.
    pub addon_name: String,
    /// Relative path of the application binary marker file.
    pub binary_marker: PathBuf,
    /// Relative path of the product metadata file holding the app version.
    pub product_metadata: PathBuf,
    /// Relative path of the add-on's installed version file.
    pub addon_version_file: PathBuf,
    /// How many directory levels below each filesystem root are searched.
    pub search_depth: usize,
    pub patcher_version: String,
    pub addon_base_url: String,
    pub patcher_base_url: String,
    /// Where users download a newer patcher from.
    pub releases_url: String,
    /// Sent as `Authorization: token <auth_token>` when set.
    pub auth_token: Option<String>,
}

fn relative_path(slash_separated: &str) -> PathBuf {
    slash_separated
        .split('/')
        .filter(|part| !part.is_empty())
        .collect()
}

impl Default for PatcherConfig {
    fn default() -> Self {
        Self {
            target_dir_name: DEFAULT_TARGET_DIR_NAME.to_owned(),
            addon_name: DEFAULT_ADDON_NAME.to_owned(),
            binary_marker: relative_path(DEFAULT_BINARY_MARKER),
            product_metadata: relative_path(DEFAULT_PRODUCT_METADATA),
            addon_version_file: relative_path(DEFAULT_ADDON_VERSION_FILE),
            search_depth: DEFAULT_SEARCH_DEPTH,
            patcher_version: PATCHER_VERSION.to_owned(),
            addon_base_url: DEFAULT_ADDON_BASE_URL.to_owned(),
            patcher_base_url: DEFAULT_PATCHER_BASE_URL.to_owned(),
            releases_url: DEFAULT_RELEASES_URL.to_owned(),
            auth_token: None,
        }
    }
}

impl PatcherConfig {
    /// Builds a config from the contents of a patcher.yaml file.
    pub fn from_yaml(yaml: &str) -> Result<Self, PatchError> {
        let overrides = YamlConfig::from_yaml(yaml)
            .map_err(|err| PatchError::InvalidArgument("yaml".to_string(), err.to_string()))?;
        let config = Self::default().with_overrides(overrides);
        patcher_debug!("Patcher configured with: {:?}", config);
        Ok(config)
    }

    fn with_overrides(self, yaml: YamlConfig) -> Self {
        Self {
            target_dir_name: yaml.target_dir_name.unwrap_or(self.target_dir_name),
            addon_name: yaml.addon_name.unwrap_or(self.addon_name),
            binary_marker: yaml
                .binary_marker
                .as_deref()
                .map(relative_path)
                .unwrap_or(self.binary_marker),
            product_metadata: yaml
                .product_metadata
                .as_deref()
                .map(relative_path)
                .unwrap_or(self.product_metadata),
            addon_version_file: yaml
                .addon_version_file
                .as_deref()
                .map(relative_path)
                .unwrap_or(self.addon_version_file),
            search_depth: yaml.search_depth.unwrap_or(self.search_depth),
            patcher_version: yaml.patcher_version.unwrap_or(self.patcher_version),
            addon_base_url: yaml
                .addon_base_url
                .map(|url| url.trim_end_matches('/').to_owned())
                .unwrap_or(self.addon_base_url),
            patcher_base_url: yaml
                .patcher_base_url
                .map(|url| url.trim_end_matches('/').to_owned())
                .unwrap_or(self.patcher_base_url),
            releases_url: yaml.releases_url.unwrap_or(self.releases_url),
            auth_token: yaml.auth_token.or(self.auth_token),
        }
    }

    pub fn binary_marker_path(&self, install_dir: &Path) -> PathBuf {
        install_dir.join(&self.binary_marker)
    }

    pub fn product_metadata_path(&self, install_dir: &Path) -> PathBuf {
        install_dir.join(&self.product_metadata)
    }

    pub fn addon_version_path(&self, install_dir: &Path) -> PathBuf {
        install_dir.join(&self.addon_version_file)
    }

    pub fn patcher_version_url(&self) -> String {
        format!(
            "{}/{PATCHER_BRANCH}/{PATCHER_VERSION_FILE_NAME}",
            self.patcher_base_url
        )
    }

    /// Add-on markers and packages are published per application version.
    pub fn addon_version_url(&self, app_version: &str) -> String {
        format!(
            "{}/{app_version}/{ADDON_VERSION_FILE_NAME}",
            self.addon_base_url
        )
    }

    pub fn package_url(&self, app_version: &str) -> String {
        format!("{}/{app_version}/{PACKAGE_FILE_NAME}", self.addon_base_url)
    }
}
