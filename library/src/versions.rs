// This file's job is to work out which versions are installed locally and
// which are published remotely.
//
// Versions are opaque tokens compared only for equality: a remote rollback
// to an older version is treated exactly like a forward update.

use std::fs;
use std::path::Path;

use anyhow::bail;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::PatcherConfig;
use crate::file_errors::{FileOperation, IoResultExt};
use crate::locator::InstallationPath;
use crate::network::ArtifactRetriever;
use crate::{is_not_found, PatchError};

static APP_VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+\.[0-9]+\.[0-9]+\.[0-9]+").expect("valid app version regex"));

/// The add-on versions for one installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonVersions {
    /// The application's own version, read from its product metadata. Remote
    /// add-on artifacts are published per application version.
    pub app_version: String,
    /// None if the add-on has never been installed.
    pub installed: Option<String>,
    pub latest: String,
}

impl AddonVersions {
    pub fn is_outdated(&self) -> bool {
        is_addon_outdated(self.installed.as_deref(), &self.latest)
    }
}

/// True when the add-on was never installed or the installed version isn't
/// exactly the latest one. Callers pass versions as read by
/// [`read_version_file`], so surrounding whitespace in either marker file
/// (a trailing newline, `\r\n`) never makes an add-on look outdated.
pub fn is_addon_outdated(installed: Option<&str>, latest: &str) -> bool {
    match installed {
        None => true,
        Some(installed) => installed != latest,
    }
}

/// Extracts the single dotted-quad version from the product metadata text.
/// Zero or several matches mean the file isn't what we expect.
pub fn parse_app_version(product_info: &str) -> anyhow::Result<String> {
    let mut matches = APP_VERSION_PATTERN.find_iter(product_info);
    match (matches.next(), matches.next()) {
        (Some(version), None) => Ok(version.as_str().to_string()),
        (None, _) => bail!(PatchError::MalformedData(
            "no application version found in product metadata".to_string()
        )),
        (Some(_), Some(_)) => bail!(PatchError::MalformedData(
            "more than one application version found in product metadata".to_string()
        )),
    }
}

/// Version markers are small text files whose whole content is the version.
/// Surrounding whitespace (e.g. a trailing newline added by an editor) is
/// not part of the version.
pub fn read_version_file(path: &Path) -> anyhow::Result<String> {
    let contents = fs::read_to_string(path).with_file_context(FileOperation::ReadFile, path)?;
    Ok(contents.trim().to_string())
}

pub fn read_installed_app_version(
    install_dir: &InstallationPath,
    config: &PatcherConfig,
) -> anyhow::Result<String> {
    let path = config.product_metadata_path(install_dir.path());
    // The metadata file is binary with the version embedded as text.
    let bytes = fs::read(&path).with_file_context(FileOperation::ReadFile, &path)?;
    parse_app_version(&String::from_utf8_lossy(&bytes))
}

/// None if the add-on version file doesn't exist.
pub fn read_installed_addon_version(
    install_dir: &InstallationPath,
    config: &PatcherConfig,
) -> anyhow::Result<Option<String>> {
    let path = config.addon_version_path(install_dir.path());
    if !path.exists() {
        patcher_info!("No add-on version file at {:?}, add-on not installed", path);
        return Ok(None);
    }
    read_version_file(&path).map(Some)
}

/// Resolves local and remote versions through an [`ArtifactRetriever`].
pub struct VersionResolver<'a> {
    config: &'a PatcherConfig,
    retriever: &'a dyn ArtifactRetriever,
}

impl<'a> VersionResolver<'a> {
    pub fn new(config: &'a PatcherConfig, retriever: &'a dyn ArtifactRetriever) -> Self {
        Self { config, retriever }
    }

    /// The latest published patcher version, or None if no marker is
    /// published.
    pub fn remote_patcher_version(&self) -> anyhow::Result<Option<String>> {
        match self.retriever.fetch_patcher_version_marker() {
            Ok(path) => read_version_file(&path).map(Some),
            Err(err) if is_not_found(&err) => {
                patcher_warn!("No patcher version marker published: {}", err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// A missing remote marker counts as outdated.
    pub fn is_self_outdated(&self) -> anyhow::Result<bool> {
        let outdated = match self.remote_patcher_version()? {
            Some(latest) => latest != self.config.patcher_version,
            None => true,
        };
        patcher_info!(
            "Patcher version {} outdated: {}",
            self.config.patcher_version,
            outdated
        );
        Ok(outdated)
    }

    /// Reads the application version, fetches the latest add-on version for
    /// it and reads the installed add-on version.
    ///
    /// A remote not-found is returned as an error recognised by
    /// [`is_not_found`]: the add-on for this application version isn't
    /// published yet.
    pub fn load_addon_versions(
        &self,
        install_dir: &InstallationPath,
    ) -> anyhow::Result<AddonVersions> {
        let app_version = read_installed_app_version(install_dir, self.config)?;
        patcher_info!("Installed application version: {}", app_version);

        let marker = self.retriever.fetch_addon_version_marker(&app_version)?;
        let latest = read_version_file(&marker)?;
        let installed = read_installed_addon_version(install_dir, self.config)?;
        patcher_info!(
            "Add-on versions: installed {:?}, latest {}",
            installed,
            latest
        );

        Ok(AddonVersions {
            app_version,
            installed,
            latest,
        })
    }
}
