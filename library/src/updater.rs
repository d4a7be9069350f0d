// This file's job is to be the Rust API for the patcher: the session state
// and the end-to-end run (self check, locate, load versions, decide, apply).

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use crate::apply::apply_patch;
use crate::config::PatcherConfig;
use crate::locator::{find_candidates, find_candidates_in, InstallationPath};
use crate::logging::write_error_log;
use crate::network::ArtifactRetriever;
use crate::versions::{AddonVersions, VersionResolver};

#[derive(Debug, PartialEq)]
pub enum PatchError {
    /// The requested remote artifact doesn't exist (yet).
    NotFound(String),
    /// Local data didn't parse into what we expected.
    MalformedData(String),
    /// An operation was called before the state it needs was established.
    InvalidState(String),
    InvalidArgument(String, String),
    /// The package for a version we already know is published is missing.
    PackageMissing(String),
}

impl std::error::Error for PatchError {}

impl Display for PatchError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            PatchError::NotFound(what) => write!(f, "Not found: {}", what),
            PatchError::MalformedData(msg) => write!(f, "Malformed data: {}", msg),
            PatchError::InvalidState(msg) => write!(f, "Invalid State: {}", msg),
            PatchError::InvalidArgument(name, value) => {
                write!(f, "Invalid Argument: {} -> {}", name, value)
            }
            PatchError::PackageMissing(what) => {
                write!(f, "Unexpected error: could not find package for {}", what)
            }
        }
    }
}

/// True if any error in the chain is [`PatchError::NotFound`].
pub fn is_not_found(error: &anyhow::Error) -> bool {
    error
        .chain()
        .any(|cause| matches!(cause.downcast_ref::<PatchError>(), Some(PatchError::NotFound(_))))
}

/// How a run ended, for every ending other than a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The patcher itself is outdated; nothing else was done.
    SelfUpdateRequired,
    /// No installation was selected.
    LocateAborted,
    /// No add-on is published for the installed application version yet.
    VersionUnavailable,
    Applied,
    Declined,
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::SelfUpdateRequired => write!(f, "Self update required"),
            Outcome::LocateAborted => write!(f, "Locate aborted"),
            Outcome::VersionUnavailable => write!(f, "Version unavailable"),
            Outcome::Applied => write!(f, "Applied"),
            Outcome::Declined => write!(f, "Declined"),
        }
    }
}

/// The user-facing side of a run. Each call blocks until the user answers.
pub trait Prompt {
    fn show(&mut self, message: &str);

    fn confirm(&mut self, question: &str) -> bool;

    /// None means the user declined to pick a directory.
    fn choose_directory(&mut self, message: &str) -> Option<PathBuf>;
}

pub const FATAL_ERROR_MESSAGE: &str = "Something went wrong. Please make sure you have \
    Internet access and the required permissions to install games on this computer.";

/// What the patcher knows so far in this run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PatcherState {
    pub install_dir: Option<InstallationPath>,
    pub self_outdated: Option<bool>,
    /// Set by `load_addon_versions`; patching is only legal once this is.
    pub versions: Option<AddonVersions>,
}

impl PatcherState {
    pub fn is_initialized(&self) -> bool {
        self.versions.is_some()
    }
}

pub struct Patcher {
    config: PatcherConfig,
    retriever: Box<dyn ArtifactRetriever>,
    search_roots: Option<Vec<PathBuf>>,
    state: PatcherState,
}

impl Patcher {
    pub fn new(config: PatcherConfig, retriever: Box<dyn ArtifactRetriever>) -> Self {
        Self {
            config,
            retriever,
            search_roots: None,
            state: PatcherState::default(),
        }
    }

    /// Search below `roots` instead of every mounted filesystem.
    pub fn with_search_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.search_roots = Some(roots);
        self
    }

    pub fn config(&self) -> &PatcherConfig {
        &self.config
    }

    pub fn state(&self) -> &PatcherState {
        &self.state
    }

    fn resolver(&self) -> VersionResolver<'_> {
        VersionResolver::new(&self.config, self.retriever.as_ref())
    }

    pub fn check_self_outdated(&mut self) -> anyhow::Result<bool> {
        let outdated = self.resolver().is_self_outdated()?;
        self.state.self_outdated = Some(outdated);
        Ok(outdated)
    }

    /// Selects the installation to patch. Any versions loaded for a previous
    /// installation are forgotten.
    pub fn set_install_dir(&mut self, path: &Path) -> Result<(), PatchError> {
        let install_dir = InstallationPath::new(path, &self.config)?;
        patcher_info!("Using installation at {:?}", install_dir.path());
        self.state.install_dir = Some(install_dir);
        self.state.versions = None;
        Ok(())
    }

    pub fn find_candidates(&self) -> Vec<InstallationPath> {
        match &self.search_roots {
            Some(roots) => find_candidates_in(roots, &self.config),
            None => find_candidates(&self.config),
        }
    }

    pub fn load_addon_versions(&mut self) -> anyhow::Result<&AddonVersions> {
        let install_dir = self
            .state
            .install_dir
            .as_ref()
            .ok_or_else(|| PatchError::InvalidState("No installation selected".to_string()))?;
        let versions = self.resolver().load_addon_versions(install_dir)?;
        let versions = self.state.versions.insert(versions);
        Ok(&*versions)
    }

    pub fn is_addon_outdated(&self) -> Result<bool, PatchError> {
        self.state
            .versions
            .as_ref()
            .map(AddonVersions::is_outdated)
            .ok_or_else(|| PatchError::InvalidState("Versions not loaded".to_string()))
    }

    /// Downloads the package for the installed application version and
    /// merges it into the installation.
    pub fn patch_installation(&self) -> anyhow::Result<()> {
        let (install_dir, versions) = match (&self.state.install_dir, &self.state.versions) {
            (Some(install_dir), Some(versions)) => (install_dir, versions),
            _ => anyhow::bail!(PatchError::InvalidState(
                "Versions not loaded".to_string()
            )),
        };

        let archive = match self.retriever.fetch_package(&versions.app_version) {
            Ok(archive) => archive,
            // The version marker for this application version exists, so
            // the package should too.
            Err(err) if crate::is_not_found(&err) => anyhow::bail!(PatchError::PackageMissing(
                format!("application version {}", versions.app_version)
            )),
            Err(err) => return Err(err),
        };
        apply_patch(&archive, install_dir.path())?;
        patcher_info!(
            "Add-on version {} installed into {:?}",
            versions.latest,
            install_dir.path()
        );
        Ok(())
    }

    /// Resolves the installation, asking the user when discovery doesn't
    /// find exactly one. Returns false if the user gave up.
    fn locate(&mut self, prompt: &mut dyn Prompt) -> bool {
        if self.state.install_dir.is_some() {
            return true;
        }

        let app = self.config.target_dir_name.clone();
        let mut candidates = self.find_candidates();
        if candidates.len() == 1 {
            self.state.install_dir = candidates.pop();
            return true;
        }

        if candidates.is_empty() {
            prompt.show(&format!(
                "Could not find your {app} install directory. Please select it manually."
            ));
        } else {
            prompt.show(&format!(
                "Found multiple {app} install directories in your computer. \
                Please select the correct one manually."
            ));
        }

        loop {
            let Some(path) = prompt.choose_directory(&format!("Select your {app} directory"))
            else {
                return false;
            };
            match self.set_install_dir(&path) {
                Ok(()) => return true,
                Err(err) => {
                    patcher_warn!("Rejected manual selection: {}", err);
                    prompt.show(&format!("Please select a valid {app} directory."));
                }
            }
        }
    }

    /// Runs the whole workflow. Only `Outcome::Applied` touches the
    /// installation; every `Err` is fatal for the run.
    pub fn run(&mut self, prompt: &mut dyn Prompt) -> anyhow::Result<Outcome> {
        let app = self.config.target_dir_name.clone();
        let addon = self.config.addon_name.clone();

        if self.check_self_outdated()? {
            prompt.show(&format!(
                "Your patcher is out of date. Please download the latest version from {}",
                self.config.releases_url
            ));
            return Ok(Outcome::SelfUpdateRequired);
        }

        if !self.locate(prompt) {
            prompt.show(&format!(
                "Exiting the patcher. Please make sure {app} is installed and try again."
            ));
            return Ok(Outcome::LocateAborted);
        }

        match self.load_addon_versions() {
            Ok(_) => {}
            Err(err) if is_not_found(&err) => {
                patcher_info!("No add-on published for this version: {}", err);
                prompt.show(&format!(
                    "Your version of {addon} is out of date, but the new version isn't \
                    available yet. Please wait for the new version to be released."
                ));
                return Ok(Outcome::VersionUnavailable);
            }
            Err(err) => return Err(err),
        }

        let question = if self.is_addon_outdated()? {
            format!("A new patch of {addon} is available. Apply patch?")
        } else {
            format!(
                "Your version of {addon} is already up to date. Do you want to patch it again?"
            )
        };
        if !prompt.confirm(&question) {
            prompt.show("Exiting the patcher.");
            return Ok(Outcome::Declined);
        }

        self.patch_installation()?;
        prompt.show("Your game has been patched. Enjoy!");
        Ok(Outcome::Applied)
    }

    /// Like [`Patcher::run`], but a fatal error is also logged, written to
    /// `error_log` and reported to the user before being returned.
    pub fn run_and_report(
        &mut self,
        prompt: &mut dyn Prompt,
        error_log: &Path,
    ) -> anyhow::Result<Outcome> {
        match self.run(prompt) {
            Ok(outcome) => {
                patcher_info!("Run finished: {}", outcome);
                Ok(outcome)
            }
            Err(err) => {
                patcher_error!("Run failed: {:?}", err);
                if let Err(log_err) = write_error_log(error_log, &err) {
                    patcher_warn!("Could not write error log: {}", log_err);
                }
                prompt.show(FATAL_ERROR_MESSAGE);
                Err(err)
            }
        }
    }
}
