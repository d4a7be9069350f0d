// This file's job is to deal with the remote side of the patcher: fetching
// version markers and packages and handing back local file paths.

use anyhow::{bail, Context};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{
    PatcherConfig, ADDON_VERSION_FILE_NAME, PACKAGE_FILE_NAME, PATCHER_VERSION_FILE_NAME,
};
use crate::file_errors::{FileOperation, IoResultExt};
use crate::PatchError;

const USER_AGENT: &str = "HSAPatcher";

/// Fetches remote artifacts into local files.
///
/// Every method fails with an error whose chain contains
/// [`PatchError::NotFound`] when the artifact doesn't exist remotely, and
/// with some other error for any other failure. See [`crate::is_not_found`].
#[cfg_attr(test, mockall::automock)]
pub trait ArtifactRetriever {
    /// The marker holding the latest published patcher version.
    fn fetch_patcher_version_marker(&self) -> anyhow::Result<PathBuf>;

    /// The marker holding the latest add-on version for `app_version`.
    fn fetch_addon_version_marker(&self, app_version: &str) -> anyhow::Result<PathBuf>;

    /// The package archive for `app_version`.
    fn fetch_package(&self, app_version: &str) -> anyhow::Result<PathBuf>;
}

pub type DownloadFileFn = fn(&str, Option<&str>) -> anyhow::Result<Vec<u8>>;

/// A container for network callbacks which can be mocked out for testing.
#[derive(Clone)]
pub struct NetworkHooks {
    /// The function to call to download a file, given a url and an optional
    /// auth token.
    pub download_file_fn: DownloadFileFn,
}

// We have to implement Debug by hand since fn types don't implement it.
impl core::fmt::Debug for NetworkHooks {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkHooks")
            .field("download_file_fn", &"<fn>")
            .finish()
    }
}

impl Default for NetworkHooks {
    fn default() -> Self {
        Self {
            download_file_fn: download_file_default,
        }
    }
}

pub fn download_file_default(url: &str, auth_token: Option<&str>) -> anyhow::Result<Vec<u8>> {
    let client = reqwest::blocking::Client::new();
    let mut request = client
        .get(url)
        .header(reqwest::header::USER_AGENT, USER_AGENT);
    if let Some(token) = auth_token {
        request = request.header(reqwest::header::AUTHORIZATION, format!("token {token}"));
    }
    let response = handle_network_result(url, request.send())?;
    // Markers are a few bytes and packages a few megabytes, so this is ok to
    // keep in memory.
    let bytes = response.bytes()?;
    Ok(bytes.to_vec())
}

/// Handles the result of a network request, returning the response if it was
/// successful, [`PatchError::NotFound`] for a 404, a special error if the
/// request failed due to a lack of internet connection, or a generic error.
fn handle_network_result(
    url: &str,
    result: Result<reqwest::blocking::Response, reqwest::Error>,
) -> anyhow::Result<reqwest::blocking::Response> {
    use std::error::Error;

    match result {
        Ok(response) => {
            let status = response.status();
            if status.is_success() {
                Ok(response)
            } else if status == reqwest::StatusCode::NOT_FOUND {
                bail!(PatchError::NotFound(url.to_string()))
            } else {
                bail!("Request failed with status: {}", status)
            }
        }
        Err(e) => match e.source() {
            Some(source)
                if source
                    .to_string()
                    .contains("failed to lookup address information") =>
            {
                bail!("Download failed due to network error. Please check your internet connection.");
            }
            _ => bail!(e),
        },
    }
}

pub fn download_to_path(
    network_hooks: &NetworkHooks,
    url: &str,
    auth_token: Option<&str>,
    path: &Path,
) -> anyhow::Result<()> {
    patcher_debug!("Downloading: {}", url);
    let download_file_hook = network_hooks.download_file_fn;
    let bytes = download_file_hook(url, auth_token)?;
    // Ensure the download directory exists.
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_file_context(FileOperation::CreateDir, parent)?;
    }

    patcher_debug!("Writing download to: {:?}", path);
    let mut file = File::create(path).with_file_context(FileOperation::CreateFile, path)?;
    file.write_all(&bytes)
        .with_file_context(FileOperation::WriteFile, path)?;
    Ok(())
}

/// Retrieves artifacts over HTTP into a temporary directory which lives as
/// long as the retriever. Dropping the retriever removes everything it
/// downloaded; failures to do so are ignored.
#[derive(Debug)]
pub struct HttpRetriever {
    config: PatcherConfig,
    network_hooks: NetworkHooks,
    download_dir: tempfile::TempDir,
}

impl HttpRetriever {
    pub fn new(config: &PatcherConfig) -> anyhow::Result<Self> {
        Self::with_hooks(config, NetworkHooks::default())
    }

    pub fn with_hooks(config: &PatcherConfig, network_hooks: NetworkHooks) -> anyhow::Result<Self> {
        let download_dir = tempfile::Builder::new()
            .prefix("patcher-")
            .tempdir()
            .context("Failed to create a temporary download directory")?;
        patcher_debug!("Download directory: {:?}", download_dir.path());
        Ok(Self {
            config: config.clone(),
            network_hooks,
            download_dir,
        })
    }

    pub fn download_dir(&self) -> &Path {
        self.download_dir.path()
    }

    fn retrieve(&self, url: &str, file_name: &str) -> anyhow::Result<PathBuf> {
        let path = self.download_dir.path().join(file_name);
        download_to_path(
            &self.network_hooks,
            url,
            self.config.auth_token.as_deref(),
            &path,
        )
        .with_context(|| format!("Error retrieving file {file_name} from url: {url}"))?;
        Ok(path)
    }
}

impl ArtifactRetriever for HttpRetriever {
    fn fetch_patcher_version_marker(&self) -> anyhow::Result<PathBuf> {
        self.retrieve(&self.config.patcher_version_url(), PATCHER_VERSION_FILE_NAME)
    }

    fn fetch_addon_version_marker(&self, app_version: &str) -> anyhow::Result<PathBuf> {
        self.retrieve(
            &self.config.addon_version_url(app_version),
            ADDON_VERSION_FILE_NAME,
        )
    }

    fn fetch_package(&self, app_version: &str) -> anyhow::Result<PathBuf> {
        self.retrieve(&self.config.package_url(app_version), PACKAGE_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::{ArtifactRetriever, HttpRetriever, NetworkHooks};
    use crate::config::PatcherConfig;
    use crate::{is_not_found, PatchError};

    fn config_for_server(server: &mockito::ServerGuard) -> PatcherConfig {
        PatcherConfig {
            addon_base_url: format!("{}/addon", server.url()),
            patcher_base_url: format!("{}/patcher", server.url()),
            ..PatcherConfig::default()
        }
    }

    #[test]
    fn network_hooks_debug() {
        let network_hooks = NetworkHooks::default();
        let debug = format!("{:?}", network_hooks);
        assert!(debug.contains("download_file_fn"));
    }

    #[test]
    fn handle_network_result_ok() {
        let http_response = http::response::Builder::new()
            .status(200)
            .body("".to_string())
            .unwrap();
        let response = reqwest::blocking::Response::from(http_response);

        let result = super::handle_network_result("url", Ok(response));

        assert!(result.is_ok());
    }

    #[test]
    fn handle_network_result_not_found() {
        let http_response = http::response::Builder::new()
            .status(404)
            .body("".to_string())
            .unwrap();
        let response = reqwest::blocking::Response::from(http_response);

        let err = super::handle_network_result("http://x/patch.zip", Ok(response)).unwrap_err();

        assert!(is_not_found(&err));
        assert_eq!(
            err.downcast_ref::<PatchError>(),
            Some(&PatchError::NotFound("http://x/patch.zip".to_string()))
        );
    }

    #[test]
    fn handle_network_result_http_status_not_ok() {
        let http_response = http::response::Builder::new()
            .status(500)
            .body("".to_string())
            .unwrap();
        let response = reqwest::blocking::Response::from(http_response);

        let err = super::handle_network_result("url", Ok(response)).unwrap_err();

        assert!(!is_not_found(&err));
        assert_eq!(
            err.to_string(),
            "Request failed with status: 500 Internal Server Error"
        );
    }

    #[test]
    fn handle_network_result_unknown_error() {
        let err = super::download_file_default("asdfasdf", None).unwrap_err();
        assert!(!is_not_found(&err));
        assert!(err.to_string().contains("builder error"));
    }

    #[test]
    fn downloads_markers_with_headers() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/patcher/master/patcher-version")
            .match_header("user-agent", "HSAPatcher")
            .match_header("authorization", "token secret")
            .with_status(200)
            .with_body("1.0.1")
            .create();

        let config = PatcherConfig {
            auth_token: Some("secret".to_string()),
            ..config_for_server(&server)
        };
        let retriever = HttpRetriever::new(&config).unwrap();
        let path = retriever.fetch_patcher_version_marker().unwrap();

        mock.assert();
        assert!(path.starts_with(retriever.download_dir()));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "1.0.1");
    }

    #[test]
    fn addon_marker_and_package_are_keyed_by_app_version() {
        let mut server = mockito::Server::new();
        let marker = server
            .mock("GET", "/addon/1.2.3.4500/hsa-version")
            .with_status(200)
            .with_body("7")
            .create();
        let package = server
            .mock("GET", "/addon/1.2.3.4500/patch.zip")
            .with_status(200)
            .with_body(vec![1u8, 2, 3])
            .create();

        let retriever = HttpRetriever::new(&config_for_server(&server)).unwrap();
        let marker_path = retriever.fetch_addon_version_marker("1.2.3.4500").unwrap();
        let package_path = retriever.fetch_package("1.2.3.4500").unwrap();

        marker.assert();
        package.assert();
        assert_eq!(std::fs::read_to_string(marker_path).unwrap(), "7");
        assert_eq!(package_path.file_name().unwrap(), "patch.zip");
        assert_eq!(std::fs::read(package_path).unwrap(), vec![1u8, 2, 3]);
    }

    #[test]
    fn missing_remote_file_is_not_found() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/addon/9.9.9.9/hsa-version")
            .with_status(404)
            .create();

        let retriever = HttpRetriever::new(&config_for_server(&server)).unwrap();
        let err = retriever.fetch_addon_version_marker("9.9.9.9").unwrap_err();

        assert!(is_not_found(&err));
        assert!(err.to_string().contains("Error retrieving file hsa-version"));
    }

    #[test]
    fn server_error_is_not_not_found() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/patcher/master/patcher-version")
            .with_status(503)
            .create();

        let retriever = HttpRetriever::new(&config_for_server(&server)).unwrap();
        let err = retriever.fetch_patcher_version_marker().unwrap_err();

        assert!(!is_not_found(&err));
    }

    #[test]
    fn hooks_replace_the_network() {
        fn fake_download(url: &str, _auth_token: Option<&str>) -> anyhow::Result<Vec<u8>> {
            Ok(format!("fetched {url}").into_bytes())
        }

        let config = PatcherConfig {
            patcher_base_url: "http://example.invalid/patcher".to_string(),
            ..PatcherConfig::default()
        };
        let retriever = HttpRetriever::with_hooks(
            &config,
            NetworkHooks {
                download_file_fn: fake_download,
            },
        )
        .unwrap();
        let path = retriever.fetch_patcher_version_marker().unwrap();
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "fetched http://example.invalid/patcher/master/patcher-version"
        );
    }

    #[test]
    fn dropping_retriever_removes_downloads() {
        fn fake_download(_url: &str, _auth_token: Option<&str>) -> anyhow::Result<Vec<u8>> {
            Ok(b"1".to_vec())
        }

        let retriever = HttpRetriever::with_hooks(
            &PatcherConfig::default(),
            NetworkHooks {
                download_file_fn: fake_download,
            },
        )
        .unwrap();
        let path = retriever.fetch_patcher_version_marker().unwrap();
        let download_dir = retriever.download_dir().to_path_buf();
        assert!(path.exists());

        drop(retriever);
        assert!(!download_dir.exists());
    }
}
