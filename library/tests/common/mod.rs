use std::collections::VecDeque;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use patcher::{PatcherConfig, Prompt};

pub const APP_VERSION: &str = "24.0.0.158725";

/// Defaults pointed at a mock server, with the running patcher version.
pub fn config_for_server(server: &mockito::ServerGuard) -> PatcherConfig {
    PatcherConfig {
        addon_base_url: format!("{}/addon", server.url()),
        patcher_base_url: format!("{}/patcher", server.url()),
        patcher_version: "1.0.1".to_string(),
        ..PatcherConfig::default()
    }
}

pub fn write_installation(parent: &Path, config: &PatcherConfig, app_version: &str) -> PathBuf {
    let install_dir = parent.join(&config.target_dir_name);
    let binary = config.binary_marker_path(&install_dir);
    fs::create_dir_all(binary.parent().unwrap()).unwrap();
    fs::write(&binary, "MZ").unwrap();
    let mut metadata = b"\x0a\x0dhearthstone\x12".to_vec();
    metadata.extend_from_slice(app_version.as_bytes());
    metadata.push(0);
    fs::write(config.product_metadata_path(&install_dir), metadata).unwrap();
    install_dir
}

/// Zip bytes holding `files` as (relative path, contents).
pub fn package_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default();
    for (name, contents) in files {
        zip.start_file(*name, options).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    pub confirmations: VecDeque<bool>,
    pub directories: VecDeque<Option<PathBuf>>,
    pub messages: Vec<String>,
    pub questions: Vec<String>,
}

impl ScriptedPrompt {
    pub fn confirming(mut self, answer: bool) -> Self {
        self.confirmations.push_back(answer);
        self
    }

    pub fn choosing(mut self, answer: Option<PathBuf>) -> Self {
        self.directories.push_back(answer);
        self
    }
}

impl Prompt for ScriptedPrompt {
    fn show(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }

    fn confirm(&mut self, question: &str) -> bool {
        self.questions.push(question.to_string());
        self.confirmations.pop_front().unwrap_or(false)
    }

    fn choose_directory(&mut self, message: &str) -> Option<PathBuf> {
        self.questions.push(message.to_string());
        self.directories.pop_front().flatten()
    }
}
