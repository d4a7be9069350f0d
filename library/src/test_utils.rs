/// Helper methods for tests.
use std::collections::VecDeque;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::PatcherConfig;
use crate::updater::Prompt;

/// Creates `parent/<target_dir_name>` with both marker files. The product
/// metadata embeds `app_version` between some binary-looking noise.
pub fn write_fake_installation(parent: &Path, config: &PatcherConfig, app_version: &str) -> PathBuf {
    let install_dir = parent.join(&config.target_dir_name);
    let binary = config.binary_marker_path(&install_dir);
    fs::create_dir_all(binary.parent().unwrap()).unwrap();
    fs::write(&binary, "MZ").unwrap();
    let mut metadata = vec![0x0a, 0x12, 0x00];
    metadata.extend_from_slice(format!("\"{app_version}\"").as_bytes());
    metadata.extend_from_slice(&[0x1a, 0xff, 0x00]);
    fs::write(config.product_metadata_path(&install_dir), metadata).unwrap();
    install_dir
}

/// Creates a zip at `zip_path` holding `files` as (relative path, contents).
pub fn write_fake_package(zip_path: &Path, files: &[(&str, &str)]) {
    let mut zip = zip::ZipWriter::new(fs::File::create(zip_path).unwrap());
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, contents) in files {
        zip.start_file(*name, options).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// A [`Prompt`] with canned answers that records what it was asked.
/// Unscripted confirmations answer false and unscripted directory prompts
/// answer None.
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
