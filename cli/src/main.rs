use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use patcher::{HttpRetriever, Patcher, PatcherConfig, Prompt, DEFAULT_ERROR_LOG};

#[derive(Debug, Clone, Parser)]
#[command(about, version)]
struct Args {
    /// Installation to patch. Skips the search, but is still validated.
    #[arg(long, value_name = "path")]
    install_dir: Option<PathBuf>,

    /// YAML file overriding the built-in configuration.
    #[arg(long, value_name = "file")]
    config: Option<PathBuf>,

    /// Answer yes to every confirmation.
    #[arg(short, long)]
    yes: bool,

    /// Where to write the details of a fatal error.
    #[arg(long, value_name = "file", default_value = DEFAULT_ERROR_LOG)]
    error_log: PathBuf,
}

/// A [`Prompt`] on a line based terminal.
struct ConsolePrompt<R, W> {
    input: R,
    output: W,
    assume_yes: bool,
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    fn new(input: R, output: W, assume_yes: bool) -> Self {
        Self {
            input,
            output,
            assume_yes,
        }
    }

    /// The next line without its line ending. None on end of input or a
    /// read error.
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

impl<R: BufRead, W: Write> Prompt for ConsolePrompt<R, W> {
    fn show(&mut self, message: &str) {
        let _ = writeln!(self.output, "{message}");
    }

    fn confirm(&mut self, question: &str) -> bool {
        if self.assume_yes {
            let _ = writeln!(self.output, "{question} [y/N] y");
            return true;
        }
        let _ = write!(self.output, "{question} [y/N] ");
        let _ = self.output.flush();
        self.read_line().map(|answer| is_yes(&answer)).unwrap_or(false)
    }

    fn choose_directory(&mut self, message: &str) -> Option<PathBuf> {
        let _ = write!(self.output, "{message} (leave empty to cancel): ");
        let _ = self.output.flush();
        self.read_line()
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<PatcherConfig> {
    let Some(path) = path else {
        return Ok(PatcherConfig::default());
    };
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    Ok(PatcherConfig::from_yaml(&yaml)?)
}

fn run(args: &Args, prompt: &mut dyn Prompt) -> anyhow::Result<()> {
    let config = load_config(args.config.as_ref())?;
    let retriever = HttpRetriever::new(&config)?;
    let mut patcher = Patcher::new(config, Box::new(retriever));
    if let Some(install_dir) = &args.install_dir {
        patcher.set_install_dir(install_dir)?;
    }
    patcher.run_and_report(prompt, &args.error_log)?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    patcher::init_logging();

    let stdin = std::io::stdin();
    let mut prompt = ConsolePrompt::new(stdin.lock(), std::io::stdout(), args.yes);
    match run(&args, &mut prompt) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
