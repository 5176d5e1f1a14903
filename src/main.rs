mod autofill;
mod calc;
mod cmd;
mod data;
mod dom;
mod error;
mod ui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "leave-autofill", about = "fill leave-request forms from saved settings")]
struct Cli {
    /// Path to the data directory holding settings.json and config.yaml (default: ./config)
    #[arg(long, default_value = "./config")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default settings store and autofill config
    Init,
    /// List the saved identity and reason presets
    Presets,
    /// Run the autofill against a page described in YAML and print the result
    Preview {
        /// YAML page description
        #[arg(long)]
        page: PathBuf,
        /// Date to fill instead of the local date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
        /// Gestures replayed on the reason field afterwards, comma separated:
        /// click, key names (ArrowDown, ArrowUp, Enter, Escape), hover:N, pick:N
        #[arg(long, value_delimiter = ',')]
        press: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The settings panel owns the terminal, so it logs nothing unless asked.
    let default_filter = if cli.command.is_none() { "off" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let data_dir = if cli.data_dir.is_absolute() {
        cli.data_dir.clone()
    } else {
        std::env::current_dir()?.join(&cli.data_dir)
    };
    data::persistence::set_data_dir(data_dir.clone());

    // Auto-init when the data directory is missing or empty and the user did not
    // explicitly invoke the `init` subcommand.
    let is_init_command = matches!(cli.command, Some(Commands::Init));
    if !is_init_command && dir_needs_init(&data_dir) {
        eprintln!(
            "Data directory '{}' is missing or empty, running init...",
            data_dir.display()
        );
        cmd::init::run()?;
    }

    match cli.command {
        None => cmd::root::run(),
        Some(Commands::Init) => cmd::init::run(),
        Some(Commands::Presets) => cmd::presets::run(),
        Some(Commands::Preview { page, today, press }) => {
            cmd::preview::run(&page, today.as_deref(), &press)
        }
    }
}

/// Returns true when `dir` does not exist or exists but contains no files.
fn dir_needs_init(dir: &std::path::Path) -> bool {
    if !dir.exists() {
        return true;
    }
    dir.read_dir()
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_dir_needs_init_nonexistent() {
        let tmp = TempDir::new().unwrap();
        assert!(dir_needs_init(&tmp.path().join("does_not_exist")));
    }

    #[test]
    fn test_dir_needs_init_empty_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(dir_needs_init(tmp.path()));
    }

    #[test]
    fn test_dir_needs_init_after_settings_written() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("settings.json"), "{}").unwrap();
        assert!(!dir_needs_init(tmp.path()));
    }

    #[test]
    fn test_cli_parses_preview() {
        let cli = Cli::parse_from([
            "leave-autofill",
            "--data-dir",
            "/tmp/x",
            "preview",
            "--page",
            "page.yaml",
            "--today",
            "2024-03-04",
            "--press",
            "click,ArrowDown,Enter",
        ]);
        assert_eq!(cli.data_dir, PathBuf::from("/tmp/x"));
        match cli.command {
            Some(Commands::Preview { page, today, press }) => {
                assert_eq!(page, PathBuf::from("page.yaml"));
                assert_eq!(today.as_deref(), Some("2024-03-04"));
                assert_eq!(press, vec!["click", "ArrowDown", "Enter"]);
            }
            _ => panic!("expected preview"),
        }
    }

    #[test]
    fn test_cli_without_subcommand_opens_panel() {
        let cli = Cli::parse_from(["leave-autofill"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.data_dir, PathBuf::from("./config"));
    }
}
