use clap::Parser;
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub debug: Option<bool>,
    /// Command used to open the commit-message surface from the CLI shell.
    /// Falls back to `$EDITOR`, then `vi`.
    pub editor: Option<String>,
}

impl Config {
    pub fn load() -> color_eyre::eyre::Result<Self> {
        let config_path = Self::get_config_path();

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    fn get_config_path() -> PathBuf {
        config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gitpane")
            .join("config.json")
    }

    pub fn merge_with_args(&self, args: &Args) -> Self {
        Self {
            debug: if args.debug { Some(true) } else { self.debug },
            editor: args.editor.clone().or_else(|| self.editor.clone()),
        }
    }

    /// Resolve the editor command with its fallback chain.
    pub fn editor_command(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok())
            .unwrap_or_else(|| "vi".to_string())
    }
}

#[derive(Debug, Clone, Parser)]
#[command(about = "Version-control panel for the folder of the active file")]
pub struct Args {
    #[arg(short, long, help = "Print version information and exit")]
    pub version: bool,

    #[arg(short, long, help = "Enable debug logging")]
    pub debug: bool,

    #[arg(long, help = "Editor command for the commit-message surface")]
    pub editor: Option<String>,

    #[arg(help = "Active file (the panel shows its containing folder)")]
    pub file: Option<PathBuf>,

    #[arg(long, help = "Initialize a repository when the folder has none")]
    pub init: bool,

    #[arg(long, value_name = "PATH", help = "Track these untracked files")]
    pub track: Vec<PathBuf>,

    #[arg(long, value_name = "PATH", help = "Stage these changed files")]
    pub stage: Vec<PathBuf>,

    #[arg(long, help = "Stage every pending change")]
    pub stage_all: bool,

    #[arg(long, value_name = "PATH", help = "Append these paths to .gitignore")]
    pub ignore: Vec<PathBuf>,

    #[arg(long, help = "Edit a commit message and commit when the editor closes")]
    pub commit: bool,
}
