//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Provider override for `--provider`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    Dashscope,
    Zhipu,
    Openai,
}

/// Which generated files `delete` removes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    Images,
    Audio,
    Both,
}

impl CategoryArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryArg::Images => "images",
            CategoryArg::Audio => "audio",
            CategoryArg::Both => "both",
        }
    }
}

/// CLI arguments for mmagent
#[derive(Parser, Debug)]
#[command(name = "mmagent")]
#[command(author, version, about = "Multimodal generation with human approval")]
#[command(long_about = r#"
mmagent generates picture-book assets (illustrations, dialogue scripts and
voice lines) through DashScope, Zhipu or OpenAI-compatible providers. Every
generation step asks for approval on the console before it runs.

Configuration files are loaded from (later wins):
1. ~/.config/mmagent/config.toml   Global config
2. ./mmagent.toml                  Project-level config
3. --config <path>                 Explicit config file
4. MMAGENT_* environment variables (e.g. MMAGENT_POLLER__INTERVAL_MS=500)

Example:
  mmagent image "a fox reading under a lamp" --style watercolor
  mmagent edit "make it night time" images/image_1718000000000_ab12cd34.png
  mmagent speak "Hello there" "Good night" --voice english_female
  mmagent describe images/image_1718000000000_ab12cd34.png
  mmagent delete --category audio
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Session to read from and write to (default: from config)
    #[arg(short, long, value_name = "ID", global = true)]
    pub session: Option<String>,

    /// Provider for multimodal calls, overriding the config
    #[arg(short, long, value_enum, global = true)]
    pub provider: Option<ProviderArg>,

    /// Approve every request without asking
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate an illustration from a prompt
    Image {
        prompt: String,

        /// Image size as W*H
        #[arg(long)]
        size: Option<String>,

        #[arg(long)]
        style: Option<String>,

        /// What the image must not contain
        #[arg(long)]
        negative_prompt: Option<String>,
    },

    /// Edit images from the session with a prompt
    Edit {
        prompt: String,

        /// Reference images relative to the session
        #[arg(required = true)]
        image_paths: Vec<String>,

        /// Image size as W*H
        #[arg(long)]
        size: Option<String>,

        /// Model instead of the provider's edit model
        #[arg(long)]
        model: Option<String>,
    },

    /// Synthesize one audio file per line
    Speak {
        #[arg(required = true)]
        texts: Vec<String>,

        /// Voice alias (chinese_female, chinese_male, english_female, english_male)
        #[arg(long)]
        voice: Option<String>,

        /// Extension for downloaded audio
        #[arg(long)]
        format: Option<String>,
    },

    /// Write a dialogue script for an image in the session
    Describe {
        /// Image path relative to the session
        image_path: String,

        /// Extra instructions for the script
        #[arg(long)]
        prompt: Option<String>,
    },

    /// Delete generated images and audio
    Delete {
        #[arg(long, value_enum, default_value = "both")]
        category: CategoryArg,

        /// Specific paths instead of a whole category
        paths: Vec<String>,
    },

    /// List the available tools
    Tools,

    /// Show configuration file locations and the merged configuration
    Config,
}
