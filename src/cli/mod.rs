//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod chat;
pub mod gateway;
pub mod say;

use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;

use crate::cli::chat::run_chat;
use crate::cli::gateway::{run_call, run_tools};
use crate::cli::say::run_say;
use crate::core::config::Config;
use crate::core::message::ConversationTurn;
use crate::core::search::GatewayKind;
use crate::core::turn::TurnOutcome;
use crate::logging::init_tracing;
use crate::utils::logging::TranscriptLog;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ngit: ",
    env!("VERGEN_GIT_DESCRIBE"),
    " (",
    env!("VERGEN_GIT_SHA"),
    ")\nbuilt: ",
    env!("VERGEN_BUILD_DATE"),
    " with rustc ",
    env!("VERGEN_RUSTC_SEMVER"),
);

#[derive(Parser)]
#[command(name = "searchlight", version, long_version = LONG_VERSION)]
#[command(about = "Chat with a language model that can search papers and the web through MCP gateways")]
#[command(
    long_about = "Searchlight is a line-oriented chat client. When a message asks for a search \
(\"search <topic> on the web\", \"search <topic> on hugging face\"), it calls the matching tool \
on an MCP gateway and hands the results to the language model together with the recent \
conversation.\n\n\
Environment Variables (override the config file):\n\
  BASE_URL          OpenAI-compatible API base URL, e.g. http://localhost:11434/v1\n\
  MODEL_NAME        Model to request completions from\n\
  API_KEY           Bearer token for the model API (optional)\n\
  LOCAL_MCP_HOST    MCP gateway serving web search\n\
  REMOTE_MCP_HOST   MCP gateway serving paper search\n\
  RUST_LOG          Diagnostic log filter (default: warn)\n\n\
Chat commands:\n\
  /quit             Leave the chat (Ctrl+D works too)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file to read instead of the per-user default
    #[arg(short = 'c', long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Model to use for chat (overrides MODEL_NAME)
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Append the conversation to the specified file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Diagnostic log filter, e.g. "debug" or "searchlight=trace"
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat on stdin/stdout (default)
    Chat,
    /// Send one message, print the reply, and exit
    Say {
        /// Message text (can be multiple words)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Call a tool on a gateway directly and print its text
    Call {
        /// Gateway to call
        #[arg(short, long, value_enum)]
        gateway: GatewayArg,
        /// Tool name, e.g. "search" or "paper_search"
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(short, long = "args", value_name = "JSON")]
        arguments: Option<String>,
    },
    /// List the tools a gateway offers
    Tools {
        /// Gateway to query
        #[arg(short, long, value_enum)]
        gateway: GatewayArg,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum GatewayArg {
    /// LOCAL_MCP_HOST
    Local,
    /// REMOTE_MCP_HOST
    Remote,
}

impl From<GatewayArg> for GatewayKind {
    fn from(value: GatewayArg) -> Self {
        match value {
            GatewayArg::Local => GatewayKind::Local,
            GatewayArg::Remote => GatewayKind::Remote,
        }
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(model) = args.model {
        config.model = Some(model);
    }

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let transcript = TranscriptLog::new(args.log)?;
            run_chat(&config, &transcript).await
        }
        Commands::Say { prompt } => {
            let transcript = TranscriptLog::new(args.log)?;
            run_say(prompt, &config, &transcript).await
        }
        Commands::Call {
            gateway,
            tool,
            arguments,
        } => run_call(&config, gateway.into(), &tool, arguments.as_deref()).await,
        Commands::Tools { gateway } => run_tools(&config, gateway.into()).await,
    }
}

pub(crate) fn warn_missing_settings(config: &Config) {
    for setting in config.missing_settings() {
        eprintln!("⚠️  {setting} is not set");
    }
}

/// Prints the reply, then each search's heading and text when enabled.
pub(crate) fn write_outcome<W: Write>(
    out: &mut W,
    outcome: &TurnOutcome,
    show_sources: bool,
) -> io::Result<()> {
    writeln!(out, "{}", outcome.reply)?;
    if show_sources {
        for section in outcome.sources() {
            writeln!(out)?;
            writeln!(out, "{}", section.heading)?;
            writeln!(out, "{}", section.body)?;
        }
    }
    out.flush()
}

pub(crate) fn record_turns(transcript: &TranscriptLog, turns: &[ConversationTurn]) {
    for turn in turns {
        if let Err(err) = transcript.log_turn(turn) {
            warn!("Failed to write transcript: {err}");
        }
    }
}
