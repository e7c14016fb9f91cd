//! One-shot "say" command

use std::error::Error;
use std::io;

use crate::cli::{record_turns, warn_missing_settings, write_outcome};
use crate::core::config::Config;
use crate::core::conversation::Conversation;
use crate::core::turn::TurnPipeline;
use crate::utils::logging::TranscriptLog;

pub async fn run_say(
    prompt: Vec<String>,
    config: &Config,
    transcript: &TranscriptLog,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: searchlight say <prompt>");
        std::process::exit(1);
    }

    warn_missing_settings(config);
    let pipeline = TurnPipeline::from_config(config)?;
    let mut conversation = Conversation::new();

    let result = pipeline.run_turn(&mut conversation, &prompt).await;
    record_turns(transcript, conversation.turns());

    match result {
        Ok(outcome) => {
            write_outcome(&mut io::stdout().lock(), &outcome, config.show_sources())?;
            Ok(())
        }
        Err(err) => {
            eprintln!("❌ Error: {err}");
            std::process::exit(1);
        }
    }
}
