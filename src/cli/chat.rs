//! Line-oriented interactive chat

use std::error::Error;
use std::io::{self, Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::cli::{record_turns, warn_missing_settings, write_outcome};
use crate::core::chat_stream::LanguageModel;
use crate::core::config::Config;
use crate::core::conversation::Conversation;
use crate::core::turn::TurnPipeline;
use crate::mcp::client::ToolGateway;
use crate::utils::logging::TranscriptLog;

pub const USAGE_HINT: &str = "search X on the web | search X on hugging face";

pub async fn run_chat(config: &Config, transcript: &TranscriptLog) -> Result<(), Box<dyn Error>> {
    warn_missing_settings(config);
    let pipeline = TurnPipeline::from_config(config)?;

    println!("{USAGE_HINT}");
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = io::stdout();
    chat_loop(&pipeline, stdin, &mut stdout, config.show_sources(), transcript).await?;
    Ok(())
}

fn is_exit_command(input: &str) -> bool {
    matches!(input, "/quit" | "/exit")
}

/// Runs turns until `/quit` or end of input and returns the conversation.
/// Model failures are reported and the loop keeps going. Lines that are not
/// valid UTF-8 are decoded lossily rather than ending the session.
pub(crate) async fn chat_loop<G, M, R, W>(
    pipeline: &TurnPipeline<G, M>,
    mut reader: R,
    out: &mut W,
    show_sources: bool,
    transcript: &TranscriptLog,
) -> Result<Conversation, Box<dyn Error>>
where
    G: ToolGateway,
    M: LanguageModel,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut conversation = Conversation::new();
    let mut buf = Vec::new();

    loop {
        write!(out, "> ")?;
        out.flush()?;

        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            writeln!(out)?;
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if is_exit_command(input) {
            break;
        }

        let before = conversation.len();
        match pipeline.run_turn(&mut conversation, input).await {
            Ok(outcome) => write_outcome(out, &outcome, show_sources)?,
            Err(err) => eprintln!("❌ {err}"),
        }
        record_turns(transcript, &conversation.turns()[before..]);
    }

    Ok(conversation)
}
