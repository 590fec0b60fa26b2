//! Chat Command
//!
//! Interactive tutor session; one line per message, empty line or EOF quits.
//!
//! Usage:
//!   wordwise chat [MESSAGE]

use std::io::Write;

use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::CommandContext;
use crate::types::{ChatMessage, Result};

pub async fn run(ctx: &CommandContext, first_message: Option<String>) -> Result<()> {
    let mut history: Vec<ChatMessage> = Vec::new();

    if let Some(message) = first_message {
        ask(ctx, &mut history, &message).await?;
        return Ok(());
    }

    eprintln!(
        "{}",
        style("Chat with your vocabulary tutor. Empty line to quit.").dim()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("{} ", style("you>").cyan().bold());
        std::io::stderr().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            break;
        }
        ask(ctx, &mut history, message).await?;
    }

    Ok(())
}

async fn ask(ctx: &CommandContext, history: &mut Vec<ChatMessage>, message: &str) -> Result<()> {
    let mut stdout = std::io::stdout();
    let reply = ctx
        .assistant
        .chat(history, message, |chunk| {
            let _ = write!(stdout, "{}", chunk);
            let _ = stdout.flush();
        })
        .await;

    if let Some(reply) = reply {
        println!();
        history.push(ChatMessage::user(message));
        history.push(ChatMessage::model(reply));
    }
    Ok(())
}
