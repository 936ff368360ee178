//! Confirmation prompts for destructive batches.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use imgdeck_core::{Confirm, ConfirmPrompt};
use tracing::warn;

/// Asks on the terminal and reads the answer from stdin.
pub struct StdinConfirm;

#[async_trait]
impl Confirm for StdinConfirm {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        let question = format!("{}: {} [y/N] ", prompt.title, prompt.message);
        match tokio::task::spawn_blocking(move || ask(&question)).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                warn!(error = %e, "could not read confirmation");
                false
            }
            Err(e) => {
                warn!(error = %e, "confirmation task failed");
                false
            }
        }
    }
}

fn ask(question: &str) -> io::Result<bool> {
    let mut stderr = io::stderr();
    stderr.write_all(question.as_bytes())?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(is_yes(&line))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Accepts every prompt, for `--yes`.
pub struct AutoConfirm;

#[async_trait]
impl Confirm for AutoConfirm {
    async fn confirm(&self, _prompt: &ConfirmPrompt) -> bool {
        true
    }
}
