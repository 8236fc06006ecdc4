//! Confirmation prompts for destructive actions.

use std::io::{BufRead, Write};

use tracing::warn;

use crate::application::draft_state::Confirmation;

/// Always gives the same answer.  Used by `--yes` and by tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirmation for FixedAnswer {
    fn confirm(&mut self, _prompt: &str) -> bool {
        self.0
    }
}

/// Asks on a terminal-like stream pair and accepts `y` or `yes`.
///
/// An I/O error or end of input counts as "no".
pub struct PromptConfirmation<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirmation<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptConfirmation<std::io::StdinLock<'static>, std::io::Stderr> {
    /// Prompts on stderr so stdout stays machine-readable.
    pub fn terminal() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> Confirmation for PromptConfirmation<R, W> {
    fn confirm(&mut self, prompt: &str) -> bool {
        if let Err(e) = write!(self.output, "{prompt} [y/N] ").and_then(|_| self.output.flush()) {
            warn!("could not show confirmation prompt: {e}");
            return false;
        }
        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(e) => {
                warn!("could not read confirmation: {e}");
                false
            }
        }
    }
}
