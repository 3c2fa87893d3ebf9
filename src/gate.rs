use crate::editor::EditorState;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::sync::Mutex;
use std::time::Duration;

/// Decides whether a pending deletion goes ahead.
pub trait ConfirmationGate {
    fn confirm(&self, target_id: &str) -> bool;
}

/// Asks on the terminal before deleting.
pub struct PromptGate;

impl ConfirmationGate for PromptGate {
    fn confirm(&self, target_id: &str) -> bool {
        print!("Delete animal {}? This cannot be undone. [y/N] ", target_id);
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(_) => false,
        }
    }
}

/// Approves every deletion (`--yes`).
pub struct AssumeYes;

impl ConfirmationGate for AssumeYes {
    fn confirm(&self, _target_id: &str) -> bool {
        true
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Spinner shown while the editor is blocked on a request.
#[derive(Default)]
pub struct Overlay {
    bar: Mutex<Option<ProgressBar>>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, state: &EditorState) {
        let mut bar = self.bar.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let message = match state {
            EditorState::Saving => "Saving animal...",
            EditorState::Deleting => "Deleting animal...",
            _ => {
                if let Some(bar) = bar.take() {
                    bar.finish_and_clear();
                }
                return;
            }
        };

        let spinner = bar.get_or_insert_with(|| {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]") {
                spinner.set_style(style);
            }
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner
        });
        spinner.set_message(message);
    }
}
