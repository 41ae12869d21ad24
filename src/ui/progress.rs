use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::ui::renderer::SpinnerHandle;

const SPINNER_TICK: Duration = Duration::from_millis(80);

/// Stands in for a spinner when stdout is not a terminal.
#[derive(Debug, Default)]
pub struct NoopSpinnerHandle;

impl SpinnerHandle for NoopSpinnerHandle {
    fn set_message(&self, _message: &str) {}

    fn finish_success(&self, _message: &str) {}

    fn finish_error(&self, _message: &str) {}
}

/// Animated spinner shown while a link is being opened. `ProgressBar` is a
/// shared handle already, so clones drive the same spinner.
#[derive(Debug, Clone)]
pub struct IndicatifSpinnerHandle {
    bar: ProgressBar,
}

impl IndicatifSpinnerHandle {
    pub fn start(label: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(label.to_owned());
        bar.enable_steady_tick(SPINNER_TICK);
        Self { bar }
    }

    pub fn from_bar(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl SpinnerHandle for IndicatifSpinnerHandle {
    fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_owned());
    }

    fn finish_success(&self, message: &str) {
        self.bar.finish_with_message(message.to_owned());
    }

    fn finish_error(&self, message: &str) {
        self.bar.abandon_with_message(message.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_spinner_keeps_its_last_message() {
        let handle = IndicatifSpinnerHandle::from_bar(ProgressBar::hidden());
        handle.set_message("Opening /dev/ttyUSB1");
        handle.finish_error("Open failed");
        assert_eq!(handle.bar.message(), "Open failed");
        assert!(handle.bar.is_finished());
    }
}
