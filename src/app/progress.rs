//! Transfer progress reporting
//!
//! Downloads and staging copies report bytes moved through the
//! [`TransferProgress`] sink. [`TransferBar`] draws an indicatif bar;
//! [`NoProgress`] discards updates.

use indicatif::{ProgressBar, ProgressStyle};

use crate::constants::progress;

/// Sink for byte-level progress of a single transfer
pub trait TransferProgress: Send {
    /// Transfer of `label` is starting; `total` is the size in bytes when known
    fn start(&mut self, label: &str, total: Option<u64>);

    /// `bytes` more have been transferred
    fn advance(&mut self, bytes: u64);

    /// Transfer is complete
    fn finish(&mut self);
}

/// Progress sink that ignores every update
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl TransferProgress for NoProgress {
    fn start(&mut self, _label: &str, _total: Option<u64>) {}

    fn advance(&mut self, _bytes: u64) {}

    fn finish(&mut self) {}
}

/// Terminal data transfer bar, redrawn for each transfer started on it
#[derive(Debug, Default)]
pub struct TransferBar {
    bar: Option<ProgressBar>,
    transferred: u64,
}

impl TransferBar {
    /// Bar with nothing drawn until the first transfer starts
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes reported so far
    pub fn transferred(&self) -> u64 {
        self.transferred
    }

    fn style_for(total: Option<u64>) -> ProgressStyle {
        match total {
            Some(_) => ProgressStyle::default_bar()
                .template(progress::TRANSFER_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars(progress::BAR_CHARS),
            None => ProgressStyle::default_spinner()
                .template(progress::SPINNER_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        }
    }
}

impl TransferProgress for TransferBar {
    fn start(&mut self, label: &str, total: Option<u64>) {
        self.finish();
        let bar = match total {
            Some(len) => ProgressBar::new(len),
            None => ProgressBar::new_spinner(),
        };
        bar.set_style(Self::style_for(total));
        bar.set_message(label.to_string());
        self.transferred = 0;
        self.bar = Some(bar);
    }

    fn advance(&mut self, bytes: u64) {
        self.transferred += bytes;
        if let Some(bar) = &self.bar {
            bar.inc(bytes);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}

/// Boxed sink chosen by a `show_progress` flag
pub fn sink_for(show_progress: bool) -> Box<dyn TransferProgress> {
    if show_progress {
        Box::new(TransferBar::new())
    } else {
        Box::new(NoProgress)
    }
}
