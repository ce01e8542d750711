use imgscout_scanner::{ImageCallback, ImageOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts image outcomes and optionally drives a terminal spinner.
#[derive(Clone)]
pub struct ProgressTracker {
    bar: Option<ProgressBar>,
    saved: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
}

impl ProgressTracker {
    pub fn new(show_progress_bars: bool) -> Self {
        let bar = if show_progress_bars {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
                pb.set_style(style);
            }
            pb.set_message("Starting...");
            Some(pb)
        } else {
            None
        };

        Self {
            bar,
            saved: Arc::new(AtomicUsize::new(0)),
            failed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn image_callback(&self) -> ImageCallback {
        let tracker = self.clone();
        Arc::new(move |outcome: &ImageOutcome| tracker.record(outcome))
    }

    pub fn record(&self, outcome: &ImageOutcome) {
        if outcome.is_saved() {
            self.saved.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }

        if let Some(ref pb) = self.bar {
            pb.set_message(format!(
                "Downloading... {} saved, {} failed",
                self.saved(),
                self.failed()
            ));
            pb.tick();
        }
    }

    pub fn set_message(&self, msg: String) {
        if let Some(ref pb) = self.bar {
            pb.set_message(msg);
        }
    }

    pub fn saved(&self) -> usize {
        self.saved.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn finish(&self) {
        if let Some(ref pb) = self.bar {
            pb.finish_with_message(format!(
                "Done! {} images saved, {} failed",
                self.saved(),
                self.failed()
            ));
        }
    }
}
