//! Progress reporting for tool runs

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mmagent_domain::{ProgressCallback, ProgressEvent};
use std::sync::{Arc, Mutex};

/// Reports per-artifact progress with a progress bar
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    /// Callback to put on the run context.
    pub fn callback(self: &Arc<Self>) -> ProgressCallback {
        let reporter = Arc::clone(self);
        Arc::new(move |event: ProgressEvent| reporter.on_progress(&event))
    }

    pub fn on_progress(&self, event: &ProgressEvent) {
        let mut bar = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        let pb = bar.get_or_insert_with(|| {
            let pb = ProgressBar::new(event.total as u64);
            pb.set_style(Self::bar_style());
            pb.set_prefix("Saving");
            pb
        });
        pb.set_length(event.total as u64);
        pb.set_position(event.current as u64);
        pb.set_message(format!("{} {}", "v".green(), event.path));

        if event.current >= event.total {
            pb.finish_with_message(format!("{}", "complete!".green()));
            *bar = None;
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl SimpleProgress {
    pub fn callback() -> ProgressCallback {
        Arc::new(|event: ProgressEvent| {
            println!(
                "  {} [{}/{}] {}",
                "v".green(),
                event.current,
                event.total,
                event.path
            );
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(current: usize, total: usize) -> ProgressEvent {
        ProgressEvent {
            thread_id: "t-1".to_string(),
            message_id: None,
            tool_call_id: None,
            current,
            total,
            path: format!("audio/{}_line.wav", 6000 + current),
        }
    }

    #[test]
    fn test_bar_resets_after_last_item() {
        let reporter = Arc::new(ProgressReporter::new());
        let callback = reporter.callback();

        callback(event(1, 2));
        assert!(reporter.bar.lock().unwrap().is_some());
        callback(event(2, 2));
        assert!(reporter.bar.lock().unwrap().is_none());
    }
}
