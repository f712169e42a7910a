// Progress display: a single console line rewritten with the cumulative
// byte count. The store may call the handler from its own worker threads.

use crate::storage::{ProgressHandler, TransferStatus};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub trait ProgressReporter {
    /// Handler to attach to the next transfer.
    fn handler(&self) -> ProgressHandler;

    /// Finalize the line once the transfer has returned.
    fn finish(&self);
}

pub fn progress_line(bytes: u64) -> String {
    format!("Bytes transferred: {bytes}")
}

/// Writes `\rBytes transferred: N` to any writer. Used for piped output
/// and in tests.
pub struct LineProgress<W: Write + Send + 'static> {
    out: Arc<Mutex<W>>,
    shown: Arc<AtomicU64>,
}

impl<W: Write + Send + 'static> LineProgress<W> {
    pub fn new(out: W) -> Self {
        LineProgress {
            out: Arc::new(Mutex::new(out)),
            shown: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared handle to the underlying writer.
    pub fn writer(&self) -> Arc<Mutex<W>> {
        self.out.clone()
    }
}

impl<W: Write + Send + 'static> ProgressReporter for LineProgress<W> {
    fn handler(&self) -> ProgressHandler {
        self.shown.store(0, Ordering::SeqCst);
        let out = self.out.clone();
        let shown = self.shown.clone();
        Arc::new(move |status: TransferStatus| {
            let bytes = status.bytes_transferred;
            // Reports from parallel workers can arrive out of order.
            if shown.fetch_max(bytes, Ordering::SeqCst) > bytes {
                return;
            }
            if let Ok(mut out) = out.lock() {
                let _ = write!(out, "\r{}", progress_line(bytes));
                let _ = out.flush();
            }
        })
    }

    fn finish(&self) {
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out);
            let _ = out.flush();
        }
    }
}

/// indicatif spinner for interactive terminals.
pub struct BarProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl BarProgress {
    pub fn new() -> Self {
        BarProgress {
            bar: Mutex::new(None),
        }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for BarProgress {
    fn handler(&self) -> ProgressHandler {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} ({elapsed})") {
            bar.set_style(style);
        }
        bar.set_message(progress_line(0));
        bar.enable_steady_tick(Duration::from_millis(120));

        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar.clone());
        }

        let shown = Arc::new(AtomicU64::new(0));
        Arc::new(move |status: TransferStatus| {
            let bytes = status.bytes_transferred;
            if shown.fetch_max(bytes, Ordering::SeqCst) <= bytes {
                bar.set_message(progress_line(bytes));
            }
        })
    }

    fn finish(&self) {
        if let Some(bar) = self.bar.lock().ok().and_then(|mut slot| slot.take()) {
            bar.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(bytes: u64) -> TransferStatus {
        TransferStatus {
            bytes_transferred: bytes,
            files_transferred: 0,
        }
    }

    fn rendered(reporter: &LineProgress<Vec<u8>>) -> String {
        String::from_utf8(reporter.writer().lock().unwrap().clone()).unwrap()
    }

    #[test]
    fn rewrites_single_line() {
        let reporter = LineProgress::new(Vec::new());
        let handler = reporter.handler();
        handler(status(512));
        handler(status(1024));
        reporter.finish();
        assert_eq!(
            rendered(&reporter),
            "\rBytes transferred: 512\rBytes transferred: 1024\n"
        );
    }

    #[test]
    fn late_smaller_report_is_not_displayed() {
        let reporter = LineProgress::new(Vec::new());
        let handler = reporter.handler();
        handler(status(300));
        handler(status(100));
        handler(status(300));
        assert_eq!(
            rendered(&reporter),
            "\rBytes transferred: 300\rBytes transferred: 300"
        );
    }

    #[test]
    fn new_handler_starts_from_zero() {
        let reporter = LineProgress::new(Vec::new());
        reporter.handler()(status(900));
        reporter.finish();
        reporter.handler()(status(10));
        assert!(rendered(&reporter).ends_with("\rBytes transferred: 10"));
    }

    #[test]
    fn handler_is_callable_from_other_threads() {
        let reporter = LineProgress::new(Vec::new());
        let handler = reporter.handler();
        std::thread::scope(|s| {
            for n in 1..=4u64 {
                let handler = handler.clone();
                s.spawn(move || handler(status(n * 100)));
            }
        });
        reporter.finish();
        let out = rendered(&reporter);
        assert!(out.contains("Bytes transferred: 400"));
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn bar_progress_finishes_cleanly() {
        let reporter = BarProgress::new();
        let handler = reporter.handler();
        handler(status(42));
        reporter.finish();
        reporter.finish();
    }
}
