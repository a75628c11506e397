//! Progress and status output
//!
//! Everything here writes to stderr so stdout stays usable for JSON output
//! and for a workbook streamed with `--output -`.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

const SPINNER_UPDATE_INTERVAL_MS: u64 = 100;
const CLEAR_LINE_WIDTH: usize = 100;
const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Spinner shown while a query is in flight
pub struct ProgressSpinner {
    message: String,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ProgressSpinner {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Start animating. Does nothing when stderr is not a terminal.
    pub fn start(&mut self) {
        if !atty::is(atty::Stream::Stderr) || self.handle.is_some() {
            return;
        }

        self.running.store(true, Ordering::Relaxed);
        let running = Arc::clone(&self.running);
        let message = self.message.clone();

        let handle = thread::spawn(move || {
            let mut index = 0;
            let mut stderr = io::stderr();

            while running.load(Ordering::Relaxed) {
                let _ = write!(stderr, "\r{} {}", SPINNER_CHARS[index], message);
                let _ = stderr.flush();

                index = (index + 1) % SPINNER_CHARS.len();
                thread::sleep(Duration::from_millis(SPINNER_UPDATE_INTERVAL_MS));
            }

            let _ = write!(stderr, "\r{:<width$}\r", "", width = CLEAR_LINE_WIDTH);
            let _ = stderr.flush();
        });

        self.handle = Some(handle);
    }

    pub fn stop(&mut self, completion_message: Option<&str>) {
        self.running.store(false, Ordering::Relaxed);

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }

        if let Some(msg) = completion_message {
            // Leading space keeps wide emoji from being clipped
            eprintln!(" {}", msg);
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for ProgressSpinner {
    fn drop(&mut self) {
        self.stop(None);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    InProgress,
    Success,
    Warning,
    Error,
}

impl OperationStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            OperationStatus::InProgress => "⏳",
            OperationStatus::Success => "✅",
            OperationStatus::Warning => "⚠️",
            OperationStatus::Error => "❌",
        }
    }
}

/// Status line text, e.g. ` ✅ Connected to xy12345`
pub fn format_status(message: &str, status: OperationStatus) -> String {
    format!(" {} {}", status.symbol(), message)
}

pub fn display_status(message: &str, status: OperationStatus) {
    eprintln!("{}", format_status(message, status));
}
