//! Non-fatal diagnostics emitted while decoding or encoding files.
//!
//! Readers and writers never print directly. They receive a `&dyn WarningSink` and report
//! recoverable problems through it, then continue with a fallback value. A process-wide
//! default sink forwards to the [`log`] facade; applications can swap it with
//! [`set_warning_sink`] or pass their own sink to a single trajectory through
//! [`TrajectoryBuilder`](crate::io::TrajectoryBuilder).

use std::sync::{Arc, Mutex, OnceLock};

/// Receiver for recoverable diagnostics.
pub trait WarningSink: Send + Sync {
    fn send_warning(&self, message: &str);
}

/// Forwards warnings to `log::warn!`. This is the default sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl WarningSink for LogSink {
    fn send_warning(&self, message: &str) {
        log::warn!("{}", message);
    }
}

/// Prints warnings to standard error with a `[chem-forge]` prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl WarningSink for StderrSink {
    fn send_warning(&self, message: &str) {
        eprintln!("[chem-forge] {}", message);
    }
}

/// Keeps every warning in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    messages: Mutex<Vec<String>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the warnings received so far.
    pub fn messages(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Removes and returns the warnings received so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns `true` if any warning contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lock().iter().any(|message| message.contains(needle))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl WarningSink for CollectingSink {
    fn send_warning(&self, message: &str) {
        self.lock().push(message.to_string());
    }
}

impl<F> WarningSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn send_warning(&self, message: &str) {
        self(message)
    }
}

fn global() -> &'static Mutex<Arc<dyn WarningSink>> {
    static SINK: OnceLock<Mutex<Arc<dyn WarningSink>>> = OnceLock::new();
    SINK.get_or_init(|| Mutex::new(Arc::new(LogSink)))
}

/// Replaces the process-wide default sink used by trajectories that were not given one.
pub fn set_warning_sink(sink: Arc<dyn WarningSink>) {
    let mut guard = global()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = sink;
}

/// Returns the current process-wide default sink.
pub fn warning_sink() -> Arc<dyn WarningSink> {
    global()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Sends a formatted warning prefixed with the component that raised it.
///
/// ```ignore
/// warning!(sink, "PDB reader", "ignoring unknown record: {}", record);
/// ```
macro_rules! warning {
    ($sink:expr, $context:expr, $($arg:tt)+) => {
        $sink.send_warning(&format!("{}: {}", $context, format_args!($($arg)+)))
    };
}

pub(crate) use warning;
