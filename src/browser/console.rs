//! Shared console line buffer.
//!
//! The browser adapter appends lines from a background task while the
//! harness pipeline runs; the harness only ever reads a trailing window.

use std::sync::{Arc, Mutex, MutexGuard};

/// Append-only, arrival-ordered console log shared between tasks
#[derive(Debug, Clone, Default)]
pub struct ConsoleLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl ConsoleLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line
    pub fn push(&self, line: impl Into<String>) {
        self.guard().push(line.into());
    }

    /// Number of lines collected so far
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    /// Whether no line has been collected
    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// The last `max` lines, oldest first
    pub fn tail(&self, max: usize) -> Vec<String> {
        let lines = self.guard();
        let start = lines.len().saturating_sub(max);
        lines[start..].to_vec()
    }

    /// Every collected line, oldest first
    pub fn snapshot(&self) -> Vec<String> {
        self.guard().clone()
    }

    // A writer that panicked mid-push cannot leave a Vec half-updated.
    fn guard(&self) -> MutexGuard<'_, Vec<String>> {
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_keeps_most_recent_in_order() {
        let log = ConsoleLog::new();
        for i in 0..100 {
            log.push(format!("line {}", i));
        }
        let tail = log.tail(40);
        assert_eq!(tail.len(), 40);
        assert_eq!(tail.first().map(String::as_str), Some("line 60"));
        assert_eq!(tail.last().map(String::as_str), Some("line 99"));
    }

    #[test]
    fn test_tail_shorter_than_window() {
        let log = ConsoleLog::new();
        log.push("a");
        log.push("b");
        assert_eq!(log.tail(40), vec!["a", "b"]);
        assert!(ConsoleLog::new().tail(40).is_empty());
    }

    #[test]
    fn test_clones_share_lines() {
        let log = ConsoleLog::new();
        let writer = log.clone();
        writer.push("from background");
        assert_eq!(log.len(), 1);
        assert!(!log.is_empty());
    }
}
