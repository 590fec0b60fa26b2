use std::sync::atomic::{AtomicBool, Ordering};

use console::{Term, style};

use crate::ai::{LoadingIndicator, Notifier, NotifyLevel};

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        eprintln!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// Indented `label: value` line, skipped when `value` is empty
    pub fn field(&self, label: &str, value: &str) {
        if !value.is_empty() {
            println!("  {} {}", style(format!("{}:", label)).dim(), value);
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminal sink for gateway notifications and the loading indicator.
///
/// Notifications go to stderr so piped stdout stays clean.
#[derive(Default)]
pub struct ConsoleNotifier {
    output: Output,
    spinner_shown: AtomicBool,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear_loading_line(&self) {
        if self.spinner_shown.swap(false, Ordering::SeqCst) {
            let _ = Term::stderr().clear_line();
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, level: NotifyLevel) {
        self.clear_loading_line();
        match level {
            NotifyLevel::Info => self.output.info(message),
            NotifyLevel::Success => self.output.success(message),
            NotifyLevel::Warning => self.output.warning(message),
            NotifyLevel::Error => self.output.error(message),
        }
    }
}

impl LoadingIndicator for ConsoleNotifier {
    fn set_loading(&self, active: bool) {
        let term = Term::stderr();
        if !term.is_term() {
            return;
        }
        if active {
            let _ = term.write_str(&format!("{}", style("… thinking").dim()));
            self.spinner_shown.store(true, Ordering::SeqCst);
        } else {
            self.clear_loading_line();
        }
    }
}
