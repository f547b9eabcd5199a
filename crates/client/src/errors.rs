//! Application-wide failure tracking.
//!
//! Anything that would otherwise crash the client (a panic, an unhandled
//! error from a background task) is reported here. Known-harmless noise is
//! filtered out; the first real failure moves the app to
//! [`AppHealth::Failed`] until the user retries.

use tokio::sync::watch;

/// Messages that are reported often and mean nothing.
const BENIGN_MESSAGES: &[&str] = &[
    "ResizeObserver loop limit exceeded",
    "ResizeObserver loop completed with undelivered notifications",
    "Non-Error promise rejection captured",
];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppHealth {
    #[default]
    Healthy,
    Failed {
        message: String,
    },
}

impl AppHealth {
    pub fn is_failed(&self) -> bool {
        matches!(self, AppHealth::Failed { .. })
    }
}

pub fn is_benign(message: &str) -> bool {
    BENIGN_MESSAGES.iter().any(|benign| message.contains(benign))
}

/// Cloning shares the same health state.
#[derive(Clone)]
pub struct ErrorMonitor {
    tx: watch::Sender<AppHealth>,
}

impl Default for ErrorMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorMonitor {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(AppHealth::Healthy);
        Self { tx }
    }

    /// Returns `true` if the report changed the app's health.
    pub fn report(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        if is_benign(&message) {
            crate::log_debug!("ErrorMonitor: ignoring benign error: {}", message);
            return false;
        }

        crate::log_error!("ErrorMonitor: {}", message);
        // Keep the first failure; later ones are usually fallout from it.
        self.tx.send_if_modified(|health| {
            if health.is_failed() {
                false
            } else {
                *health = AppHealth::Failed { message };
                true
            }
        })
    }

    /// Manual retry: back to healthy.
    pub fn reset(&self) {
        crate::log_info!("ErrorMonitor: reset");
        self.tx.send_replace(AppHealth::Healthy);
    }

    pub fn health(&self) -> AppHealth {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppHealth> {
        self.tx.subscribe()
    }

    /// Route panics on any thread into this monitor, then run the previous hook.
    pub fn install_panic_hook(&self) {
        let monitor = self.clone();
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let payload = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic".to_string());
            let location = info
                .location()
                .map(|l| format!(" at {}:{}", l.file(), l.line()))
                .unwrap_or_default();
            monitor.report(format!("{}{}", payload, location));
            previous(info);
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benign_messages_are_ignored() {
        let monitor = ErrorMonitor::new();
        assert!(!monitor.report("ResizeObserver loop limit exceeded"));
        assert_eq!(monitor.health(), AppHealth::Healthy);
    }

    #[test]
    fn first_failure_wins_until_reset() {
        let monitor = ErrorMonitor::new();
        let rx = monitor.subscribe();

        assert!(monitor.report("store exploded"));
        assert!(!monitor.report("and then this"));
        assert_eq!(
            *rx.borrow(),
            AppHealth::Failed {
                message: "store exploded".to_string()
            }
        );

        monitor.reset();
        assert_eq!(monitor.health(), AppHealth::Healthy);
        assert!(monitor.report("again"));
    }
}
