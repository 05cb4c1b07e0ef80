//! Process-wide Ctrl-C handling.
//!
//! The signal is registered once at startup. While a TWAP holds a receiver,
//! Ctrl-C stops that run; otherwise it ends the program.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Exit status for a run ended by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Clone)]
pub struct Interrupt {
    tx: Arc<watch::Sender<bool>>,
}

impl Interrupt {
    fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Install the Ctrl-C listener. Call once, inside the runtime.
    pub fn install() -> Self {
        let interrupt = Self::new();
        let listener = interrupt.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if !listener.deliver() {
                    info!("Interrupted");
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
            }
        });
        interrupt
    }

    /// A fresh stop signal for one run. Earlier presses do not carry over.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.send_replace(false);
        self.tx.subscribe()
    }

    /// Signal the active run, if any. Returns false when nobody is listening.
    fn deliver(&self) -> bool {
        if self.tx.receiver_count() == 0 {
            return false;
        }
        info!("Interrupt received, stopping after the current slice");
        self.tx.send_replace(true);
        true
    }
}
