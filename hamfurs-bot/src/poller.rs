//! The long-poll loop.
//!
//! Updates are fetched in batches and dispatched strictly one after another,
//! so no two handlers ever run at the same time.

use crate::module::handler::MessageHandler;
use crate::telegram::{TelegramClient, Update};
use std::sync::Arc;
use std::time::Duration;

const MIN_BACKOFF: Duration = Duration::from_millis(250);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

pub struct Poller {
    client: Arc<TelegramClient>,
    handler: Arc<MessageHandler>,
    timeout_secs: u64,
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).clamp(MIN_BACKOFF, MAX_BACKOFF)
}

/// Offset acknowledging every update in `updates`.
fn next_offset(offset: i64, updates: &[Update]) -> i64 {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .fold(offset, i64::max)
}

impl Poller {
    pub fn new(client: Arc<TelegramClient>, handler: Arc<MessageHandler>, timeout_secs: u64) -> Self {
        Self {
            client,
            handler,
            timeout_secs,
        }
    }

    /// Poll until Ctrl-C.
    pub async fn run(&self) {
        let mut offset = 0;
        let mut backoff = Duration::ZERO;

        tracing::info!("Polling for updates (timeout {}s)", self.timeout_secs);
        loop {
            let batch = tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received.");
                    return;
                }
                batch = self.client.get_updates(offset, self.timeout_secs) => batch,
            };

            match batch {
                Ok(updates) => {
                    backoff = Duration::ZERO;
                    offset = next_offset(offset, &updates);
                    for update in updates {
                        self.handler.handle_update(update).await;
                    }
                }
                Err(e) => {
                    backoff = next_backoff(backoff);
                    tracing::error!(
                        "Fetching updates failed: {}. Retrying in {:.2}s",
                        e,
                        backoff.as_secs_f64()
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(update_id: i64) -> Update {
        Update {
            update_id,
            message: None,
            edited_message: None,
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let mut delay = Duration::ZERO;
        delay = next_backoff(delay);
        assert_eq!(delay, Duration::from_millis(250));
        delay = next_backoff(delay);
        assert_eq!(delay, Duration::from_millis(500));
        for _ in 0..20 {
            delay = next_backoff(delay);
        }
        assert_eq!(delay, MAX_BACKOFF);
    }

    #[test]
    fn test_next_offset() {
        assert_eq!(next_offset(0, &[]), 0);
        assert_eq!(next_offset(0, &[update(7), update(9), update(8)]), 10);
        assert_eq!(next_offset(20, &[update(3)]), 20);
    }
}
