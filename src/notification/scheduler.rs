use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use crate::telegram::transport::Transport;

/// Deletes sent messages after a delay.
///
/// Each armed deletion is a detached task: nobody awaits it, it is never
/// retried or cancelled, and deletions still pending at shutdown are dropped.
#[derive(Clone)]
pub struct DeletionScheduler {
    transport: Arc<dyn Transport>,
}

impl DeletionScheduler {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn arm(&self, chat_id: i64, message_id: i32, delay_secs: u64) {
        debug!(
            chat_id,
            message_id, "Scheduling message for auto-deletion in {}s", delay_secs
        );

        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(delay_secs)).await;

            match transport.delete_message(chat_id, message_id).await {
                Ok(()) => debug!(chat_id, message_id, "Message deleted after {}s", delay_secs),
                Err(e) => error!(chat_id, message_id, error = %e, "Failed to delete message"),
            }
        });
    }
}
