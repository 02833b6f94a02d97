use std::collections::VecDeque;
use std::time::Duration;

use crate::models::Notification;

/// Per-user queues of notifications waiting for the chat front-end
///
/// Each queue is capped; when full, the oldest notification is dropped.
/// Queues live in a bounded in-memory cache: at most `max_users` recipients
/// are tracked, and a queue nobody delivers to or drains for `idle` is evicted.
pub struct Outbox {
    max_per_user: usize,
    queues: moka::future::Cache<String, VecDeque<Notification>>,
}

impl Outbox {
    pub fn new(max_per_user: usize, max_users: u64, idle: Duration) -> Self {
        let queues = moka::future::CacheBuilder::new(max_users)
            .time_to_idle(idle)
            .build();

        Self {
            max_per_user: max_per_user.max(1),
            queues,
        }
    }

    /// Queue notifications for their recipients
    pub async fn deliver<I>(&self, notifications: I)
    where
        I: IntoIterator<Item = Notification>,
    {
        let max_per_user = self.max_per_user;

        for notification in notifications {
            let recipient = notification.recipient.clone();
            tracing::trace!("Queued notice for {}", recipient);

            self.queues
                .entry(recipient)
                .and_upsert_with(|existing| {
                    let mut queue = existing.map(|e| e.into_value()).unwrap_or_default();
                    if queue.len() >= max_per_user {
                        if let Some(dropped) = queue.pop_front() {
                            tracing::warn!(
                                "Outbox full for {}, dropping notice from {}",
                                dropped.recipient,
                                dropped.created_at
                            );
                        }
                    }
                    queue.push_back(notification);
                    std::future::ready(queue)
                })
                .await;
        }
    }

    /// Take every queued notification for `user_id`, oldest first
    pub async fn drain(&self, user_id: &str) -> Vec<Notification> {
        self.queues
            .remove(user_id)
            .await
            .map(Vec::from)
            .unwrap_or_default()
    }

    pub async fn pending(&self, user_id: &str) -> usize {
        self.queues.get(user_id).await.map_or(0, |queue| queue.len())
    }
}
