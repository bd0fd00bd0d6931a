//! C2 — Event Bus: one global broadcast channel for fan-out plus a bounded
//! replay ring, grounded in the teacher's broadcast-channel-plus-lag-policy
//! `AgentBus`. Pattern subscriptions (`*`/`**`) are new functionality
//! required by the spec; each `subscribe` spawns a forwarding task that
//! filters the shared broadcast receiver through the compiled pattern.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use taskcore_kernel::domain::event::{pattern_matches, routing_key};
use taskcore_kernel::domain::Event;
use taskcore_kernel::error::{TaskCoreError, TaskCoreResult};
use taskcore_kernel::traits::{EventBus, Subscription};
use tokio::sync::broadcast;

struct ReplayLog {
    events: VecDeque<Event>,
    capacity: usize,
}

impl ReplayLog {
    fn push(&mut self, event: Event) {
        if self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    fn matching(&self, pattern: &str, limit: usize) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| pattern_matches(pattern, &routing_key(e)))
            .rev()
            .take(limit)
            .rev()
            .cloned()
            .collect()
    }
}

pub struct InMemoryEventBus {
    sender: broadcast::Sender<Event>,
    replay: Arc<Mutex<ReplayLog>>,
}

impl InMemoryEventBus {
    pub fn new(replay_capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(1024);
        Self { sender, replay: Arc::new(Mutex::new(ReplayLog { events: VecDeque::new(), capacity: replay_capacity })) }
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, event: Event) -> TaskCoreResult<()> {
        self.replay.lock().push(event.clone());
        // A lagging or absent subscriber is not an error for the publisher;
        // broadcast::Sender::send only fails when there are zero receivers,
        // which is a normal, ignorable state for this bus.
        let _ = self.sender.send(event);
        Ok(())
    }

    async fn subscribe(&self, pattern: &str) -> TaskCoreResult<Subscription> {
        let mut source = self.sender.subscribe();
        let (tx, rx) = tokio::sync::mpsc::channel(256);
        let pattern = pattern.to_string();
        let id = uuid::Uuid::new_v4().to_string();

        tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(event) => {
                        if pattern_matches(&pattern, &routing_key(&event)) && tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(Subscription { id, receiver: rx })
    }

    async fn unsubscribe(&self, _subscription_id: &str) -> TaskCoreResult<()> {
        // Forwarding tasks exit on their own once the subscriber's receiver
        // is dropped; there is no separate registry entry to remove.
        Ok(())
    }

    async fn replay(&self, pattern: &str, limit: usize) -> TaskCoreResult<Vec<Event>> {
        if limit == 0 {
            return Err(TaskCoreError::invalid_input("replay limit must be > 0"));
        }
        Ok(self.replay.lock().matching(pattern, limit))
    }
}
