//! Per-chat event queues
//!
//! Events of one chat are handled one at a time in arrival order, so a leave
//! can never overtake the message that came before it. Different chats each
//! get their own worker and proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use super::dispatcher::EventDispatcher;
use crate::domain::entities::{ChatEvent, ChatId};
use crate::domain::traits::{Bot, Store};

struct ChatQueue {
    tx: mpsc::UnboundedSender<ChatEvent>,
    worker: JoinHandle<()>,
}

/// Routes events into one ordered queue per chat
pub struct ChatRouter<B: Bot, S: Store> {
    dispatcher: Arc<EventDispatcher<B, S>>,
    queues: Mutex<HashMap<ChatId, ChatQueue>>,
}

impl<B: Bot + 'static, S: Store + 'static> ChatRouter<B, S> {
    pub fn new(dispatcher: Arc<EventDispatcher<B, S>>) -> Self {
        Self {
            dispatcher,
            queues: Mutex::new(HashMap::new()),
        }
    }

    /// Queue an event behind the earlier events of its chat
    pub async fn route(&self, event: ChatEvent) {
        let chat_id = event.chat().id;
        let mut queues = self.queues.lock().await;
        let queue = queues
            .entry(chat_id)
            .or_insert_with(|| self.spawn_worker(chat_id));

        // The receiver only goes away if the worker died
        if let Err(mpsc::error::SendError(event)) = queue.tx.send(event) {
            tracing::warn!("[{}] chat worker stopped, restarting", chat_id);
            let fresh = self.spawn_worker(chat_id);
            if fresh.tx.send(event).is_err() {
                tracing::error!("[{}] dropped event, chat worker unavailable", chat_id);
            }
            *queue = fresh;
        }
    }

    /// Close every queue and wait until the events already queued are handled
    pub async fn shutdown(&self) {
        let queues: Vec<(ChatId, ChatQueue)> = self.queues.lock().await.drain().collect();
        for (chat_id, ChatQueue { tx, worker }) in queues {
            drop(tx);
            if let Err(e) = worker.await {
                tracing::error!("[{}] chat worker failed: {}", chat_id, e);
            }
        }
    }

    fn spawn_worker(&self, chat_id: ChatId) -> ChatQueue {
        let (tx, mut rx) = mpsc::unbounded_channel::<ChatEvent>();
        let dispatcher = self.dispatcher.clone();

        let worker = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = dispatcher.dispatch(event).await {
                    tracing::error!("[{}] failed to handle event: {}", chat_id, e);
                }
            }
            tracing::debug!("[{}] chat queue closed", chat_id);
        });

        ChatQueue { tx, worker }
    }
}
