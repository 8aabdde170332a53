use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serenity::all::{GuildId, UserId};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;
use uuid::Uuid;

type Key = (GuildId, UserId);

struct Ticket {
    id: Uuid,
    handle: JoinHandle<()>,
}

/// Holds one pending expiry per (guild, user)
///
/// Scheduling a key again replaces the previous job. A job removes its own
/// ticket when its delay elapses, before it starts running, so cancelling
/// from inside the job is a no-op.
#[derive(Default)]
pub struct ExpiryScheduler {
    pending: Arc<DashMap<Key, Ticket>>,
}

impl ExpiryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<F>(&self, guild_id: GuildId, user_id: UserId, delay: Duration, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = (guild_id, user_id);
        let id = Uuid::new_v4();
        let pending = Arc::clone(&self.pending);

        // Hold the entry while spawning so a zero-delay job cannot clear its
        // ticket before it is inserted.
        let entry = self.pending.entry(key);
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            pending.remove_if(&key, |_, ticket| ticket.id == id);
            job.await;
        });

        let ticket = Ticket { id, handle };
        match entry {
            Entry::Occupied(mut occupied) => {
                let previous = occupied.insert(ticket);
                previous.handle.abort();
                debug!(
                    "Replaced pending expiry for user {} in guild {}",
                    user_id, guild_id
                );
            }
            Entry::Vacant(vacant) => {
                vacant.insert(ticket);
            }
        }
    }

    /// Cancel the pending job for a key. Returns whether one was pending.
    pub fn cancel(&self, guild_id: GuildId, user_id: UserId) -> bool {
        match self.pending.remove(&(guild_id, user_id)) {
            Some((_, ticket)) => {
                ticket.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, guild_id: GuildId, user_id: UserId) -> bool {
        self.pending.contains_key(&(guild_id, user_id))
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for ExpiryScheduler {
    fn drop(&mut self) {
        for entry in self.pending.iter() {
            entry.value().handle.abort();
        }
    }
}
