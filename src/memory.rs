use chrono::Utc;
use lru::LruCache;
use serde::Serialize;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::llm::{ChatMessage, Role};

const DEFAULT_MAX_USERS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMemoryStats {
    pub user_id: String,
    pub exchanges: usize,
    pub last_exchange: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    pub total_users: usize,
    pub total_exchanges: usize,
    pub user_stats: Vec<UserMemoryStats>,
}

/// Short-term chat history per user, bounded in both directions.
///
/// Each user keeps at most `max_entries` messages and at most `max_users`
/// users are tracked; the least recently touched user is evicted first.
pub struct ConversationMemory {
    users: Mutex<LruCache<String, VecDeque<MemoryEntry>>>,
    max_entries: usize,
}

impl ConversationMemory {
    pub fn new(max_entries: usize, max_users: usize) -> Self {
        let cap = NonZeroUsize::new(max_users)
            .or_else(|| NonZeroUsize::new(DEFAULT_MAX_USERS))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            users: Mutex::new(LruCache::new(cap)),
            max_entries,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, VecDeque<MemoryEntry>>> {
        // History is advisory; a panic mid-update leaves at worst a short deque.
        self.users.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Prior exchanges, oldest first, ready to splice into a request.
    pub fn history(&self, user_id: &str) -> Vec<ChatMessage> {
        let mut users = self.lock();
        users
            .get(user_id)
            .map(|entries| {
                entries
                    .iter()
                    .map(|e| ChatMessage {
                        role: e.role,
                        content: e.content.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn record_exchange(&self, user_id: &str, prompt: &str, reply: &str) {
        let timestamp = Utc::now().to_rfc3339();
        let mut users = self.lock();
        let entries = users.get_or_insert_mut(user_id.to_string(), VecDeque::new);
        entries.push_back(MemoryEntry {
            role: Role::User,
            content: prompt.to_string(),
            timestamp: timestamp.clone(),
        });
        entries.push_back(MemoryEntry {
            role: Role::Assistant,
            content: reply.to_string(),
            timestamp,
        });
        while entries.len() > self.max_entries {
            entries.pop_front();
        }
    }

    pub fn clear_user(&self, user_id: &str) {
        self.lock().pop(user_id);
        info!("Cleared memory for user {}", user_id);
    }

    pub fn clear_all(&self) {
        self.lock().clear();
        info!("Cleared all user memory");
    }

    pub fn user_size(&self, user_id: &str) -> usize {
        self.lock().peek(user_id).map_or(0, VecDeque::len)
    }

    /// Keep only the newest `max` entries (the configured cap when `None` or zero).
    pub fn trim_user(&self, user_id: &str, max: Option<usize>) {
        let limit = max.filter(|&m| m > 0).unwrap_or(self.max_entries);
        let mut users = self.lock();
        if let Some(entries) = users.peek_mut(user_id) {
            let before = entries.len();
            if before > limit {
                entries.drain(..before - limit);
                info!("Trimmed memory for user {} from {} to {} exchanges", user_id, before, limit);
            }
        }
    }

    pub fn stats(&self) -> MemoryStats {
        let users = self.lock();
        let user_stats: Vec<UserMemoryStats> = users
            .iter()
            .map(|(user_id, entries)| UserMemoryStats {
                user_id: user_id.clone(),
                exchanges: entries.len(),
                last_exchange: entries
                    .back()
                    .map(|e| e.timestamp.clone())
                    .unwrap_or_else(|| "unknown".to_string()),
            })
            .collect();

        MemoryStats {
            total_users: users.len(),
            total_exchanges: user_stats.iter().map(|s| s.exchanges).sum(),
            user_stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_capped_oldest_first() {
        let memory = ConversationMemory::new(4, 10);
        for i in 0..3 {
            memory.record_exchange("alice", &format!("q{}", i), &format!("a{}", i));
        }

        let history = memory.history("alice");
        assert_eq!(history.len(), 4);
        assert_eq!(history[0], ChatMessage::user("q1"));
        assert_eq!(history[3], ChatMessage::assistant("a2"));
        assert!(memory.history("bob").is_empty());
    }

    #[test]
    fn test_least_recent_user_is_evicted() {
        let memory = ConversationMemory::new(20, 2);
        memory.record_exchange("1", "hi", "hello");
        memory.record_exchange("2", "hi", "hello");
        // Touch user 1 so user 2 becomes the eviction candidate
        memory.history("1");
        memory.record_exchange("3", "hi", "hello");

        assert_eq!(memory.user_size("1"), 2);
        assert_eq!(memory.user_size("2"), 0);
        assert_eq!(memory.user_size("3"), 2);
    }

    #[test]
    fn test_trim_and_clear() {
        let memory = ConversationMemory::new(20, 10);
        for _ in 0..5 {
            memory.record_exchange("system", "p", "r");
        }
        assert_eq!(memory.user_size("system"), 10);

        memory.trim_user("system", Some(0));
        assert_eq!(memory.user_size("system"), 10);

        memory.trim_user("system", Some(3));
        assert_eq!(memory.user_size("system"), 3);
        assert_eq!(memory.history("system")[0].role, Role::Assistant);

        memory.clear_user("system");
        assert_eq!(memory.user_size("system"), 0);

        memory.record_exchange("a", "p", "r");
        memory.record_exchange("b", "p", "r");
        memory.clear_all();
        assert_eq!(memory.stats().total_users, 0);
    }

    #[test]
    fn test_stats_totals() {
        let memory = ConversationMemory::new(20, 10);
        memory.record_exchange("a", "p", "r");
        memory.record_exchange("a", "p", "r");
        memory.record_exchange("b", "p", "r");

        let stats = memory.stats();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.total_exchanges, 6);
        let a = stats.user_stats.iter().find(|s| s.user_id == "a").unwrap();
        assert_eq!(a.exchanges, 4);
        assert_ne!(a.last_exchange, "unknown");

        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("totalExchanges").is_some());
        assert!(json["userStats"][0].get("lastExchange").is_some());
    }
}
