//! Conversation state for the travel agent.
//!
//! A [`Conversation`] is a plain value: the agent takes one in and hands an updated
//! one back, so nothing about a conversation lives inside the agent itself. The
//! [`ConversationStore`] keeps them between HTTP requests, one lock per
//! conversation.

use crate::error::{Result, TravelError};
use crate::llm::models::LlmMessage;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(Uuid);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ConversationId {
    type Err = TravelError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| TravelError::InvalidRequest(format!("invalid conversation id: {}", e)))
    }
}

/// Message history of one conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    messages: Vec<LlmMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::with_id(ConversationId::new())
    }

    pub fn with_id(id: ConversationId) -> Self {
        Self {
            id,
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn messages(&self) -> &[LlmMessage] {
        &self.messages
    }

    pub fn push(&mut self, message: LlmMessage) {
        self.messages.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = LlmMessage>) {
        self.messages.extend(messages);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounds on the conversations a [`ConversationStore`] keeps in memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    pub max_conversations: usize,
    /// Conversations untouched for this long are dropped when room is needed
    pub idle_ttl: Duration,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_conversations: 10_000,
            idle_ttl: Duration::from_secs(3600),
        }
    }
}

struct Slot {
    conversation: Arc<Mutex<Conversation>>,
    last_used: Instant,
}

impl Slot {
    fn new(id: ConversationId) -> Self {
        Self {
            conversation: Arc::new(Mutex::new(Conversation::with_id(id))),
            last_used: Instant::now(),
        }
    }

    /// Someone besides the store holds a handle
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.conversation) > 1
    }
}

/// Conversations shared across concurrent requests.
///
/// Each conversation sits behind its own async mutex. A request holds that lock for
/// its whole agent run, so two requests on the same conversation run one after the
/// other while different conversations proceed in parallel.
///
/// Before a new conversation is added, idle ones past [`StoreLimits::idle_ttl`] are
/// dropped, and at [`StoreLimits::max_conversations`] the least recently used idle
/// one goes.
pub struct ConversationStore {
    conversations: DashMap<ConversationId, Slot>,
    limits: StoreLimits,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::with_limits(StoreLimits::default())
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: StoreLimits) -> Self {
        Self {
            conversations: DashMap::new(),
            limits: StoreLimits {
                max_conversations: limits.max_conversations.max(1),
                ..limits
            },
        }
    }

    /// Slot for `id`, created empty if unknown; a fresh id is minted when `id` is `None`.
    ///
    /// Fails with [`TravelError::CapacityExceeded`] when the store is full and every
    /// conversation in it is checked out.
    pub fn checkout(&self, id: Option<ConversationId>) -> Result<Arc<Mutex<Conversation>>> {
        let id = id.unwrap_or_default();
        if !self.conversations.contains_key(&id) {
            self.make_room()?;
        }

        let mut slot = self.conversations.entry(id).or_insert_with(|| Slot::new(id));
        slot.last_used = Instant::now();
        Ok(Arc::clone(&slot.conversation))
    }

    /// Drop `id` if it has no history and no other request holds it.
    ///
    /// Release your own handle from [`checkout`](Self::checkout) first.
    pub fn discard_if_empty(&self, id: &ConversationId) -> bool {
        self.conversations
            .remove_if(id, |_, slot| {
                !slot.in_use()
                    && slot
                        .conversation
                        .try_lock()
                        .is_ok_and(|conversation| conversation.is_empty())
            })
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    fn make_room(&self) -> Result<()> {
        let ttl = self.limits.idle_ttl;
        self.conversations
            .retain(|_, slot| slot.in_use() || slot.last_used.elapsed() < ttl);

        if self.conversations.len() < self.limits.max_conversations {
            return Ok(());
        }

        let oldest = self
            .conversations
            .iter()
            .filter(|entry| !entry.value().in_use())
            .min_by_key(|entry| entry.value().last_used)
            .map(|entry| *entry.key());

        match oldest {
            Some(id) => {
                debug!(conversation = %id, "Evicting least recently used conversation");
                self.conversations.remove_if(&id, |_, slot| !slot.in_use());
                Ok(())
            }
            None => Err(TravelError::CapacityExceeded(format!(
                "all {} conversations are in use",
                self.conversations.len()
            ))),
        }
    }
}
