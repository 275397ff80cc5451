//! Per-browser-session chat state.
//!
//! A [`ChatSession`] is the whole UI model for one visitor: the turns shown
//! on the page and whether a reply is still pending. It is never synchronised
//! with the server's message store; clearing it or restarting the UI loses it.
//!
//! ```text
//! idle ──begin_submit──▶ sending ──finish_submit──▶ idle
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chat_types::Role;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::client::ChatBackend;

/// One line of the visible history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTurn {
    pub sender: Role,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<SessionTurn>,
    sending: bool,
}

impl ChatSession {
    pub fn messages(&self) -> &[SessionTurn] {
        &self.messages
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Start a submission.
    ///
    /// Returns the trimmed text to send, or `None` when a reply is still
    /// pending or the input is blank. On `Some` the user turn has already
    /// been appended.
    pub fn begin_submit(&mut self, input: &str) -> Option<String> {
        if self.sending {
            return None;
        }
        let text = input.trim();
        if text.is_empty() {
            return None;
        }
        self.sending = true;
        self.messages.push(SessionTurn {
            sender: Role::User,
            text: text.to_owned(),
        });
        Some(text.to_owned())
    }

    /// Record the reply (or inline error text) and return to idle.
    pub fn finish_submit(&mut self, reply: String) {
        self.messages.push(SessionTurn {
            sender: Role::Bot,
            text: reply,
        });
        self.sending = false;
    }

    /// Forget the visible history. The server's store is untouched.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

/// Lock a session, recovering the state if a previous holder panicked.
pub fn lock(session: &Mutex<ChatSession>) -> MutexGuard<'_, ChatSession> {
    session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Run one submit cycle against `backend`.
///
/// The session lock is only held to change state, never across the call, so
/// a page render during a pending reply shows the disabled input. The call
/// and `finish_submit` run on their own task: if the caller is dropped (the
/// browser went away) the reply is still recorded and the session goes back
/// to idle. Returns `false` when the submission was a no-op.
pub async fn submit(
    session: Arc<Mutex<ChatSession>>,
    backend: Arc<dyn ChatBackend>,
    input: &str,
) -> bool {
    let message = lock(&session).begin_submit(input);
    let Some(message) = message else {
        return false;
    };

    let exchange = {
        let session = session.clone();
        tokio::spawn(async move {
            let reply = backend.send(&message).await;
            lock(&session).finish_submit(reply);
        })
    };
    if let Err(e) = exchange.await {
        warn!(error = %e, "submit task did not complete");
        lock(&session).finish_submit(format!("Error: {e}"));
    }
    true
}

struct Entry {
    session: Arc<Mutex<ChatSession>>,
    last_seen: Instant,
}

/// All live sessions, keyed by the id stored in the visitor's cookie.
///
/// Only ids minted here are ever stored. Sessions idle for longer than
/// `idle` are dropped, and at most `max` are kept.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, Entry>>,
    idle: Duration,
    max: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(Duration::from_secs(60 * 60), 1024)
    }
}

impl SessionRegistry {
    pub fn new(idle: Duration, max: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle,
            max: max.max(1),
        }
    }

    /// Look up a known, non-expired session and mark it as seen.
    pub fn get(&self, id: Option<Uuid>) -> Option<Arc<Mutex<ChatSession>>> {
        self.get_at(id, Instant::now())
    }

    /// Look up the session for `id`, starting a new one when unknown.
    ///
    /// A new session always gets a fresh id, never the one the caller sent.
    /// Returns the id actually used and whether the session is new.
    pub fn get_or_create(&self, id: Option<Uuid>) -> (Uuid, Arc<Mutex<ChatSession>>, bool) {
        self.get_or_create_at(id, Instant::now())
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    fn map(&self) -> MutexGuard<'_, HashMap<Uuid, Entry>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn get_at(&self, id: Option<Uuid>, now: Instant) -> Option<Arc<Mutex<ChatSession>>> {
        let id = id?;
        let mut sessions = self.map();
        self.touch(&mut sessions, id, now)
    }

    fn get_or_create_at(&self, id: Option<Uuid>, now: Instant) -> (Uuid, Arc<Mutex<ChatSession>>, bool) {
        let mut sessions = self.map();
        if let Some(id) = id {
            if let Some(session) = self.touch(&mut sessions, id, now) {
                return (id, session, false);
            }
        }

        self.evict(&mut sessions, now);
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(ChatSession::default()));
        sessions.insert(
            id,
            Entry {
                session: session.clone(),
                last_seen: now,
            },
        );
        (id, session, true)
    }

    fn touch(
        &self,
        sessions: &mut HashMap<Uuid, Entry>,
        id: Uuid,
        now: Instant,
    ) -> Option<Arc<Mutex<ChatSession>>> {
        let entry = sessions.get_mut(&id)?;
        if now.saturating_duration_since(entry.last_seen) > self.idle {
            sessions.remove(&id);
            debug!(session = %id, "idle session expired");
            return None;
        }
        entry.last_seen = now;
        Some(entry.session.clone())
    }

    /// Make room for one more session.
    fn evict(&self, sessions: &mut HashMap<Uuid, Entry>, now: Instant) {
        let before = sessions.len();
        sessions.retain(|_, e| now.saturating_duration_since(e.last_seen) <= self.idle);

        while sessions.len() >= self.max {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, e)| e.last_seen)
                .map(|(id, _)| *id)
            else {
                break;
            };
            sessions.remove(&oldest);
        }

        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, remaining = sessions.len(), "sessions evicted");
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
