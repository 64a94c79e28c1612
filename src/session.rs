//! Session state and the page router.
//!
//! Each candidate session owns one `ScreeningState` and the page it is
//! on. Sessions are keyed by UUID and guarded by a per-session mutex so
//! at most one turn mutates a session at a time; there is no cross-session
//! sharing.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::SessionError;
use crate::llm::ChatMessage;
use crate::screening::ScreeningState;

/// The four screens of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Welcome,
    InfoCollection,
    ChatInterface,
    Exit,
}

impl Default for Page {
    fn default() -> Self {
        Self::Welcome
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Welcome => "welcome",
            Self::InfoCollection => "info_collection",
            Self::ChatInterface => "chat_interface",
            Self::Exit => "exit",
        };
        write!(f, "{s}")
    }
}

/// One candidate session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub page: Page,
    pub screening: ScreeningState,
    /// Chat transcript shown to the candidate.
    pub transcript: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    default_language: String,
}

impl Session {
    pub fn new(default_language: impl Into<String>) -> Self {
        let default_language = default_language.into();
        let now = Utc::now();
        let mut screening = ScreeningState::default();
        screening.record.preferred_language = default_language.clone();
        Self {
            id: Uuid::new_v4(),
            page: Page::Welcome,
            screening,
            transcript: Vec::new(),
            created_at: now,
            updated_at: now,
            default_language,
        }
    }

    /// Error unless the session is on `expected`.
    pub fn require_page(&self, expected: Page) -> Result<(), SessionError> {
        if self.page != expected {
            return Err(SessionError::WrongPage {
                expected: expected.to_string(),
                actual: self.page.to_string(),
            });
        }
        Ok(())
    }

    /// Welcome → InfoCollection, discarding any previous application.
    pub fn start_application(&mut self) -> Result<(), SessionError> {
        self.require_page(Page::Welcome)?;
        self.discard_application();
        self.page = Page::InfoCollection;
        self.touch();
        Ok(())
    }

    /// Return to Welcome and discard the whole record.
    pub fn reset(&mut self) {
        self.discard_application();
        self.page = Page::Welcome;
        self.touch();
    }

    /// Move to another page.
    pub fn navigate(&mut self, page: Page) {
        self.page = page;
        self.touch();
    }

    /// Append a turn to the transcript.
    pub fn push_message(&mut self, message: ChatMessage) {
        self.transcript.push(message);
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn discard_application(&mut self) {
        self.screening = ScreeningState::default();
        self.screening.record.preferred_language = self.default_language.clone();
        self.transcript.clear();
    }
}

/// In-memory session registry.
pub struct SessionManager {
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>,
    default_language: String,
}

impl SessionManager {
    pub fn new(default_language: impl Into<String>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            default_language: default_language.into(),
        }
    }

    /// Create a new session and return a handle to it.
    pub async fn create(&self) -> Arc<Mutex<Session>> {
        let session = Session::new(self.default_language.clone());
        let id = session.id;
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, Arc::clone(&handle));
        handle
    }

    /// Look up a session by id.
    pub async fn get(&self, id: Uuid) -> Result<Arc<Mutex<Session>>, SessionError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound { id })
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
