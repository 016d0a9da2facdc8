// src/models/session.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::MAX_PLAYERS_LIMIT;
use crate::models::participant::PlayerSummary;

/// Lifecycle of a live session. Variants are declared in transition order,
/// so `Ord` doubles as the "is this a forward move" check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionStatus {
    Lobby,
    Playing,
    Finished,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Lobby => "LOBBY",
            SessionStatus::Playing => "PLAYING",
            SessionStatus::Finished => "FINISHED",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOBBY" => Ok(SessionStatus::Lobby),
            "PLAYING" => Ok(SessionStatus::Playing),
            "FINISHED" => Ok(SessionStatus::Finished),
            other => Err(format!("unknown session status '{}'", other)),
        }
    }
}

/// Represents the 'live_sessions' table: one play-through of a quiz.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub id: i64,

    /// Six-digit join code, unique across every session ever created.
    pub pin: String,

    pub quiz_id: i64,
    pub host_id: i64,
    pub status: SessionStatus,

    /// Index into the quiz's ordered questions; -1 until the first advance.
    pub current_question_index: i32,

    /// When the current question was revealed.
    pub question_started_at: Option<chrono::DateTime<chrono::Utc>>,

    pub max_players: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Session {
    /// The current question index, if one has been revealed.
    pub fn question_index(&self) -> Option<usize> {
        usize::try_from(self.current_question_index).ok()
    }
}

/// DTO for a host opening a new session on one of their quizzes.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(range(min = 1, max = MAX_PLAYERS_LIMIT))]
    pub max_players: Option<i32>,
}

/// Returned to the host after session creation.
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: i64,
    pub pin: String,
    pub status: SessionStatus,
    pub max_players: i32,
    /// Capability the host presents on `host_join`.
    pub host_token: String,
}

/// Polling snapshot of a session, mirroring what a socket resync shows.
#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub quiz_title: String,
    pub total_questions: usize,
    pub current_question: i32,
    pub players: Vec<PlayerSummary>,
    pub player_count: usize,
}
