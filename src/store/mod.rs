// src/store/mod.rs

//! Persistence seam for live sessions.
//!
//! Every method is individually atomic. Multi-step rules that must not
//! race (join capacity, forward-only status, pointer advance, answer
//! upsert plus score recompute) are enforced inside a single call.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    live::LiveError,
    models::{
        answer::{Answer, NewAnswer},
        participant::Participant,
        question::{Question, Quiz},
        session::{Session, SessionStatus},
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait LiveStore: Send + Sync {
    /// Quiz header, if it exists.
    async fn quiz(&self, quiz_id: i64) -> Result<Option<Quiz>, LiveError>;

    /// Questions of a quiz ordered by `(position, id)`.
    async fn questions(&self, quiz_id: i64) -> Result<Vec<Question>, LiveError>;

    /// Opens a LOBBY session with a fresh join code.
    ///
    /// Fails with `NotFound` for an unknown quiz and `EmptyQuiz` when the
    /// quiz has no questions.
    async fn create_session(&self, quiz_id: i64, host_id: i64, max_players: i32) -> Result<Session, LiveError>;

    async fn session(&self, pin: &str) -> Result<Option<Session>, LiveError>;

    /// Moves the session forward to `status`. Returns `false` without
    /// writing when `status` is not ahead of the current one.
    async fn set_status(&self, pin: &str, status: SessionStatus) -> Result<bool, LiveError>;

    /// Compare-and-swap on the question pointer: moves it from `expected`
    /// to `expected + 1` and stamps the reveal time in the same write.
    /// Fails with `Conflict` when the pointer is no longer `expected` and
    /// with `NotPlaying` outside PLAYING.
    async fn advance(&self, pin: &str, expected: i32) -> Result<Session, LiveError>;

    /// Adds a participant while the session is in LOBBY, enforcing
    /// nickname uniqueness and capacity atomically.
    async fn add_participant(&self, pin: &str, nickname: &str, avatar_id: i32) -> Result<Participant, LiveError>;

    /// Deletes a participant (and their answers) only while in LOBBY.
    async fn remove_participant(&self, pin: &str, participant_id: i64) -> Result<bool, LiveError>;

    /// Every participant of the session, in no particular order.
    async fn participants(&self, pin: &str) -> Result<Vec<Participant>, LiveError>;

    async fn participant(&self, pin: &str, participant_id: i64) -> Result<Option<Participant>, LiveError>;

    /// Inserts or replaces the (participant, question) answer, then
    /// recomputes the participant's score from all of their answers.
    /// Returns the new total.
    async fn upsert_answer(&self, answer: NewAnswer) -> Result<i64, LiveError>;

    async fn has_answered(&self, participant_id: i64, question_id: i64) -> Result<bool, LiveError>;

    /// Answers to `question_id` given by participants of this session.
    async fn answers_for_question(&self, pin: &str, question_id: i64) -> Result<Vec<Answer>, LiveError>;
}
