// src/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    live::LiveError,
    models::{
        answer::{Answer, NewAnswer},
        participant::Participant,
        question::{Question, Quiz},
        session::{Session, SessionStatus},
    },
    store::LiveStore,
    utils::pin::{PIN_ATTEMPTS, generate_pin},
};

type PinSource = Box<dyn Fn() -> String + Send + Sync>;

#[derive(Default)]
struct Inner {
    quizzes: HashMap<i64, Quiz>,
    questions: HashMap<i64, Vec<Question>>,
    sessions: HashMap<String, Session>,
    participants: HashMap<i64, Participant>,
    answers: HashMap<(i64, i64), Answer>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn session(&self, pin: &str) -> Result<&Session, LiveError> {
        self.sessions
            .get(pin)
            .ok_or_else(|| LiveError::not_found(format!("Session {}", pin)))
    }

    fn session_mut(&mut self, pin: &str) -> Result<&mut Session, LiveError> {
        self.sessions
            .get_mut(pin)
            .ok_or_else(|| LiveError::not_found(format!("Session {}", pin)))
    }

    fn roster(&self, session_id: i64) -> impl Iterator<Item = &Participant> {
        self.participants.values().filter(move |p| p.session_id == session_id)
    }
}

/// Process-local store. Backs the test suites and embedded use; all state
/// sits behind one async mutex, so every trait call is atomic.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    pin_source: PinSource,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_pin_source(generate_pin)
    }

    /// Uses `source` instead of the random generator for join codes.
    pub fn with_pin_source(source: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            pin_source: Box::new(source),
        }
    }

    /// Loads quiz content. Question order follows `(position, id)`.
    pub async fn insert_quiz(&self, quiz: Quiz, mut questions: Vec<Question>) {
        questions.sort_by_key(|q| (q.position, q.id));
        let mut inner = self.inner.lock().await;
        inner.next_id = inner.next_id.max(quiz.id).max(questions.iter().map(|q| q.id).max().unwrap_or(0));
        inner.questions.insert(quiz.id, questions);
        inner.quizzes.insert(quiz.id, quiz);
    }
}

#[async_trait]
impl LiveStore for MemoryStore {
    async fn quiz(&self, quiz_id: i64) -> Result<Option<Quiz>, LiveError> {
        Ok(self.inner.lock().await.quizzes.get(&quiz_id).cloned())
    }

    async fn questions(&self, quiz_id: i64) -> Result<Vec<Question>, LiveError> {
        Ok(self
            .inner
            .lock()
            .await
            .questions
            .get(&quiz_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_session(&self, quiz_id: i64, host_id: i64, max_players: i32) -> Result<Session, LiveError> {
        let mut inner = self.inner.lock().await;

        if !inner.quizzes.contains_key(&quiz_id) {
            return Err(LiveError::not_found(format!("Quiz {}", quiz_id)));
        }
        if inner.questions.get(&quiz_id).is_none_or(|q| q.is_empty()) {
            return Err(LiveError::EmptyQuiz);
        }

        let pin = (0..PIN_ATTEMPTS)
            .map(|_| (self.pin_source)())
            .find(|pin| !inner.sessions.contains_key(pin))
            .ok_or_else(|| LiveError::Conflict("could not allocate a unique PIN".to_string()))?;

        let session = Session {
            id: inner.next_id(),
            pin: pin.clone(),
            quiz_id,
            host_id,
            status: SessionStatus::Lobby,
            current_question_index: -1,
            question_started_at: None,
            max_players,
            created_at: Utc::now(),
        };
        inner.sessions.insert(pin, session.clone());
        Ok(session)
    }

    async fn session(&self, pin: &str) -> Result<Option<Session>, LiveError> {
        Ok(self.inner.lock().await.sessions.get(pin).cloned())
    }

    async fn set_status(&self, pin: &str, status: SessionStatus) -> Result<bool, LiveError> {
        let mut inner = self.inner.lock().await;
        let session = inner.session_mut(pin)?;
        if status <= session.status {
            return Ok(false);
        }
        session.status = status;
        Ok(true)
    }

    async fn advance(&self, pin: &str, expected: i32) -> Result<Session, LiveError> {
        let mut inner = self.inner.lock().await;
        let session = inner.session_mut(pin)?;
        if session.status != SessionStatus::Playing {
            return Err(LiveError::NotPlaying);
        }
        if session.current_question_index != expected {
            return Err(LiveError::Conflict(format!(
                "question pointer moved from {} to {}",
                expected, session.current_question_index
            )));
        }
        session.current_question_index = expected + 1;
        session.question_started_at = Some(Utc::now());
        Ok(session.clone())
    }

    async fn add_participant(&self, pin: &str, nickname: &str, avatar_id: i32) -> Result<Participant, LiveError> {
        let mut inner = self.inner.lock().await;
        let session = inner.session(pin)?;
        let (session_id, max_players) = (session.id, session.max_players);

        if session.status != SessionStatus::Lobby {
            return Err(LiveError::SessionNotJoinable);
        }
        if inner.roster(session_id).any(|p| p.nickname == nickname) {
            return Err(LiveError::DuplicateNickname(nickname.to_string()));
        }
        if inner.roster(session_id).count() >= usize::try_from(max_players).unwrap_or(0) {
            return Err(LiveError::SessionFull(max_players));
        }

        let participant = Participant {
            id: inner.next_id(),
            session_id,
            nickname: nickname.to_string(),
            avatar_id,
            score: 0,
            joined_at: Utc::now(),
        };
        inner.participants.insert(participant.id, participant.clone());
        Ok(participant)
    }

    async fn remove_participant(&self, pin: &str, participant_id: i64) -> Result<bool, LiveError> {
        let mut inner = self.inner.lock().await;
        let session = inner.session(pin)?;
        if session.status != SessionStatus::Lobby {
            return Ok(false);
        }
        let session_id = session.id;

        let belongs = inner
            .participants
            .get(&participant_id)
            .is_some_and(|p| p.session_id == session_id);
        if !belongs {
            return Ok(false);
        }

        inner.participants.remove(&participant_id);
        inner.answers.retain(|(pid, _), _| *pid != participant_id);
        Ok(true)
    }

    async fn participants(&self, pin: &str) -> Result<Vec<Participant>, LiveError> {
        let inner = self.inner.lock().await;
        let session_id = inner.session(pin)?.id;
        Ok(inner.roster(session_id).cloned().collect())
    }

    async fn participant(&self, pin: &str, participant_id: i64) -> Result<Option<Participant>, LiveError> {
        let inner = self.inner.lock().await;
        let session_id = inner.session(pin)?.id;
        Ok(inner
            .participants
            .get(&participant_id)
            .filter(|p| p.session_id == session_id)
            .cloned())
    }

    async fn upsert_answer(&self, answer: NewAnswer) -> Result<i64, LiveError> {
        let mut inner = self.inner.lock().await;
        if !inner.participants.contains_key(&answer.participant_id) {
            return Err(LiveError::not_found(format!("Participant {}", answer.participant_id)));
        }

        let participant_id = answer.participant_id;
        inner.answers.insert(
            (participant_id, answer.question_id),
            Answer {
                participant_id,
                question_id: answer.question_id,
                selected_option: answer.selected_option,
                is_correct: answer.is_correct,
                time_taken: answer.time_taken,
                points_earned: answer.points_earned,
                answered_at: Utc::now(),
            },
        );

        let total: i64 = inner
            .answers
            .values()
            .filter(|a| a.participant_id == participant_id)
            .map(|a| a.points_earned)
            .sum();

        if let Some(p) = inner.participants.get_mut(&participant_id) {
            p.score = total;
        }
        Ok(total)
    }

    async fn has_answered(&self, participant_id: i64, question_id: i64) -> Result<bool, LiveError> {
        Ok(self
            .inner
            .lock()
            .await
            .answers
            .contains_key(&(participant_id, question_id)))
    }

    async fn answers_for_question(&self, pin: &str, question_id: i64) -> Result<Vec<Answer>, LiveError> {
        let inner = self.inner.lock().await;
        let session_id = inner.session(pin)?.id;
        Ok(inner
            .answers
            .values()
            .filter(|a| a.question_id == question_id)
            .filter(|a| {
                inner
                    .participants
                    .get(&a.participant_id)
                    .is_some_and(|p| p.session_id == session_id)
            })
            .cloned()
            .collect())
    }
}
