// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::{
    live::LiveError,
    models::{
        answer::{Answer, NewAnswer},
        participant::Participant,
        question::{OptionLabel, Question, Quiz},
        session::{Session, SessionStatus},
    },
    store::LiveStore,
    utils::pin::{PIN_ATTEMPTS, generate_pin},
};

const SESSION_COLUMNS: &str = "id, pin, quiz_id, host_id, status, current_question_index, \
                               question_started_at, max_players, created_at";

const PARTICIPANT_COLUMNS: &str = "p.id, p.session_id, p.nickname, p.avatar_id, p.score, p.joined_at";

/// Row shape of 'live_sessions'; status is stored as text.
#[derive(FromRow)]
struct SessionRow {
    id: i64,
    pin: String,
    quiz_id: i64,
    host_id: i64,
    status: String,
    current_question_index: i32,
    question_started_at: Option<DateTime<Utc>>,
    max_players: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for Session {
    type Error = LiveError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Session {
            id: row.id,
            pin: row.pin,
            quiz_id: row.quiz_id,
            host_id: row.host_id,
            status: row.status.parse().map_err(decode_error)?,
            current_question_index: row.current_question_index,
            question_started_at: row.question_started_at,
            max_players: row.max_players,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct QuestionRow {
    id: i64,
    quiz_id: i64,
    text: String,
    image: Option<String>,
    option_a: String,
    option_b: String,
    option_c: String,
    option_d: String,
    correct_option: String,
    time_limit: i32,
    position: i32,
}

impl TryFrom<QuestionRow> for Question {
    type Error = LiveError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        Ok(Question {
            id: row.id,
            quiz_id: row.quiz_id,
            text: row.text,
            image: row.image,
            option_a: row.option_a,
            option_b: row.option_b,
            option_c: row.option_c,
            option_d: row.option_d,
            correct_option: row.correct_option.parse().map_err(decode_error)?,
            time_limit: row.time_limit,
            position: row.position,
        })
    }
}

#[derive(FromRow)]
struct AnswerRow {
    participant_id: i64,
    question_id: i64,
    selected_option: String,
    is_correct: bool,
    time_taken: f64,
    points_earned: i64,
    answered_at: DateTime<Utc>,
}

impl TryFrom<AnswerRow> for Answer {
    type Error = LiveError;

    fn try_from(row: AnswerRow) -> Result<Self, Self::Error> {
        Ok(Answer {
            participant_id: row.participant_id,
            question_id: row.question_id,
            selected_option: row.selected_option.parse::<OptionLabel>().map_err(decode_error)?,
            is_correct: row.is_correct,
            time_taken: row.time_taken,
            points_earned: row.points_earned,
            answered_at: row.answered_at,
        })
    }
}

fn decode_error(msg: String) -> LiveError {
    LiveError::Storage(sqlx::Error::Decode(msg.into()))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error().is_some_and(|e| e.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error().is_some_and(|e| e.is_foreign_key_violation())
}

fn status_rank(status: SessionStatus) -> i32 {
    match status {
        SessionStatus::Lobby => 0,
        SessionStatus::Playing => 1,
        SessionStatus::Finished => 2,
    }
}

/// Postgres-backed store over the tables in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn require_session(&self, pin: &str) -> Result<Session, LiveError> {
        self.session(pin)
            .await?
            .ok_or_else(|| LiveError::not_found(format!("Session {}", pin)))
    }
}

#[async_trait]
impl LiveStore for PgStore {
    async fn quiz(&self, quiz_id: i64) -> Result<Option<Quiz>, LiveError> {
        let row: Option<(i64, String, i64)> =
            sqlx::query_as("SELECT id, title, creator_id FROM live_quizzes WHERE id = $1")
                .bind(quiz_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(id, title, creator_id)| Quiz { id, title, creator_id }))
    }

    async fn questions(&self, quiz_id: i64) -> Result<Vec<Question>, LiveError> {
        sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT
                id, quiz_id, text, image,
                option_a, option_b, option_c, option_d,
                correct_option, time_limit, position
            FROM live_questions
            WHERE quiz_id = $1
            ORDER BY position, id
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Question::try_from)
        .collect()
    }

    async fn create_session(&self, quiz_id: i64, host_id: i64, max_players: i32) -> Result<Session, LiveError> {
        if self.quiz(quiz_id).await?.is_none() {
            return Err(LiveError::not_found(format!("Quiz {}", quiz_id)));
        }

        let question_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM live_questions WHERE quiz_id = $1")
            .bind(quiz_id)
            .fetch_one(&self.pool)
            .await?;
        if question_count == 0 {
            return Err(LiveError::EmptyQuiz);
        }

        let sql = format!(
            "INSERT INTO live_sessions (pin, quiz_id, host_id, max_players) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            SESSION_COLUMNS
        );

        // The unique index on `pin` is the collision check.
        for _ in 0..PIN_ATTEMPTS {
            let pin = generate_pin();
            let inserted = sqlx::query_as::<_, SessionRow>(&sql)
                .bind(&pin)
                .bind(quiz_id)
                .bind(host_id)
                .bind(max_players)
                .fetch_one(&self.pool)
                .await;

            match inserted {
                Ok(row) => return row.try_into(),
                Err(e) if is_unique_violation(&e) => {
                    tracing::debug!(pin = %pin, "join code collision, retrying");
                }
                Err(e) => {
                    tracing::error!("Failed to create live session: {:?}", e);
                    return Err(e.into());
                }
            }
        }

        Err(LiveError::Conflict("could not allocate a unique PIN".to_string()))
    }

    async fn session(&self, pin: &str) -> Result<Option<Session>, LiveError> {
        let sql = format!("SELECT {} FROM live_sessions WHERE pin = $1", SESSION_COLUMNS);
        sqlx::query_as::<_, SessionRow>(&sql)
            .bind(pin)
            .fetch_optional(&self.pool)
            .await?
            .map(Session::try_from)
            .transpose()
    }

    async fn set_status(&self, pin: &str, status: SessionStatus) -> Result<bool, LiveError> {
        let result = sqlx::query(
            r#"
            UPDATE live_sessions
            SET status = $2
            WHERE pin = $1
              AND (CASE status WHEN 'LOBBY' THEN 0 WHEN 'PLAYING' THEN 1 ELSE 2 END) < $3
            "#,
        )
        .bind(pin)
        .bind(status.as_str())
        .bind(status_rank(status))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }
        self.require_session(pin).await?;
        Ok(false)
    }

    async fn advance(&self, pin: &str, expected: i32) -> Result<Session, LiveError> {
        let sql = format!(
            "UPDATE live_sessions \
             SET current_question_index = current_question_index + 1, question_started_at = NOW() \
             WHERE pin = $1 AND status = 'PLAYING' AND current_question_index = $2 \
             RETURNING {}",
            SESSION_COLUMNS
        );

        let row = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(pin)
            .bind(expected)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            return row.try_into();
        }

        let session = self.require_session(pin).await?;
        if session.status != SessionStatus::Playing {
            return Err(LiveError::NotPlaying);
        }
        Err(LiveError::Conflict(format!(
            "question pointer moved from {} to {}",
            expected, session.current_question_index
        )))
    }

    async fn add_participant(&self, pin: &str, nickname: &str, avatar_id: i32) -> Result<Participant, LiveError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serialises concurrent joins on the same session.
        let session: Option<(i64, String, i32)> =
            sqlx::query_as("SELECT id, status, max_players FROM live_sessions WHERE pin = $1 FOR UPDATE")
                .bind(pin)
                .fetch_optional(&mut *tx)
                .await?;
        let (session_id, status, max_players) =
            session.ok_or_else(|| LiveError::not_found(format!("Session {}", pin)))?;

        if status != SessionStatus::Lobby.as_str() {
            return Err(LiveError::SessionNotJoinable);
        }

        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM live_participants WHERE session_id = $1 AND nickname = $2)",
        )
        .bind(session_id)
        .bind(nickname)
        .fetch_one(&mut *tx)
        .await?;
        if taken {
            return Err(LiveError::DuplicateNickname(nickname.to_string()));
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM live_participants WHERE session_id = $1")
            .bind(session_id)
            .fetch_one(&mut *tx)
            .await?;
        if count >= i64::from(max_players) {
            return Err(LiveError::SessionFull(max_players));
        }

        let participant = sqlx::query_as::<_, Participant>(
            r#"
            INSERT INTO live_participants (session_id, nickname, avatar_id)
            VALUES ($1, $2, $3)
            RETURNING id, session_id, nickname, avatar_id, score, joined_at
            "#,
        )
        .bind(session_id)
        .bind(nickname)
        .bind(avatar_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                LiveError::DuplicateNickname(nickname.to_string())
            } else {
                LiveError::from(e)
            }
        })?;

        tx.commit().await?;
        Ok(participant)
    }

    async fn remove_participant(&self, pin: &str, participant_id: i64) -> Result<bool, LiveError> {
        let result = sqlx::query(
            r#"
            DELETE FROM live_participants p
            USING live_sessions s
            WHERE p.session_id = s.id
              AND s.pin = $1
              AND s.status = 'LOBBY'
              AND p.id = $2
            "#,
        )
        .bind(pin)
        .bind(participant_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn participants(&self, pin: &str) -> Result<Vec<Participant>, LiveError> {
        let session = self.require_session(pin).await?;
        let sql = format!(
            "SELECT {} FROM live_participants p WHERE p.session_id = $1 ORDER BY p.id",
            PARTICIPANT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Participant>(&sql)
            .bind(session.id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn participant(&self, pin: &str, participant_id: i64) -> Result<Option<Participant>, LiveError> {
        let sql = format!(
            "SELECT {} FROM live_participants p \
             JOIN live_sessions s ON s.id = p.session_id \
             WHERE s.pin = $1 AND p.id = $2",
            PARTICIPANT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Participant>(&sql)
            .bind(pin)
            .bind(participant_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn upsert_answer(&self, answer: NewAnswer) -> Result<i64, LiveError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO live_answers
                (participant_id, question_id, selected_option, is_correct, time_taken, points_earned)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (participant_id, question_id) DO UPDATE SET
                selected_option = EXCLUDED.selected_option,
                is_correct = EXCLUDED.is_correct,
                time_taken = EXCLUDED.time_taken,
                points_earned = EXCLUDED.points_earned,
                answered_at = NOW()
            "#,
        )
        .bind(answer.participant_id)
        .bind(answer.question_id)
        .bind(answer.selected_option.as_str())
        .bind(answer.is_correct)
        .bind(answer.time_taken)
        .bind(answer.points_earned)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                LiveError::not_found(format!("Participant {}", answer.participant_id))
            } else {
                LiveError::from(e)
            }
        })?;

        // Recompute from the ledger rather than incrementing.
        let total: i64 = sqlx::query_scalar(
            r#"
            UPDATE live_participants
            SET score = (
                SELECT COALESCE(SUM(points_earned), 0)::BIGINT
                FROM live_answers
                WHERE participant_id = $1
            )
            WHERE id = $1
            RETURNING score
            "#,
        )
        .bind(answer.participant_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(total)
    }

    async fn has_answered(&self, participant_id: i64, question_id: i64) -> Result<bool, LiveError> {
        Ok(sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM live_answers WHERE participant_id = $1 AND question_id = $2)",
        )
        .bind(participant_id)
        .bind(question_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn answers_for_question(&self, pin: &str, question_id: i64) -> Result<Vec<Answer>, LiveError> {
        sqlx::query_as::<_, AnswerRow>(
            r#"
            SELECT
                a.participant_id, a.question_id, a.selected_option,
                a.is_correct, a.time_taken, a.points_earned, a.answered_at
            FROM live_answers a
            JOIN live_participants p ON p.id = a.participant_id
            JOIN live_sessions s ON s.id = p.session_id
            WHERE s.pin = $1 AND a.question_id = $2
            "#,
        )
        .bind(pin)
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Answer::try_from)
        .collect()
    }
}
