// src/models/message.rs

//! Wire envelopes for the live session socket.
//! Inbound frames are `{"action": ..., ...}`, outbound frames `{"type": ..., ...}`.

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{
    answer::{AnswerOutcome, QuestionResults},
    participant::{PlayerSummary, RankedPlayer},
    question::QuestionView,
    session::SessionStatus,
};

/// Everything a client may send. Frames with any other `action` fail to
/// decode and are dropped by the socket loop.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    HostJoin {
        #[serde(default)]
        host_token: Option<String>,
    },
    PlayerJoin {
        player_id: i64,
        nickname: String,
        avatar_id: i32,
    },
    PlayerReady {
        player_id: i64,
    },
    KickPlayer {
        player_id: i64,
    },
    StartGame,
    NextQuestion,
    /// Mistyped or missing option/time still decode, so the sender gets
    /// a zero `answer_result` instead of silence.
    SubmitAnswer {
        player_id: i64,
        #[serde(default, deserialize_with = "lenient_string")]
        selected_option: Option<String>,
        #[serde(default, deserialize_with = "lenient_f64")]
        time_taken: Option<f64>,
    },
    ShowResults,
    EndGame,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(serde_json::Value::deserialize(deserializer)?.as_str().map(str::to_owned))
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(serde_json::Value::deserialize(deserializer)?.as_f64())
}

impl ClientMessage {
    pub fn action(&self) -> &'static str {
        match self {
            ClientMessage::HostJoin { .. } => "host_join",
            ClientMessage::PlayerJoin { .. } => "player_join",
            ClientMessage::PlayerReady { .. } => "player_ready",
            ClientMessage::KickPlayer { .. } => "kick_player",
            ClientMessage::StartGame => "start_game",
            ClientMessage::NextQuestion => "next_question",
            ClientMessage::SubmitAnswer { .. } => "submit_answer",
            ClientMessage::ShowResults => "show_results",
            ClientMessage::EndGame => "end_game",
        }
    }
}

/// Everything the server sends, unicast or fanned out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    HostConnected {
        session_pin: String,
        quiz_title: String,
        total_questions: usize,
        max_players: i32,
        players: Vec<PlayerSummary>,
        status: SessionStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_question: Option<QuestionView>,
    },
    PlayerJoined {
        player_id: i64,
        nickname: String,
        avatar_id: i32,
    },
    PlayerLeft {
        player_id: i64,
    },
    PlayerKicked {
        player_id: i64,
    },
    SyncCurrentState {
        status: SessionStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_score: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        question: Option<QuestionView>,
    },
    GameStarted,
    ShowQuestion {
        question: QuestionView,
    },
    AnswerResult(AnswerOutcome),
    AnswerCountUpdate {
        count: usize,
        total: usize,
    },
    QuestionResults {
        results: QuestionResults,
    },
    GameEnded {
        podium: Vec<RankedPlayer>,
    },
}

impl ServerMessage {
    /// Copy of this message as a non-host connection may see it.
    pub fn for_player(&self) -> ServerMessage {
        match self {
            ServerMessage::QuestionResults { results } => ServerMessage::QuestionResults {
                results: QuestionResults {
                    correct_option: None,
                    ..results.clone()
                },
            },
            other => other.clone(),
        }
    }
}
