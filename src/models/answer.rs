// src/models/answer.rs

use serde::Serialize;

use crate::models::{participant::RankedPlayer, question::OptionLabel};

/// Represents the 'live_answers' table.
/// At most one row per (participant, question); resubmissions overwrite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub participant_id: i64,
    pub question_id: i64,
    pub selected_option: OptionLabel,
    pub is_correct: bool,
    /// Seconds, as reported by the client.
    pub time_taken: f64,
    pub points_earned: i64,
    pub answered_at: chrono::DateTime<chrono::Utc>,
}

/// Values written by one ledger upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnswer {
    pub participant_id: i64,
    pub question_id: i64,
    pub selected_option: OptionLabel,
    pub is_correct: bool,
    pub time_taken: f64,
    pub points_earned: i64,
}

/// Feedback for the submitting player. `Default` is the degraded
/// zero-value result used when scoring fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnswerOutcome {
    pub is_correct: bool,
    pub points_earned: i64,
    pub total_score: i64,
    /// 1-based position in the session ranking; 0 when unknown.
    pub rank: usize,
}

/// How many players have answered the current question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AnswerCount {
    pub count: usize,
    pub total: usize,
}

/// Per-option tally for one question.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnswerCounts {
    #[serde(rename = "A")]
    pub a: usize,
    #[serde(rename = "B")]
    pub b: usize,
    #[serde(rename = "C")]
    pub c: usize,
    #[serde(rename = "D")]
    pub d: usize,
}

impl AnswerCounts {
    pub fn add(&mut self, label: OptionLabel) {
        match label {
            OptionLabel::A => self.a += 1,
            OptionLabel::B => self.b += 1,
            OptionLabel::C => self.c += 1,
            OptionLabel::D => self.d += 1,
        }
    }
}

/// Aggregate shown once the host closes a question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResults {
    /// Stripped before delivery to player connections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<OptionLabel>,
    pub answer_counts: AnswerCounts,
    pub top_players: Vec<RankedPlayer>,
}
