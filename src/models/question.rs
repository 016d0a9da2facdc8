// src/models/question.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A quiz owned by a host. Content is read-only while sessions run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub creator_id: i64,
}

/// One of the four answer slots of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    pub const ALL: [OptionLabel; 4] = [OptionLabel::A, OptionLabel::B, OptionLabel::C, OptionLabel::D];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(OptionLabel::A),
            "B" => Ok(OptionLabel::B),
            "C" => Ok(OptionLabel::C),
            "D" => Ok(OptionLabel::D),
            other => Err(format!("'{}' is not one of A, B, C, D", other)),
        }
    }
}

/// Represents the 'live_questions' table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub text: String,

    /// Optional illustration URL.
    pub image: Option<String>,

    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,

    /// Never leaves the server inside a player-visible payload.
    pub correct_option: OptionLabel,

    /// Seconds; informational for client countdowns and the decay formula.
    pub time_limit: i32,

    /// Ordering index within the quiz; ties fall back to `id`.
    pub position: i32,
}

impl Question {
    pub fn option_text(&self, label: OptionLabel) -> &str {
        match label {
            OptionLabel::A => &self.option_a,
            OptionLabel::B => &self.option_b,
            OptionLabel::C => &self.option_c,
            OptionLabel::D => &self.option_d,
        }
    }
}

/// The four option texts keyed by label, as sent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionOptions {
    #[serde(rename = "A")]
    pub a: String,
    #[serde(rename = "B")]
    pub b: String,
    #[serde(rename = "C")]
    pub c: String,
    #[serde(rename = "D")]
    pub d: String,
}

/// Question shaped for transmission. Has no field for the correct label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionView {
    pub question_id: i64,
    pub index: usize,
    pub total: usize,
    pub text: String,
    pub image: Option<String>,
    pub options: QuestionOptions,
    pub time_limit: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_answered: Option<bool>,
}

impl QuestionView {
    pub fn new(question: &Question, index: usize, total: usize) -> Self {
        Self {
            question_id: question.id,
            index,
            total,
            text: question.text.clone(),
            image: question.image.clone(),
            options: QuestionOptions {
                a: question.option_text(OptionLabel::A).to_string(),
                b: question.option_text(OptionLabel::B).to_string(),
                c: question.option_text(OptionLabel::C).to_string(),
                d: question.option_text(OptionLabel::D).to_string(),
            },
            time_limit: question.time_limit,
            has_answered: None,
        }
    }

    pub fn with_answered(mut self, has_answered: bool) -> Self {
        self.has_answered = Some(has_answered);
        self
    }
}
