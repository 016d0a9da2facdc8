// src/models/participant.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::config::AVATAR_COUNT;

/// Represents the 'live_participants' table: one player inside one session.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Participant {
    pub id: i64,
    pub session_id: i64,

    /// Unique within the session, not globally.
    pub nickname: String,

    pub avatar_id: i32,

    /// Sum of `points_earned` over this participant's answers.
    pub score: i64,

    /// Ranking tiebreak: earlier joiners place ahead on equal score.
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

/// Player entry as shown in lobby lists and snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub id: i64,
    pub nickname: String,
    pub avatar_id: i32,
    pub score: i64,
}

impl From<&Participant> for PlayerSummary {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id,
            nickname: p.nickname.clone(),
            avatar_id: p.avatar_id,
            score: p.score,
        }
    }
}

/// Podium / leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPlayer {
    pub player_id: i64,
    pub nickname: String,
    pub score: i64,
    pub avatar_id: i32,
}

impl From<&Participant> for RankedPlayer {
    fn from(p: &Participant) -> Self {
        Self {
            player_id: p.id,
            nickname: p.nickname.clone(),
            score: p.score,
            avatar_id: p.avatar_id,
        }
    }
}

/// DTO for a guest joining a lobby by PIN.
#[derive(Debug, Deserialize, Validate)]
pub struct JoinRequest {
    #[validate(length(equal = 6, message = "PIN must be 6 digits."))]
    pub pin: String,
    #[validate(length(min = 1, max = 30, message = "Nickname length must be between 1 and 30 characters."))]
    pub nickname: String,
    #[validate(range(min = 1, max = AVATAR_COUNT))]
    #[serde(default = "default_avatar")]
    pub avatar_id: i32,
}

fn default_avatar() -> i32 {
    1
}
