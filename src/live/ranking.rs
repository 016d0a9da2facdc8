//! Scoring formula and ranking order. Stateless: callers pass the roster
//! they just read, nothing is cached between requests.

use std::cmp::Ordering;

use crate::{
    config::MAX_QUESTION_POINTS,
    models::participant::{Participant, RankedPlayer},
};

pub const PODIUM_SIZE: usize = 3;
pub const LEADERBOARD_SIZE: usize = 5;

/// Points for a correct answer: full marks at 0s, linear decay to 0 at the
/// time limit, clamped at 0 for late answers. Negative reported times
/// count as 0s.
pub fn points_for(time_taken: f64, time_limit: i32) -> i64 {
    if time_limit <= 0 {
        return 0;
    }
    let limit = f64::from(time_limit);
    let remaining = (limit - time_taken.max(0.0)).max(0.0);
    (MAX_QUESTION_POINTS * (remaining / limit)).floor() as i64
}

/// Score descending, then earlier join, then lower id.
pub fn compare(a: &Participant, b: &Participant) -> Ordering {
    b.score
        .cmp(&a.score)
        .then(a.joined_at.cmp(&b.joined_at))
        .then(a.id.cmp(&b.id))
}

pub fn sort_ranked(players: &mut [Participant]) {
    players.sort_by(compare);
}

/// 1-based rank of `participant_id` in an already ranked roster, 0 if absent.
pub fn rank_of(ranked: &[Participant], participant_id: i64) -> usize {
    ranked
        .iter()
        .position(|p| p.id == participant_id)
        .map_or(0, |i| i + 1)
}

pub fn podium(ranked: &[Participant]) -> Vec<RankedPlayer> {
    top(ranked, PODIUM_SIZE)
}

pub fn leaderboard_snapshot(ranked: &[Participant]) -> Vec<RankedPlayer> {
    top(ranked, LEADERBOARD_SIZE)
}

fn top(ranked: &[Participant], n: usize) -> Vec<RankedPlayer> {
    ranked.iter().take(n).map(RankedPlayer::from).collect()
}
