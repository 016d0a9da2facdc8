use crate::{
    live::{LiveError, ranking, roster, sequencer},
    models::{
        answer::{AnswerCount, AnswerCounts, AnswerOutcome, NewAnswer, QuestionResults},
        question::OptionLabel,
        session::{Session, SessionStatus},
    },
    store::LiveStore,
};

async fn load_session(store: &dyn LiveStore, pin: &str) -> Result<Session, LiveError> {
    store
        .session(pin)
        .await?
        .ok_or_else(|| LiveError::not_found(format!("Session {}", pin)))
}

/// Scores and stores a player's answer to the session's current question.
///
/// The (participant, question) row is upserted and the total recomputed
/// from every stored answer, so retries and resubmissions never stack
/// points. Late answers are accepted and earn 0.
pub async fn record(
    store: &dyn LiveStore,
    pin: &str,
    participant_id: i64,
    selected_option: &str,
    time_taken: f64,
) -> Result<AnswerOutcome, LiveError> {
    let session = load_session(store, pin).await?;
    if session.status != SessionStatus::Playing {
        return Err(LiveError::NotPlaying);
    }

    let participant = store
        .participant(pin, participant_id)
        .await?
        .ok_or_else(|| LiveError::not_found(format!("Player {}", participant_id)))?;

    let (question, _, _) = sequencer::question_at(store, &session)
        .await?
        .ok_or_else(|| LiveError::not_found("Current question"))?;

    let selected = selected_option.parse::<OptionLabel>().map_err(LiveError::InvalidOption)?;
    let is_correct = selected == question.correct_option;
    let points_earned = if is_correct {
        ranking::points_for(time_taken, question.time_limit)
    } else {
        0
    };

    let total_score = store
        .upsert_answer(NewAnswer {
            participant_id: participant.id,
            question_id: question.id,
            selected_option: selected,
            is_correct,
            time_taken,
            points_earned,
        })
        .await?;

    let ranked = roster::list(store, pin).await?;
    let rank = ranking::rank_of(&ranked, participant.id);

    tracing::debug!(
        pin,
        player_id = participant.id,
        question_id = question.id,
        is_correct,
        points_earned,
        total_score,
        rank,
        "answer recorded"
    );

    Ok(AnswerOutcome {
        is_correct,
        points_earned,
        total_score,
        rank,
    })
}

pub async fn has_answered(store: &dyn LiveStore, participant_id: i64, question_id: i64) -> Result<bool, LiveError> {
    store.has_answered(participant_id, question_id).await
}

/// Answers received for the current question versus players in the room.
pub async fn answer_count(store: &dyn LiveStore, pin: &str) -> Result<AnswerCount, LiveError> {
    let session = load_session(store, pin).await?;
    let Some((question, _, _)) = sequencer::question_at(store, &session).await? else {
        return Ok(AnswerCount::default());
    };

    let count = store.answers_for_question(pin, question.id).await?.len();
    let total = store.participants(pin).await?.len();
    Ok(AnswerCount { count, total })
}

/// Per-option tally, the correct label and the current top five.
/// `None` when no question has been revealed yet.
pub async fn question_results(store: &dyn LiveStore, pin: &str) -> Result<Option<QuestionResults>, LiveError> {
    let session = load_session(store, pin).await?;
    let Some((question, _, _)) = sequencer::question_at(store, &session).await? else {
        return Ok(None);
    };

    let mut answer_counts = AnswerCounts::default();
    for answer in store.answers_for_question(pin, question.id).await? {
        answer_counts.add(answer.selected_option);
    }

    let ranked = roster::list(store, pin).await?;
    Ok(Some(QuestionResults {
        correct_option: Some(question.correct_option),
        answer_counts,
        top_players: ranking::leaderboard_snapshot(&ranked),
    }))
}
