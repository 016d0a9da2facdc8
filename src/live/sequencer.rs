use crate::{
    live::LiveError,
    models::{
        question::{Question, QuestionView},
        session::Session,
    },
    store::LiveStore,
};

/// The question the session pointer designates, with the quiz length.
pub(crate) async fn question_at(
    store: &dyn LiveStore,
    session: &Session,
) -> Result<Option<(Question, usize, usize)>, LiveError> {
    let Some(index) = session.question_index() else {
        return Ok(None);
    };
    let mut questions = store.questions(session.quiz_id).await?;
    let total = questions.len();
    if index >= total {
        return Ok(None);
    }
    Ok(Some((questions.swap_remove(index), index, total)))
}

/// Read-only view of the current question. `None` before the first
/// advance.
pub async fn current_question(store: &dyn LiveStore, pin: &str) -> Result<Option<QuestionView>, LiveError> {
    let session = store
        .session(pin)
        .await?
        .ok_or_else(|| LiveError::not_found(format!("Session {}", pin)))?;

    Ok(question_at(store, &session)
        .await?
        .map(|(question, index, total)| QuestionView::new(&question, index, total)))
}

/// Moves to the next question and returns its view, or `None` once the
/// quiz is exhausted (the pointer is left on the last question and the
/// caller ends the game).
///
/// The pointer move is a compare-and-swap against the index read here, so
/// two racing calls cannot skip a question: the loser gets `Conflict`.
pub async fn advance(store: &dyn LiveStore, pin: &str) -> Result<Option<QuestionView>, LiveError> {
    let session = store
        .session(pin)
        .await?
        .ok_or_else(|| LiveError::not_found(format!("Session {}", pin)))?;

    let questions = store.questions(session.quiz_id).await?;
    let next = usize::try_from(session.current_question_index + 1)
        .ok()
        .and_then(|i| questions.get(i).map(|q| (i, q)));
    let Some((index, question)) = next else {
        return Ok(None);
    };

    let advanced = store.advance(pin, session.current_question_index).await?;
    tracing::debug!(pin, index = advanced.current_question_index, "advanced to next question");

    Ok(Some(QuestionView::new(question, index, questions.len())))
}
