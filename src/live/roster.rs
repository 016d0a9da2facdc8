use crate::{
    config::{AVATAR_COUNT, NICKNAME_MAX_LEN},
    live::{LiveError, ranking},
    models::{participant::Participant, session::SessionStatus},
    store::LiveStore,
};

/// Adds a player to a LOBBY session.
///
/// Rejections create nothing: `SessionNotJoinable` outside LOBBY,
/// `DuplicateNickname` when the name is taken in this session,
/// `SessionFull` at capacity.
pub async fn join(
    store: &dyn LiveStore,
    pin: &str,
    nickname: &str,
    avatar_id: i32,
) -> Result<Participant, LiveError> {
    let nickname = nickname.trim();
    if nickname.is_empty() {
        return Err(LiveError::Invalid("nickname is required".to_string()));
    }
    if nickname.chars().count() > NICKNAME_MAX_LEN {
        return Err(LiveError::Invalid(format!(
            "nickname is longer than {} characters",
            NICKNAME_MAX_LEN
        )));
    }
    if !(1..=AVATAR_COUNT).contains(&avatar_id) {
        return Err(LiveError::Invalid(format!("avatar {} does not exist", avatar_id)));
    }

    let participant = store.add_participant(pin, nickname, avatar_id).await?;
    tracing::info!(pin, player_id = participant.id, nickname, "player joined lobby");
    Ok(participant)
}

/// Removes a player while the session is still in LOBBY.
/// Returns `false` (and changes nothing) in any other state or when the
/// player is not in this session.
pub async fn kick(store: &dyn LiveStore, pin: &str, participant_id: i64) -> Result<bool, LiveError> {
    let Some(session) = store.session(pin).await? else {
        return Ok(false);
    };
    if session.status != SessionStatus::Lobby {
        return Ok(false);
    }
    store.remove_participant(pin, participant_id).await
}

/// Every participant in ranking order (score desc, join time asc).
pub async fn list(store: &dyn LiveStore, pin: &str) -> Result<Vec<Participant>, LiveError> {
    let mut players = store.participants(pin).await?;
    ranking::sort_ranked(&mut players);
    Ok(players)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{OptionLabel, Question, Quiz};
    use crate::store::MemoryStore;

    async fn lobby(capacity: i32) -> (MemoryStore, String) {
        let store = MemoryStore::new();
        store
            .insert_quiz(
                Quiz { id: 1, title: "Quiz".to_string(), creator_id: 1 },
                vec![Question {
                    id: 10,
                    quiz_id: 1,
                    text: "Q".to_string(),
                    image: None,
                    option_a: "a".to_string(),
                    option_b: "b".to_string(),
                    option_c: "c".to_string(),
                    option_d: "d".to_string(),
                    correct_option: OptionLabel::A,
                    time_limit: 20,
                    position: 0,
                }],
            )
            .await;
        let pin = store.create_session(1, 1, capacity).await.unwrap().pin;
        (store, pin)
    }

    #[tokio::test]
    async fn test_duplicate_nickname_rejected() {
        let (store, pin) = lobby(50).await;

        join(&store, &pin, "Alex", 1).await.unwrap();
        let err = join(&store, &pin, "Alex", 2).await.unwrap_err();
        assert!(matches!(err, LiveError::DuplicateNickname(_)));

        // Trimmed names collide too.
        let err = join(&store, &pin, "  Alex ", 2).await.unwrap_err();
        assert!(matches!(err, LiveError::DuplicateNickname(_)));

        assert_eq!(list(&store, &pin).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_capacity_enforced() {
        let (store, pin) = lobby(3).await;

        for name in ["a", "b", "c"] {
            join(&store, &pin, name, 1).await.unwrap();
        }
        let err = join(&store, &pin, "d", 1).await.unwrap_err();
        assert!(matches!(err, LiveError::SessionFull(3)));
        assert_eq!(list(&store, &pin).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_join_only_in_lobby() {
        let (store, pin) = lobby(50).await;
        store.set_status(&pin, SessionStatus::Playing).await.unwrap();

        let err = join(&store, &pin, "Late", 1).await.unwrap_err();
        assert!(matches!(err, LiveError::SessionNotJoinable));
    }

    #[tokio::test]
    async fn test_join_validates_input() {
        let (store, pin) = lobby(50).await;

        assert!(matches!(join(&store, &pin, "   ", 1).await, Err(LiveError::Invalid(_))));
        assert!(matches!(join(&store, &pin, "Sam", 0).await, Err(LiveError::Invalid(_))));
        assert!(matches!(join(&store, &pin, "Sam", 16).await, Err(LiveError::Invalid(_))));
        assert!(matches!(join(&store, "000000", "Sam", 1).await, Err(LiveError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_kick_only_in_lobby() {
        let (store, pin) = lobby(50).await;
        let a = join(&store, &pin, "a", 1).await.unwrap();
        let b = join(&store, &pin, "b", 1).await.unwrap();

        assert!(kick(&store, &pin, a.id).await.unwrap());
        assert!(!kick(&store, &pin, a.id).await.unwrap());

        store.set_status(&pin, SessionStatus::Playing).await.unwrap();
        assert!(!kick(&store, &pin, b.id).await.unwrap());

        let ids: Vec<i64> = list(&store, &pin).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![b.id]);
    }

    #[tokio::test]
    async fn test_list_ties_follow_join_order() {
        let (store, pin) = lobby(50).await;
        let first = join(&store, &pin, "first", 1).await.unwrap();
        let second = join(&store, &pin, "second", 1).await.unwrap();

        let ids: Vec<i64> = list(&store, &pin).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }
}
