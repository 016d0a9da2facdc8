//! Per-connection session protocol.
//!
//! A `Connection` is driven by exactly one socket task, so its handlers run
//! one message at a time in arrival order. Different connections of the
//! same session run concurrently and only share state through the store
//! and the hub.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{
    live::{LiveEngine, LiveError, hub::Fanout, ledger, ranking, roster, sequencer},
    models::{
        answer::{AnswerCount, AnswerOutcome},
        message::{ClientMessage, ServerMessage},
        participant::PlayerSummary,
        session::{Session, SessionStatus},
    },
    utils::jwt::verify_host_token,
};

pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

pub struct Connection {
    engine: LiveEngine,
    pin: String,
    is_host: bool,
    player_id: Option<i64>,
    outbox: Outbox,
}

impl Connection {
    /// Joins the session group. No message is sent until the client acts.
    pub fn open(engine: LiveEngine, pin: impl Into<String>, outbox: Outbox) -> (Self, Fanout) {
        let pin = pin.into();
        let fanout = engine.hub().subscribe(&pin);
        let conn = Self {
            engine,
            pin,
            is_host: false,
            player_id: None,
            outbox,
        };
        (conn, fanout)
    }

    pub fn pin(&self) -> &str {
        &self.pin
    }

    pub fn is_host(&self) -> bool {
        self.is_host
    }

    pub fn player_id(&self) -> Option<i64> {
        self.player_id
    }

    /// What this connection may see of a fanned-out message.
    pub fn outbound(&self, msg: &Arc<ServerMessage>) -> ServerMessage {
        if self.is_host {
            msg.as_ref().clone()
        } else {
            msg.for_player()
        }
    }

    pub async fn handle(&mut self, msg: ClientMessage) -> Result<(), LiveError> {
        tracing::debug!(pin = %self.pin, action = msg.action(), host = self.is_host, "live action");
        match msg {
            ClientMessage::HostJoin { host_token } => self.host_join(host_token).await,
            ClientMessage::PlayerJoin {
                player_id,
                nickname,
                avatar_id,
            } => {
                self.player_join(player_id, nickname, avatar_id);
                Ok(())
            }
            ClientMessage::PlayerReady { player_id } => self.player_ready(player_id).await,
            ClientMessage::KickPlayer { player_id } => self.kick_player(player_id).await,
            ClientMessage::StartGame => self.start_game().await,
            ClientMessage::NextQuestion => self.next_question().await,
            ClientMessage::SubmitAnswer {
                player_id,
                selected_option,
                time_taken,
            } => {
                self.submit_answer(player_id, selected_option.as_deref(), time_taken.unwrap_or(0.0))
                    .await;
                Ok(())
            }
            ClientMessage::ShowResults => self.show_results().await,
            ClientMessage::EndGame => self.end_game().await,
        }
    }

    /// Leaves the group; other members learn about departing players.
    /// Drop the `Fanout` returned by `open` before calling this.
    pub async fn close(self) {
        if let Some(player_id) = self.player_id {
            self.broadcast(ServerMessage::PlayerLeft { player_id });
        }
        self.engine.hub().prune(&self.pin);
        tracing::debug!(pin = %self.pin, host = self.is_host, "live connection closed");
    }

    fn send(&self, msg: ServerMessage) {
        // The receiver only goes away when the socket task is already ending.
        let _ = self.outbox.send(msg);
    }

    fn broadcast(&self, msg: ServerMessage) {
        self.engine.hub().publish(&self.pin, msg);
    }

    fn require_host(&self, action: &'static str) -> Result<(), LiveError> {
        if self.is_host {
            Ok(())
        } else {
            Err(LiveError::UnauthorizedAction(action))
        }
    }

    async fn session(&self) -> Result<Session, LiveError> {
        self.engine
            .store()
            .session(&self.pin)
            .await?
            .ok_or_else(|| LiveError::not_found(format!("Session {}", self.pin)))
    }

    async fn host_join(&mut self, host_token: Option<String>) -> Result<(), LiveError> {
        let session = self.session().await?;

        if self.engine.settings().require_host_token {
            let token = host_token.ok_or(LiveError::UnauthorizedAction("join as host without a token"))?;
            let claims = verify_host_token(&token, &self.pin, self.engine.secret())
                .map_err(|_| LiveError::UnauthorizedAction("join as host with this token"))?;
            if claims.sub != session.host_id.to_string() {
                return Err(LiveError::UnauthorizedAction("join as host of another user's session"));
            }
        }
        self.is_host = true;

        let store = self.engine.store();
        let quiz_title = store
            .quiz(session.quiz_id)
            .await?
            .map(|q| q.title)
            .unwrap_or_default();
        let total_questions = store.questions(session.quiz_id).await?.len();
        let players = roster::list(store, &self.pin)
            .await?
            .iter()
            .map(PlayerSummary::from)
            .collect();

        let current_question = if session.status == SessionStatus::Playing {
            sequencer::current_question(store, &self.pin).await?
        } else {
            None
        };

        tracing::info!(pin = %self.pin, host_id = session.host_id, "host connected");
        self.send(ServerMessage::HostConnected {
            session_pin: self.pin.clone(),
            quiz_title,
            total_questions,
            max_players: session.max_players,
            players,
            status: session.status,
            current_question,
        });
        Ok(())
    }

    fn player_join(&mut self, player_id: i64, nickname: String, avatar_id: i32) {
        self.player_id = Some(player_id);
        self.broadcast(ServerMessage::PlayerJoined {
            player_id,
            nickname,
            avatar_id,
        });
    }

    async fn player_ready(&mut self, player_id: i64) -> Result<(), LiveError> {
        self.player_id = Some(player_id);
        let session = self.session().await?;
        let store = self.engine.store();

        if session.status == SessionStatus::Playing {
            if let Some(view) = sequencer::current_question(store, &self.pin).await? {
                let has_answered = ledger::has_answered(store, player_id, view.question_id).await?;
                let current_score = store
                    .participant(&self.pin, player_id)
                    .await?
                    .map_or(0, |p| p.score);

                self.send(ServerMessage::SyncCurrentState {
                    status: SessionStatus::Playing,
                    current_score: Some(current_score),
                    question: Some(view.with_answered(has_answered)),
                });
                return Ok(());
            }
        }

        self.send(ServerMessage::SyncCurrentState {
            status: session.status,
            current_score: None,
            question: None,
        });
        Ok(())
    }

    async fn kick_player(&mut self, player_id: i64) -> Result<(), LiveError> {
        self.require_host("kick players")?;
        if roster::kick(self.engine.store(), &self.pin, player_id).await? {
            tracing::info!(pin = %self.pin, player_id, "player kicked");
            self.broadcast(ServerMessage::PlayerKicked { player_id });
        }
        Ok(())
    }

    async fn start_game(&mut self) -> Result<(), LiveError> {
        self.require_host("start the game")?;
        if !self.engine.store().set_status(&self.pin, SessionStatus::Playing).await? {
            tracing::debug!(pin = %self.pin, "start ignored, session already started");
            return Ok(());
        }

        tracing::info!(pin = %self.pin, "game started");
        self.broadcast(ServerMessage::GameStarted);

        // Give players time to reach the game screen and reconnect.
        // Not cancelled if the host leaves meanwhile.
        tokio::time::sleep(self.engine.settings().start_delay).await;

        self.next_question().await
    }

    async fn next_question(&mut self) -> Result<(), LiveError> {
        self.require_host("advance questions")?;
        match sequencer::advance(self.engine.store(), &self.pin).await? {
            Some(question) => {
                tracing::info!(pin = %self.pin, index = question.index, total = question.total, "showing question");
                self.broadcast(ServerMessage::ShowQuestion { question });
                Ok(())
            }
            None => self.finish().await,
        }
    }

    async fn submit_answer(&mut self, player_id: i64, selected_option: Option<&str>, time_taken: f64) {
        let store = self.engine.store();

        let recorded = match selected_option {
            Some(option) => ledger::record(store, &self.pin, player_id, option, time_taken).await,
            None => Err(LiveError::InvalidOption("no option selected".to_string())),
        };
        let outcome = match recorded {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::warn!(pin = %self.pin, player_id, error = %error, "answer not scored");
                AnswerOutcome::default()
            }
        };
        self.send(ServerMessage::AnswerResult(outcome));

        let AnswerCount { count, total } = match ledger::answer_count(store, &self.pin).await {
            Ok(counts) => counts,
            Err(error) => {
                tracing::warn!(pin = %self.pin, error = %error, "answer count unavailable");
                AnswerCount::default()
            }
        };
        self.broadcast(ServerMessage::AnswerCountUpdate { count, total });
    }

    async fn show_results(&mut self) -> Result<(), LiveError> {
        self.require_host("show results")?;
        if let Some(results) = ledger::question_results(self.engine.store(), &self.pin).await? {
            self.broadcast(ServerMessage::QuestionResults { results });
        }
        Ok(())
    }

    async fn end_game(&mut self) -> Result<(), LiveError> {
        if self.engine.settings().require_host_token {
            self.require_host("end the game")?;
        }
        self.finish().await
    }

    async fn finish(&mut self) -> Result<(), LiveError> {
        let store = self.engine.store();
        if !store.set_status(&self.pin, SessionStatus::Finished).await? {
            tracing::debug!(pin = %self.pin, "end ignored, session already finished");
            return Ok(());
        }

        let ranked = roster::list(store, &self.pin).await?;
        let podium = ranking::podium(&ranked);
        tracing::info!(pin = %self.pin, players = ranked.len(), "game ended");
        self.broadcast(ServerMessage::GameEnded { podium });
        Ok(())
    }
}
