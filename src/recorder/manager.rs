//! The action write path.
//!
//! One `record` call turns a raw engine event into one enriched, persisted
//! action row: resolve the referenced identities, allocate the step slot,
//! extract features from whatever context the event carried, insert
//! atomically, and fold hand-level facts into the hand aggregate.

use super::errors::{EventIdentity, RecorderError, RecorderResult};
use super::models::{ActionEvent, ActionKind, NewAction, Phase, StoredAction};
use crate::cards::{Card, parse_cards, parse_hole_cards};
use crate::features::{FeatureBundle, FeatureContext, extract};
use crate::session::{ActionId, Cents, HandId, PlayerId, SessionId};
use crate::store::errors::StoreError;
use crate::store::repository::LedgerStore;
use std::sync::Arc;

/// Records action events against a ledger store.
///
/// Recorders are cheap to clone and recorders for different hands write
/// independently; within one hand, step allocation serializes at the store.
pub struct ActionRecorder<S> {
    store: Arc<S>,
}

impl<S> Clone for ActionRecorder<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> ActionRecorder<S>
where
    S: LedgerStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Record one action event and return the persisted row's id.
    ///
    /// The write is atomic: on any rejection no partial row is visible.
    /// An event replayed with an explicit `step_number` whose slot is
    /// already occupied by the same player returns the existing row's id.
    pub async fn record(&self, event: &ActionEvent) -> RecorderResult<ActionId> {
        let identity = EventIdentity::of(event);

        if let Some(amount) = event.amount {
            if amount < 0 {
                return Err(RecorderError::InvalidAmount { identity, amount });
            }
        }

        self.resolve_parents(event, &identity).await?;

        // Idempotent replay check before burning a new step slot.
        if let Some(step) = event.step_number {
            if let Some(existing) = self
                .store
                .find_by_step(event.hand_id, step)
                .await
                .map_err(|e| RecorderError::from_store(e, identity.clone()))?
            {
                return self.replayed(event, &identity, existing);
            }
        }

        let features = extract(&feature_context(event));
        let action = build_row(event, &features);

        let (action_id, step_number) = self.insert(&action, event, &identity).await?;
        log::debug!(
            "Recorded {} for hand {} at step {step_number}",
            event.action,
            event.hand_id
        );

        self.update_hand_aggregate(event).await?;
        Ok(action_id)
    }

    /// Record a phase transition as a bookkeeping action with a JSON
    /// detail payload.
    pub async fn record_phase_advance(
        &self,
        game_session_id: SessionId,
        hand_id: HandId,
        from: Phase,
        to: Phase,
        street_number: u32,
        community_cards: Option<String>,
    ) -> RecorderResult<ActionId> {
        let detail = serde_json::json!({
            "from": from.as_str(),
            "to": to.as_str(),
            "street_number": street_number,
        });
        let event = ActionEvent {
            community_cards,
            detail: Some(detail.to_string()),
            ..ActionEvent::new(game_session_id, hand_id, ActionKind::PhaseAdvance, to)
        };
        self.record(&event).await
    }

    /// Record a pot award to a winner. Also folds the amount and winner
    /// into the hand aggregate.
    pub async fn record_pot_award(
        &self,
        game_session_id: SessionId,
        hand_id: HandId,
        winner_id: PlayerId,
        amount: Cents,
        phase: Phase,
    ) -> RecorderResult<ActionId> {
        let event = ActionEvent {
            player_id: Some(winner_id),
            amount: Some(amount),
            detail: Some("Pot award".to_string()),
            ..ActionEvent::new(game_session_id, hand_id, ActionKind::WinPot, phase)
        };
        self.record(&event).await
    }

    /// All persisted actions of a hand in step order, for reads and
    /// replay verification.
    pub async fn hand_actions(&self, hand_id: HandId) -> RecorderResult<Vec<StoredAction>> {
        self.store.actions_for_hand(hand_id).await.map_err(|e| {
            RecorderError::from_store(
                e,
                EventIdentity {
                    hand_id,
                    step_number: None,
                    player_id: None,
                },
            )
        })
    }

    async fn resolve_parents(
        &self,
        event: &ActionEvent,
        identity: &EventIdentity,
    ) -> RecorderResult<()> {
        let session = self
            .store
            .find_session(event.game_session_id)
            .await
            .map_err(|e| RecorderError::from_store(e, identity.clone()))?
            .ok_or_else(|| RecorderError::ReferentialIntegrity {
                identity: identity.clone(),
                column: "game_session_id".to_string(),
                parent_id: event.game_session_id,
            })?;

        if let Some(player_id) = event.player_id {
            self.store
                .find_player(player_id)
                .await
                .map_err(|e| RecorderError::from_store(e, identity.clone()))?
                .ok_or_else(|| RecorderError::ReferentialIntegrity {
                    identity: identity.clone(),
                    column: "player_id".to_string(),
                    parent_id: player_id,
                })?;
        }

        match self
            .store
            .find_hand(event.hand_id)
            .await
            .map_err(|e| RecorderError::from_store(e, identity.clone()))?
        {
            Some(hand) if hand.game_session_id != session.id => {
                // The engine reused a hand id across sessions; linking the
                // row would corrupt the hand's action sequence.
                Err(RecorderError::ReferentialIntegrity {
                    identity: identity.clone(),
                    column: "hand_id".to_string(),
                    parent_id: event.hand_id,
                })
            }
            Some(_) => Ok(()),
            None => {
                // First event of a new hand.
                self.store
                    .create_hand(event.hand_id, session.id)
                    .await
                    .map_err(|e| RecorderError::from_store(e, identity.clone()))
            }
        }
    }

    async fn insert(
        &self,
        action: &NewAction,
        event: &ActionEvent,
        identity: &EventIdentity,
    ) -> RecorderResult<(ActionId, i32)> {
        match self.store.insert_action(action).await {
            Ok(ok) => Ok(ok),
            Err(StoreError::DuplicateStep { .. }) if action.step_number.is_none() => {
                // Lost a step-allocation race; one retry picks up the next
                // free slot.
                log::warn!(
                    "Step allocation raced for hand {}, retrying once",
                    event.hand_id
                );
                match self.store.insert_action(action).await {
                    Ok(ok) => Ok(ok),
                    Err(StoreError::DuplicateStep { .. }) => Err(RecorderError::OrderingConflict {
                        identity: identity.clone(),
                    }),
                    Err(other) => Err(RecorderError::from_store(other, identity.clone())),
                }
            }
            Err(StoreError::DuplicateStep { step_number, .. }) => {
                // Explicit step taken between the replay check and the
                // insert; decide idempotency against what actually landed.
                match self
                    .store
                    .find_by_step(event.hand_id, step_number)
                    .await
                    .map_err(|e| RecorderError::from_store(e, identity.clone()))?
                {
                    Some(existing) => self
                        .replayed(event, identity, existing)
                        .map(|id| (id, step_number)),
                    None => Err(RecorderError::OrderingConflict {
                        identity: identity.clone(),
                    }),
                }
            }
            Err(other) => Err(RecorderError::from_store(other, identity.clone())),
        }
    }

    /// Resolve an explicit-step collision: the same event replayed is
    /// acknowledged with the existing row's id, anything else is an
    /// ordering conflict.
    fn replayed(
        &self,
        event: &ActionEvent,
        identity: &EventIdentity,
        existing: StoredAction,
    ) -> RecorderResult<ActionId> {
        if existing.player_id == event.player_id && existing.action == event.action {
            log::debug!(
                "Replay of hand {} step {} acknowledged",
                existing.hand_id,
                existing.step_number
            );
            Ok(existing.id)
        } else {
            Err(RecorderError::OrderingConflict {
                identity: identity.clone(),
            })
        }
    }

    async fn update_hand_aggregate(&self, event: &ActionEvent) -> RecorderResult<()> {
        let identity = EventIdentity::of(event);
        match event.action {
            ActionKind::DealCommunity => {
                if let Some(board) = &event.community_cards {
                    self.store
                        .set_board(event.hand_id, board)
                        .await
                        .map_err(|e| RecorderError::from_store(e, identity))?;
                }
            }
            ActionKind::WinPot => match (event.player_id, event.amount) {
                (Some(winner_id), Some(amount)) => {
                    self.store
                        .record_award(event.hand_id, winner_id, amount)
                        .await
                        .map_err(|e| RecorderError::from_store(e, identity))?;
                }
                _ => {
                    log::warn!(
                        "win_pot for hand {} missing winner or amount, aggregate not updated",
                        event.hand_id
                    );
                }
            },
            _ => {}
        }
        Ok(())
    }
}

/// Recompute the derived features of a persisted row from its raw facts.
///
/// The stored feature columns are a materialization of [`extract`]; after
/// an extractor change, a backfill recomputes them from `hole_card1`/
/// `hole_card2`, `community_cards`, and the stored betting amounts. Pot and
/// stack are not persisted, so the betting ratios are reproducible only
/// from the original event context.
pub fn recompute_features(action: &StoredAction) -> FeatureBundle {
    let hole_cards = match (&action.hole_card1, &action.hole_card2) {
        (Some(first), Some(second)) => match (first.parse::<Card>(), second.parse::<Card>()) {
            (Ok(a), Ok(b)) => Some((a, b)),
            _ => None,
        },
        _ => None,
    };
    let mut bundle = extract(&FeatureContext {
        hole_cards,
        community_cards: action
            .community_cards
            .as_deref()
            .and_then(|text| parse_cards(text).ok())
            .unwrap_or_default(),
        amount_to_call: action.amount_to_call,
        pot: None,
        stack: None,
        highest_bet: action.highest_bet,
    });
    // Ratios carry over from record time; their inputs are not stored.
    bundle.betting.pot_odds = action.pot_odds;
    bundle.betting.percent_stack_to_call = action.percent_stack_to_call;
    bundle
}

fn feature_context(event: &ActionEvent) -> FeatureContext {
    let hole_cards = event.hole_cards.as_deref().and_then(|text| {
        parse_hole_cards(text)
            .map_err(|err| {
                log::warn!("Unparseable hole cards {text:?} for hand {}: {err}", event.hand_id);
                err
            })
            .ok()
    });
    let community_cards = event
        .community_cards
        .as_deref()
        .and_then(|text| {
            parse_cards(text)
                .map_err(|err| {
                    log::warn!(
                        "Unparseable community cards {text:?} for hand {}: {err}",
                        event.hand_id
                    );
                    err
                })
                .ok()
        })
        .unwrap_or_default();
    FeatureContext {
        hole_cards,
        community_cards,
        amount_to_call: event.amount_to_call,
        pot: event.pot,
        stack: event.stack,
        highest_bet: event.highest_bet,
    }
}

fn build_row(event: &ActionEvent, features: &FeatureBundle) -> NewAction {
    let hole = event
        .hole_cards
        .as_deref()
        .and_then(|text| parse_hole_cards(text).ok());
    NewAction {
        game_session_id: event.game_session_id,
        hand_id: event.hand_id,
        step_number: event.step_number,
        player_id: event.player_id,
        position: event.position.clone(),
        phase: event.phase,
        action: event.action,
        amount: event.amount,
        hole_cards: event.hole_cards.clone(),
        hole_card1: hole.map(|(first, _)| first.to_string()),
        hole_card2: hole.map(|(_, second)| second.to_string()),
        community_cards: event.community_cards.clone(),
        hand_rank_5: features.board.as_ref().map(|b| b.hand_rank_5),
        hand_class: features.board.as_ref().map(|b| b.hand_class.clone()),
        pf_hand_class: features.preflop.as_ref().map(|p| p.hand_class.clone()),
        high_rank: features.preflop.as_ref().map(|p| i16::from(p.high_rank)),
        low_rank: features.preflop.as_ref().map(|p| i16::from(p.low_rank)),
        is_pair: features.preflop.as_ref().map(|p| p.is_pair),
        is_suited: features.preflop.as_ref().map(|p| p.is_suited),
        gap: features.preflop.as_ref().map(|p| i16::from(p.gap)),
        chen_score: features.preflop.as_ref().map(|p| p.chen_score),
        amount_to_call: features.betting.amount_to_call,
        percent_stack_to_call: features.betting.percent_stack_to_call,
        highest_bet: features.betting.highest_bet,
        pot_odds: features.betting.pot_odds,
        detail: event.detail.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::NewGameSession;
    use crate::store::MemoryStore;
    use crate::store::repository::{HandRepository, PlayerRepository, SessionRepository};

    async fn seeded() -> (ActionRecorder<MemoryStore>, i64, i64) {
        let store = Arc::new(MemoryStore::new());
        let session = store
            .create_session(&NewGameSession::nlhe(100, 200))
            .await
            .unwrap();
        let player = store.create_player("P1").await.unwrap();
        (ActionRecorder::new(store), session, player)
    }

    fn raise_event(session: i64, player: i64) -> ActionEvent {
        ActionEvent {
            player_id: Some(player),
            amount: Some(600),
            hole_cards: Some("AhKs".to_string()),
            ..ActionEvent::new(session, 1, ActionKind::Raise, Phase::Preflop)
        }
    }

    #[tokio::test]
    async fn records_and_enriches() {
        let (recorder, session, player) = seeded().await;
        recorder.record(&raise_event(session, player)).await.unwrap();

        let actions = recorder.hand_actions(1).await.unwrap();
        assert_eq!(actions.len(), 1);
        let action = &actions[0];
        assert_eq!(action.step_number, 1);
        assert_eq!(action.hole_card1.as_deref(), Some("Ah"));
        assert_eq!(action.hole_card2.as_deref(), Some("Ks"));
        assert_eq!(action.pf_hand_class.as_deref(), Some("AKo"));
        assert_eq!(action.chen_score, Some(10.0));
        assert_eq!(action.is_suited, Some(false));
        assert_eq!(action.gap, Some(0));
        // No board yet: postflop features stay null.
        assert_eq!(action.hand_rank_5, None);
        assert_eq!(action.hand_class, None);
    }

    #[tokio::test]
    async fn rejects_unknown_session() {
        let (recorder, _, player) = seeded().await;
        let err = recorder.record(&raise_event(999, player)).await.unwrap_err();
        match err {
            RecorderError::ReferentialIntegrity {
                column, parent_id, ..
            } => {
                assert_eq!(column, "game_session_id");
                assert_eq!(parent_id, 999);
            }
            other => panic!("unexpected error: {other}"),
        }
        // Nothing was persisted for the rejected event.
        assert!(recorder.hand_actions(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_unknown_player() {
        let (recorder, session, _) = seeded().await;
        let err = recorder.record(&raise_event(session, 42)).await.unwrap_err();
        assert!(matches!(
            err,
            RecorderError::ReferentialIntegrity { ref column, parent_id: 42, .. }
                if column == "player_id"
        ));
    }

    #[tokio::test]
    async fn rejects_negative_amount() {
        let (recorder, session, player) = seeded().await;
        let mut event = raise_event(session, player);
        event.amount = Some(-5);
        let err = recorder.record(&event).await.unwrap_err();
        assert!(matches!(
            err,
            RecorderError::InvalidAmount { amount: -5, .. }
        ));
    }

    #[tokio::test]
    async fn steps_increase_without_gaps() {
        let (recorder, session, player) = seeded().await;
        for _ in 0..5 {
            recorder.record(&raise_event(session, player)).await.unwrap();
        }
        let steps: Vec<i32> = recorder
            .hand_actions(1)
            .await
            .unwrap()
            .iter()
            .map(|a| a.step_number)
            .collect();
        assert_eq!(steps, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn explicit_step_replay_is_idempotent() {
        let (recorder, session, player) = seeded().await;
        let mut event = raise_event(session, player);
        event.step_number = Some(1);

        let first = recorder.record(&event).await.unwrap();
        let second = recorder.record(&event).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(recorder.hand_actions(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn conflicting_explicit_step_is_an_ordering_conflict() {
        let (recorder, session, player) = seeded().await;
        let mut event = raise_event(session, player);
        event.step_number = Some(1);
        recorder.record(&event).await.unwrap();

        // Same slot, different action: not a replay.
        let mut conflicting = event.clone();
        conflicting.action = ActionKind::Fold;
        let err = recorder.record(&conflicting).await.unwrap_err();
        assert!(matches!(err, RecorderError::OrderingConflict { .. }));
    }

    #[tokio::test]
    async fn system_actions_carry_no_player() {
        let (recorder, session, _) = seeded().await;
        let id = recorder
            .record_phase_advance(session, 1, Phase::Preflop, Phase::Flop, 1, Some("7h8dTc".into()))
            .await
            .unwrap();
        assert!(id > 0);
        let actions = recorder.hand_actions(1).await.unwrap();
        assert_eq!(actions[0].player_id, None);
        assert_eq!(actions[0].action, ActionKind::PhaseAdvance);
        let detail: serde_json::Value =
            serde_json::from_str(actions[0].detail.as_deref().unwrap()).unwrap();
        assert_eq!(detail["from"], "preflop");
        assert_eq!(detail["to"], "flop");
    }

    #[tokio::test]
    async fn pot_award_updates_hand_aggregate() {
        let (recorder, session, player) = seeded().await;
        recorder.record(&raise_event(session, player)).await.unwrap();
        recorder
            .record_pot_award(session, 1, player, 1200, Phase::Showdown)
            .await
            .unwrap();

        let hand = recorder
            .store
            .find_hand(1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hand.pot, 1200);
        assert_eq!(hand.winner_id, Some(player));
    }

    #[tokio::test]
    async fn deal_community_sets_the_board() {
        let (recorder, session, _) = seeded().await;
        let event = ActionEvent {
            community_cards: Some("7h8dTc".to_string()),
            ..ActionEvent::new(session, 1, ActionKind::DealCommunity, Phase::Flop)
        };
        recorder.record(&event).await.unwrap();
        let hand = recorder.store.find_hand(1).await.unwrap().unwrap();
        assert_eq!(hand.board.as_deref(), Some("7h8dTc"));
    }

    #[tokio::test]
    async fn malformed_cards_record_nulls_not_errors() {
        let (recorder, session, player) = seeded().await;
        let mut event = raise_event(session, player);
        event.hole_cards = Some("not cards".to_string());
        recorder.record(&event).await.unwrap();

        let actions = recorder.hand_actions(1).await.unwrap();
        assert_eq!(actions[0].hole_cards.as_deref(), Some("not cards"));
        assert_eq!(actions[0].chen_score, None);
        assert_eq!(actions[0].pf_hand_class, None);
    }

    #[tokio::test]
    async fn recompute_matches_stored_features() {
        let (recorder, session, player) = seeded().await;
        let event = ActionEvent {
            community_cards: Some("Ad7c2h".to_string()),
            amount_to_call: Some(600),
            pot: Some(900),
            stack: Some(2400),
            highest_bet: Some(600),
            ..raise_event(session, player)
        };
        recorder.record(&event).await.unwrap();

        let stored = &recorder.hand_actions(1).await.unwrap()[0];
        let bundle = recompute_features(stored);
        let preflop = bundle.preflop.unwrap();
        assert_eq!(Some(preflop.chen_score), stored.chen_score);
        assert_eq!(Some(preflop.hand_class.as_str()), stored.pf_hand_class.as_deref());
        let board = bundle.board.unwrap();
        assert_eq!(Some(board.hand_rank_5), stored.hand_rank_5);
        assert_eq!(Some(board.hand_class.as_str()), stored.hand_class.as_deref());
        assert_eq!(bundle.betting.pot_odds, stored.pot_odds);
    }
}
