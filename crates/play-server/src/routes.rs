use axum::{extract::State, http::StatusCode, response::Html, Json};
use game_env::{GameError, Move, Step};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::{AppState, GameSession};

#[derive(Clone, Debug, Serialize)]
pub(crate) struct StatePayload {
    board: [[u32; 4]; 4],
    score: u64,
    moves: u64,
    highest_tile: u32,
    max_tile: u32,
    done: bool,
    /// "win" or "lose" once the run is finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'static str>,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct StepPayload {
    /// The direction that was applied; absent when the game was already over.
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<Move>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reward: Option<f32>,
    state: StatePayload,
}

#[derive(Deserialize)]
pub(crate) struct MoveRequest {
    /// Raw action index: 0 = up, 1 = left, 2 = right, 3 = down.
    action: u8,
}

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    policy: &'static str,
}

fn state_payload(session: &GameSession) -> StatePayload {
    let env = session.env();
    let board = env.board();
    StatePayload {
        board: board.to_rows(),
        score: env.score(),
        moves: env.moves(),
        highest_tile: env.highest_tile(),
        max_tile: board.highest_tile(),
        done: env.is_done(),
        result: session.outcome(),
    }
}

fn step_payload(session: &GameSession, applied: Option<(Move, Step)>) -> StepPayload {
    let (action, reward) = match applied {
        Some((mv, step)) => (Some(mv), Some(step.reward)),
        None => (None, None),
    };
    StepPayload {
        action,
        reward,
        state: state_payload(session),
    }
}

pub async fn index() -> Html<&'static str> {
    Html(include_str!("../assets/index.html"))
}

pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let session = state.session.lock().expect("session mutex poisoned");
    Json(HealthResponse {
        status: "ok",
        policy: session.policy_name(),
    })
}

pub async fn get_state(State(state): State<AppState>) -> Json<StatePayload> {
    let session = state.session.lock().expect("session mutex poisoned");
    Json(state_payload(&session))
}

/// One policy-driven tick.
pub async fn post_step(State(state): State<AppState>) -> Json<StepPayload> {
    let mut session = state.session.lock().expect("session mutex poisoned");
    let applied = session.tick();
    if let Some((mv, step)) = &applied {
        debug!(action = %mv, reward = step.reward, "policy tick");
    }
    Json(step_payload(&session, applied))
}

/// One manual move from the page (arrow keys).
pub async fn post_move(
    State(state): State<AppState>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<StepPayload>, (StatusCode, String)> {
    let mut session = state.session.lock().expect("session mutex poisoned");
    match session.step_raw(req.action) {
        Ok(step) => {
            let mv = Move::from_index(req.action).expect("validated by step_raw");
            Ok(Json(step_payload(&session, Some((mv, step)))))
        }
        Err(err @ GameError::InvalidAction(_)) => {
            Err((StatusCode::BAD_REQUEST, err.to_string()))
        }
    }
}

pub async fn post_reset(State(state): State<AppState>) -> Json<StatePayload> {
    let mut session = state.session.lock().expect("session mutex poisoned");
    session.reset();
    debug!("session reset");
    Json(state_payload(&session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent::policy::LookaheadPolicy;

    fn test_state() -> AppState {
        AppState::new(GameSession::new(42, Box::new(LookaheadPolicy)))
    }

    #[tokio::test]
    async fn fresh_session_reports_a_starting_board() {
        let state = test_state();
        let Json(payload) = get_state(State(state)).await;
        let tiles: Vec<u32> = payload
            .board
            .into_iter()
            .flatten()
            .filter(|&v| v != 0)
            .collect();
        assert_eq!(tiles.len(), 2);
        assert!(tiles.iter().all(|v| matches!(v, 2 | 4)));
        assert_eq!(payload.score, 0);
        assert_eq!(payload.moves, 0);
        assert!(!payload.done);
        assert_eq!(payload.result, None);
    }

    #[tokio::test]
    async fn stepping_advances_and_reset_starts_over() {
        let state = test_state();

        let Json(stepped) = post_step(State(state.clone())).await;
        assert!(stepped.action.is_some());
        assert!(stepped.reward.is_some());
        assert_eq!(stepped.state.moves, 1);

        let Json(fresh) = post_reset(State(state.clone())).await;
        assert_eq!(fresh.moves, 0);
        assert_eq!(fresh.score, 0);

        let Json(health) = get_health(State(state)).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.policy, "lookahead");
    }

    #[tokio::test]
    async fn manual_moves_validate_the_action_index() {
        let state = test_state();

        let err = post_move(State(state.clone()), Json(MoveRequest { action: 9 }))
            .await
            .expect_err("action 9 is invalid");
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert!(err.1.contains("invalid action 9"));

        // The rejected request left the session untouched.
        let Json(payload) = get_state(State(state.clone())).await;
        assert_eq!(payload.moves, 0);

        // A legal index plays normally (or reports a -1 no-op).
        let Json(applied) = post_move(State(state), Json(MoveRequest { action: 1 }))
            .await
            .expect("action 1 is valid");
        assert_eq!(applied.action, Some(Move::Left));
    }
}
