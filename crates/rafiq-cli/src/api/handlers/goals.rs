//! Tasbih goal and friend-progress handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rafiq_core::{FriendLinkId, GoalId, NewGoal, UserId};
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::utils::{Caller, bad_body, error_response, json_result, message};

#[derive(Deserialize)]
pub struct IncrementRequest {
    /// Kept raw so that fractional and non-numeric values reach delta parsing
    /// and come back as validation errors.
    #[serde(default)]
    increment: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkFriendRequest {
    friend_user_id: UserId,
    #[serde(default)]
    is_public: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyRequest {
    is_public: bool,
}

pub async fn list_goals_handler(
    State(state): State<AppState>,
    _caller: Caller,
    Path(user_id): Path<UserId>,
) -> Response {
    json_result(state.engagement.goals.list_goals(user_id).await)
}

pub async fn create_goal_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    payload: Result<axum::Json<NewGoal>, JsonRejection>,
) -> Response {
    let axum::Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return bad_body(rejection),
    };
    match state.engagement.goals.create_goal(caller, req).await {
        Ok(goal) => (StatusCode::CREATED, axum::Json(goal)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn increment_goal_handler(
    State(state): State<AppState>,
    _caller: Caller,
    Path(goal_id): Path<GoalId>,
    payload: Result<axum::Json<IncrementRequest>, JsonRejection>,
) -> Response {
    let axum::Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return bad_body(rejection),
    };
    json_result(
        state
            .engagement
            .goals
            .increment_goal(goal_id, &req.increment)
            .await,
    )
}

pub async fn friends_progress_handler(
    State(state): State<AppState>,
    _caller: Caller,
    Path(user_id): Path<UserId>,
) -> Response {
    json_result(state.engagement.goals.list_friends_progress(user_id).await)
}

pub async fn link_friend_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    payload: Result<axum::Json<LinkFriendRequest>, JsonRejection>,
) -> Response {
    let axum::Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return bad_body(rejection),
    };
    match state
        .engagement
        .goals
        .link_friend(caller, req.friend_user_id, req.is_public)
        .await
    {
        Ok(link) => (StatusCode::CREATED, axum::Json(link)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn privacy_handler(
    State(state): State<AppState>,
    _caller: Caller,
    Path(link_id): Path<FriendLinkId>,
    payload: Result<axum::Json<PrivacyRequest>, JsonRejection>,
) -> Response {
    let axum::Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return bad_body(rejection),
    };
    match state
        .engagement
        .goals
        .set_goal_privacy(link_id, req.is_public)
        .await
    {
        Ok(()) => message("privacy updated"),
        Err(e) => error_response(e),
    }
}
