//! Like handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use rafiq_core::{EngagementError, PostId, UserId};

use crate::api::state::AppState;
use crate::api::utils::{Caller, api_error, error_response, json_result, message};

pub async fn like_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(post_id): Path<PostId>,
) -> Response {
    match state.engagement.likes.like(post_id, caller).await {
        Ok(()) => message("post liked"),
        Err(EngagementError::Duplicate(_)) => api_error(StatusCode::CONFLICT, "already liked"),
        Err(e) => error_response(e),
    }
}

pub async fn unlike_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(post_id): Path<PostId>,
) -> Response {
    match state.engagement.likes.unlike(post_id, caller).await {
        Ok(()) => message("post unliked"),
        Err(e) => error_response(e),
    }
}

pub async fn like_info_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(post_id): Path<PostId>,
) -> Response {
    json_result(state.engagement.likes.like_info(post_id, caller).await)
}

pub async fn liked_posts_handler(
    State(state): State<AppState>,
    _caller: Caller,
    Path(user_id): Path<UserId>,
) -> Response {
    json_result(
        state
            .engagement
            .likes
            .liked_post_ids(user_id)
            .await
            .map(|ids| serde_json::json!({ "likedPosts": ids })),
    )
}
