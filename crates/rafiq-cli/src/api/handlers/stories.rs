//! Story handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rafiq_core::{NewStory, StoryId, StoryScope, UserId};

use crate::api::state::AppState;
use crate::api::utils::{Caller, bad_body, error_response, json_result, message};

pub async fn create_story_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    payload: Result<axum::Json<NewStory>, JsonRejection>,
) -> Response {
    let axum::Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return bad_body(rejection),
    };
    match state.engagement.stories.create_story(caller, req).await {
        Ok(story) => (StatusCode::CREATED, axum::Json(story)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn list_stories_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Response {
    json_result(
        state
            .engagement
            .stories
            .list_visible_stories(caller, StoryScope::All)
            .await,
    )
}

pub async fn list_user_stories_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(user_id): Path<UserId>,
) -> Response {
    json_result(
        state
            .engagement
            .stories
            .list_visible_stories(caller, StoryScope::ByOwner(user_id))
            .await,
    )
}

pub async fn get_story_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(story_id): Path<StoryId>,
) -> Response {
    json_result(state.engagement.stories.get_story(story_id, caller).await)
}

pub async fn view_story_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(story_id): Path<StoryId>,
) -> Response {
    match state.engagement.stories.record_view(story_id, caller).await {
        Ok(()) => message("view recorded"),
        Err(e) => error_response(e),
    }
}

pub async fn delete_story_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(story_id): Path<StoryId>,
) -> Response {
    match state.engagement.stories.delete_story(story_id, caller).await {
        Ok(()) => message("story deleted"),
        Err(e) => error_response(e),
    }
}
