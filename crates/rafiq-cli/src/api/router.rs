//! Axum router construction.

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::api::state::AppState;

/// Build the complete router with every API route.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health::health_handler))
        // Stories
        .route(
            "/api/stories",
            get(handlers::stories::list_stories_handler)
                .post(handlers::stories::create_story_handler),
        )
        .route(
            "/api/stories/user/{user_id}",
            get(handlers::stories::list_user_stories_handler),
        )
        .route(
            "/api/stories/{story_id}",
            get(handlers::stories::get_story_handler)
                .delete(handlers::stories::delete_story_handler),
        )
        .route(
            "/api/stories/{story_id}/view",
            post(handlers::stories::view_story_handler),
        )
        // Likes
        .route(
            "/api/likes/user/{user_id}",
            get(handlers::likes::liked_posts_handler),
        )
        .route(
            "/api/likes/{post_id}",
            get(handlers::likes::like_info_handler)
                .post(handlers::likes::like_handler)
                .delete(handlers::likes::unlike_handler),
        )
        // Tasbih goals. GET takes a user id, PATCH a goal id.
        .route("/api/tasbih/goals", post(handlers::goals::create_goal_handler))
        .route(
            "/api/tasbih/goals/{id}",
            get(handlers::goals::list_goals_handler).patch(handlers::goals::increment_goal_handler),
        )
        .route("/api/tasbih/friends", post(handlers::goals::link_friend_handler))
        .route(
            "/api/tasbih/friends/{user_id}",
            get(handlers::goals::friends_progress_handler),
        )
        .route(
            "/api/tasbih/privacy/{link_id}",
            put(handlers::goals::privacy_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
