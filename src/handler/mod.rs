use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

mod download;
mod home;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::home))
        .route("/download", post(download::download))
        .with_state(state)
}
