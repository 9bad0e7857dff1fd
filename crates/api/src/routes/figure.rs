use axum::routing::get;
use axum::Router;

use crate::handlers::figure;
use crate::state::AppState;

/// Routes mounted at `/figures`.
///
/// ```text
/// GET /       -> list
/// GET /{id}   -> get_by_id
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(figure::list))
        .route("/{id}", get(figure::get_by_id))
}
