//! Handlers for the read-only `/figures` resource.
//!
//! ```text
//! GET /figures        -> list (summary projection, ordered by id)
//! GET /figures/{id}   -> get_by_id (full record)
//! ```

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::Json;
use figures_core::error::CoreError;
use figures_core::types::DbId;
use figures_db::models::figure::{Figure, FigureSummary};
use figures_db::repositories::FigureRepo;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /figures
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<FigureSummary>>> {
    let figures = FigureRepo::list_summaries(&state.pool).await?;
    Ok(Json(figures))
}

/// GET /figures/{id}
///
/// A non-numeric id is rejected with a JSON 400 rather than axum's plain
/// text rejection.
pub async fn get_by_id(
    State(state): State<AppState>,
    id: Result<Path<DbId>, PathRejection>,
) -> AppResult<Json<Figure>> {
    let Path(id) = id.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let figure = FigureRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Figure",
            id,
        }))?;
    Ok(Json(figure))
}
