//! Repository for the `figures` table.
//!
//! Reads back the list and detail views; writes happen only through
//! [`FigureRepo::upsert_batch`].

use std::collections::{HashMap, HashSet};

use figures_core::coercion::CandidateRecord;
use figures_core::types::DbId;
use figures_core::upsert::{classify, explicit_ids, UpsertAction, UpsertOutcome};
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgConnection, PgPool, Postgres};

use crate::models::figure::{Figure, FigureData, FigureSummary, NewFigure};

/// Full column list, in table order.
const COLUMNS: &str = "id, name, title, era, birth_year, death_year, introduction, biography, \
     contributions, image_intro, image_activity, image_ext_1, image_ext_2, video_1, video_2";

/// Columns served by the list view.
const SUMMARY_COLUMNS: &str =
    "id, name, title, era, birth_year, death_year, introduction, image_intro";

/// Provides the list/detail reads and the batched import upsert.
pub struct FigureRepo;

impl FigureRepo {
    /// List every figure as a summary, ordered by id.
    pub async fn list_summaries(pool: &PgPool) -> Result<Vec<FigureSummary>, sqlx::Error> {
        let query = format!("SELECT {SUMMARY_COLUMNS} FROM figures ORDER BY id ASC");
        sqlx::query_as::<_, FigureSummary>(&query)
            .fetch_all(pool)
            .await
    }

    /// Find a figure by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Figure>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM figures WHERE id = $1");
        sqlx::query_as::<_, Figure>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Total number of rows.
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM figures")
            .fetch_one(pool)
            .await
    }

    /// Create or update a batch of candidates in one transaction.
    ///
    /// Existing rows are loaded (and locked) with a single query, each
    /// candidate is classified as a create or a partial update, and the
    /// actions run in input order. Any error rolls the whole batch back.
    pub async fn upsert_batch(
        pool: &PgPool,
        candidates: Vec<CandidateRecord>,
    ) -> Result<UpsertOutcome, sqlx::Error> {
        if candidates.is_empty() {
            return Ok(UpsertOutcome::default());
        }

        let batch_size = candidates.len();
        let mut tx = pool.begin().await?;

        let ids = explicit_ids(&candidates);
        let mut rows: HashMap<DbId, Figure> = if ids.is_empty() {
            HashMap::new()
        } else {
            Self::find_by_ids_for_update(&mut *tx, &ids)
                .await?
                .into_iter()
                .map(|figure| (figure.id, figure))
                .collect()
        };
        let existing: HashSet<DbId> = rows.keys().copied().collect();

        let mut outcome = UpsertOutcome::default();
        let mut created_explicit_id = false;

        for action in classify(candidates, &existing) {
            match action {
                UpsertAction::Create(candidate) => {
                    let new = NewFigure::from_candidate(&candidate);
                    created_explicit_id |= new.id.is_some();
                    let figure = Self::insert(&mut *tx, &new).await?;
                    // Only rows with explicit ids can be targeted again in this batch.
                    if new.id.is_some() {
                        rows.insert(figure.id, figure);
                    }
                    outcome.inserted += 1;
                }
                UpsertAction::Update { id, fields } => {
                    let figure = rows.get_mut(&id).ok_or(sqlx::Error::RowNotFound)?;
                    figure.data.merge(&fields);
                    Self::update(&mut *tx, figure).await?;
                    outcome.updated += 1;
                }
            }
        }

        if created_explicit_id {
            Self::sync_id_sequence(&mut *tx).await?;
        }

        tx.commit().await?;

        tracing::debug!(
            batch_size,
            inserted = outcome.inserted,
            updated = outcome.updated,
            "Committed figure batch"
        );
        Ok(outcome)
    }

    async fn find_by_ids_for_update(
        conn: &mut PgConnection,
        ids: &[DbId],
    ) -> Result<Vec<Figure>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM figures WHERE id = ANY($1) FOR UPDATE");
        sqlx::query_as::<_, Figure>(&query)
            .bind(ids)
            .fetch_all(conn)
            .await
    }

    async fn insert(conn: &mut PgConnection, new: &NewFigure) -> Result<Figure, sqlx::Error> {
        let query = format!(
            "INSERT INTO figures ({COLUMNS})
             VALUES (COALESCE($1, nextval(pg_get_serial_sequence('figures', 'id'))),
                     $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {COLUMNS}"
        );
        let q = sqlx::query_as::<_, Figure>(&query).bind(new.id);
        bind_data(q, &new.data).fetch_one(conn).await
    }

    async fn update(conn: &mut PgConnection, figure: &Figure) -> Result<(), sqlx::Error> {
        let query = format!(
            "UPDATE figures SET
                name = $2, title = $3, era = $4, birth_year = $5, death_year = $6,
                introduction = $7, biography = $8, contributions = $9,
                image_intro = $10, image_activity = $11, image_ext_1 = $12,
                image_ext_2 = $13, video_1 = $14, video_2 = $15
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let q = sqlx::query_as::<_, Figure>(&query).bind(figure.id);
        bind_data(q, &figure.data).fetch_one(conn).await?;
        Ok(())
    }

    /// Move the id sequence past the highest id so store-assigned ids never
    /// collide with explicitly imported ones.
    async fn sync_id_sequence(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            "SELECT setval(pg_get_serial_sequence('figures', 'id'),
                           (SELECT COALESCE(MAX(id), 0) + 1 FROM figures),
                           false)",
        )
        .execute(conn)
        .await?;
        Ok(())
    }
}

/// Bind the fourteen data columns as `$2..$15`.
fn bind_data<'q>(
    query: QueryAs<'q, Postgres, Figure, PgArguments>,
    data: &'q FigureData,
) -> QueryAs<'q, Postgres, Figure, PgArguments> {
    query
        .bind(&data.name)
        .bind(&data.title)
        .bind(&data.era)
        .bind(data.birth_year)
        .bind(data.death_year)
        .bind(&data.introduction)
        .bind(&data.biography)
        .bind(&data.contributions)
        .bind(&data.image_intro)
        .bind(&data.image_activity)
        .bind(&data.image_ext_1)
        .bind(&data.image_ext_2)
        .bind(&data.video_1)
        .bind(&data.video_2)
}
