//! Figure entity model, summary projection, and candidate merge.

use figures_core::coercion::{CandidateRecord, FieldValue};
use figures_core::fields::FigureField;
use figures_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `figures` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Figure {
    pub id: DbId,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub data: FigureData,
}

/// Every column of a figure except its immutable `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct FigureData {
    pub name: String,
    pub title: Option<String>,
    pub era: Option<String>,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
    pub introduction: Option<String>,
    pub biography: Option<String>,
    pub contributions: Option<String>,
    pub image_intro: Option<String>,
    pub image_activity: Option<String>,
    pub image_ext_1: Option<String>,
    pub image_ext_2: Option<String>,
    pub video_1: Option<String>,
    pub video_2: Option<String>,
}

/// The list view: a deliberately narrower shape than [`Figure`].
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct FigureSummary {
    pub id: DbId,
    pub name: String,
    pub title: Option<String>,
    pub era: Option<String>,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
    pub introduction: Option<String>,
    pub image_intro: Option<String>,
}

/// Insert payload built from a candidate. `id: None` lets the store assign one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewFigure {
    pub id: Option<DbId>,
    pub data: FigureData,
}

impl NewFigure {
    /// Build an insert payload from exactly the candidate's fields.
    pub fn from_candidate(candidate: &CandidateRecord) -> Self {
        let mut data = FigureData::default();
        data.merge(candidate);
        Self {
            id: candidate.id(),
            data,
        }
    }
}

impl FigureData {
    /// Apply every field the candidate carries, leaving the rest untouched.
    ///
    /// `id` is never applied; an explicit null clears the column.
    pub fn merge(&mut self, candidate: &CandidateRecord) {
        for (field, value) in candidate.data_fields() {
            self.set(field, value);
        }
    }

    fn set(&mut self, field: FigureField, value: &FieldValue) {
        match field {
            FigureField::Id => {}
            FigureField::Name => self.name = value.as_text().unwrap_or_default().to_string(),
            FigureField::Title => self.title = text(value),
            FigureField::Era => self.era = text(value),
            FigureField::BirthYear => self.birth_year = year(value),
            FigureField::DeathYear => self.death_year = year(value),
            FigureField::Introduction => self.introduction = text(value),
            FigureField::Biography => self.biography = text(value),
            FigureField::Contributions => self.contributions = text(value),
            FigureField::ImageIntro => self.image_intro = text(value),
            FigureField::ImageActivity => self.image_activity = text(value),
            FigureField::ImageExt1 => self.image_ext_1 = text(value),
            FigureField::ImageExt2 => self.image_ext_2 = text(value),
            FigureField::Video1 => self.video_1 = text(value),
            FigureField::Video2 => self.video_2 = text(value),
        }
    }
}

fn text(value: &FieldValue) -> Option<String> {
    value.as_text().map(str::to_string)
}

fn year(value: &FieldValue) -> Option<i32> {
    value.as_integer().and_then(|v| i32::try_from(v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing() -> FigureData {
        FigureData {
            name: "Marie Curie".into(),
            title: Some("Physicist".into()),
            birth_year: Some(1867),
            death_year: Some(1934),
            ..Default::default()
        }
    }

    #[test]
    fn merge_only_touches_carried_fields() {
        let mut data = existing();
        let candidate = CandidateRecord::new()
            .with(FigureField::Id, FieldValue::Integer(1))
            .with(FigureField::DeathYear, FieldValue::Integer(1935));

        data.merge(&candidate);

        assert_eq!(data.death_year, Some(1935));
        assert_eq!(data.title.as_deref(), Some("Physicist"));
        assert_eq!(data.name, "Marie Curie");
    }

    #[test]
    fn explicit_null_clears_a_column() {
        let mut data = existing();
        data.merge(&CandidateRecord::new().with(FigureField::Title, FieldValue::Null));
        assert_eq!(data.title, None);
    }

    #[test]
    fn new_figure_takes_exactly_the_candidate_fields() {
        let candidate = CandidateRecord::new()
            .with(FigureField::Name, FieldValue::Text("Ada Lovelace".into()))
            .with(FigureField::BirthYear, FieldValue::Integer(1815));

        let new = NewFigure::from_candidate(&candidate);

        assert_eq!(new.id, None);
        assert_eq!(new.data.name, "Ada Lovelace");
        assert_eq!(new.data.birth_year, Some(1815));
        assert_eq!(new.data.biography, None);
    }

    #[test]
    fn new_figure_keeps_explicit_id() {
        let candidate = CandidateRecord::new()
            .with(FigureField::Id, FieldValue::Integer(9))
            .with(FigureField::Name, FieldValue::Text("Hypatia".into()));
        assert_eq!(NewFigure::from_candidate(&candidate).id, Some(9));
    }
}
