//! The fixed column set of the `figures` table.
//!
//! Importers address columns by header name; everything past the import
//! boundary uses [`FigureField`] so unknown names cannot leak into the
//! storage layer.

use serde::{Deserialize, Serialize};

/// How a column's raw text is interpreted during coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 64-bit primary key.
    Id,
    /// 32-bit calendar year.
    Year,
    /// Free text, bounded or unbounded by the schema.
    Text,
}

/// A known column of the `figures` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FigureField {
    Id,
    Name,
    Title,
    Era,
    BirthYear,
    DeathYear,
    Introduction,
    Biography,
    Contributions,
    ImageIntro,
    ImageActivity,
    ImageExt1,
    ImageExt2,
    Video1,
    Video2,
}

impl FigureField {
    /// Every column, in table declaration order.
    pub const ALL: [FigureField; 15] = [
        Self::Id,
        Self::Name,
        Self::Title,
        Self::Era,
        Self::BirthYear,
        Self::DeathYear,
        Self::Introduction,
        Self::Biography,
        Self::Contributions,
        Self::ImageIntro,
        Self::ImageActivity,
        Self::ImageExt1,
        Self::ImageExt2,
        Self::Video1,
        Self::Video2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Title => "title",
            Self::Era => "era",
            Self::BirthYear => "birth_year",
            Self::DeathYear => "death_year",
            Self::Introduction => "introduction",
            Self::Biography => "biography",
            Self::Contributions => "contributions",
            Self::ImageIntro => "image_intro",
            Self::ImageActivity => "image_activity",
            Self::ImageExt1 => "image_ext_1",
            Self::ImageExt2 => "image_ext_2",
            Self::Video1 => "video_1",
            Self::Video2 => "video_2",
        }
    }

    /// Look up a column by its exact (case-sensitive) header name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Id => FieldKind::Id,
            Self::BirthYear | Self::DeathYear => FieldKind::Year,
            _ => FieldKind::Text,
        }
    }
}

impl std::fmt::Display for FigureField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
