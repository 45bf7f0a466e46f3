use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::category::Category;
use crate::filter::{Association, FilterAssignment, Page, Searchable, Tagged};

/// Catalogue entry with its filter associations and categories attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benefit {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub bonus: String,
    pub video_url: Option<String>,
    pub source_url: Option<String>,
    pub filters: Vec<Association>,
    pub categories: Vec<Category>,
}

impl Tagged for Benefit {
    fn associations(&self) -> &[Association] {
        &self.filters
    }
}

impl Searchable for Benefit {
    fn id(&self) -> i64 {
        self.id
    }

    fn contains_text(&self, needle: &str) -> bool {
        self.title.contains(needle) || self.content.contains(needle) || self.bonus.contains(needle)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct BenefitRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub bonus: String,
    pub video_url: Option<String>,
    pub source_url: Option<String>,
}

impl BenefitRow {
    pub fn into_benefit(self, filters: Vec<Association>, categories: Vec<Category>) -> Benefit {
        Benefit {
            id: self.id,
            title: self.title,
            content: self.content,
            bonus: self.bonus,
            video_url: self.video_url,
            source_url: self.source_url,
            filters,
            categories,
        }
    }
}

/// Search result page as returned over HTTP
#[derive(Debug, Clone, Serialize)]
pub struct BenefitList {
    pub benefits: Vec<Benefit>,
    pub total: usize,
}

impl From<Page<Benefit>> for BenefitList {
    fn from(page: Page<Benefit>) -> Self {
        Self { benefits: page.items, total: page.total }
    }
}

/// Create/update payload. On update, `categories` is only applied when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenefitInput {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub bonus: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub filters: Vec<FilterAssignment>,
    #[serde(default)]
    pub categories: Option<Vec<i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn benefit() -> Benefit {
        Benefit {
            id: 1,
            title: "Child allowance".into(),
            content: "Monthly payment".into(),
            bonus: "Up to 200".into(),
            video_url: None,
            source_url: None,
            filters: vec![],
            categories: vec![],
        }
    }

    #[test]
    fn text_search_covers_title_content_and_bonus() {
        let b = benefit();
        assert!(b.contains_text("allowance"));
        assert!(b.contains_text("Monthly"));
        assert!(b.contains_text("200"));
        assert!(!b.contains_text("monthly"));
    }
}
