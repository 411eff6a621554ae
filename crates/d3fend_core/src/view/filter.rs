//! Technique filter engine.
//!
//! # Invariants
//! - Output is an order-preserving subsequence of the input.
//! - Category and search stages compose with logical AND.
//! - Empty search text disables the search stage.

use crate::model::taxonomy::{CategoryId, Technique};

/// Literal category filter value that disables the category stage.
pub const CATEGORY_FILTER_ALL: &str = "all";

/// Category stage of a [`TechniqueFilter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(CategoryId),
}

impl CategoryFilter {
    /// Parses an external filter value. Only the exact literal `"all"`
    /// disables the category stage; any other value is matched verbatim.
    pub fn parse(value: &str) -> Self {
        if value == CATEGORY_FILTER_ALL {
            Self::All
        } else {
            Self::Only(value.to_string())
        }
    }

    /// External string form, inverse of [`CategoryFilter::parse`].
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => CATEGORY_FILTER_ALL,
            Self::Only(id) => id.as_str(),
        }
    }

    pub fn admits(&self, technique: &Technique) -> bool {
        match self {
            Self::All => true,
            Self::Only(id) => technique.category_id == *id,
        }
    }
}

/// Matrix filter: category selector plus free-text search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TechniqueFilter {
    pub category: CategoryFilter,
    /// Case-insensitive substring matched against technique id or name.
    pub search_text: String,
}

impl TechniqueFilter {
    pub fn new(category_id: &str, search_text: impl Into<String>) -> Self {
        Self {
            category: CategoryFilter::parse(category_id),
            search_text: search_text.into(),
        }
    }

    /// Returns whether this filter keeps every technique.
    pub fn is_identity(&self) -> bool {
        self.category == CategoryFilter::All && self.search_text.is_empty()
    }

    pub fn admits(&self, technique: &Technique) -> bool {
        self.admits_with_needle(technique, &self.search_text.to_lowercase())
    }

    fn admits_with_needle(&self, technique: &Technique, needle_lower: &str) -> bool {
        self.category.admits(technique)
            && (needle_lower.is_empty() || technique.matches_search(needle_lower))
    }
}

/// Applies `filter` to `techniques`, preserving input order.
pub fn apply_filter(techniques: &[Technique], filter: &TechniqueFilter) -> Vec<Technique> {
    let needle = filter.search_text.to_lowercase();
    techniques
        .iter()
        .filter(|technique| filter.admits_with_needle(technique, &needle))
        .cloned()
        .collect()
}
