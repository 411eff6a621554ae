//! Category grouping and matrix layout.
//!
//! # Responsibility
//! - Partition a technique sequence by `category_id`.
//! - Lay groups out as matrix columns in category declaration order.
//!
//! # Invariants
//! - `group_by_category` is an exact partition: every input technique lands
//!   in exactly one group, in first-seen order.
//! - `build_matrix` omits empty categories and techniques whose category is
//!   unknown to the store.

use crate::model::taxonomy::{Category, CategoryId, Technique};
use crate::store::TaxonomyStore;

/// Techniques sharing one category id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup {
    pub category_id: CategoryId,
    pub techniques: Vec<Technique>,
}

/// Ordered mapping from category id to its techniques.
///
/// Key order is the first-seen order of each category id in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryGroups {
    groups: Vec<CategoryGroup>,
}

impl CategoryGroups {
    pub fn get(&self, category_id: &str) -> Option<&[Technique]> {
        self.groups
            .iter()
            .find(|group| group.category_id == category_id)
            .map(|group| group.techniques.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|group| group.category_id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total techniques across all groups.
    pub fn technique_count(&self) -> usize {
        self.groups.iter().map(|group| group.techniques.len()).sum()
    }
}

/// Partitions `techniques` by category id.
pub fn group_by_category(techniques: &[Technique]) -> CategoryGroups {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    for technique in techniques {
        match groups
            .iter_mut()
            .find(|group| group.category_id == technique.category_id)
        {
            Some(group) => group.techniques.push(technique.clone()),
            None => groups.push(CategoryGroup {
                category_id: technique.category_id.clone(),
                techniques: vec![technique.clone()],
            }),
        }
    }
    CategoryGroups { groups }
}

/// One rendered matrix column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixColumn {
    pub category: Category,
    pub techniques: Vec<Technique>,
}

/// Matrix layout handed to renderers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatrixView {
    pub columns: Vec<MatrixColumn>,
}

impl MatrixView {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn technique_count(&self) -> usize {
        self.columns.iter().map(|column| column.techniques.len()).sum()
    }

    pub fn column(&self, category_id: &str) -> Option<&MatrixColumn> {
        self.columns
            .iter()
            .find(|column| column.category.id == category_id)
    }

    pub fn contains_technique(&self, technique_id: &str) -> bool {
        self.columns.iter().any(|column| {
            column
                .techniques
                .iter()
                .any(|technique| technique.id == technique_id)
        })
    }
}

/// Lays `groups` out in the store's category declaration order.
pub fn build_matrix(store: &TaxonomyStore, groups: &CategoryGroups) -> MatrixView {
    let columns = store
        .categories()
        .iter()
        .filter_map(|category| {
            let techniques = groups.get(category.id.as_str())?;
            if techniques.is_empty() {
                return None;
            }
            Some(MatrixColumn {
                category: category.clone(),
                techniques: techniques.to_vec(),
            })
        })
        .collect();
    MatrixView { columns }
}
