//! Food records and their two read-back projections.
//!
//! A [`FoodRecord`] is the intent a scenario submits. It is observed back
//! twice: as a [`TableRow`] rendered by the page, and as a
//! [`StoredFood`](crate::storage::StoredFood) read from storage. The UI shows
//! the category as a localized label while storage keeps a fixed code, so
//! every comparison goes through [`CategoryLabels`].

use crate::result::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};

/// Food category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Vegetable
    Vegetable,
    /// Fruit
    Fruit,
}

impl Category {
    /// All categories, in form order
    pub const ALL: [Self; 2] = [Self::Vegetable, Self::Fruit];

    /// Storage-side code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Vegetable => "VEGETABLE",
            Self::Fruit => "FRUIT",
        }
    }

    /// Parse a storage-side code
    pub fn from_code(code: &str) -> HarnessResult<Self> {
        match code {
            "VEGETABLE" => Ok(Self::Vegetable),
            "FRUIT" => Ok(Self::Fruit),
            other => Err(HarnessError::mismatch(
                "category code",
                "VEGETABLE or FRUIT",
                other,
            )),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Visible labels the page uses for each category.
///
/// The UI contract only guarantees label stability, so the category select
/// is driven and read back by these strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryLabels {
    /// Label for [`Category::Vegetable`]
    pub vegetable: String,
    /// Label for [`Category::Fruit`]
    pub fruit: String,
}

impl Default for CategoryLabels {
    fn default() -> Self {
        Self {
            vegetable: "Vegetable".to_string(),
            fruit: "Fruit".to_string(),
        }
    }
}

impl CategoryLabels {
    /// Labels of the Russian-localized deployment
    #[must_use]
    pub fn russian() -> Self {
        Self {
            vegetable: "Овощ".to_string(),
            fruit: "Фрукт".to_string(),
        }
    }

    /// Visible label for a category
    #[must_use]
    pub fn label(&self, category: Category) -> &str {
        match category {
            Category::Vegetable => &self.vegetable,
            Category::Fruit => &self.fruit,
        }
    }

    /// Category shown under a visible label
    pub fn category_for(&self, label: &str) -> HarnessResult<Category> {
        Category::ALL
            .into_iter()
            .find(|c| self.label(*c) == label)
            .ok_or_else(|| {
                HarnessError::invalid_scenario(format!(
                    "unknown category label {label:?} (expected {:?} or {:?})",
                    self.vegetable, self.fruit
                ))
            })
    }
}

/// Canonical UI text for the exotic flag
#[must_use]
pub const fn exotic_label(exotic: bool) -> &'static str {
    if exotic {
        "true"
    } else {
        "false"
    }
}

/// Storage-side encoding of the exotic flag
#[must_use]
pub const fn exotic_code(exotic: bool) -> i64 {
    if exotic {
        1
    } else {
        0
    }
}

/// The `(name, category, exotic)` triple under test
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FoodRecord {
    /// Record name, the lookup key within a run
    pub name: String,
    /// Category
    pub category: Category,
    /// Exotic flag
    pub exotic: bool,
}

impl FoodRecord {
    /// Create a record
    #[must_use]
    pub fn new(name: impl Into<String>, category: Category, exotic: bool) -> Self {
        Self {
            name: name.into(),
            category,
            exotic,
        }
    }
}

impl std::fmt::Display for FoodRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.name, self.category, self.exotic)
    }
}

/// One rendered table row, in column order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    /// Name cell
    pub name: String,
    /// Category label cell
    pub category_label: String,
    /// Exotic cell, literal `"true"`/`"false"`
    pub exotic_label: String,
}

impl TableRow {
    /// Create a row
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        category_label: impl Into<String>,
        exotic_label: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category_label: category_label.into(),
            exotic_label: exotic_label.into(),
        }
    }

    /// Build a row from the three cell texts
    pub fn from_cells(cells: Vec<String>) -> HarnessResult<Self> {
        let [name, category_label, exotic_label]: [String; 3] =
            cells.try_into().map_err(|cells: Vec<String>| {
                HarnessError::mismatch("table row cell count", 3, cells.len())
            })?;
        Ok(Self {
            name,
            category_label,
            exotic_label,
        })
    }
}

impl std::fmt::Display for TableRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{} | {} | {}]",
            self.name, self.category_label, self.exotic_label
        )
    }
}
