//! Consistency checks between what the table shows and what storage holds.
//!
//! The UI snapshot and the storage snapshot are obtained independently and
//! are only compared here. A storage count of two or more is a verdict, not
//! an error: the duplicate scenario expects it.

use crate::record::{exotic_label, CategoryLabels, FoodRecord, TableRow};
use crate::result::{HarnessError, HarnessResult};
use crate::storage::StoredFood;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How many storage rows a record resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyVerdict {
    /// No matching rows
    Absent,
    /// Exactly one matching row
    Present,
    /// Two or more matching rows
    Duplicated,
}

impl ConsistencyVerdict {
    /// Classify a storage row count
    #[must_use]
    pub const fn from_count(count: u64) -> Self {
        match count {
            0 => Self::Absent,
            1 => Self::Present,
            _ => Self::Duplicated,
        }
    }

    /// Whether any row exists
    #[must_use]
    pub const fn exists(self) -> bool {
        !matches!(self, Self::Absent)
    }
}

impl std::fmt::Display for ConsistencyVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Absent => "absent",
            Self::Present => "present",
            Self::Duplicated => "duplicated",
        };
        f.write_str(s)
    }
}

/// Verdict for `expected` given the number of storage rows matching it
#[must_use]
pub fn verify(expected: &FoodRecord, storage_row_count: u64) -> ConsistencyVerdict {
    let verdict = ConsistencyVerdict::from_count(storage_row_count);
    debug!(record = %expected, storage_row_count, %verdict, "verdict");
    verdict
}

/// The table row `record` should render as
#[must_use]
pub fn expected_row(record: &FoodRecord, labels: &CategoryLabels) -> TableRow {
    TableRow::new(
        record.name.clone(),
        labels.label(record.category),
        exotic_label(record.exotic),
    )
}

/// Whether any of `rows` matches `expected` on all three fields
#[must_use]
pub fn verify_ui_contains_row(expected: &FoodRecord, rows: &[TableRow], labels: &CategoryLabels) -> bool {
    let wanted = expected_row(expected, labels);
    rows.iter().any(|row| *row == wanted)
}

/// Check a single row field by field.
///
/// # Errors
///
/// [`HarnessError::ConsistencyMismatch`] naming the first differing column.
pub fn check_row_identity(
    expected: &FoodRecord,
    row: &TableRow,
    labels: &CategoryLabels,
) -> HarnessResult<()> {
    let wanted = expected_row(expected, labels);
    let columns = [
        ("name", &wanted.name, &row.name),
        ("category", &wanted.category_label, &row.category_label),
        ("exotic", &wanted.exotic_label, &row.exotic_label),
    ];
    for (column, want, got) in columns {
        if want != got {
            return Err(HarnessError::mismatch(
                format!("{column} cell of row {row}"),
                want,
                got,
            ));
        }
    }
    Ok(())
}

/// UI and storage must agree on whether `record` exists.
///
/// `Duplicated` never reconciles; the duplicate path checks its verdict
/// through [`expect_verdict`] instead.
pub fn reconcile(record: &FoodRecord, ui_present: bool, verdict: ConsistencyVerdict) -> HarnessResult<()> {
    match (verdict, ui_present) {
        (ConsistencyVerdict::Absent, false) | (ConsistencyVerdict::Present, true) => Ok(()),
        (ConsistencyVerdict::Duplicated, shown) => Err(HarnessError::mismatch(
            format!("UI and storage for {record}"),
            "storage verdict present or absent",
            format!("table shown = {shown}, storage duplicated"),
        )),
        (verdict, shown) => Err(HarnessError::mismatch(
            format!("UI and storage for {record}"),
            format!("table shown = {}", verdict == ConsistencyVerdict::Present),
            format!("table shown = {shown}, storage {verdict}"),
        )),
    }
}

/// Require a specific verdict
pub fn expect_verdict(
    record: &FoodRecord,
    expected: ConsistencyVerdict,
    actual: ConsistencyVerdict,
) -> HarnessResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(HarnessError::mismatch(
            format!("storage verdict for {}", record.name),
            expected,
            actual,
        ))
    }
}

/// Every stored row for the name carries the expected category and flag
pub fn check_stored_fields(record: &FoodRecord, stored: &[StoredFood]) -> HarnessResult<()> {
    for row in stored.iter().filter(|r| r.name == record.name) {
        if row.category != record.category {
            return Err(HarnessError::mismatch(
                format!("FOOD_TYPE of row {}", row.id),
                record.category.code(),
                row.category.code(),
            ));
        }
        if row.exotic != record.exotic {
            return Err(HarnessError::mismatch(
                format!("FOOD_EXOTIC of row {}", row.id),
                record.exotic,
                row.exotic,
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::record::Category;
    use proptest::prelude::*;

    fn melotria() -> FoodRecord {
        FoodRecord::new("Melotria", Category::Vegetable, true)
    }

    mod verdict_tests {
        use super::*;

        #[test]
        fn test_from_count() {
            assert_eq!(ConsistencyVerdict::from_count(0), ConsistencyVerdict::Absent);
            assert_eq!(ConsistencyVerdict::from_count(1), ConsistencyVerdict::Present);
            assert_eq!(ConsistencyVerdict::from_count(2), ConsistencyVerdict::Duplicated);
        }

        #[test]
        fn test_serde_labels() {
            let json = serde_json::to_string(&ConsistencyVerdict::Duplicated).unwrap();
            assert_eq!(json, "\"duplicated\"");
        }

        #[test]
        fn test_expect_verdict() {
            let r = melotria();
            assert!(expect_verdict(&r, ConsistencyVerdict::Present, ConsistencyVerdict::Present).is_ok());
            let err = expect_verdict(&r, ConsistencyVerdict::Present, ConsistencyVerdict::Duplicated)
                .unwrap_err();
            assert!(err.to_string().contains("expected present, observed duplicated"));
        }

        proptest! {
            #[test]
            fn test_verify_classifies_any_count(count in 0_u64..10_000) {
                let verdict = verify(&melotria(), count);
                prop_assert_eq!(verdict.exists(), count > 0);
                prop_assert_eq!(verdict == ConsistencyVerdict::Duplicated, count >= 2);
            }
        }
    }

    mod row_tests {
        use super::*;

        #[test]
        fn test_ui_contains_row_needs_all_fields() {
            let labels = CategoryLabels::default();
            let rows = vec![
                TableRow::new("Melotria", "Vegetable", "false"),
                TableRow::new("Apple", "Fruit", "false"),
            ];
            assert!(!verify_ui_contains_row(&melotria(), &rows, &labels));
            let rows = vec![TableRow::new("Melotria", "Vegetable", "true")];
            assert!(verify_ui_contains_row(&melotria(), &rows, &labels));
        }

        #[test]
        fn test_row_identity_names_field() {
            let labels = CategoryLabels::default();
            let row = TableRow::new("Melotria", "Fruit", "true");
            match check_row_identity(&melotria(), &row, &labels).unwrap_err() {
                HarnessError::ConsistencyMismatch {
                    subject,
                    expected,
                    observed,
                } => {
                    assert!(subject.starts_with("category"));
                    assert_eq!(expected, "Vegetable");
                    assert_eq!(observed, "Fruit");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_row_identity_uses_configured_labels() {
            let row = TableRow::new("Melotria", "Овощ", "true");
            assert!(check_row_identity(&melotria(), &row, &CategoryLabels::russian()).is_ok());
            assert!(check_row_identity(&melotria(), &row, &CategoryLabels::default()).is_err());
        }
    }

    mod reconcile_tests {
        use super::*;

        #[test]
        fn test_agreement() {
            let r = melotria();
            assert!(reconcile(&r, false, ConsistencyVerdict::Absent).is_ok());
            assert!(reconcile(&r, true, ConsistencyVerdict::Present).is_ok());
        }

        #[test]
        fn test_disagreement() {
            let r = melotria();
            assert!(reconcile(&r, true, ConsistencyVerdict::Absent).is_err());
            assert!(reconcile(&r, false, ConsistencyVerdict::Present).is_err());
            assert!(reconcile(&r, true, ConsistencyVerdict::Duplicated).is_err());
        }

        #[test]
        fn test_duplicated_names_both_acceptable_verdicts() {
            let err = reconcile(&melotria(), true, ConsistencyVerdict::Duplicated).unwrap_err();
            let message = err.to_string();
            assert!(message.contains("expected storage verdict present or absent"));
            assert!(message.contains("observed table shown = true, storage duplicated"));
            assert!(!message.contains("expected table shown = false"));
        }

        #[test]
        fn test_stored_fields() {
            let r = melotria();
            let good = StoredFood {
                id: 5,
                name: "Melotria".into(),
                category: Category::Vegetable,
                exotic: true,
            };
            assert!(check_stored_fields(&r, std::slice::from_ref(&good)).is_ok());
            let bad = StoredFood {
                exotic: false,
                id: 6,
                ..good.clone()
            };
            let err = check_stored_fields(&r, &[good, bad]).unwrap_err();
            assert!(err.to_string().contains("FOOD_EXOTIC of row 6"));
        }
    }
}
