//! Locator registry for the food list page.
//!
//! Every element the harness touches is named by an [`Element`] and mapped to
//! exactly one [`Selector`] in [`Element::selector`]. A markup change is a one
//! line edit there.

use serde::{Deserialize, Serialize};

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// XPath expression
    XPath(String),
    /// CSS selector
    Css(String),
}

impl Selector {
    /// Create an XPath selector
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Raw expression text
    #[must_use]
    pub fn expression(&self) -> &str {
        match self {
            Self::XPath(s) | Self::Css(s) => s,
        }
    }

    /// JavaScript expression yielding the first match (or `null`)
    #[must_use]
    pub fn to_query(&self) -> String {
        self.to_query_within("document")
    }

    /// JavaScript expression yielding the first match under `context`
    #[must_use]
    pub fn to_query_within(&self, context: &str) -> String {
        match self {
            Self::XPath(s) => format!(
                "document.evaluate({s:?}, {context}, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue"
            ),
            Self::Css(s) => format!("{context}.querySelector({s:?})"),
        }
    }

    /// JavaScript expression yielding an array of all matches
    #[must_use]
    pub fn to_all_query(&self) -> String {
        match self {
            Self::XPath(s) => format!(
                "(() => {{ const snap = document.evaluate({s:?}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                 const out = []; for (let i = 0; i < snap.snapshotLength; i++) {{ out.push(snap.snapshotItem(i)); }} return out; }})()"
            ),
            Self::Css(s) => format!("Array.from(document.querySelectorAll({s:?}))"),
        }
    }

    /// JavaScript expression counting matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        match self {
            Self::XPath(s) => format!(
                "document.evaluate({s:?}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength"
            ),
            Self::Css(s) => format!("document.querySelectorAll({s:?}).length"),
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::XPath(s) => write!(f, "xpath={s}"),
            Self::Css(s) => write!(f, "css={s}"),
        }
    }
}

/// Symbolic names of the elements on the food list page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    /// Button opening the add form
    AddButton,
    /// Button submitting the add form
    SaveButton,
    /// Free-text name input
    NameField,
    /// Category single-select
    CategorySelect,
    /// Exotic checkbox
    ExoticCheckbox,
    /// Reset action inside the navigation menu
    ResetLink,
    /// Navigation menu toggle
    NavDropdown,
    /// Body rows of the record table
    TableRows,
    /// Name cell, relative to a row
    RowName,
    /// Category cell, relative to a row
    RowCategory,
    /// Exotic cell, relative to a row
    RowExotic,
}

impl Element {
    /// Every registered element
    pub const ALL: [Self; 11] = [
        Self::AddButton,
        Self::SaveButton,
        Self::NameField,
        Self::CategorySelect,
        Self::ExoticCheckbox,
        Self::ResetLink,
        Self::NavDropdown,
        Self::TableRows,
        Self::RowName,
        Self::RowCategory,
        Self::RowExotic,
    ];

    /// Row cells in column order
    pub const ROW_CELLS: [Self; 3] = [Self::RowName, Self::RowCategory, Self::RowExotic];

    /// Locator expression for this element
    #[must_use]
    pub fn selector(self) -> Selector {
        let xpath = match self {
            // The page's own class attribute is misspelled; match it as served.
            Self::AddButton => r#"//div[@class = "btn-grou mt-2 mb-2"]/button"#,
            Self::SaveButton => r#"//button[@id="save"]"#,
            Self::NameField => r#"//input[@id="name"]"#,
            Self::CategorySelect => r#"//select[@id="type"]"#,
            Self::ExoticCheckbox => r#"//input[@id="exotic"]"#,
            Self::ResetLink => r#"//a[@id="reset"]"#,
            Self::NavDropdown => r#"//a[@id="navbarDropdown"]"#,
            Self::TableRows => "//table/tbody/tr",
            Self::RowName => "./td[1]",
            Self::RowCategory => "./td[2]",
            Self::RowExotic => "./td[3]",
        };
        Selector::xpath(xpath)
    }

    /// Reverse lookup from a selector to its registered element
    #[must_use]
    pub fn from_selector(selector: &Selector) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.selector() == *selector)
    }

    /// Whether the selector is evaluated relative to a table row
    #[must_use]
    pub const fn is_row_relative(self) -> bool {
        matches!(self, Self::RowName | Self::RowCategory | Self::RowExotic)
    }

    /// Name used in logs and error messages
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AddButton => "AddButton",
            Self::SaveButton => "SaveButton",
            Self::NameField => "NameField",
            Self::CategorySelect => "CategorySelect",
            Self::ExoticCheckbox => "ExoticCheckbox",
            Self::ResetLink => "ResetLink",
            Self::NavDropdown => "NavDropdown",
            Self::TableRows => "TableRows",
            Self::RowName => "RowName",
            Self::RowCategory => "RowCategory",
            Self::RowExotic => "RowExotic",
        }
    }

    /// `Name (selector)` description for diagnostics
    #[must_use]
    pub fn describe(self) -> String {
        format!("{} ({})", self.name(), self.selector())
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
