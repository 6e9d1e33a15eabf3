//! Page model of the food list page.
//!
//! Actions resolve their element through the wait engine first (the implicit
//! find timeout) and are then issued exactly once. Nothing here retries an
//! action: a second click on Save can submit twice. Only the read-side
//! conditions are polled.

use crate::driver::PageDriver;
use crate::locators::{Element, Selector};
use crate::record::{CategoryLabels, FoodRecord, TableRow};
use crate::result::{HarnessError, HarnessResult};
use crate::wait::{Evaluation, WaitCondition, WaitOptions, WaitResult, Waiter};
use crate::widgets::{
    Button, Checkbox, Clickable, Fillable, SelectField, Selectable, TextField, Toggleable, Widget,
};
use tracing::{debug, info};

/// Rows the table holds after a reset
pub const DEFAULT_BASELINE_ROWS: usize = 4;

/// Comparison a row-count condition applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountPredicate {
    /// Exactly `n` rows
    Equals(usize),
    /// Strictly more than `n` rows
    Exceeds(usize),
}

impl CountPredicate {
    /// Whether `count` satisfies the predicate
    #[must_use]
    pub const fn holds(self, count: usize) -> bool {
        match self {
            Self::Equals(n) => count == n,
            Self::Exceeds(n) => count > n,
        }
    }
}

impl std::fmt::Display for CountPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Equals(n) => write!(f, "row count == {n}"),
            Self::Exceeds(n) => write!(f, "row count > {n}"),
        }
    }
}

/// Condition over the number of elements matching a selector
pub struct RowCount<'a> {
    driver: &'a dyn PageDriver,
    rows: Selector,
    predicate: CountPredicate,
}

impl std::fmt::Debug for RowCount<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowCount")
            .field("rows", &self.rows)
            .field("predicate", &self.predicate)
            .finish_non_exhaustive()
    }
}

impl<'a> RowCount<'a> {
    /// Count table rows on `driver`
    #[must_use]
    pub fn new(driver: &'a dyn PageDriver, predicate: CountPredicate) -> Self {
        Self {
            driver,
            rows: Element::TableRows.selector(),
            predicate,
        }
    }
}

impl WaitCondition for RowCount<'_> {
    type Output = usize;

    fn evaluate(&mut self) -> HarnessResult<Evaluation<usize>> {
        let count = self.driver.count(&self.rows)?;
        Ok(if self.predicate.holds(count) {
            Evaluation::Satisfied(count)
        } else {
            Evaluation::unsatisfied(format!("{count} rows"))
        })
    }

    fn description(&self) -> String {
        self.predicate.to_string()
    }
}

/// Condition: the element exists and accepts interaction
pub struct ElementClickable<'a> {
    driver: &'a dyn PageDriver,
    element: Element,
}

impl std::fmt::Debug for ElementClickable<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementClickable")
            .field("element", &self.element)
            .finish_non_exhaustive()
    }
}

impl<'a> ElementClickable<'a> {
    /// Watch `element` on `driver`
    #[must_use]
    pub fn new(driver: &'a dyn PageDriver, element: Element) -> Self {
        Self { driver, element }
    }
}

impl WaitCondition for ElementClickable<'_> {
    type Output = ();

    fn evaluate(&mut self) -> HarnessResult<Evaluation<()>> {
        let selector = self.element.selector();
        let matches = self.driver.count(&selector)?;
        if matches == 0 {
            return Ok(Evaluation::unsatisfied("no matching element"));
        }
        Ok(if self.driver.is_interactable(&selector)? {
            Evaluation::Satisfied(())
        } else {
            Evaluation::unsatisfied(format!("{matches} match(es), not interactable"))
        })
    }

    fn description(&self) -> String {
        format!("{} to be clickable", self.element.describe())
    }
}

/// Page model over one browser session
#[derive(Debug)]
pub struct FoodPage<D: PageDriver> {
    driver: D,
    labels: CategoryLabels,
    implicit: WaitOptions,
    wait: WaitOptions,
    baseline_rows: usize,
}

impl<D: PageDriver> FoodPage<D> {
    /// Wrap a driver with default options
    #[must_use]
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            labels: CategoryLabels::default(),
            implicit: WaitOptions::default(),
            wait: WaitOptions::default(),
            baseline_rows: DEFAULT_BASELINE_ROWS,
        }
    }

    /// Set the category labels
    #[must_use]
    pub fn with_labels(mut self, labels: CategoryLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Set the options used by both element resolution and row waits
    #[must_use]
    pub const fn with_wait(mut self, options: WaitOptions) -> Self {
        self.implicit = options;
        self.wait = options;
        self
    }

    /// Set the implicit find timeout used to resolve elements before acting
    #[must_use]
    pub const fn with_implicit_timeout(mut self, timeout_ms: u64) -> Self {
        self.implicit = self.implicit.with_timeout(timeout_ms);
        self
    }

    /// Set the row count expected after a reset
    #[must_use]
    pub const fn with_baseline_rows(mut self, rows: usize) -> Self {
        self.baseline_rows = rows;
        self
    }

    /// Category labels in use
    #[must_use]
    pub const fn labels(&self) -> &CategoryLabels {
        &self.labels
    }

    /// Options used by row-count waits
    #[must_use]
    pub const fn wait_options(&self) -> &WaitOptions {
        &self.wait
    }

    /// Underlying driver
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Navigate to the page
    pub fn open(&mut self, url: &str) -> HarnessResult<&mut Self> {
        info!(url, "opening food page");
        self.driver.navigate(url)?;
        Ok(self)
    }

    /// Wait until `element` is clickable within the implicit timeout.
    ///
    /// # Errors
    ///
    /// [`HarnessError::ElementNotFound`] if nothing ever matched,
    /// [`HarnessError::ElementNotInteractable`] if it matched but never
    /// became interactable.
    pub fn await_clickable(&self, element: Element) -> HarnessResult<()> {
        let condition = ElementClickable::new(&self.driver, element);
        match Waiter::with_options(self.implicit).wait(condition) {
            Ok(_) => Ok(()),
            Err(HarnessError::TimedOut {
                timeout_ms,
                last_observed,
                ..
            }) => {
                if self.driver.count(&element.selector())? == 0 {
                    Err(HarnessError::ElementNotFound {
                        locator: element.describe(),
                    })
                } else {
                    Err(HarnessError::ElementNotInteractable {
                        locator: element.describe(),
                        message: format!("{last_observed} after {timeout_ms}ms"),
                    })
                }
            }
            Err(other) => Err(other),
        }
    }

    /// Wait until the table holds exactly `expected` rows
    pub fn await_row_count_equals(&self, expected: usize) -> HarnessResult<WaitResult<usize>> {
        self.await_rows(CountPredicate::Equals(expected))
    }

    /// Wait until the table holds more than `previous` rows
    pub fn await_row_count_exceeds(&self, previous: usize) -> HarnessResult<WaitResult<usize>> {
        self.await_rows(CountPredicate::Exceeds(previous))
    }

    fn await_rows(&self, predicate: CountPredicate) -> HarnessResult<WaitResult<usize>> {
        Waiter::with_options(self.wait).wait(RowCount::new(&self.driver, predicate))
    }

    fn click(&mut self, button: Button) -> HarnessResult<()> {
        self.await_clickable(button.element())?;
        debug!(element = %button.element(), "click");
        button.click(&mut self.driver)
    }

    /// Open the add form
    pub fn open_add_form(&mut self) -> HarnessResult<&mut Self> {
        self.click(Button(Element::AddButton))?;
        Ok(self)
    }

    /// Type the record name
    pub fn fill_name(&mut self, text: &str) -> HarnessResult<&mut Self> {
        let field = TextField(Element::NameField);
        self.await_clickable(field.element())?;
        field.fill(&mut self.driver, text)?;
        Ok(self)
    }

    /// Choose the category by its visible label
    pub fn select_category(&mut self, label: &str) -> HarnessResult<&mut Self> {
        let select = SelectField(Element::CategorySelect);
        self.await_clickable(select.element())?;
        select.select_label(&mut self.driver, label)?;
        Ok(self)
    }

    /// Bring the exotic checkbox to `flag`
    pub fn set_exotic(&mut self, flag: bool) -> HarnessResult<&mut Self> {
        let checkbox = Checkbox(Element::ExoticCheckbox);
        self.await_clickable(checkbox.element())?;
        checkbox.set(&mut self.driver, flag)?;
        Ok(self)
    }

    /// Submit the add form
    pub fn save(&mut self) -> HarnessResult<&mut Self> {
        self.click(Button(Element::SaveButton))?;
        Ok(self)
    }

    /// Fill and submit the add form for `record`.
    ///
    /// With `select_category == false` the form's default category is kept.
    pub fn add_food(&mut self, record: &FoodRecord, select_category: bool) -> HarnessResult<()> {
        self.fill_add_form(record, select_category)?.save()?;
        Ok(())
    }

    /// Open the add form and fill it for `record` without submitting
    pub fn fill_add_form(&mut self, record: &FoodRecord, select_category: bool) -> HarnessResult<&mut Self> {
        info!(record = %record, "filling the add form");
        let label = self.labels.label(record.category).to_string();
        self.open_add_form()?.fill_name(&record.name)?;
        if select_category {
            self.select_category(&label)?;
        }
        self.set_exotic(record.exotic)
    }

    /// Current table rows, read fresh
    pub fn rows(&self) -> HarnessResult<Vec<TableRow>> {
        let cells: Vec<Selector> = Element::ROW_CELLS.iter().map(|e| e.selector()).collect();
        self.driver
            .cell_texts(&Element::TableRows.selector(), &cells)?
            .into_iter()
            .map(TableRow::from_cells)
            .collect()
    }

    /// Current number of table rows
    pub fn row_count(&self) -> HarnessResult<usize> {
        self.driver.count(&Element::TableRows.selector())
    }

    /// Row at `index`, if present
    pub fn row_at(&self, index: usize) -> HarnessResult<Option<TableRow>> {
        Ok(self.rows()?.into_iter().nth(index))
    }

    /// Last table row, if any
    pub fn last_row(&self) -> HarnessResult<Option<TableRow>> {
        Ok(self.rows()?.pop())
    }

    /// The row `record` renders as
    #[must_use]
    pub fn expected_row(&self, record: &FoodRecord) -> TableRow {
        crate::consistency::expected_row(record, &self.labels)
    }

    /// Reset the page data through the navigation menu and wait for the
    /// baseline row count.
    pub fn reset_data(&mut self) -> HarnessResult<()> {
        self.click(Button(Element::NavDropdown))?;
        self.click(Button(Element::ResetLink))?;
        let result = self.await_row_count_equals(self.baseline_rows)?;
        info!(rows = result.value, "page data reset");
        Ok(())
    }

    /// Close the browser session
    pub fn close(&mut self) -> HarnessResult<()> {
        self.driver.close()
    }
}
