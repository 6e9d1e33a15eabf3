//! In-process model of the food list page.
//!
//! Behaves like the real application as far as the page contract goes: the
//! add form is a modal that must be opened before its fields accept input,
//! the reset link is only reachable through the navigation menu, saving
//! persists to the shared [`SqliteFoodStore`], and table updates land after a
//! configurable render delay. Saved rows are appended client-side; the table
//! is only re-read from storage on navigation and reset, so rows inserted
//! directly into storage stay invisible until then.

use super::PageDriver;
use crate::locators::{Element, Selector};
use crate::record::{exotic_label, Category, CategoryLabels, FoodRecord, TableRow};
use crate::result::{HarnessError, HarnessResult};
use crate::storage::{FoodStore, SqliteFoodStore, StoredFood};
use std::time::{Duration, Instant};
use tracing::trace;

/// Misbehaviours the simulated application can be told to exhibit
#[derive(Debug, Clone, Default)]
pub struct SimulatedFaults {
    /// Delay between an action and the table reflecting it
    pub render_delay: Duration,
    /// Save closes the form but neither persists nor renders
    pub drop_saves: bool,
    /// Save renders the row but does not persist it
    pub skip_persist: bool,
    /// Save persists the record twice
    pub double_persist: bool,
    /// Save renders the row with this category label instead
    pub render_category_as: Option<String>,
    /// Elements that never become interactable
    pub hidden: Vec<Element>,
}

#[derive(Debug, Clone)]
struct FormState {
    name: String,
    category: Category,
    exotic: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            name: String::new(),
            category: Category::Vegetable,
            exotic: false,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingRender {
    due: Instant,
    rows: Vec<TableRow>,
}

/// Simulated food list page backed by a shared store
#[derive(Debug)]
pub struct SimulatedPage {
    store: SqliteFoodStore,
    labels: CategoryLabels,
    faults: SimulatedFaults,
    url: Option<String>,
    closed: bool,
    menu_open: bool,
    form: Option<FormState>,
    rendered: Vec<TableRow>,
    pending: Option<PendingRender>,
    call_history: Vec<String>,
}

impl SimulatedPage {
    /// Create a page over `store`
    #[must_use]
    pub fn new(store: SqliteFoodStore) -> Self {
        Self {
            store,
            labels: CategoryLabels::default(),
            faults: SimulatedFaults::default(),
            url: None,
            closed: false,
            menu_open: false,
            form: None,
            rendered: Vec::new(),
            pending: None,
            call_history: Vec::new(),
        }
    }

    /// Set the category labels the page renders
    #[must_use]
    pub fn with_labels(mut self, labels: CategoryLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Set fault injection
    #[must_use]
    pub fn with_faults(mut self, faults: SimulatedFaults) -> Self {
        self.faults = faults;
        self
    }

    /// Set the render delay
    #[must_use]
    pub fn with_render_delay(mut self, delay: Duration) -> Self {
        self.faults.render_delay = delay;
        self
    }

    /// Mutating calls made so far, as `method:element[:arg]`
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Check if a call with this prefix was made
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(prefix))
    }

    /// URL of the last navigation
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Whether the session was closed
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> HarnessResult<()> {
        if self.closed {
            return Err(HarnessError::driver("session closed"));
        }
        if self.url.is_none() {
            return Err(HarnessError::driver("no page loaded"));
        }
        Ok(())
    }

    fn element(selector: &Selector) -> HarnessResult<Element> {
        Element::from_selector(selector).ok_or_else(|| HarnessError::ElementNotFound {
            locator: selector.to_string(),
        })
    }

    fn to_row(&self, food: &StoredFood) -> TableRow {
        TableRow::new(
            food.name.clone(),
            self.labels.label(food.category),
            exotic_label(food.exotic),
        )
    }

    fn visible_rows(&self) -> &[TableRow] {
        match &self.pending {
            Some(p) if Instant::now() >= p.due => &p.rows,
            _ => &self.rendered,
        }
    }

    fn settle(&mut self) {
        if self.pending.as_ref().is_some_and(|p| Instant::now() >= p.due) {
            if let Some(p) = self.pending.take() {
                self.rendered = p.rows;
            }
        }
    }

    fn schedule(&mut self, rows: Vec<TableRow>) {
        let due = Instant::now() + self.faults.render_delay;
        self.pending = Some(PendingRender { due, rows });
    }

    fn interactable(&self, element: Element) -> bool {
        if self.faults.hidden.contains(&element) {
            return false;
        }
        match element {
            Element::AddButton => self.form.is_none(),
            Element::SaveButton
            | Element::NameField
            | Element::CategorySelect
            | Element::ExoticCheckbox => self.form.is_some(),
            Element::ResetLink => self.menu_open,
            Element::NavDropdown => true,
            Element::TableRows | Element::RowName | Element::RowCategory | Element::RowExotic => {
                !self.visible_rows().is_empty()
            }
        }
    }

    fn require_interactable(&self, element: Element) -> HarnessResult<()> {
        if self.interactable(element) {
            Ok(())
        } else {
            Err(HarnessError::ElementNotInteractable {
                locator: element.describe(),
                message: "element is not displayed".to_string(),
            })
        }
    }

    fn form_mut(&mut self, element: Element) -> HarnessResult<&mut FormState> {
        self.form
            .as_mut()
            .ok_or_else(|| HarnessError::ElementNotInteractable {
                locator: element.describe(),
                message: "add form is closed".to_string(),
            })
    }

    fn submit(&mut self) -> HarnessResult<()> {
        let form = self.form.take().unwrap_or_default();
        if self.faults.drop_saves {
            trace!(name = %form.name, "save dropped");
            return Ok(());
        }
        let record = FoodRecord::new(form.name, form.category, form.exotic);
        if !self.faults.skip_persist {
            self.store.insert(&record)?;
            if self.faults.double_persist {
                self.store.insert(&record)?;
            }
        }
        self.settle();
        let mut rows = self
            .pending
            .take()
            .map_or_else(|| self.rendered.clone(), |p| p.rows);
        let mut row = TableRow::new(
            record.name,
            self.labels.label(record.category),
            exotic_label(record.exotic),
        );
        if let Some(label) = &self.faults.render_category_as {
            row.category_label = label.clone();
        }
        rows.push(row);
        self.schedule(rows);
        Ok(())
    }

    fn reset(&mut self) -> HarnessResult<()> {
        self.store.reset_to_baseline()?;
        let rows = self
            .store
            .select_all()?
            .iter()
            .map(|f| self.to_row(f))
            .collect();
        self.menu_open = false;
        self.schedule(rows);
        Ok(())
    }
}

impl PageDriver for SimulatedPage {
    fn navigate(&mut self, url: &str) -> HarnessResult<()> {
        if self.closed {
            return Err(HarnessError::driver("session closed"));
        }
        self.call_history.push(format!("navigate:{url}"));
        self.rendered = self
            .store
            .select_all()?
            .iter()
            .map(|f| self.to_row(f))
            .collect();
        self.pending = None;
        self.form = None;
        self.menu_open = false;
        self.url = Some(url.to_string());
        Ok(())
    }

    fn count(&self, selector: &Selector) -> HarnessResult<usize> {
        self.ensure_open()?;
        Ok(match Element::from_selector(selector) {
            Some(e) if e == Element::TableRows || e.is_row_relative() => {
                self.visible_rows().len()
            }
            Some(_) => 1,
            None => 0,
        })
    }

    fn is_interactable(&self, selector: &Selector) -> HarnessResult<bool> {
        self.ensure_open()?;
        Ok(Element::from_selector(selector).is_some_and(|e| self.interactable(e)))
    }

    fn click(&mut self, selector: &Selector) -> HarnessResult<()> {
        self.ensure_open()?;
        let element = Self::element(selector)?;
        self.require_interactable(element)?;
        self.call_history.push(format!("click:{element}"));
        match element {
            Element::AddButton => {
                self.form = Some(FormState::default());
                Ok(())
            }
            Element::SaveButton => self.submit(),
            Element::ExoticCheckbox => {
                let form = self.form_mut(element)?;
                form.exotic = !form.exotic;
                Ok(())
            }
            Element::NavDropdown => {
                self.menu_open = !self.menu_open;
                Ok(())
            }
            Element::ResetLink => self.reset(),
            _ => Ok(()),
        }
    }

    fn send_keys(&mut self, selector: &Selector, text: &str) -> HarnessResult<()> {
        self.ensure_open()?;
        let element = Self::element(selector)?;
        self.require_interactable(element)?;
        if element != Element::NameField {
            return Err(HarnessError::ElementNotInteractable {
                locator: element.describe(),
                message: "element does not accept text".to_string(),
            });
        }
        self.call_history.push(format!("send_keys:{element}:{text}"));
        self.form_mut(element)?.name.push_str(text);
        Ok(())
    }

    fn select_by_visible_text(&mut self, selector: &Selector, label: &str) -> HarnessResult<()> {
        self.ensure_open()?;
        let element = Self::element(selector)?;
        self.require_interactable(element)?;
        if element != Element::CategorySelect {
            return Err(HarnessError::ElementNotInteractable {
                locator: element.describe(),
                message: "element is not a select".to_string(),
            });
        }
        let category = Category::ALL
            .into_iter()
            .find(|c| self.labels.label(*c) == label)
            .ok_or_else(|| HarnessError::ElementNotFound {
                locator: format!("option {label:?} in {}", element.describe()),
            })?;
        self.call_history.push(format!("select:{element}:{label}"));
        self.form_mut(element)?.category = category;
        Ok(())
    }

    fn is_checked(&self, selector: &Selector) -> HarnessResult<bool> {
        self.ensure_open()?;
        let element = Self::element(selector)?;
        if element != Element::ExoticCheckbox {
            return Err(HarnessError::driver(format!("{element} is not a checkbox")));
        }
        Ok(self.form.as_ref().is_some_and(|f| f.exotic))
    }

    fn cell_texts(&self, rows: &Selector, cells: &[Selector]) -> HarnessResult<Vec<Vec<String>>> {
        self.ensure_open()?;
        if Self::element(rows)? != Element::TableRows {
            return Err(HarnessError::ElementNotFound {
                locator: rows.to_string(),
            });
        }
        let columns = cells
            .iter()
            .map(Self::element)
            .collect::<HarnessResult<Vec<_>>>()?;
        self.visible_rows()
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| match column {
                        Element::RowName => Ok(row.name.clone()),
                        Element::RowCategory => Ok(row.category_label.clone()),
                        Element::RowExotic => Ok(row.exotic_label.clone()),
                        other => Err(HarnessError::ElementNotFound {
                            locator: format!("{} within a table row", other.describe()),
                        }),
                    })
                    .collect()
            })
            .collect()
    }

    fn close(&mut self) -> HarnessResult<()> {
        self.call_history.push("close".to_string());
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn page() -> (SimulatedPage, SqliteFoodStore) {
        let store = SqliteFoodStore::open_in_memory().unwrap();
        store.seed_baseline().unwrap();
        let mut page = SimulatedPage::new(store.clone());
        page.navigate("http://localhost:8080/food").unwrap();
        (page, store)
    }

    fn rows(page: &SimulatedPage) -> Vec<Vec<String>> {
        let cells: Vec<Selector> = Element::ROW_CELLS.iter().map(|e| e.selector()).collect();
        page.cell_texts(&Element::TableRows.selector(), &cells)
            .unwrap()
    }

    #[test]
    fn test_navigate_renders_storage() {
        let (page, _) = page();
        assert_eq!(page.count(&Element::TableRows.selector()).unwrap(), 4);
        assert_eq!(rows(&page)[0], vec!["Orange", "Fruit", "true"]);
        assert_eq!(page.url(), Some("http://localhost:8080/food"));
    }

    #[test]
    fn test_form_fields_need_open_form() {
        let (mut page, _) = page();
        let name = Element::NameField.selector();
        assert!(!page.is_interactable(&name).unwrap());
        let err = page.send_keys(&name, "Potato").unwrap_err();
        assert_eq!(err.kind(), "element_not_interactable");
        page.click(&Element::AddButton.selector()).unwrap();
        assert!(page.is_interactable(&name).unwrap());
        assert!(!page.is_interactable(&Element::AddButton.selector()).unwrap());
    }

    #[test]
    fn test_save_persists_and_appends() {
        let (mut page, store) = page();
        page.click(&Element::AddButton.selector()).unwrap();
        page.send_keys(&Element::NameField.selector(), "Mangosteen")
            .unwrap();
        page.select_by_visible_text(&Element::CategorySelect.selector(), "Fruit")
            .unwrap();
        page.click(&Element::ExoticCheckbox.selector()).unwrap();
        assert!(page.is_checked(&Element::ExoticCheckbox.selector()).unwrap());
        page.click(&Element::SaveButton.selector()).unwrap();
        assert_eq!(
            store
                .count_matching(&FoodRecord::new("Mangosteen", Category::Fruit, true))
                .unwrap(),
            1
        );
        assert_eq!(rows(&page).last().unwrap(), &vec!["Mangosteen", "Fruit", "true"]);
    }

    #[test]
    fn test_render_delay_defers_rows() {
        let (page, _) = page();
        let mut page = page.with_render_delay(Duration::from_millis(40));
        page.click(&Element::AddButton.selector()).unwrap();
        page.send_keys(&Element::NameField.selector(), "Potato").unwrap();
        page.click(&Element::SaveButton.selector()).unwrap();
        assert_eq!(page.count(&Element::TableRows.selector()).unwrap(), 4);
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(page.count(&Element::TableRows.selector()).unwrap(), 5);
    }

    #[test]
    fn test_unknown_option_is_not_found() {
        let (mut page, _) = page();
        page.click(&Element::AddButton.selector()).unwrap();
        let err = page
            .select_by_visible_text(&Element::CategorySelect.selector(), "Meat")
            .unwrap_err();
        assert_eq!(err.kind(), "element_not_found");
    }

    #[test]
    fn test_reset_needs_menu() {
        let (mut page, store) = page();
        store
            .insert(&FoodRecord::new("Grape", Category::Fruit, false))
            .unwrap();
        let reset = Element::ResetLink.selector();
        assert!(page.click(&reset).is_err());
        page.click(&Element::NavDropdown.selector()).unwrap();
        page.click(&reset).unwrap();
        assert_eq!(store.count_by_name("Grape").unwrap(), 0);
        assert_eq!(page.count(&Element::TableRows.selector()).unwrap(), 4);
        assert!(!page.is_interactable(&reset).unwrap());
    }

    #[test]
    fn test_direct_inserts_stay_invisible_until_reload() {
        let (mut page, store) = page();
        store
            .insert(&FoodRecord::new("Grape", Category::Fruit, false))
            .unwrap();
        assert_eq!(page.count(&Element::TableRows.selector()).unwrap(), 4);
        page.navigate("http://localhost:8080/food").unwrap();
        assert_eq!(page.count(&Element::TableRows.selector()).unwrap(), 5);
    }

    #[test]
    fn test_closed_session_rejects_calls() {
        let (mut page, _) = page();
        page.close().unwrap();
        assert!(page.is_closed());
        let err = page.count(&Element::TableRows.selector()).unwrap_err();
        assert_eq!(err.kind(), "driver");
    }

    #[test]
    fn test_hidden_fault() {
        let (page, _) = page();
        let page = page.with_faults(SimulatedFaults {
            hidden: vec![Element::AddButton],
            ..SimulatedFaults::default()
        });
        assert!(!page.is_interactable(&Element::AddButton.selector()).unwrap());
        assert_eq!(page.count(&Element::AddButton.selector()).unwrap(), 1);
    }
}
