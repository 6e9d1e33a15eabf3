//! Widget capabilities.
//!
//! Each kind of form control implements only the capabilities it has, so a
//! text field cannot be toggled and a checkbox cannot be typed into.

use crate::driver::PageDriver;
use crate::locators::Element;
use crate::result::HarnessResult;

/// A registered element the page model can address
pub trait Widget {
    /// Registry entry for this widget
    fn element(&self) -> Element;
}

/// Widgets that respond to a click
pub trait Clickable: Widget {
    /// Click the widget
    fn click(&self, driver: &mut dyn PageDriver) -> HarnessResult<()> {
        driver.click(&self.element().selector())
    }
}

/// Widgets that accept typed text
pub trait Fillable: Widget {
    /// Type `text` into the widget
    fn fill(&self, driver: &mut dyn PageDriver, text: &str) -> HarnessResult<()> {
        driver.send_keys(&self.element().selector(), text)
    }
}

/// Widgets offering labelled options
pub trait Selectable: Widget {
    /// Choose an option by its visible label
    fn select_label(&self, driver: &mut dyn PageDriver, label: &str) -> HarnessResult<()> {
        driver.select_by_visible_text(&self.element().selector(), label)
    }
}

/// Widgets with an on/off state
pub trait Toggleable: Widget {
    /// Current state
    fn is_on(&self, driver: &dyn PageDriver) -> HarnessResult<bool> {
        driver.is_checked(&self.element().selector())
    }

    /// Bring the widget to `on`, clicking only when the state differs
    fn set(&self, driver: &mut dyn PageDriver, on: bool) -> HarnessResult<()> {
        if self.is_on(driver)? != on {
            driver.click(&self.element().selector())?;
        }
        Ok(())
    }
}

/// A push button or link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Button(pub Element);

/// A free-text input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextField(pub Element);

/// A single-select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectField(pub Element);

/// A checkbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkbox(pub Element);

macro_rules! widget {
    ($($ty:ident),*) => {
        $(impl Widget for $ty {
            fn element(&self) -> Element {
                self.0
            }
        })*
    };
}

widget!(Button, TextField, SelectField, Checkbox);

impl Clickable for Button {}
impl Fillable for TextField {}
impl Selectable for SelectField {}
impl Toggleable for Checkbox {}
