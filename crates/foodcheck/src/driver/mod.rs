//! PageDriver - the page contract the harness consumes.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  PageDriver (trait)                                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────┐      ┌──────────────────────────┐  │
//! │  │  SimulatedPage       │      │  CdpDriver               │  │
//! │  │  in-process food app │      │  (feature = "browser")   │  │
//! │  │  over a FoodStore    │      │  chromiumoxide over CDP  │  │
//! │  └──────────────────────┘      └──────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The trait is blocking and object safe so widgets can drive it through
//! `&mut dyn PageDriver`. Methods that only observe take `&self`; wait
//! conditions rely on that to stay side-effect free.

#[cfg(feature = "browser")]
mod cdp;
mod simulated;

#[cfg(feature = "browser")]
pub use cdp::CdpDriver;
pub use simulated::{SimulatedFaults, SimulatedPage};

use crate::locators::Selector;
use crate::result::HarnessResult;

/// Blocking browser-page operations used by the page model
pub trait PageDriver {
    /// Navigate to URL
    fn navigate(&mut self, url: &str) -> HarnessResult<()>;

    /// Number of elements matching the selector
    fn count(&self, selector: &Selector) -> HarnessResult<usize>;

    /// Whether the first match exists, is displayed and is enabled
    fn is_interactable(&self, selector: &Selector) -> HarnessResult<bool>;

    /// Click the first match
    fn click(&mut self, selector: &Selector) -> HarnessResult<()>;

    /// Type text into the first match
    fn send_keys(&mut self, selector: &Selector, text: &str) -> HarnessResult<()>;

    /// Choose the option whose visible text equals `label`
    fn select_by_visible_text(&mut self, selector: &Selector, label: &str) -> HarnessResult<()>;

    /// Checked state of a checkbox
    fn is_checked(&self, selector: &Selector) -> HarnessResult<bool>;

    /// Text of each `cells` selector, evaluated relative to every `rows` match
    fn cell_texts(&self, rows: &Selector, cells: &[Selector]) -> HarnessResult<Vec<Vec<String>>>;

    /// Close the browser session
    fn close(&mut self) -> HarnessResult<()>;
}

impl<D: PageDriver + ?Sized> PageDriver for Box<D> {
    fn navigate(&mut self, url: &str) -> HarnessResult<()> {
        (**self).navigate(url)
    }

    fn count(&self, selector: &Selector) -> HarnessResult<usize> {
        (**self).count(selector)
    }

    fn is_interactable(&self, selector: &Selector) -> HarnessResult<bool> {
        (**self).is_interactable(selector)
    }

    fn click(&mut self, selector: &Selector) -> HarnessResult<()> {
        (**self).click(selector)
    }

    fn send_keys(&mut self, selector: &Selector, text: &str) -> HarnessResult<()> {
        (**self).send_keys(selector, text)
    }

    fn select_by_visible_text(&mut self, selector: &Selector, label: &str) -> HarnessResult<()> {
        (**self).select_by_visible_text(selector, label)
    }

    fn is_checked(&self, selector: &Selector) -> HarnessResult<bool> {
        (**self).is_checked(selector)
    }

    fn cell_texts(&self, rows: &Selector, cells: &[Selector]) -> HarnessResult<Vec<Vec<String>>> {
        (**self).cell_texts(rows, cells)
    }

    fn close(&mut self) -> HarnessResult<()> {
        (**self).close()
    }
}
