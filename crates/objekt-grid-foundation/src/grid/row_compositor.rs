//! Merges pins with the paged item stream and chunks the result into rows.

use std::fmt;
use std::rc::Rc;

use super::row_entry::{Row, RowEntry};

/// Caller-supplied visibility predicate for items.
///
/// Compared by `Rc` identity when deciding whether rows must be recomposed,
/// so keep the same `Rc` alive across frames unless the predicate changed.
pub type ShouldRender<I> = Rc<dyn Fn(&I) -> bool>;

/// Options for [`compose_rows`].
pub struct ComposeOptions<I> {
    /// Suppress the pin prefix entirely.
    pub hide_pins: bool,
    /// Items for which this returns `false` are dropped. `None` keeps all.
    pub should_render: Option<ShouldRender<I>>,
}

impl<I> Default for ComposeOptions<I> {
    fn default() -> Self {
        Self {
            hide_pins: false,
            should_render: None,
        }
    }
}

impl<I> Clone for ComposeOptions<I> {
    fn clone(&self) -> Self {
        Self {
            hide_pins: self.hide_pins,
            should_render: self.should_render.clone(),
        }
    }
}

impl<I> fmt::Debug for ComposeOptions<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposeOptions")
            .field("hide_pins", &self.hide_pins)
            .field("should_render", &self.should_render.is_some())
            .finish()
    }
}

impl<I> ComposeOptions<I> {
    pub fn with_hide_pins(mut self, hide_pins: bool) -> Self {
        self.hide_pins = hide_pins;
        self
    }

    pub fn with_should_render(mut self, predicate: impl Fn(&I) -> bool + 'static) -> Self {
        self.should_render = Some(Rc::new(predicate));
        self
    }

    fn renders(&self, item: &I) -> bool {
        self.should_render
            .as_ref()
            .map_or(true, |predicate| predicate(item))
    }
}

/// Builds the ordered row list for one frame.
///
/// Pins come first (unless hidden) in the order given, then every item that
/// passes `should_render`, in server order. Rows hold exactly `column_count`
/// entries except the last, which holds the remainder. Empty input yields no
/// rows at all.
///
/// Pinned objekts that also appear in `items` are kept; filter them through
/// `should_render` if they should not show twice.
pub fn compose_rows<P, I>(
    pins: &[P],
    items: &[I],
    column_count: usize,
    options: &ComposeOptions<I>,
) -> Vec<Row<P, I>>
where
    P: Clone,
    I: Clone,
{
    let column_count = column_count.max(1);
    let pin_entries = pins
        .iter()
        .filter(|_| !options.hide_pins)
        .map(|pin| RowEntry::Pin(pin.clone()));
    let item_entries = items
        .iter()
        .filter(|item| options.renders(item))
        .map(|item| RowEntry::Item(item.clone()));

    let mut rows = Vec::new();
    let mut current = Row::new();
    for entry in pin_entries.chain(item_entries) {
        current.push(entry);
        if current.len() == column_count {
            rows.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        rows.push(current);
    }
    rows
}

/// Identity of every input that feeds [`compose_rows`].
struct ComposeKey<P, I> {
    pins: Rc<[P]>,
    items: Rc<[I]>,
    column_count: usize,
    should_render: Option<ShouldRender<I>>,
    hide_pins: bool,
}

impl<P, I> ComposeKey<P, I> {
    fn matches(
        &self,
        pins: &Rc<[P]>,
        items: &Rc<[I]>,
        column_count: usize,
        options: &ComposeOptions<I>,
    ) -> bool {
        let same_predicate = match (&self.should_render, &options.should_render) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        Rc::ptr_eq(&self.pins, pins)
            && Rc::ptr_eq(&self.items, items)
            && self.column_count == column_count
            && self.hide_pins == options.hide_pins
            && same_predicate
    }
}

/// Memoizing wrapper around [`compose_rows`].
///
/// Rows are rebuilt only when the identity of an input changes. The pin list
/// is never cached beyond that identity check: a new `Rc` always recomposes.
pub struct RowCompositor<P, I> {
    key: Option<ComposeKey<P, I>>,
    rows: Rc<[Row<P, I>]>,
    revision: u64,
}

impl<P, I> Default for RowCompositor<P, I> {
    fn default() -> Self {
        Self {
            key: None,
            rows: Rc::from(Vec::new()),
            revision: 0,
        }
    }
}

impl<P, I> fmt::Debug for RowCompositor<P, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowCompositor")
            .field("rows", &self.rows.len())
            .field("revision", &self.revision)
            .finish()
    }
}

impl<P: Clone, I: Clone> RowCompositor<P, I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomposes if any input identity changed. Returns whether it did.
    pub fn compose(
        &mut self,
        pins: &Rc<[P]>,
        items: &Rc<[I]>,
        column_count: usize,
        options: &ComposeOptions<I>,
    ) -> bool {
        let column_count = column_count.max(1);
        if self
            .key
            .as_ref()
            .is_some_and(|key| key.matches(pins, items, column_count, options))
        {
            return false;
        }
        self.rows = Rc::from(compose_rows(pins, items, column_count, options));
        self.key = Some(ComposeKey {
            pins: Rc::clone(pins),
            items: Rc::clone(items),
            column_count,
            should_render: options.should_render.clone(),
            hide_pins: options.hide_pins,
        });
        self.revision += 1;
        true
    }
}

impl<P, I> RowCompositor<P, I> {
    pub fn rows(&self) -> &Rc<[Row<P, I>]> {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Bumped every time the rows are rebuilt.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
