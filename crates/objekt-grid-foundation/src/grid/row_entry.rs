//! Identity and entry types shared by the row compositor and renderer.

use smallvec::SmallVec;
use std::fmt;
use std::rc::Rc;

/// Caller-supplied identity of an item or pin.
///
/// Pins and items share this key space so callers can de-duplicate a pinned
/// objekt against the filtered stream.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKey {
    Number(u64),
    Text(Rc<str>),
}

impl fmt::Debug for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::Number(value) => write!(f, "#{value}"),
            ItemKey::Text(value) => write!(f, "{value:?}"),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::Number(value) => write!(f, "{value}"),
            ItemKey::Text(value) => f.write_str(value),
        }
    }
}

impl From<u64> for ItemKey {
    fn from(value: u64) -> Self {
        ItemKey::Number(value)
    }
}

impl From<&str> for ItemKey {
    fn from(value: &str) -> Self {
        ItemKey::Text(Rc::from(value))
    }
}

impl From<String> for ItemKey {
    fn from(value: String) -> Self {
        ItemKey::Text(Rc::from(value))
    }
}

/// A record delivered by the paged data source.
pub trait GridItem {
    fn item_key(&self) -> ItemKey;
}

/// A record from the locally held pin list.
pub trait PinnedItem {
    /// Token id comparable against [`GridItem::item_key`].
    fn token_key(&self) -> ItemKey;
}

impl<T: GridItem + ?Sized> GridItem for Rc<T> {
    fn item_key(&self) -> ItemKey {
        (**self).item_key()
    }
}

impl<T: PinnedItem + ?Sized> PinnedItem for Rc<T> {
    fn token_key(&self) -> ItemKey {
        (**self).token_key()
    }
}

/// One cell of a grid row.
#[derive(Clone, Debug, PartialEq)]
pub enum RowEntry<P, I> {
    Pin(P),
    Item(I),
}

impl<P: PinnedItem, I: GridItem> RowEntry<P, I> {
    pub fn key(&self) -> ItemKey {
        match self {
            RowEntry::Pin(pin) => pin.token_key(),
            RowEntry::Item(item) => item.item_key(),
        }
    }
}

impl<P, I> RowEntry<P, I> {
    pub fn is_pin(&self) -> bool {
        matches!(self, RowEntry::Pin(_))
    }

    pub fn as_item(&self) -> Option<&I> {
        match self {
            RowEntry::Item(item) => Some(item),
            RowEntry::Pin(_) => None,
        }
    }

    pub fn as_pin(&self) -> Option<&P> {
        match self {
            RowEntry::Pin(pin) => Some(pin),
            RowEntry::Item(_) => None,
        }
    }
}

/// Inline capacity for a row. Grids rarely exceed eight columns, so rows stay
/// off the heap in the common case.
pub const ROW_INLINE_CAPACITY: usize = 8;

/// One visual grid row; `row[i]` occupies grid column `i`.
pub type Row<P, I> = SmallVec<[RowEntry<P, I>; ROW_INLINE_CAPACITY]>;
