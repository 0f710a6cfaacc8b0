//! Small item and pin records for tests.

use objekt_grid_foundation::{GridItem, ItemKey, PinnedItem};

/// An objekt as the page source delivers it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestItem {
    pub id: u64,
    /// Locked objekts are typically hidden through `should_render`.
    pub locked: bool,
}

impl TestItem {
    pub fn new(id: u64) -> Self {
        Self { id, locked: false }
    }

    pub fn locked(id: u64) -> Self {
        Self { id, locked: true }
    }
}

impl GridItem for TestItem {
    fn item_key(&self) -> ItemKey {
        ItemKey::Number(self.id)
    }
}

/// A pinned objekt from the local pin list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestPin {
    pub token_id: u64,
}

impl TestPin {
    pub fn new(token_id: u64) -> Self {
        Self { token_id }
    }
}

impl PinnedItem for TestPin {
    fn token_key(&self) -> ItemKey {
        ItemKey::Number(self.token_id)
    }
}

/// Items with ids `first..first + count`.
pub fn items(first: u64, count: usize) -> Vec<TestItem> {
    (first..first + count as u64).map(TestItem::new).collect()
}

pub fn pins(ids: &[u64]) -> Vec<TestPin> {
    ids.iter().copied().map(TestPin::new).collect()
}
