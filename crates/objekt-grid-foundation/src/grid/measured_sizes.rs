//! Real row heights reported by the renderer after paint.

/// Sizes closer than this are treated as unchanged.
const SIZE_EPSILON: f32 = 0.001;

/// Identifies a row for measurement purposes.
///
/// Carries the cache generation it was handed out under, so a measurement
/// taken before a column-count change cannot land on the re-chunked row that
/// now happens to share its index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RowKey {
    pub generation: u64,
    pub index: usize,
}

/// Why [`MeasuredSizes::record`] ignored a measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejected {
    /// The key was handed out before the last invalidation.
    StaleGeneration,
    /// NaN, negative or infinite.
    InvalidSize,
    /// Within epsilon of the stored size.
    Unchanged,
}

/// Arena of measured row heights indexed by row position.
///
/// `generation` is bumped whenever the whole cache is invalidated (column
/// count change). `dirty_from` records the lowest index whose size changed
/// since the owner last rebuilt its offsets.
#[derive(Debug, Default)]
pub struct MeasuredSizes {
    sizes: Vec<Option<f32>>,
    generation: u64,
    revision: u64,
    dirty_from: Option<usize>,
}

impl MeasuredSizes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Bumped on every accepted change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn key_for(&self, index: usize) -> RowKey {
        RowKey {
            generation: self.generation,
            index,
        }
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.sizes.get(index).copied().flatten()
    }

    pub fn is_measured(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    pub fn measured_count(&self) -> usize {
        self.sizes.iter().filter(|size| size.is_some()).count()
    }

    /// Stores a measurement and returns the size it replaced, `None` when the
    /// row had never been measured.
    pub fn record(&mut self, key: RowKey, size: f32) -> Result<Option<f32>, Rejected> {
        if key.generation != self.generation {
            log::trace!(
                "dropping measurement for row {} from generation {} (now {})",
                key.index,
                key.generation,
                self.generation
            );
            return Err(Rejected::StaleGeneration);
        }
        if !size.is_finite() || size < 0.0 {
            log::warn!("ignoring invalid measurement {} for row {}", size, key.index);
            return Err(Rejected::InvalidSize);
        }
        if key.index >= self.sizes.len() {
            self.sizes.resize(key.index + 1, None);
        }
        let previous = self.sizes[key.index];
        if previous.is_some_and(|old| (old - size).abs() < SIZE_EPSILON) {
            return Err(Rejected::Unchanged);
        }
        self.sizes[key.index] = Some(size);
        self.mark_dirty(key.index);
        Ok(previous)
    }

    /// Drops sizes for rows at or past `len`.
    pub fn truncate(&mut self, len: usize) {
        if self.sizes.len() > len {
            self.sizes.truncate(len);
            self.mark_dirty(len);
        }
    }

    /// Forgets every measurement and starts a new generation.
    pub fn invalidate(&mut self) {
        self.sizes.clear();
        self.generation += 1;
        self.mark_dirty(0);
    }

    /// Returns and clears the lowest changed index.
    pub fn take_dirty_from(&mut self) -> Option<usize> {
        self.dirty_from.take()
    }

    fn mark_dirty(&mut self, index: usize) {
        self.revision += 1;
        self.dirty_from = Some(self.dirty_from.map_or(index, |from| from.min(index)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_read_back() {
        let mut sizes = MeasuredSizes::new();
        let key = sizes.key_for(3);
        assert_eq!(sizes.record(key, 120.0), Ok(None));
        assert_eq!(sizes.get(3), Some(120.0));
        assert_eq!(sizes.get(2), None);
        assert_eq!(sizes.take_dirty_from(), Some(3));
        assert_eq!(sizes.take_dirty_from(), None);
    }

    #[test]
    fn test_unchanged_size_is_not_dirty() {
        let mut sizes = MeasuredSizes::new();
        let key = sizes.key_for(0);
        let _ = sizes.record(key, 50.0);
        sizes.take_dirty_from();

        assert_eq!(sizes.record(key, 50.0005), Err(Rejected::Unchanged));
        assert_eq!(sizes.record(key, 64.0), Ok(Some(50.0)));
        sizes.take_dirty_from();
        assert_eq!(sizes.record(key, 64.0), Err(Rejected::Unchanged));
        assert_eq!(sizes.take_dirty_from(), None);
    }

    #[test]
    fn test_invalid_sizes_rejected() {
        let mut sizes = MeasuredSizes::new();
        let key = sizes.key_for(0);
        assert_eq!(sizes.record(key, f32::NAN), Err(Rejected::InvalidSize));
        assert_eq!(sizes.record(key, -4.0), Err(Rejected::InvalidSize));
        assert_eq!(sizes.record(key, f32::INFINITY), Err(Rejected::InvalidSize));
        assert_eq!(sizes.measured_count(), 0);
    }

    #[test]
    fn test_stale_generation_rejected() {
        let mut sizes = MeasuredSizes::new();
        let stale = sizes.key_for(1);
        sizes.invalidate();

        assert_eq!(sizes.record(stale, 90.0), Err(Rejected::StaleGeneration));
        assert!(!sizes.is_measured(1));
        assert_eq!(sizes.generation(), 1);
    }

    #[test]
    fn test_dirty_tracks_lowest_index() {
        let mut sizes = MeasuredSizes::new();
        let _ = sizes.record(sizes.key_for(5), 10.0);
        let _ = sizes.record(sizes.key_for(2), 10.0);
        let _ = sizes.record(sizes.key_for(7), 10.0);
        assert_eq!(sizes.take_dirty_from(), Some(2));
    }

    #[test]
    fn test_truncate_drops_tail() {
        let mut sizes = MeasuredSizes::new();
        let _ = sizes.record(sizes.key_for(4), 10.0);
        sizes.take_dirty_from();
        sizes.truncate(2);
        assert!(!sizes.is_measured(4));
        assert_eq!(sizes.take_dirty_from(), Some(2));
    }
}
