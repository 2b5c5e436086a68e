//! Compressed index+check action tables.
//!
//! Rows of a sparse action matrix are overlaid in one `table` array. Each
//! row has a base offset; the entry for `key` lives at `base + key`, and the
//! parallel `check` array records which key owns that slot so overlapping
//! rows cannot alias each other. A base of zero marks an empty row.

/// Value type used by generated tables.
pub type TableValue = i32;

/// A borrowed, compressed table.
#[derive(Debug, Clone, Copy)]
pub struct CompressedTable<'t> {
    table: &'t [TableValue],
    check: &'t [TableValue],
    /// Highest valid slot index.
    size: usize,
}

impl<'t> CompressedTable<'t> {
    /// Wrap a table and its check array. Slots above `size` are never read.
    pub fn new(table: &'t [TableValue], check: &'t [TableValue], size: TableValue) -> Self {
        let limit = table.len().min(check.len()).saturating_sub(1);
        let size = usize::try_from(size).map_or(0, |size| size.min(limit));
        Self { table, check, size }
    }

    /// Look up `key` in the row starting at `base`.
    #[inline]
    pub fn probe(&self, base: TableValue, key: TableValue) -> Option<TableValue> {
        if base == 0 {
            return None;
        }

        let index = usize::try_from(i64::from(base) + i64::from(key)).ok()?;
        if index > self.size || self.check.get(index) != Some(&key) {
            return None;
        }

        self.table.get(index).copied()
    }
}
