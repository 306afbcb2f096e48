use std::collections::BTreeMap;

/// Master id → release year, as resolved from `/masters/{id}`.
///
/// A present key is final for the run, including a cached `None`
/// ("looked up, no year"), so failed lookups are not repeated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterYearCache {
    entries: BTreeMap<String, Option<i32>>,
    dirty: bool,
}

impl MasterYearCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap entries loaded from disk; the result starts clean
    pub fn from_entries(entries: BTreeMap<String, Option<i32>>) -> Self {
        Self { entries, dirty: false }
    }

    pub fn key(master_id: i64) -> String {
        master_id.to_string()
    }

    /// `Some(year)` on a hit (year may itself be `None`), `None` on a miss
    pub fn get(&self, master_id: i64) -> Option<Option<i32>> {
        self.entries.get(&Self::key(master_id)).copied()
    }

    pub fn contains(&self, master_id: i64) -> bool {
        self.entries.contains_key(&Self::key(master_id))
    }

    pub fn insert(&mut self, master_id: i64, year: Option<i32>) {
        self.entries.insert(Self::key(master_id), year);
        self.dirty = true;
    }

    pub fn entries(&self) -> &BTreeMap<String, Option<i32>> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of masters known to have no year
    pub fn unresolved_count(&self) -> usize {
        self.entries.values().filter(|year| year.is_none()).count()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
