//! Ordered store of the product records of the active search
//!
//! Records keep the order the server returned them in. Mutation is restricted
//! to the `model` module so that every change goes through the reconciler.

use std::collections::HashMap;

use crate::domain::{ProductId, ProductRecord};

#[derive(Debug, Clone, Default)]
pub struct ResultCache {
    records: Vec<ProductRecord>,
    index: HashMap<ProductId, usize>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn get(&self, id: ProductId) -> Option<&ProductRecord> {
        self.index.get(&id).map(|&position| &self.records[position])
    }

    pub fn contains(&self, id: ProductId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn visible(&self) -> impl Iterator<Item = &ProductRecord> {
        self.records.iter().filter(|record| record.is_available())
    }

    pub fn visible_count(&self) -> usize {
        self.visible().count()
    }

    pub(super) fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
    }

    /// Append records, skipping ids already present
    ///
    /// Returns the position of the first appended record. Duplicates can only
    /// appear when stock moved between two page requests; the first copy wins.
    pub(super) fn append(&mut self, records: Vec<ProductRecord>) -> usize {
        let start = self.records.len();
        for record in records {
            if self.index.contains_key(&record.id) {
                log::debug!("Skipping duplicate product {} in page", record.id);
                continue;
            }
            self.index.insert(record.id, self.records.len());
            self.records.push(record);
        }
        start
    }

    pub(super) fn get_mut(&mut self, id: ProductId) -> Option<&mut ProductRecord> {
        let position = *self.index.get(&id)?;
        self.records.get_mut(position)
    }

    pub(super) fn iter_mut(&mut self) -> impl Iterator<Item = &mut ProductRecord> {
        self.records.iter_mut()
    }

    pub(super) fn since(&self, start: usize) -> &[ProductRecord] {
        self.records.get(start..).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::product;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_append_keeps_server_order() {
        let mut cache = ResultCache::new();
        cache.append(vec![product(3, "A"), product(1, "A")]);
        let start = cache.append(vec![product(2, "A")]);

        let ids: Vec<_> = cache.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![ProductId(3), ProductId(1), ProductId(2)]);
        assert_eq!(start, 2);
        assert_eq!(cache.since(start).len(), 1);
    }

    #[test]
    fn test_append_skips_duplicates() {
        let mut cache = ResultCache::new();
        cache.append(vec![product(1, "A")]);
        let mut duplicate = product(1, "B");
        duplicate.name = "changed".into();
        cache.append(vec![duplicate, product(2, "A")]);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(ProductId(1)).map(|r| r.department.as_str()), Some("A"));
    }

    #[test]
    fn test_visible_excludes_sold_out() {
        let mut cache = ResultCache::new();
        let mut sold_out = product(2, "A");
        sold_out.available = 0.0;
        cache.append(vec![product(1, "A"), sold_out]);

        assert_eq!(cache.visible_count(), 1);
        assert!(cache.contains(ProductId(2)));
    }

    #[test]
    fn test_clear() {
        let mut cache = ResultCache::new();
        cache.append(vec![product(1, "A")]);
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(ProductId(1)).is_none());
    }
}
