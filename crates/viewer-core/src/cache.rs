use crate::geometry::PageGeometry;
use std::collections::{HashMap, VecDeque};

/// Least-recently-used store of page geometries for one document.
///
/// Geometry never changes for a page, so entries are only evicted for
/// capacity. Hit/miss counters are kept for diagnostics.
#[derive(Debug, Clone)]
pub struct GeometryCache {
    capacity: usize,
    entries: HashMap<u32, PageGeometry>,
    recency: VecDeque<u32>,
    hits: u64,
    misses: u64,
}

impl GeometryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            recency: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, page_index: u32) -> bool {
        self.entries.contains_key(&page_index)
    }

    pub fn get(&mut self, page_index: u32) -> Option<PageGeometry> {
        match self.entries.get(&page_index).copied() {
            Some(geometry) => {
                self.hits += 1;
                self.promote(page_index);
                Some(geometry)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, page_index: u32, geometry: PageGeometry) {
        if self.entries.insert(page_index, geometry).is_some() {
            self.promote(page_index);
            return;
        }

        self.recency.push_back(page_index);

        while self.entries.len() > self.capacity {
            let Some(oldest) = self.recency.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    fn promote(&mut self, page_index: u32) {
        if let Some(position) = self.recency.iter().position(|entry| *entry == page_index) {
            self.recency.remove(position);
            self.recency.push_back(page_index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(width: f32) -> PageGeometry {
        PageGeometry::new(width, 700.0)
    }

    #[test]
    fn evicts_least_recently_used_page() {
        let mut cache = GeometryCache::new(2);

        cache.insert(0, page(100.0));
        cache.insert(1, page(200.0));
        assert_eq!(cache.get(0), Some(page(100.0)));
        cache.insert(2, page(300.0));

        assert!(cache.contains(0));
        assert!(!cache.contains(1));
        assert!(cache.contains(2));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn counts_hits_and_misses() {
        let mut cache = GeometryCache::new(4);
        cache.insert(3, page(100.0));

        let _ = cache.get(3);
        let _ = cache.get(4);
        let _ = cache.get(3);

        assert_eq!(cache.stats(), (2, 1));
    }

    #[test]
    fn zero_capacity_still_holds_one_entry() {
        let mut cache = GeometryCache::new(0);
        cache.insert(0, page(1.0));
        cache.insert(1, page(2.0));

        assert_eq!(cache.len(), 1);
        assert!(cache.contains(1));

        cache.clear();
        assert!(cache.is_empty());
    }
}
