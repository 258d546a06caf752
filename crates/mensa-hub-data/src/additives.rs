use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::images::ImageTable;
use crate::processed::{Additive, AdditiveKind};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("additive store failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Local persistent store for additive records, keyed by name. The backend
/// serializes writes per key, so concurrent inserts of the same name still
/// leave exactly one record.
pub trait AdditiveStore: Send + Sync {
    fn exists(&self, name: &str) -> Result<bool, StoreError>;
    fn get(&self, name: &str) -> Result<Option<Additive>, StoreError>;
    /// no-op when a record with the same name already exists
    fn insert(&self, additive: &Additive) -> Result<(), StoreError>;
    fn update_like(&self, name: &str, disliked: bool) -> Result<(), StoreError>;
    fn all(&self, kind: AdditiveKind) -> Result<Vec<Additive>, StoreError>;
}

/// Maps raw component names from meal documents to stored additive records,
/// creating them on first encounter.
pub struct AdditiveResolver<'a, S> {
    store: &'a S,
    images: &'a ImageTable,
}

impl<'a, S: AdditiveStore> AdditiveResolver<'a, S> {
    pub fn new(store: &'a S, images: &'a ImageTable) -> Self {
        Self { store, images }
    }

    /// Returns the stored record for `raw_name`, creating and persisting one
    /// with default like state on first encounter. Blank names yield a
    /// transient record that is never persisted, so meal construction
    /// survives malformed source data.
    pub fn resolve(&self, raw_name: &str, kind: AdditiveKind) -> Result<Additive, StoreError> {
        let name = raw_name.trim();
        if name.is_empty() {
            return Ok(self.fresh(String::new(), kind));
        }

        if let Some(existing) = self.store.get(name)? {
            return Ok(existing);
        }

        let additive = self.fresh(name.to_string(), kind);
        self.store.insert(&additive)?;
        Ok(additive)
    }

    /// Splits on `,` and resolves every token independently, preserving
    /// order. Duplicate tokens are not deduplicated; a blank input yields an
    /// empty list.
    pub fn resolve_all(
        &self,
        raw_csv: &str,
        kind: AdditiveKind,
    ) -> Result<Vec<Additive>, StoreError> {
        if raw_csv.trim().is_empty() {
            return Ok(Vec::new());
        }

        raw_csv
            .split(',')
            .map(|token| self.resolve(token, kind))
            .collect()
    }

    fn fresh(&self, name: String, kind: AdditiveKind) -> Additive {
        Additive {
            name,
            kind,
            liked: true,
            image: self.images.default_image().to_string(),
        }
    }
}

/// In-memory additive store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Additive>>,
}

impl MemoryStore {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Additive>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Backend("memory store poisoned".into()))
    }
}

impl AdditiveStore for MemoryStore {
    fn exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.contains_key(name))
    }

    fn get(&self, name: &str) -> Result<Option<Additive>, StoreError> {
        Ok(self.lock()?.get(name).cloned())
    }

    fn insert(&self, additive: &Additive) -> Result<(), StoreError> {
        self.lock()?
            .entry(additive.name.clone())
            .or_insert_with(|| additive.clone());
        Ok(())
    }

    fn update_like(&self, name: &str, disliked: bool) -> Result<(), StoreError> {
        if let Some(record) = self.lock()?.get_mut(name) {
            record.liked = !disliked;
        }
        Ok(())
    }

    fn all(&self, kind: AdditiveKind) -> Result<Vec<Additive>, StoreError> {
        let mut records: Vec<_> = self
            .lock()?
            .values()
            .filter(|additive| additive.kind == kind)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images() -> ImageTable {
        ImageTable::new(HashMap::new(), "images/default.png")
    }

    #[test]
    fn first_encounter_creates_a_persisted_record() {
        let store = MemoryStore::default();
        let images = images();
        let resolver = AdditiveResolver::new(&store, &images);

        let additive = resolver.resolve("Gluten", AdditiveKind::Allergen).unwrap();
        assert_eq!(additive.name, "Gluten");
        assert!(additive.liked);
        assert_eq!(additive.image, "images/default.png");
        assert!(store.exists("Gluten").unwrap());
    }

    #[test]
    fn resolving_twice_yields_one_record_and_keeps_like_state() {
        let store = MemoryStore::default();
        let images = images();
        let resolver = AdditiveResolver::new(&store, &images);

        resolver.resolve("Senf", AdditiveKind::Ingredient).unwrap();
        store.update_like("Senf", true).unwrap();

        let again = resolver.resolve("Senf", AdditiveKind::Ingredient).unwrap();
        assert_eq!(again.name, "Senf");
        assert!(!again.liked);
        assert_eq!(store.all(AdditiveKind::Ingredient).unwrap().len(), 1);
    }

    #[test]
    fn names_are_trimmed_before_lookup() {
        let store = MemoryStore::default();
        let images = images();
        let resolver = AdditiveResolver::new(&store, &images);

        resolver.resolve("Soja", AdditiveKind::Allergen).unwrap();
        let trimmed = resolver.resolve("  Soja ", AdditiveKind::Allergen).unwrap();

        assert_eq!(trimmed.name, "Soja");
        assert_eq!(store.all(AdditiveKind::Allergen).unwrap().len(), 1);
    }

    #[test]
    fn blank_names_yield_transient_records() {
        let store = MemoryStore::default();
        let images = images();
        let resolver = AdditiveResolver::new(&store, &images);

        let transient = resolver.resolve("   ", AdditiveKind::Allergen).unwrap();
        assert_eq!(transient.name, "");
        assert!(transient.liked);
        assert!(store.all(AdditiveKind::Allergen).unwrap().is_empty());
    }

    #[test]
    fn resolve_all_keeps_order_and_duplicates() {
        let store = MemoryStore::default();
        let images = images();
        let resolver = AdditiveResolver::new(&store, &images);

        let resolved = resolver.resolve_all("a,b,b", AdditiveKind::Allergen).unwrap();
        let names: Vec<_> = resolved.iter().map(|a| a.name.as_str()).collect();

        assert_eq!(names, ["a", "b", "b"]);
        assert_eq!(store.all(AdditiveKind::Allergen).unwrap().len(), 2);
    }

    #[test]
    fn resolve_all_on_blank_input_is_empty() {
        let store = MemoryStore::default();
        let images = images();
        let resolver = AdditiveResolver::new(&store, &images);

        assert!(resolver.resolve_all("", AdditiveKind::Allergen).unwrap().is_empty());
        assert!(resolver.resolve_all("  ", AdditiveKind::Allergen).unwrap().is_empty());
    }
}
