
use std::collections::HashMap;

use mensa_hub_data::{GroupError, MealDocument, ParseError, ProviderDocument, StoreError};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] mongodb::error::Error),
    #[error(transparent)]
    Feed(#[from] reqwest::Error),
    #[error(transparent)]
    Group(#[from] GroupError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid date range")]
    InvalidRange,
}

/// upstream payload replacing the document collections on refresh
#[derive(Debug, Deserialize)]
pub struct FeedPayload {
    pub providers: Vec<ProviderDocument>,
    pub meals: Vec<MealDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderQuery {
    pub location: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MealQuery {
    pub provider: String,
    pub from_ts: i64,
    pub to_ts: i64,
}

/// Per-query write-through cache of raw documents, the `cache` side of the
/// source-fallback policy.
#[derive(Debug, Default)]
pub struct DocumentCache {
    providers: HashMap<ProviderQuery, Vec<ProviderDocument>>,
    meals: HashMap<MealQuery, Vec<MealDocument>>,
}

impl DocumentCache {
    pub fn providers(&self, query: &ProviderQuery) -> Vec<ProviderDocument> {
        self.providers.get(query).cloned().unwrap_or_default()
    }

    pub fn put_providers(&mut self, query: ProviderQuery, documents: &[ProviderDocument]) {
        self.providers.insert(query, documents.to_vec());
    }

    pub fn meals(&self, query: &MealQuery) -> Vec<MealDocument> {
        self.meals.get(query).cloned().unwrap_or_default()
    }

    pub fn put_meals(&mut self, query: MealQuery, documents: &[MealDocument]) {
        self.meals.insert(query, documents.to_vec());
    }

    pub fn clear(&mut self) {
        self.providers.clear();
        self.meals.clear();
    }
}
