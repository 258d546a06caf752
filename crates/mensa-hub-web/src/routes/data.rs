use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate};
use mensa_hub_data::{
    extract_week, fetch_with_fallback, group_menus, Additive, AdditiveKind, AdditiveResolver,
    AdditiveStore, FoodProvider, ImageTable, MealDocument, Menu, ProviderDocument, SourceKind,
};
use mongodb::{bson::doc, options::ReplaceOptions, Collection};
use tokio::sync::RwLock;

use crate::config::FeedConfig;
use crate::store::SqliteStore;

mod data;
pub use data::*;

/// The repository behind the API: wraps every document read in the
/// server/cache fallback policy and turns raw documents into domain values.
#[derive(Clone)]
pub struct CanteenRepository {
    client: reqwest::Client,
    collections: DocumentCollections,
    cache: Arc<RwLock<DocumentCache>>,
    store: SqliteStore,
    images: ImageTable,
    primary: SourceKind,
    feed: Option<FeedConfig>,
}

impl CanteenRepository {
    pub fn new(
        db: &mongodb::Database,
        store: SqliteStore,
        images: ImageTable,
        primary: SourceKind,
        feed: Option<FeedConfig>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            collections: DocumentCollections::new(db),
            cache: Arc::new(RwLock::new(DocumentCache::default())),
            store,
            images,
            primary,
            feed,
        }
    }

    pub async fn providers(
        &self,
        location: String,
        category: String,
    ) -> Result<Vec<FoodProvider>, RepoError> {
        let query = ProviderQuery { location, category };
        let documents = fetch_with_fallback(
            || self.provider_documents(self.primary, &query),
            || self.provider_documents(self.primary.complement(), &query),
        )
        .await?;

        documents
            .into_iter()
            .map(|document| {
                FoodProvider::from_document(document, &self.images).map_err(RepoError::from)
            })
            .collect()
    }

    async fn provider_documents(
        &self,
        source: SourceKind,
        query: &ProviderQuery,
    ) -> Result<Vec<ProviderDocument>, RepoError> {
        match source {
            SourceKind::Server => {
                let documents = self.collections.providers_by(query).await?;
                if !documents.is_empty() {
                    self.cache
                        .write()
                        .await
                        .put_providers(query.clone(), &documents);
                }
                Ok(documents)
            }
            SourceKind::Cache => Ok(self.cache.read().await.providers(query)),
        }
    }

    pub async fn menus(
        &self,
        provider: String,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Menu>, RepoError> {
        let query = MealQuery {
            provider,
            from_ts: day_start(from).ok_or(RepoError::InvalidRange)?.timestamp(),
            to_ts: day_end(to).ok_or(RepoError::InvalidRange)?.timestamp(),
        };
        if query.from_ts > query.to_ts {
            return Err(RepoError::InvalidRange);
        }

        let documents = fetch_with_fallback(
            || self.meal_documents(self.primary, &query),
            || self.meal_documents(self.primary.complement(), &query),
        )
        .await?;

        let resolver = AdditiveResolver::new(&self.store, &self.images);
        Ok(group_menus(documents, &resolver)?)
    }

    async fn meal_documents(
        &self,
        source: SourceKind,
        query: &MealQuery,
    ) -> Result<Vec<MealDocument>, RepoError> {
        match source {
            SourceKind::Server => {
                let documents = self.collections.meals_between(query).await?;
                if !documents.is_empty() {
                    self.cache.write().await.put_meals(query.clone(), &documents);
                }
                Ok(documents)
            }
            SourceKind::Cache => Ok(self.cache.read().await.meals(query)),
        }
    }

    pub fn additives(&self, kind: AdditiveKind) -> Result<Vec<Additive>, RepoError> {
        Ok(self.store.all(kind)?)
    }

    pub fn update_like(&self, name: &str, disliked: bool) -> Result<(), RepoError> {
        Ok(self.store.update_like(name, disliked)?)
    }

    /// Pulls the upstream feed and replaces the document collections with it.
    /// The payload is validated before any write, so a malformed feed leaves
    /// the collections untouched.
    pub async fn refresh_feed(&self) -> Result<(), RepoError> {
        let Some(feed) = &self.feed else {
            return Ok(());
        };

        let payload: FeedPayload = self.client.get(&feed.url).send().await?.json().await?;
        for provider in &payload.providers {
            extract_week(provider)?;
        }

        self.collections.replace_feed(&payload).await?;
        self.cache.write().await.clear();
        tracing::info!(
            providers = payload.providers.len(),
            meals = payload.meals.len(),
            "feed refreshed"
        );

        Ok(())
    }
}

fn day_start(date: NaiveDate) -> Option<DateTime<Local>> {
    date.and_hms_opt(0, 0, 0)?.and_local_timezone(Local).earliest()
}

fn day_end(date: NaiveDate) -> Option<DateTime<Local>> {
    date.and_hms_opt(23, 59, 59)?.and_local_timezone(Local).latest()
}

#[derive(Clone)]
pub struct DocumentCollections {
    providers: Collection<ProviderDocument>,
    meals: Collection<MealDocument>,
}

impl DocumentCollections {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            providers: db.collection("providers"),
            meals: db.collection("meals"),
        }
    }

    async fn providers_by(
        &self,
        query: &ProviderQuery,
    ) -> mongodb::error::Result<Vec<ProviderDocument>> {
        let filter = doc! {
            "location": &query.location,
            "category": &query.category,
        };

        let mut cursor = self.providers.find(filter, None).await?;
        let mut documents = Vec::new();
        while cursor.advance().await? {
            documents.push(cursor.deserialize_current()?);
        }

        Ok(documents)
    }

    async fn meals_between(
        &self,
        query: &MealQuery,
    ) -> mongodb::error::Result<Vec<MealDocument>> {
        let filter = doc! {
            "provider_id": &query.provider,
            "served_at": doc! { "$gte": query.from_ts, "$lte": query.to_ts },
        };

        let mut cursor = self.meals.find(filter, None).await?;
        let mut documents = Vec::new();
        while cursor.advance().await? {
            documents.push(cursor.deserialize_current()?);
        }

        Ok(documents)
    }

    async fn replace_feed(&self, payload: &FeedPayload) -> mongodb::error::Result<()> {
        for provider in &payload.providers {
            self.providers
                .replace_one(
                    doc! { "id": &provider.id },
                    provider,
                    ReplaceOptions::builder().upsert(true).build(),
                )
                .await?;
        }

        let ids: Vec<&str> = payload.providers.iter().map(|p| p.id.as_str()).collect();
        self.meals
            .delete_many(doc! { "provider_id": { "$in": ids } }, None)
            .await?;
        if !payload.meals.is_empty() {
            self.meals.insert_many(&payload.meals, None).await?;
        }

        Ok(())
    }
}
