
use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use chrono::{Days, NaiveDate, Weekday};
use mensa_hub_data::{Additive, AdditiveKind, FoodProvider, ImageTable, Menu};
use tokio_cron_scheduler::Job;

use crate::config::Config;
use crate::store::SqliteStore;

use self::data::{CanteenRepository, RepoError};
use std::time::Instant;

mod data;
mod helpers;
use helpers::*;

#[derive(Clone, FromRef)]
struct AppState {
    repository: CanteenRepository,
}

impl AppState {
    async fn new(config: &Config) -> anyhow::Result<Self> {
        let db = connect_db(&config.db).await?;
        let store = SqliteStore::open(&config.store.path)?;
        let images = ImageTable::new(
            config.images.entries.clone(),
            config.images.default_image.clone(),
        );

        let repository = CanteenRepository::new(
            &db,
            store,
            images,
            config.primary_source,
            config.feed.clone(),
        );

        if config.feed.is_some() {
            let repo = repository.clone();
            register_jobs(|shed| async move {
                // run every night at 00:01
                shed.add(Job::new_async("0 1 0 1/1 * ? *", move |uuid, _| {
                    let repo = repo.clone();
                    async move {
                        tracing::info!("refreshing feed (job: {uuid:?})");
                        let start = Instant::now();
                        if let Err(err) = repo.refresh_feed().await {
                            tracing::error!("feed refresh failed: {err}");
                        }
                        tracing::info!("feed refresh done (took {:?})", start.elapsed());
                    }
                    .pin()
                })?)
                .await?;

                Ok(shed)
            })
            .await;
        }

        Ok(Self { repository })
    }
}

pub async fn make_router(config: &Config) -> anyhow::Result<Router> {
    Ok(Router::new()
        .route("/api/providers", get(providers))
        .route("/api/menus", get(menus))
        .route("/api/additives", get(additives))
        .route("/api/additives/like", post(update_like))
        .with_state(AppState::new(config).await?))
}

#[derive(Default, Debug, Clone, Copy, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
enum RelativeDate {
    Yesterday,
    #[default]
    Today,
    Tomorrow,
}

#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(untagged)]
enum MenuDate {
    Relative(RelativeDate),
    Weekday(Weekday),
    Date(NaiveDate),
}

impl MenuDate {
    fn as_date(self) -> Option<NaiveDate> {
        let today = chrono::Local::now().date_naive();
        Some(match self {
            MenuDate::Relative(RelativeDate::Today) => today,
            MenuDate::Relative(RelativeDate::Yesterday) => today.pred_opt()?,
            MenuDate::Relative(RelativeDate::Tomorrow) => today.succ_opt()?,
            MenuDate::Date(d) => d,
            MenuDate::Weekday(w) => today
                .week(Weekday::Mon)
                .first_day()
                .checked_add_days(Days::new(w.num_days_from_monday() as _))?,
        })
    }
}

#[derive(Debug, serde::Deserialize)]
struct ProvidersQuery {
    location: String,
    category: String,
}

async fn providers(
    Query(q): Query<ProvidersQuery>,
    State(repository): State<CanteenRepository>,
) -> Result<Json<Vec<FoodProvider>>, (StatusCode, Json<String>)> {
    Ok(Json(
        repository
            .providers(q.location, q.category)
            .await
            .map_err(reject)?,
    ))
}

#[derive(Debug, serde::Deserialize)]
struct MenusQuery {
    provider: String,
    from: Option<MenuDate>,
    to: Option<MenuDate>,
}

async fn menus(
    Query(q): Query<MenusQuery>,
    State(repository): State<CanteenRepository>,
) -> Result<Json<Vec<Menu>>, (StatusCode, Json<String>)> {
    let from = q
        .from
        .unwrap_or(MenuDate::Relative(RelativeDate::Today))
        .as_date()
        .ok_or_else(bad_date)?;
    let to = match q.to {
        Some(to) => to.as_date().ok_or_else(bad_date)?,
        None => from.checked_add_days(Days::new(6)).ok_or_else(bad_date)?,
    };

    Ok(Json(
        repository.menus(q.provider, from, to).await.map_err(reject)?,
    ))
}

#[derive(Debug, serde::Deserialize)]
struct AdditivesQuery {
    kind: AdditiveKind,
}

async fn additives(
    Query(q): Query<AdditivesQuery>,
    State(repository): State<CanteenRepository>,
) -> Result<Json<Vec<Additive>>, (StatusCode, Json<String>)> {
    Ok(Json(repository.additives(q.kind).map_err(reject)?))
}

#[derive(Debug, serde::Deserialize)]
struct LikeBody {
    name: String,
    disliked: bool,
}

async fn update_like(
    State(repository): State<CanteenRepository>,
    Json(body): Json<LikeBody>,
) -> Result<StatusCode, (StatusCode, Json<String>)> {
    repository
        .update_like(&body.name, body.disliked)
        .map_err(reject)?;

    Ok(StatusCode::NO_CONTENT)
}

fn bad_date() -> (StatusCode, Json<String>) {
    (StatusCode::BAD_REQUEST, Json(format!("invalid_date")))
}

fn reject(err: RepoError) -> (StatusCode, Json<String>) {
    let status = match &err {
        RepoError::InvalidRange => StatusCode::BAD_REQUEST,
        RepoError::Parse(_) | RepoError::Group(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn relative_dates_resolve_around_today() {
        let today = chrono::Local::now().date_naive();

        assert_eq!(
            MenuDate::Relative(RelativeDate::Today).as_date(),
            Some(today)
        );
        assert_eq!(
            MenuDate::Relative(RelativeDate::Tomorrow).as_date(),
            today.succ_opt()
        );
        assert_eq!(
            MenuDate::Relative(RelativeDate::Yesterday).as_date(),
            today.pred_opt()
        );
    }

    #[test]
    fn weekdays_resolve_into_the_current_week() {
        let monday = MenuDate::Weekday(Weekday::Mon).as_date().unwrap();

        assert_eq!(monday.weekday(), Weekday::Mon);
        let today = chrono::Local::now().date_naive();
        assert_eq!(monday, today.week(Weekday::Mon).first_day());
    }

    #[test]
    fn explicit_dates_pass_through() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 13).unwrap();
        assert_eq!(MenuDate::Date(date).as_date(), Some(date));
    }

    #[test]
    fn query_dates_deserialize_untagged() {
        let relative: MenuDate = serde_json::from_str("\"tomorrow\"").unwrap();
        assert!(matches!(
            relative,
            MenuDate::Relative(RelativeDate::Tomorrow)
        ));

        let date: MenuDate = serde_json::from_str("\"2024-05-13\"").unwrap();
        assert!(matches!(date, MenuDate::Date(_)));
    }
}
