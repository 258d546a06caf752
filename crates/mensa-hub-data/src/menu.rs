use std::collections::BTreeMap;

use chrono::{DateTime, Local, Utc};

use crate::additives::{AdditiveResolver, AdditiveStore, StoreError};
use crate::processed::{AdditiveKind, Meal, Menu, ParseError, Role};
use crate::raw::MealDocument;

#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Groups a fetched batch of meal documents into per-date menus, sorted by
/// date. Meals keep their arrival order within a date. The first malformed
/// record fails the whole batch.
pub fn group_menus<S: AdditiveStore>(
    documents: Vec<MealDocument>,
    resolver: &AdditiveResolver<'_, S>,
) -> Result<Vec<Menu>, GroupError> {
    let mut buckets: BTreeMap<_, Vec<Meal>> = BTreeMap::new();
    for document in documents {
        let served = DateTime::<Utc>::from_timestamp(document.served_at, 0)
            .ok_or(ParseError::InvalidTimestamp(document.served_at))?;
        let date = served.with_timezone(&Local).date_naive();

        buckets
            .entry(date)
            .or_default()
            .push(build_meal(document, resolver)?);
    }

    Ok(buckets
        .into_iter()
        .map(|(date, meals)| Menu { date, meals })
        .collect())
}

fn build_meal<S: AdditiveStore>(
    document: MealDocument,
    resolver: &AdditiveResolver<'_, S>,
) -> Result<Meal, GroupError> {
    let mut additives = resolver.resolve_all(
        document.allergens.as_deref().unwrap_or(""),
        AdditiveKind::Allergen,
    )?;
    additives.extend(resolver.resolve_all(
        document.ingredients.as_deref().unwrap_or(""),
        AdditiveKind::Ingredient,
    )?);

    let mut prices = BTreeMap::new();
    prices.insert(
        Role::Student,
        document
            .price_student
            .ok_or(ParseError::MissingField("price_student"))?,
    );
    prices.insert(
        Role::Employee,
        document
            .price_employee
            .ok_or(ParseError::MissingField("price_employee"))?,
    );
    prices.insert(
        Role::Guest,
        document
            .price_guest
            .ok_or(ParseError::MissingField("price_guest"))?,
    );

    Ok(Meal {
        name: document.name,
        additives,
        prices,
    })
}
