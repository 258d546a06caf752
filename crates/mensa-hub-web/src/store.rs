use std::path::{Path, PathBuf};

use mensa_hub_data::{Additive, AdditiveKind, AdditiveStore, StoreError};
use rusqlite::{params, Connection, OptionalExtension};

/// Sqlite-backed additive store. The `name` primary key plus `insert or
/// ignore` give the at-most-one-record-per-name invariant even under
/// concurrent writers.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };

        let conn = store.conn()?;
        conn.prepare(
            "create table if not exists additives (
                name text not null primary key,
                kind text not null,
                liked integer not null,
                image text not null
            )",
        )?
        .execute([])?;

        Ok(store)
    }

    fn conn(&self) -> rusqlite::Result<Connection> {
        Connection::open(&self.path)
    }
}

fn row_to_additive(row: &rusqlite::Row<'_>) -> rusqlite::Result<Additive> {
    let kind: String = row.get(1)?;
    let kind = AdditiveKind::parse(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("unknown additive kind `{kind}`").into(),
        )
    })?;

    Ok(Additive {
        name: row.get(0)?,
        kind,
        liked: row.get(2)?,
        image: row.get(3)?,
    })
}

impl AdditiveStore for SqliteStore {
    fn exists(&self, name: &str) -> Result<bool, StoreError> {
        let conn = self.conn().map_err(StoreError::backend)?;
        let mut stmt = conn
            .prepare_cached("select 1 from additives where name = ?1")
            .map_err(StoreError::backend)?;

        stmt.exists(params![name]).map_err(StoreError::backend)
    }

    fn get(&self, name: &str) -> Result<Option<Additive>, StoreError> {
        let conn = self.conn().map_err(StoreError::backend)?;
        let mut stmt = conn
            .prepare_cached("select name, kind, liked, image from additives where name = ?1")
            .map_err(StoreError::backend)?;

        stmt.query_row(params![name], row_to_additive)
            .optional()
            .map_err(StoreError::backend)
    }

    fn insert(&self, additive: &Additive) -> Result<(), StoreError> {
        let conn = self.conn().map_err(StoreError::backend)?;
        // `or ignore`: an existing record and its like state win
        let mut stmt = conn
            .prepare_cached(
                "insert or ignore into additives (name, kind, liked, image)
                    values (?1, ?2, ?3, ?4)",
            )
            .map_err(StoreError::backend)?;

        stmt.execute(params![
            additive.name,
            additive.kind.as_str(),
            additive.liked,
            additive.image
        ])
        .map_err(StoreError::backend)?;

        Ok(())
    }

    fn update_like(&self, name: &str, disliked: bool) -> Result<(), StoreError> {
        let conn = self.conn().map_err(StoreError::backend)?;
        let mut stmt = conn
            .prepare_cached("update additives set liked = ?2 where name = ?1")
            .map_err(StoreError::backend)?;

        stmt.execute(params![name, !disliked])
            .map_err(StoreError::backend)?;

        Ok(())
    }

    fn all(&self, kind: AdditiveKind) -> Result<Vec<Additive>, StoreError> {
        let conn = self.conn().map_err(StoreError::backend)?;
        let mut stmt = conn
            .prepare_cached(
                "select name, kind, liked, image from additives where kind = ?1 order by name",
            )
            .map_err(StoreError::backend)?;

        let rows = stmt
            .query_map(params![kind.as_str()], row_to_additive)
            .map_err(StoreError::backend)?;

        let mut additives = Vec::new();
        for additive in rows {
            additives.push(additive.map_err(StoreError::backend)?);
        }

        Ok(additives)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(tag: &str) -> SqliteStore {
        let path = std::env::temp_dir().join(format!(
            "mensa-hub-{tag}-{}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        SqliteStore::open(path).unwrap()
    }

    fn additive(name: &str, kind: AdditiveKind) -> Additive {
        Additive {
            name: name.into(),
            kind,
            liked: true,
            image: "images/default.png".into(),
        }
    }

    #[test]
    fn inserted_records_round_trip() {
        let store = temp_store("roundtrip");

        store
            .insert(&additive("Gluten", AdditiveKind::Allergen))
            .unwrap();

        assert!(store.exists("Gluten").unwrap());
        let stored = store.get("Gluten").unwrap().unwrap();
        assert_eq!(stored.name, "Gluten");
        assert_eq!(stored.kind, AdditiveKind::Allergen);
        assert!(stored.liked);
        assert!(store.get("Milch").unwrap().is_none());
    }

    #[test]
    fn reinserting_keeps_the_existing_like_state() {
        let store = temp_store("reinsert");

        store
            .insert(&additive("Senf", AdditiveKind::Ingredient))
            .unwrap();
        store.update_like("Senf", true).unwrap();
        store
            .insert(&additive("Senf", AdditiveKind::Ingredient))
            .unwrap();

        assert!(!store.get("Senf").unwrap().unwrap().liked);
        assert_eq!(store.all(AdditiveKind::Ingredient).unwrap().len(), 1);
    }

    #[test]
    fn all_filters_by_kind_and_sorts_by_name() {
        let store = temp_store("all");

        store
            .insert(&additive("Milch", AdditiveKind::Allergen))
            .unwrap();
        store
            .insert(&additive("Gluten", AdditiveKind::Allergen))
            .unwrap();
        store
            .insert(&additive("Senf", AdditiveKind::Ingredient))
            .unwrap();

        let allergens = store.all(AdditiveKind::Allergen).unwrap();
        let names: Vec<_> = allergens.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Gluten", "Milch"]);
    }
}
