use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

pub const DB_FILE: &str = "rosterd.sqlite3";

pub const STUDENTS_KEY: &str = "students";
pub const CLASSES_KEY: &str = "classes";
pub const FEE_ENTRIES_KEY: &str = "fee_entries";

/// Workspace-scoped persistence handle. Every collection lives as one whole
/// JSON array blob under a fixed key; mutations are read-modify-write of the
/// full array, last writer wins.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(workspace)
            .with_context(|| format!("failed to create workspace {}", workspace.display()))?;
        let conn = Connection::open(workspace.join(DB_FILE))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> anyhow::Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS collections(
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Store { conn })
    }

    /// Whole-collection read. A key that was never written reads as an empty
    /// collection; an unparseable blob is logged and discarded the same way.
    pub fn load_collection<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Vec<T>> {
        let blob: Option<String> = self
            .conn
            .query_row("SELECT value FROM collections WHERE key = ?", [key], |r| {
                r.get(0)
            })
            .optional()?;
        let Some(blob) = blob else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&blob) {
            Ok(items) => Ok(items),
            Err(e) => {
                eprintln!("rosterd: discarding corrupt collection {key:?}: {e}");
                Ok(Vec::new())
            }
        }
    }

    /// Whole-collection overwrite.
    pub fn save_collection<T: Serialize>(&self, key: &str, items: &[T]) -> anyhow::Result<()> {
        let blob = serde_json::to_string(items)
            .with_context(|| format!("failed to serialize collection {key}"))?;
        self.conn.execute(
            "INSERT INTO collections(key, value) VALUES(?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            (key, &blob),
        )?;
        Ok(())
    }
}

/// Shallow field merge used by every update operation: keys present in the
/// patch replace the stored value, explicit nulls clear optional fields,
/// everything else is carried over unchanged.
pub fn merge_record<T>(existing: &T, patch: &serde_json::Value) -> anyhow::Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut base = serde_json::to_value(existing)?;
    let patch_map = patch.as_object().context("patch must be a JSON object")?;
    let base_map = base
        .as_object_mut()
        .context("record did not serialize to an object")?;
    for (key, value) in patch_map {
        if value.is_null() {
            base_map.remove(key);
        } else {
            base_map.insert(key.clone(), value.clone());
        }
    }
    serde_json::from_value(base).context("patch produced an invalid record")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: String,
        label: Option<String>,
    }

    #[test]
    fn unwritten_key_reads_empty() {
        let store = Store::open_in_memory().expect("open store");
        let rows: Vec<Row> = store.load_collection("never_written").expect("load");
        assert!(rows.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = Store::open_in_memory().expect("open store");
        let rows = vec![
            Row {
                id: "a1".into(),
                label: Some("first".into()),
            },
            Row {
                id: "b2".into(),
                label: None,
            },
        ];
        store.save_collection("rows", &rows).expect("save");
        let loaded: Vec<Row> = store.load_collection("rows").expect("load");
        assert_eq!(loaded, rows);
    }

    #[test]
    fn save_overwrites_previous_blob() {
        let store = Store::open_in_memory().expect("open store");
        store
            .save_collection("rows", &[Row { id: "a1".into(), label: None }])
            .expect("save");
        store.save_collection::<Row>("rows", &[]).expect("save empty");
        let loaded: Vec<Row> = store.load_collection("rows").expect("load");
        assert!(loaded.is_empty());
    }

    #[test]
    fn corrupt_blob_reads_empty() {
        let store = Store::open_in_memory().expect("open store");
        store
            .conn
            .execute(
                "INSERT INTO collections(key, value) VALUES('rows', 'not json {')",
                [],
            )
            .expect("inject blob");
        let rows: Vec<Row> = store.load_collection("rows").expect("load");
        assert!(rows.is_empty());
    }

    #[test]
    fn merge_overwrites_and_clears_fields() {
        let row = Row {
            id: "a1".into(),
            label: Some("old".into()),
        };
        let merged: Row =
            merge_record(&row, &serde_json::json!({ "label": "new" })).expect("merge");
        assert_eq!(merged.label.as_deref(), Some("new"));

        let cleared: Row =
            merge_record(&row, &serde_json::json!({ "label": null })).expect("merge");
        assert_eq!(cleared.label, None);
    }

    #[test]
    fn merge_rejects_non_object_patch() {
        let row = Row {
            id: "a1".into(),
            label: None,
        };
        assert!(merge_record(&row, &serde_json::json!([1, 2])).is_err());
    }
}
