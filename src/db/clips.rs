use super::DbError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

const CLIP_COLUMNS: &str = "id, external_id, source, url, embed_url, edit_url, broadcaster_login,
    creator_login, created_by_user_id, title, duration, view_count, thumbnail_url, extra,
    created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clip {
    pub id: i64,
    pub external_id: String,
    pub source: String,
    pub url: String,
    pub embed_url: Option<String>,
    pub edit_url: Option<String>,
    pub broadcaster_login: String,
    pub creator_login: Option<String>,
    pub created_by_user_id: Option<String>,
    pub title: Option<String>,
    pub duration: Option<i64>,
    pub view_count: i64,
    pub thumbnail_url: Option<String>,
    /// Raw JSON text as stored; use `get_extra` to read it.
    #[serde(serialize_with = "serialize_extra")]
    pub extra: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn serialize_extra<S: Serializer>(extra: &str, serializer: S) -> Result<S::Ok, S::Error> {
    parse_extra(extra).serialize(serializer)
}

/// Empty or malformed text reads as `{}`.
pub fn parse_extra(extra: &str) -> Value {
    if extra.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(extra).unwrap_or_else(|_| json!({}))
}

impl Clip {
    pub fn get_extra(&self) -> Value {
        parse_extra(&self.extra)
    }

    pub fn set_extra(&mut self, data: &Value) {
        self.extra = serde_json::to_string(data).unwrap_or_else(|_| "{}".to_string());
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            external_id: row.get(1)?,
            source: row.get(2)?,
            url: row.get(3)?,
            embed_url: row.get(4)?,
            edit_url: row.get(5)?,
            broadcaster_login: row.get(6)?,
            creator_login: row.get(7)?,
            created_by_user_id: row.get(8)?,
            title: row.get(9)?,
            duration: row.get(10)?,
            view_count: row.get(11)?,
            thumbnail_url: row.get(12)?,
            extra: row.get(13)?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }
}

fn default_source() -> String {
    "twitch".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewClip {
    pub external_id: String,
    #[serde(default = "default_source")]
    pub source: String,
    pub url: String,
    #[serde(default)]
    pub embed_url: Option<String>,
    #[serde(default)]
    pub edit_url: Option<String>,
    pub broadcaster_login: String,
    #[serde(default)]
    pub creator_login: Option<String>,
    #[serde(default)]
    pub created_by_user_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub extra: Option<Value>,
}

/// Inserts a clip, or refreshes it when `external_id` is already known.
pub fn upsert_clip(conn: &Connection, new: &NewClip) -> Result<Clip, DbError> {
    let now = Utc::now();
    let extra = new
        .extra
        .as_ref()
        .and_then(|v| serde_json::to_string(v).ok())
        .unwrap_or_else(|| "{}".to_string());
    conn.execute(
        "INSERT INTO clips (external_id, source, url, embed_url, edit_url, broadcaster_login,
            creator_login, created_by_user_id, title, duration, view_count, thumbnail_url, extra,
            created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)
         ON CONFLICT(external_id) DO UPDATE SET
            source = excluded.source,
            url = excluded.url,
            embed_url = excluded.embed_url,
            edit_url = excluded.edit_url,
            broadcaster_login = excluded.broadcaster_login,
            creator_login = excluded.creator_login,
            created_by_user_id = excluded.created_by_user_id,
            title = excluded.title,
            duration = excluded.duration,
            view_count = excluded.view_count,
            thumbnail_url = excluded.thumbnail_url,
            extra = excluded.extra,
            updated_at = excluded.updated_at",
        params![
            new.external_id,
            new.source,
            new.url,
            new.embed_url,
            new.edit_url,
            new.broadcaster_login,
            new.creator_login,
            new.created_by_user_id,
            new.title,
            new.duration,
            new.view_count,
            new.thumbnail_url,
            extra,
            now,
        ],
    )?;
    get_clip_by_external_id(conn, &new.external_id)?.ok_or(DbError::Sqlite(
        rusqlite::Error::QueryReturnedNoRows,
    ))
}

pub fn get_clip_by_external_id(conn: &Connection, external_id: &str) -> Result<Option<Clip>, DbError> {
    let sql = format!("SELECT {CLIP_COLUMNS} FROM clips WHERE external_id = ?1");
    let clip = conn
        .query_row(&sql, [external_id], Clip::from_row)
        .optional()?;
    Ok(clip)
}

/// Newest first.
pub fn get_clips_for_broadcaster(
    conn: &Connection,
    broadcaster_login: &str,
    limit: u32,
) -> Result<Vec<Clip>, DbError> {
    let sql = format!(
        "SELECT {CLIP_COLUMNS} FROM clips WHERE broadcaster_login = ?1 COLLATE NOCASE
         ORDER BY created_at DESC, id DESC LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let clips = stmt
        .query_map(params![broadcaster_login, limit], Clip::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(clips)
}

pub fn get_recent_clips(conn: &Connection, limit: u32) -> Result<Vec<Clip>, DbError> {
    let sql = format!("SELECT {CLIP_COLUMNS} FROM clips ORDER BY created_at DESC, id DESC LIMIT ?1");
    let mut stmt = conn.prepare(&sql)?;
    let clips = stmt
        .query_map([limit], Clip::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(clips)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn new_clip(external_id: &str, broadcaster: &str) -> NewClip {
        NewClip {
            external_id: external_id.to_string(),
            source: default_source(),
            url: format!("https://clips.twitch.tv/{external_id}"),
            embed_url: None,
            edit_url: None,
            broadcaster_login: broadcaster.to_string(),
            creator_login: Some("viewer42".to_string()),
            created_by_user_id: None,
            title: Some("clutch".to_string()),
            duration: Some(30),
            view_count: 12,
            thumbnail_url: None,
            extra: Some(json!({"game": "Apex Legends"})),
        }
    }

    #[test]
    fn test_parse_extra_is_defensive() {
        assert_eq!(parse_extra(""), json!({}));
        assert_eq!(parse_extra("{not json"), json!({}));
        assert_eq!(parse_extra(r#"{"a": 1}"#), json!({"a": 1}));
    }

    #[test]
    fn test_upsert_and_read_back() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let clip = upsert_clip(conn, &new_clip("AbcClip", "shroud"))?;
            assert_eq!(clip.source, "twitch");
            assert_eq!(clip.get_extra(), json!({"game": "Apex Legends"}));

            let mut changed = new_clip("AbcClip", "shroud");
            changed.view_count = 99;
            let again = upsert_clip(conn, &changed)?;
            assert_eq!(again.id, clip.id);
            assert_eq!(again.view_count, 99);
            assert_eq!(again.created_at, clip.created_at);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_clips_for_broadcaster() {
        let db = Database::open_in_memory().unwrap();
        let clips = db
            .with_conn(|conn| {
                upsert_clip(conn, &new_clip("one", "shroud"))?;
                upsert_clip(conn, &new_clip("two", "Shroud"))?;
                upsert_clip(conn, &new_clip("three", "naughty"))?;
                get_clips_for_broadcaster(conn, "shroud", 10)
            })
            .unwrap();
        let ids: Vec<&str> = clips.iter().map(|c| c.external_id.as_str()).collect();
        assert_eq!(ids, vec!["two", "one"]);
    }

    #[test]
    fn test_malformed_extra_serializes_as_empty_object() {
        let db = Database::open_in_memory().unwrap();
        let clip = db
            .with_conn(|conn| {
                upsert_clip(conn, &new_clip("bad", "shroud"))?;
                conn.execute("UPDATE clips SET extra = 'oops' WHERE external_id = 'bad'", [])?;
                Ok(get_clip_by_external_id(conn, "bad")?)
            })
            .unwrap()
            .unwrap();
        assert_eq!(clip.get_extra(), json!({}));
        let as_json = serde_json::to_value(&clip).unwrap();
        assert_eq!(as_json["extra"], json!({}));
    }

    #[test]
    fn test_set_extra() {
        let db = Database::open_in_memory().unwrap();
        let mut clip = db
            .with_conn(|conn| upsert_clip(conn, &new_clip("x", "shroud")))
            .unwrap();
        clip.set_extra(&json!({"pinned": true}));
        assert_eq!(clip.extra, r#"{"pinned":true}"#);
        assert_eq!(clip.get_extra(), json!({"pinned": true}));
    }
}
