//! Tag repository implementation.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, info};

use jotter_core::defaults::TAG_NAME_MAX_LEN;
use jotter_core::{
    ChangeEvent, Error, EventBus, NoteTag, Result, Tag, TagChange, TagRepository,
};

use crate::log_query;

/// Validate a tag name and return it trimmed.
///
/// Rules:
/// - Surrounding whitespace is ignored
/// - Length between 1 and 100 characters
/// - No control characters
pub fn validate_tag_name(name: &str) -> std::result::Result<String, String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Tag name cannot be empty".to_string());
    }
    if trimmed.chars().count() > TAG_NAME_MAX_LEN {
        return Err(format!(
            "Tag name must be {} characters or less",
            TAG_NAME_MAX_LEN
        ));
    }
    if trimmed.chars().any(char::is_control) {
        return Err("Tag name cannot contain control characters".to_string());
    }
    Ok(trimmed.to_string())
}

fn tag_from_row(row: &sqlx::postgres::PgRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
    }
}

/// PostgreSQL implementation of TagRepository.
///
/// Association changes are published on the [`EventBus`] after commit.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
    events: EventBus,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given pool and event bus.
    pub fn new(pool: Pool<Postgres>, events: EventBus) -> Self {
        Self { pool, events }
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let row = sqlx::query("SELECT id, name FROM tag WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(tag_from_row))
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn list(&self) -> Result<Vec<Tag>> {
        let start = Instant::now();
        let rows = sqlx::query("SELECT id, name FROM tag ORDER BY name, id")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let tags: Vec<Tag> = rows.iter().map(tag_from_row).collect();
        log_query("tags", "list", start, tags.len());
        Ok(tags)
    }

    async fn create(&self, name: &str) -> Result<Tag> {
        let name = validate_tag_name(name).map_err(Error::InvalidInput)?;

        // A case-insensitive duplicate trips tag_name_lower_key.
        let row = sqlx::query("INSERT INTO tag (name) VALUES ($1) RETURNING id, name")
            .bind(&name)
            .fetch_one(&self.pool)
            .await?;

        let tag = tag_from_row(&row);
        info!(
            subsystem = "database",
            component = "tags",
            op = "create",
            tag_id = tag.id,
            "Tag created"
        );
        Ok(tag)
    }

    async fn get_or_create(&self, name: &str) -> Result<Tag> {
        let name = validate_tag_name(name).map_err(Error::InvalidInput)?;

        if let Some(tag) = self.find_by_name(&name).await? {
            debug!(
                subsystem = "database",
                component = "tags",
                op = "get_or_create",
                tag_id = tag.id,
                "Existing tag matched"
            );
            return Ok(tag);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO tag (name) VALUES ($1)
            ON CONFLICT ((LOWER(name))) DO NOTHING
            RETURNING id, name
            "#,
        )
        .bind(&name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match inserted {
            Some(row) => {
                let tag = tag_from_row(&row);
                info!(
                    subsystem = "database",
                    component = "tags",
                    op = "get_or_create",
                    tag_id = tag.id,
                    "Tag created"
                );
                Ok(tag)
            }
            // A concurrent caller inserted the same name first.
            None => self
                .find_by_name(&name)
                .await?
                .ok_or_else(|| Error::NotFound(format!("tag named {:?}", name))),
        }
    }

    async fn list_for_note(&self, note_id: i64) -> Result<Vec<Tag>> {
        let start = Instant::now();
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT t.id, t.name
            FROM tag t
            JOIN note_tag nt ON nt.tag_id = t.id
            WHERE nt.note_id = $1
            ORDER BY t.name, t.id
            "#,
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let tags: Vec<Tag> = rows.iter().map(tag_from_row).collect();
        log_query("tags", "list_for_note", start, tags.len());
        Ok(tags)
    }

    async fn associate(&self, note_id: i64, tag_id: i64) -> Result<bool> {
        let pair = NoteTag::new(note_id, tag_id);
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM note_tag WHERE note_id = $1 AND tag_id = $2)",
        )
        .bind(pair.note_id)
        .bind(pair.tag_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if exists {
            debug!(
                subsystem = "database",
                component = "tags",
                op = "associate",
                note_id,
                tag_id,
                "Association already present"
            );
            return Ok(false);
        }

        // Lock both rows so neither can be deleted before the insert lands.
        sqlx::query("SELECT id FROM note WHERE id = $1 FOR KEY SHARE")
            .bind(pair.note_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::NoteNotFound(note_id))?;

        sqlx::query("SELECT id FROM tag WHERE id = $1 FOR KEY SHARE")
            .bind(pair.tag_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::TagNotFound(tag_id))?;

        let inserted = sqlx::query(
            "INSERT INTO note_tag (note_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(pair.note_id)
        .bind(pair.tag_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        tx.commit().await.map_err(Error::Database)?;

        if inserted {
            info!(
                subsystem = "database",
                component = "tags",
                op = "associate",
                note_id,
                tag_id,
                "Tag associated with note"
            );
            self.events
                .emit(ChangeEvent::tags_changed(note_id, tag_id, TagChange::Associated));
        }
        Ok(inserted)
    }

    async fn disassociate(&self, note_id: i64, tag_id: i64) -> Result<bool> {
        let removed = sqlx::query("DELETE FROM note_tag WHERE note_id = $1 AND tag_id = $2")
            .bind(note_id)
            .bind(tag_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?
            .rows_affected()
            > 0;

        if removed {
            info!(
                subsystem = "database",
                component = "tags",
                op = "disassociate",
                note_id,
                tag_id,
                "Tag removed from note"
            );
            self.events.emit(ChangeEvent::tags_changed(
                note_id,
                tag_id,
                TagChange::Disassociated,
            ));
        }
        Ok(removed)
    }

    async fn delete(&self, tag_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let mut note_ids: Vec<i64> =
            sqlx::query_scalar("DELETE FROM note_tag WHERE tag_id = $1 RETURNING note_id")
                .bind(tag_id)
                .fetch_all(&mut *tx)
                .await?;

        // A concurrent associate can still trip the note_tag foreign key here;
        // `?` reports that as ConstraintViolation.
        let deleted = sqlx::query("DELETE FROM tag WHERE id = $1")
            .bind(tag_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        tx.commit().await.map_err(Error::Database)?;

        if deleted {
            note_ids.sort_unstable();
            info!(
                subsystem = "database",
                component = "tags",
                op = "delete",
                tag_id,
                associations = note_ids.len(),
                "Tag deleted"
            );
            self.events.emit(ChangeEvent::TagsChanged {
                note_ids,
                tag_id,
                change: TagChange::TagDeleted,
            });
        }
        Ok(deleted)
    }
}
