//! Note repository implementation.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Executor, Pool, Postgres, Row, Transaction};
use tracing::{field, info, instrument, Span};

use jotter_core::logging::RESULT_COUNT;
use jotter_core::{
    ChangeEvent, CreateNoteRequest, Error, EventBus, Note, NoteRepository, Result, Tag,
    TagChange, UpdateNoteRequest,
};

use crate::{escape_like, log_query};

/// One row of the note/tag join. Tag columns are null for untagged notes.
#[derive(Debug, Clone)]
pub(crate) struct NoteTagRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub is_favorite: bool,
    pub tag_id: Option<i64>,
    pub tag_name: Option<String>,
}

impl NoteTagRow {
    fn from_row(row: &PgRow) -> Self {
        Self {
            id: row.get("id"),
            title: row.get("title"),
            content: row.get("content"),
            created_at: row.get("created_at"),
            modified_at: row.get("modified_at"),
            is_favorite: row.get("is_favorite"),
            tag_id: row.get("tag_id"),
            tag_name: row.get("tag_name"),
        }
    }
}

/// Fold joined rows into notes, keeping first-seen note order.
///
/// Tags are de-duplicated by id per note, so join fan-out never yields the
/// same tag twice, then sorted by name and id.
pub(crate) fn fold_note_rows(rows: impl IntoIterator<Item = NoteTagRow>) -> Vec<Note> {
    let mut notes: Vec<Note> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();
    let mut seen_tags: HashSet<(i64, i64)> = HashSet::new();

    for row in rows {
        let pos = *index.entry(row.id).or_insert_with(|| {
            notes.push(Note {
                id: row.id,
                title: row.title.clone(),
                content: row.content.clone(),
                created_at: row.created_at,
                modified_at: row.modified_at,
                is_favorite: row.is_favorite,
                tags: Vec::new(),
            });
            notes.len() - 1
        });

        if let (Some(tag_id), Some(tag_name)) = (row.tag_id, row.tag_name) {
            if seen_tags.insert((row.id, tag_id)) {
                notes[pos].tags.push(Tag {
                    id: tag_id,
                    name: tag_name,
                });
            }
        }
    }

    for note in &mut notes {
        note.tags
            .sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    }
    notes
}

/// Reject text PostgreSQL `text` columns cannot store.
pub(crate) fn validate_note_text(field: &str, value: &str) -> Result<()> {
    if value.contains('\0') {
        return Err(Error::InvalidInput(format!(
            "{} must not contain NUL characters",
            field
        )));
    }
    Ok(())
}

/// Notes joined with their tags; callers append WHERE/ORDER BY.
const NOTE_WITH_TAGS_SELECT: &str = r#"
    SELECT
        n.id,
        n.title,
        n.content,
        n.created_at,
        n.modified_at,
        n.is_favorite,
        t.id AS tag_id,
        t.name AS tag_name
    FROM note n
    LEFT JOIN note_tag nt ON nt.note_id = n.id
    LEFT JOIN tag t ON t.id = nt.tag_id
"#;

const NOTE_WITH_TAGS_ORDER: &str = "ORDER BY n.id, t.name, t.id";

/// `modified_at` moves to the current clock time, or one microsecond past the
/// stored value when the clock has not advanced.
const UPDATE_NOTE: &str = r#"
    UPDATE note
    SET title = $2,
        content = $3,
        is_favorite = $4,
        modified_at = GREATEST(clock_timestamp(), modified_at + INTERVAL '1 microsecond')
    WHERE id = $1
    RETURNING id
"#;

const SET_FAVORITE: &str = r#"
    UPDATE note
    SET is_favorite = $2,
        modified_at = GREATEST(clock_timestamp(), modified_at + INTERVAL '1 microsecond')
    WHERE id = $1
    RETURNING id
"#;

/// Load one note with its tags through any executor (pool or transaction).
async fn load_note<'e, E>(executor: E, id: i64) -> Result<Option<Note>>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        "{} WHERE n.id = $1 {}",
        NOTE_WITH_TAGS_SELECT, NOTE_WITH_TAGS_ORDER
    );
    let rows = sqlx::query(&sql)
        .bind(id)
        .fetch_all(executor)
        .await
        .map_err(Error::Database)?;

    Ok(fold_note_rows(rows.iter().map(NoteTagRow::from_row))
        .into_iter()
        .next())
}

/// PostgreSQL implementation of NoteRepository.
///
/// Deleting a tagged note publishes one [`TagChange::NoteDeleted`] event per
/// detached tag on the [`EventBus`] after commit.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
    events: EventBus,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given pool and event bus.
    pub fn new(pool: Pool<Postgres>, events: EventBus) -> Self {
        Self { pool, events }
    }

    /// Run a note/tag join with an optional filter and a single bound parameter.
    async fn fetch_with_tags<T>(
        &self,
        op: &'static str,
        filter: &str,
        param: Option<T>,
    ) -> Result<Vec<Note>>
    where
        T: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + 'static,
    {
        let start = Instant::now();
        let sql = format!(
            "{} {} {}",
            NOTE_WITH_TAGS_SELECT, filter, NOTE_WITH_TAGS_ORDER
        );
        let mut query = sqlx::query(&sql);
        if let Some(param) = param {
            query = query.bind(param);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(Error::Database)?;

        let notes = fold_note_rows(rows.iter().map(NoteTagRow::from_row));
        log_query("notes", op, start, notes.len());
        Ok(notes)
    }

    /// Reload an updated note inside its transaction and commit.
    async fn finish_update(
        mut tx: Transaction<'_, Postgres>,
        id: i64,
        updated: Option<PgRow>,
    ) -> Result<Note> {
        if updated.is_none() {
            return Err(Error::NoteNotFound(id));
        }

        let note = load_note(&mut *tx, id)
            .await?
            .ok_or(Error::NoteNotFound(id))?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(note)
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn list_all(&self) -> Result<Vec<Note>> {
        self.fetch_with_tags::<i64>("list_all", "", None).await
    }

    async fn get(&self, id: i64) -> Result<Note> {
        let start = Instant::now();
        let note = load_note(&self.pool, id).await?;
        log_query("notes", "get", start, usize::from(note.is_some()));
        note.ok_or(Error::NoteNotFound(id))
    }

    #[instrument(skip(self), fields(
        subsystem = "database",
        component = "notes",
        op = "search",
        result_count = field::Empty,
    ))]
    async fn search(&self, term: &str) -> Result<Vec<Note>> {
        let pattern = format!("%{}%", escape_like(term));
        let notes = self
            .fetch_with_tags(
                "search",
                r"WHERE n.title LIKE $1 ESCAPE '\' OR n.content LIKE $1 ESCAPE '\'",
                Some(pattern),
            )
            .await?;
        Span::current().record(RESULT_COUNT, notes.len());
        Ok(notes)
    }

    async fn create(&self, req: CreateNoteRequest) -> Result<Note> {
        validate_note_text("title", &req.title)?;
        validate_note_text("content", &req.content)?;

        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO note (title, content, created_at, modified_at, is_favorite)
            VALUES ($1, $2, $3, $3, false)
            RETURNING id, title, content, created_at, modified_at, is_favorite
            "#,
        )
        .bind(&req.title)
        .bind(&req.content)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let note = Note {
            id: row.get("id"),
            title: row.get("title"),
            content: row.get("content"),
            created_at: row.get("created_at"),
            modified_at: row.get("modified_at"),
            is_favorite: row.get("is_favorite"),
            tags: Vec::new(),
        };

        info!(
            subsystem = "database",
            component = "notes",
            op = "create",
            note_id = note.id,
            "Note created"
        );
        Ok(note)
    }

    async fn update(&self, id: i64, req: UpdateNoteRequest) -> Result<Note> {
        validate_note_text("title", &req.title)?;
        validate_note_text("content", &req.content)?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let updated = sqlx::query(UPDATE_NOTE)
            .bind(id)
            .bind(&req.title)
            .bind(&req.content)
            .bind(req.is_favorite)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?;
        let note = Self::finish_update(tx, id, updated).await?;

        info!(
            subsystem = "database",
            component = "notes",
            op = "update",
            note_id = id,
            "Note updated"
        );
        Ok(note)
    }

    async fn set_favorite(&self, id: i64, is_favorite: bool) -> Result<Note> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let updated = sqlx::query(SET_FAVORITE)
            .bind(id)
            .bind(is_favorite)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?;
        let note = Self::finish_update(tx, id, updated).await?;

        info!(
            subsystem = "database",
            component = "notes",
            op = "set_favorite",
            note_id = id,
            is_favorite,
            "Note favorite flag set"
        );
        Ok(note)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let mut tag_ids: Vec<i64> =
            sqlx::query_scalar("DELETE FROM note_tag WHERE note_id = $1 RETURNING tag_id")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        let deleted = sqlx::query("DELETE FROM note WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        tx.commit().await.map_err(Error::Database)?;

        if deleted {
            tag_ids.sort_unstable();
            info!(
                subsystem = "database",
                component = "notes",
                op = "delete",
                note_id = id,
                associations = tag_ids.len(),
                "Note deleted"
            );
            for tag_id in tag_ids {
                self.events
                    .emit(ChangeEvent::tags_changed(id, tag_id, TagChange::NoteDeleted));
            }
        }
        Ok(deleted)
    }

    async fn list_by_tag(&self, tag_id: i64) -> Result<Vec<Note>> {
        self.fetch_with_tags(
            "list_by_tag",
            "WHERE n.id IN (SELECT note_id FROM note_tag WHERE tag_id = $1)",
            Some(tag_id),
        )
        .await
    }

    async fn list_favorites(&self) -> Result<Vec<Note>> {
        self.fetch_with_tags::<i64>("list_favorites", "WHERE n.is_favorite", None)
            .await
    }
}
