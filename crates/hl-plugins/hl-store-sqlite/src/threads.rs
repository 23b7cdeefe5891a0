//! Threading over the `threads` table.
//!
//! The `members` and `content` columns hold JSON arrays of id strings.
//! Every list mutation is a single UPDATE using the JSON1 functions,
//! so each one is atomic at the document level: add-if-absent for
//! joins/appends, remove-if-present for leaves/removals. Insertion
//! order is preserved and removal never reorders the remainder.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hl_core::error::{AppError, Result};
use hl_core::models::Thread;
use hl_core::traits::Threading;
use sqlx::Row;
use uuid::Uuid;

use crate::{db_err, text_to_uuid, uuid_to_text, SqliteDocStore};

/// First occurrence wins; neither `members` nor `content` may carry
/// duplicates, even when the caller supplies them.
fn dedup_preserving_order(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

fn ids_to_json(ids: &[Uuid]) -> String {
    serde_json::to_string(&ids.iter().map(|id| id.to_string()).collect::<Vec<_>>())
        .unwrap_or_else(|_| "[]".to_string())
}

fn json_to_ids(raw: &str) -> Vec<Uuid> {
    serde_json::from_str::<Vec<String>>(raw)
        .map(|v| v.iter().map(|s| text_to_uuid(s)).collect())
        .unwrap_or_default()
}

fn row_to_thread(row: &sqlx::sqlite::SqliteRow) -> Thread {
    Thread {
        id: text_to_uuid(&row.get::<String, _>("id")),
        creator: text_to_uuid(&row.get::<String, _>("creator")),
        title: row.get("title"),
        members: json_to_ids(&row.get::<String, _>("members")),
        content: json_to_ids(&row.get::<String, _>("content")),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    }
}

impl SqliteDocStore {
    /// Appends `value` to the JSON array in `column` unless it is
    /// already present. Affects zero rows when the thread is missing
    /// OR when the value was already there; `require_thread`
    /// disambiguates the two.
    async fn array_add_if_absent(&self, column: &str, id: Uuid, value: Uuid) -> Result<()> {
        let sql = format!(
            "UPDATE threads
                SET {col} = json_insert({col}, '$[#]', ?1)
              WHERE id = ?2
                AND NOT EXISTS (
                    SELECT 1 FROM json_each(threads.{col})
                     WHERE json_each.value = ?1
                )",
            col = column
        );
        let res = sqlx::query(&sql)
            .bind(uuid_to_text(value))
            .bind(uuid_to_text(id))
            .execute(self.pool())
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            self.require_thread(id).await?;
        }
        Ok(())
    }

    /// Removes `value` from the JSON array in `column` in place via
    /// `json_remove` on the matched element's path, so the remaining
    /// elements provably keep their order. When the value is absent
    /// the path subquery is NULL, `json_remove` yields NULL, and the
    /// COALESCE leaves the column untouched. A no-op rewrite still
    /// counts as an affected row, so zero rows means the thread is
    /// missing.
    async fn array_remove_if_present(&self, column: &str, id: Uuid, value: Uuid) -> Result<()> {
        let sql = format!(
            "UPDATE threads
                SET {col} = COALESCE(
                    json_remove({col},
                        (SELECT '$[' || json_each.key || ']'
                           FROM json_each(threads.{col})
                          WHERE json_each.value = ?1)),
                    {col})
              WHERE id = ?2",
            col = column
        );
        let res = sqlx::query(&sql)
            .bind(uuid_to_text(value))
            .bind(uuid_to_text(id))
            .execute(self.pool())
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(AppError::not_found("Thread", id));
        }
        Ok(())
    }

    async fn require_thread(&self, id: Uuid) -> Result<()> {
        let found = sqlx::query("SELECT 1 FROM threads WHERE id = ?")
            .bind(uuid_to_text(id))
            .fetch_optional(self.pool())
            .await
            .map_err(db_err)?;
        match found {
            Some(_) => Ok(()),
            None => Err(AppError::not_found("Thread", id)),
        }
    }
}

#[async_trait]
impl Threading for SqliteDocStore {
    async fn create_thread(
        &self,
        creator: Uuid,
        title: &str,
        initial_content: &[Uuid],
        initial_members: &[Uuid],
    ) -> Result<Thread> {
        if title.trim().is_empty() {
            return Err(AppError::ValidationError("thread title must not be empty".into()));
        }

        let thread = Thread {
            id: Uuid::now_v7(),
            creator,
            title: title.to_string(),
            members: dedup_preserving_order(initial_members),
            content: dedup_preserving_order(initial_content),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO threads (id, creator, title, members, content, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_text(thread.id))
        .bind(uuid_to_text(thread.creator))
        .bind(&thread.title)
        .bind(ids_to_json(&thread.members))
        .bind(ids_to_json(&thread.content))
        .bind(thread.created_at)
        .execute(self.pool())
        .await
        .map_err(db_err)?;

        Ok(thread)
    }

    async fn get_thread(&self, id: Uuid) -> Result<Thread> {
        let row = sqlx::query("SELECT * FROM threads WHERE id = ?")
            .bind(uuid_to_text(id))
            .fetch_optional(self.pool())
            .await
            .map_err(db_err)?;

        match row {
            Some(row) => Ok(row_to_thread(&row)),
            None => Err(AppError::not_found("Thread", id)),
        }
    }

    async fn edit_title(&self, id: Uuid, new_title: &str) -> Result<()> {
        if new_title.trim().is_empty() {
            return Err(AppError::ValidationError("thread title must not be empty".into()));
        }

        let res = sqlx::query("UPDATE threads SET title = ? WHERE id = ?")
            .bind(new_title)
            .bind(uuid_to_text(id))
            .execute(self.pool())
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(AppError::not_found("Thread", id));
        }
        Ok(())
    }

    async fn delete_thread(&self, id: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM threads WHERE id = ?")
            .bind(uuid_to_text(id))
            .execute(self.pool())
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(AppError::not_found("Thread", id));
        }
        Ok(())
    }

    async fn join(&self, id: Uuid, user: Uuid) -> Result<()> {
        self.array_add_if_absent("members", id, user).await
    }

    async fn leave(&self, id: Uuid, user: Uuid) -> Result<()> {
        self.array_remove_if_present("members", id, user).await
    }

    async fn assert_creator(&self, id: Uuid, user: Uuid) -> Result<()> {
        let row = sqlx::query("SELECT creator FROM threads WHERE id = ?")
            .bind(uuid_to_text(id))
            .fetch_optional(self.pool())
            .await
            .map_err(db_err)?;

        let creator = match row {
            Some(row) => text_to_uuid(&row.get::<String, _>("creator")),
            None => return Err(AppError::not_found("Thread", id)),
        };
        if creator != user {
            return Err(AppError::NotAllowed(
                "only the thread creator may perform this action".into(),
            ));
        }
        Ok(())
    }

    async fn append_post(&self, thread: Uuid, post: Uuid) -> Result<()> {
        self.array_add_if_absent("content", thread, post).await
    }

    async fn remove_post(&self, thread: Uuid, post: Uuid) -> Result<()> {
        self.array_remove_if_present("content", thread, post).await
    }
}
