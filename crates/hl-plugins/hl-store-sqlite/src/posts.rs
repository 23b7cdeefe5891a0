//! Posting over the `posts` table. Plain per-document CRUD; the
//! owning thread's content list is never touched from here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hl_core::error::{AppError, Result};
use hl_core::models::Post;
use hl_core::traits::Posting;
use sqlx::Row;
use uuid::Uuid;

use crate::{db_err, text_to_uuid, uuid_to_text, SqliteDocStore};

fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> Post {
    Post {
        id: text_to_uuid(&row.get::<String, _>("id")),
        author: text_to_uuid(&row.get::<String, _>("author")),
        content: row.get("content"),
        thread: text_to_uuid(&row.get::<String, _>("thread")),
        options: row
            .get::<Option<String>, _>("options")
            .and_then(|raw| serde_json::from_str(&raw).ok()),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    }
}

#[async_trait]
impl Posting for SqliteDocStore {
    async fn create_post(
        &self,
        author: Uuid,
        content: &str,
        thread: Uuid,
        options: Option<serde_json::Value>,
    ) -> Result<Post> {
        if content.trim().is_empty() {
            return Err(AppError::ValidationError("post content must not be empty".into()));
        }

        let post = Post {
            id: Uuid::now_v7(),
            author,
            content: content.to_string(),
            thread,
            options,
            created_at: Utc::now(),
        };

        let options_raw = match &post.options {
            Some(v) => Some(serde_json::to_string(v)?),
            None => None,
        };

        sqlx::query(
            "INSERT INTO posts (id, author, content, thread, options, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_text(post.id))
        .bind(uuid_to_text(post.author))
        .bind(&post.content)
        .bind(uuid_to_text(post.thread))
        .bind(options_raw)
        .bind(post.created_at)
        .execute(self.pool())
        .await
        .map_err(db_err)?;

        Ok(post)
    }

    async fn get_post(&self, id: Uuid) -> Result<Post> {
        let row = sqlx::query("SELECT * FROM posts WHERE id = ?")
            .bind(uuid_to_text(id))
            .fetch_optional(self.pool())
            .await
            .map_err(db_err)?;

        match row {
            Some(row) => Ok(row_to_post(&row)),
            None => Err(AppError::not_found("Post", id)),
        }
    }

    async fn update_post(
        &self,
        id: Uuid,
        content: Option<&str>,
        options: Option<serde_json::Value>,
    ) -> Result<()> {
        if let Some(c) = content {
            if c.trim().is_empty() {
                return Err(AppError::ValidationError("post content must not be empty".into()));
            }
        }
        let options_raw = match &options {
            Some(v) => Some(serde_json::to_string(v)?),
            None => None,
        };

        // COALESCE keeps columns whose replacement is NULL unchanged.
        let res = sqlx::query(
            "UPDATE posts
                SET content = COALESCE(?, content),
                    options = COALESCE(?, options)
              WHERE id = ?",
        )
        .bind(content)
        .bind(options_raw)
        .bind(uuid_to_text(id))
        .execute(self.pool())
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(AppError::not_found("Post", id));
        }
        Ok(())
    }

    async fn delete_post(&self, id: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(uuid_to_text(id))
            .execute(self.pool())
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(AppError::not_found("Post", id));
        }
        Ok(())
    }

    async fn assert_author(&self, id: Uuid, user: Uuid) -> Result<()> {
        let row = sqlx::query("SELECT author FROM posts WHERE id = ?")
            .bind(uuid_to_text(id))
            .fetch_optional(self.pool())
            .await
            .map_err(db_err)?;

        let author = match row {
            Some(row) => text_to_uuid(&row.get::<String, _>("author")),
            None => return Err(AppError::not_found("Post", id)),
        };
        if author != user {
            return Err(AppError::NotAllowed(
                "only the post author may perform this action".into(),
            ));
        }
        Ok(())
    }

    async fn posts_by_author(&self, author: Uuid) -> Result<Vec<Post>> {
        let rows = sqlx::query("SELECT * FROM posts WHERE author = ? ORDER BY created_at ASC")
            .bind(uuid_to_text(author))
            .fetch_all(self.pool())
            .await
            .map_err(db_err)?;

        Ok(rows.iter().map(row_to_post).collect())
    }

    async fn posts_by_id(&self, ids: &[Uuid]) -> Result<Vec<Post>> {
        // Resolved one by one to honor the caller's ordering; content
        // lists are small (no pagination anywhere in this system).
        let mut posts = Vec::with_capacity(ids.len());
        for &id in ids {
            match self.get_post(id).await {
                Ok(post) => posts.push(post),
                Err(AppError::NotFound(_, _)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(posts)
    }
}
