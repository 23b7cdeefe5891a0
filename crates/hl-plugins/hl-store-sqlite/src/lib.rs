//! # hl-store-sqlite Implementation
//!
//! SQLite used as a document store: each concept owns one table, each
//! row is one document, and the `members`/`content`/`selected`
//! sequences live inside the row as JSON arrays. There are no foreign
//! keys and no cross-table transactions on purpose — the store
//! guarantees per-document atomicity only, and the orchestration layer
//! in `hl-api` is responsible for cross-collection consistency.
//!
//! Membership and content-list mutations are single-statement UPDATEs
//! built on the JSON1 functions (add-if-absent / remove-if-present),
//! so concurrent joins/leaves or post creations against the same
//! thread cannot lose each other's writes.

mod threads;
mod posts;
mod profiles;

use hl_core::error::AppError;
use hl_core::models::ProfileQuestion;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use uuid::Uuid;

/// Implements `Threading`, `Posting`, and `Profiling` over one pool.
pub struct SqliteDocStore {
    pool: SqlitePool,
    question: ProfileQuestion,
}

// Helpers for UUID <-> TEXT mapping
fn uuid_to_text(id: Uuid) -> String {
    id.to_string()
}

fn text_to_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).unwrap_or_default()
}

fn db_err(e: sqlx::Error) -> AppError {
    AppError::Internal(e.to_string())
}

impl SqliteDocStore {
    /// Opens (or creates) the database and ensures the schema exists.
    pub async fn new(url: &str, question: ProfileQuestion) -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // An in-memory SQLite database exists per connection, so the
        // pool must stay at a single connection for `sqlite::memory:`.
        let max = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max)
            .connect_with(opts)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS threads (
                id         TEXT PRIMARY KEY,
                creator    TEXT NOT NULL,
                title      TEXT NOT NULL,
                members    TEXT NOT NULL DEFAULT '[]',
                content    TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS posts (
                id         TEXT PRIMARY KEY,
                author     TEXT NOT NULL,
                content    TEXT NOT NULL,
                thread     TEXT NOT NULL,
                options    TEXT,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS profiles (
                id       TEXT PRIMARY KEY,
                user     TEXT NOT NULL,
                question TEXT NOT NULL,
                selected TEXT NOT NULL DEFAULT '[]',
                UNIQUE (user, question)
            )",
        )
        .execute(&pool)
        .await?;

        log::info!("sqlite document store ready at {}", url);
        Ok(Self { pool, question })
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) fn question(&self) -> &ProfileQuestion {
        &self.question
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hl_core::error::AppError;
    use hl_core::traits::{Posting, Profiling, Threading};

    async fn memory_store() -> SqliteDocStore {
        SqliteDocStore::new("sqlite::memory:", ProfileQuestion::default_question())
            .await
            .expect("failed to open in-memory store")
    }

    #[tokio::test]
    async fn test_create_and_get_thread_preserves_order() {
        let store = memory_store().await;
        let creator = Uuid::now_v7();
        let posts: Vec<Uuid> = (0..3).map(|_| Uuid::now_v7()).collect();
        let members = vec![creator, Uuid::now_v7()];

        let thread = store
            .create_thread(creator, "Family reunion", &posts, &members)
            .await
            .expect("create_thread failed");

        let fetched = store.get_thread(thread.id).await.unwrap();
        assert_eq!(fetched.content, posts);
        assert_eq!(fetched.members, members);
        assert_eq!(fetched.creator, creator);
        assert_eq!(fetched.title, "Family reunion");
    }

    #[tokio::test]
    async fn test_create_thread_drops_duplicate_members() {
        let store = memory_store().await;
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());

        let thread = store
            .create_thread(Uuid::now_v7(), "t", &[], &[a, b, a])
            .await
            .unwrap();
        assert_eq!(thread.members, vec![a, b]);
        assert_eq!(store.get_thread(thread.id).await.unwrap().members, vec![a, b]);
    }

    #[tokio::test]
    async fn test_create_thread_rejects_empty_title() {
        let store = memory_store().await;
        let err = store
            .create_thread(Uuid::now_v7(), "   ", &[], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_join_is_idempotent() {
        let store = memory_store().await;
        let thread = store
            .create_thread(Uuid::now_v7(), "t", &[], &[])
            .await
            .unwrap();
        let user = Uuid::now_v7();

        store.join(thread.id, user).await.unwrap();
        store.join(thread.id, user).await.unwrap();

        let members = store.get_thread(thread.id).await.unwrap().members;
        assert_eq!(members, vec![user]);
    }

    #[tokio::test]
    async fn test_leave_absent_member_is_noop() {
        let store = memory_store().await;
        let resident = Uuid::now_v7();
        let thread = store
            .create_thread(Uuid::now_v7(), "t", &[], &[resident])
            .await
            .unwrap();

        store.leave(thread.id, Uuid::now_v7()).await.unwrap();

        let members = store.get_thread(thread.id).await.unwrap().members;
        assert_eq!(members, vec![resident]);
    }

    #[tokio::test]
    async fn test_leave_keeps_remaining_order() {
        let store = memory_store().await;
        let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let thread = store
            .create_thread(Uuid::now_v7(), "t", &[], &[a, b, c])
            .await
            .unwrap();

        store.leave(thread.id, b).await.unwrap();

        let members = store.get_thread(thread.id).await.unwrap().members;
        assert_eq!(members, vec![a, c]);
    }

    #[tokio::test]
    async fn test_remove_preserves_order_at_every_position() {
        let store = memory_store().await;
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::now_v7()).collect();
        let thread = store
            .create_thread(Uuid::now_v7(), "t", &ids, &[])
            .await
            .unwrap();

        // First element.
        store.remove_post(thread.id, ids[0]).await.unwrap();
        assert_eq!(
            store.get_thread(thread.id).await.unwrap().content,
            vec![ids[1], ids[2], ids[3]]
        );
        // Last element.
        store.remove_post(thread.id, ids[3]).await.unwrap();
        assert_eq!(
            store.get_thread(thread.id).await.unwrap().content,
            vec![ids[1], ids[2]]
        );
        // Middle element.
        store.remove_post(thread.id, ids[1]).await.unwrap();
        assert_eq!(store.get_thread(thread.id).await.unwrap().content, vec![ids[2]]);
    }

    #[tokio::test]
    async fn test_join_missing_thread_is_not_found() {
        let store = memory_store().await;
        let err = store.join(Uuid::now_v7(), Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_, _)));
    }

    #[tokio::test]
    async fn test_append_and_remove_post_refs() {
        let store = memory_store().await;
        let thread = store
            .create_thread(Uuid::now_v7(), "t", &[], &[])
            .await
            .unwrap();
        let (p1, p2) = (Uuid::now_v7(), Uuid::now_v7());

        store.append_post(thread.id, p1).await.unwrap();
        store.append_post(thread.id, p2).await.unwrap();
        // A second append of the same id must not duplicate it.
        store.append_post(thread.id, p1).await.unwrap();
        assert_eq!(store.get_thread(thread.id).await.unwrap().content, vec![p1, p2]);

        store.remove_post(thread.id, p1).await.unwrap();
        store.remove_post(thread.id, p1).await.unwrap();
        assert_eq!(store.get_thread(thread.id).await.unwrap().content, vec![p2]);
    }

    #[tokio::test]
    async fn test_assert_creator_error_taxonomy() {
        let store = memory_store().await;
        let creator = Uuid::now_v7();
        let thread = store.create_thread(creator, "t", &[], &[]).await.unwrap();

        store.assert_creator(thread.id, creator).await.unwrap();

        let err = store
            .assert_creator(thread.id, Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotAllowed(_)));

        let err = store
            .assert_creator(Uuid::now_v7(), creator)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_, _)));
    }

    #[tokio::test]
    async fn test_edit_title() {
        let store = memory_store().await;
        let thread = store
            .create_thread(Uuid::now_v7(), "before", &[], &[])
            .await
            .unwrap();

        store.edit_title(thread.id, "after").await.unwrap();
        assert_eq!(store.get_thread(thread.id).await.unwrap().title, "after");

        let err = store.edit_title(thread.id, "").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = store.edit_title(Uuid::now_v7(), "x").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_, _)));
    }

    #[tokio::test]
    async fn test_post_crud_and_partial_update() {
        let store = memory_store().await;
        let author = Uuid::now_v7();
        let thread = Uuid::now_v7();

        let post = store
            .create_post(author, "hi", thread, Some(serde_json::json!({"bold": true})))
            .await
            .unwrap();

        // Content-only update leaves options untouched.
        store.update_post(post.id, Some("edited"), None).await.unwrap();
        let fetched = store.get_post(post.id).await.unwrap();
        assert_eq!(fetched.content, "edited");
        assert_eq!(fetched.options, Some(serde_json::json!({"bold": true})));
        assert_eq!(fetched.thread, thread);

        store.delete_post(post.id).await.unwrap();
        let err = store.get_post(post.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_, _)));
        // Deleting again reports the document as already gone.
        let err = store.delete_post(post.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_, _)));
    }

    #[tokio::test]
    async fn test_assert_author() {
        let store = memory_store().await;
        let author = Uuid::now_v7();
        let post = store
            .create_post(author, "mine", Uuid::now_v7(), None)
            .await
            .unwrap();

        store.assert_author(post.id, author).await.unwrap();
        let err = store
            .assert_author(post.id, Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotAllowed(_)));
    }

    #[tokio::test]
    async fn test_posts_by_id_follows_given_order() {
        let store = memory_store().await;
        let author = Uuid::now_v7();
        let thread = Uuid::now_v7();
        let p1 = store.create_post(author, "one", thread, None).await.unwrap();
        let p2 = store.create_post(author, "two", thread, None).await.unwrap();

        let posts = store
            .posts_by_id(&[p2.id, Uuid::now_v7(), p1.id])
            .await
            .unwrap();
        let bodies: Vec<_> = posts.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(bodies, vec!["two", "one"]);
    }

    #[tokio::test]
    async fn test_profile_upsert_replaces_answer() {
        let store = memory_store().await;
        let user = Uuid::now_v7();

        let first = store
            .upsert_answer(user, &["Parent".to_string()])
            .await
            .unwrap();
        let second = store
            .upsert_answer(user, &["Cousin".to_string(), "Friend of the family".to_string()])
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        let records = store.answers_for(user).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].selected_choices,
            vec!["Cousin".to_string(), "Friend of the family".to_string()]
        );
    }

    #[tokio::test]
    async fn test_profile_rejects_unknown_choice() {
        let store = memory_store().await;
        let err = store
            .upsert_answer(Uuid::now_v7(), &["Stranger".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
