//! # Core Traits (Ports)
//!
//! Each concept owns exactly one document collection and exposes its
//! operations here. Any plugin must implement these traits to be used
//! by the binary. Concepts never call each other; composing them is
//! the job of the orchestration layer in `hl-api`.

use async_trait::async_trait;
use crate::error::Result;
use crate::models::{Post, ProfileRecord, Thread, User};
use uuid::Uuid;

/// Thread ownership: creator, title, ordered member list, ordered
/// content (post id) list.
#[async_trait]
pub trait Threading: Send + Sync {
    /// Creates a thread from copies of the supplied sequences. The
    /// caller's slices never alias the stored ones, and duplicate ids
    /// in either sequence are dropped (first occurrence wins). Empty
    /// titles are rejected with `ValidationError`.
    async fn create_thread(
        &self,
        creator: Uuid,
        title: &str,
        initial_content: &[Uuid],
        initial_members: &[Uuid],
    ) -> Result<Thread>;

    async fn get_thread(&self, id: Uuid) -> Result<Thread>;

    /// Replaces the title. Callers must have already verified creator
    /// identity via [`Threading::assert_creator`].
    async fn edit_title(&self, id: Uuid, new_title: &str) -> Result<()>;

    /// Removes the thread document only. Cascading deletion of the
    /// posts it references belongs to the orchestration layer, because
    /// Threading has no knowledge of Posting.
    async fn delete_thread(&self, id: Uuid) -> Result<()>;

    /// Appends `user` to `members` if not already present. Joining
    /// twice has no additional effect.
    async fn join(&self, id: Uuid, user: Uuid) -> Result<()>;

    /// Removes `user` from `members`. Leaving when absent is a no-op,
    /// not an error.
    async fn leave(&self, id: Uuid, user: Uuid) -> Result<()>;

    /// The sole authorization primitive for creator-restricted
    /// mutations: `NotFound` if the thread is missing, `NotAllowed` if
    /// `user` is not the creator.
    async fn assert_creator(&self, id: Uuid, user: Uuid) -> Result<()>;

    /// Idempotent append to the `content` list. Internal maintenance
    /// operation, invoked only by the orchestration layer.
    async fn append_post(&self, thread: Uuid, post: Uuid) -> Result<()>;

    /// Idempotent removal from the `content` list; remaining entries
    /// keep their order. Internal maintenance operation.
    async fn remove_post(&self, thread: Uuid, post: Uuid) -> Result<()>;
}

/// Post ownership: author, body, options bucket, owning-thread
/// back-reference. Creating or deleting a post does NOT touch the
/// thread's content list; the orchestration layer keeps the two sides
/// consistent.
#[async_trait]
pub trait Posting: Send + Sync {
    async fn create_post(
        &self,
        author: Uuid,
        content: &str,
        thread: Uuid,
        options: Option<serde_json::Value>,
    ) -> Result<Post>;

    async fn get_post(&self, id: Uuid) -> Result<Post>;

    /// Partial update: fields passed as `None` are left unchanged.
    async fn update_post(
        &self,
        id: Uuid,
        content: Option<&str>,
        options: Option<serde_json::Value>,
    ) -> Result<()>;

    async fn delete_post(&self, id: Uuid) -> Result<()>;

    /// `NotFound` if the post is missing, `NotAllowed` if `user` is
    /// not the author.
    async fn assert_author(&self, id: Uuid, user: Uuid) -> Result<()>;

    async fn posts_by_author(&self, author: Uuid) -> Result<Vec<Post>>;

    /// Resolves ids in the order given, silently skipping ids with no
    /// document. Used to render a thread timeline from `content`.
    async fn posts_by_id(&self, ids: &[Uuid]) -> Result<Vec<Post>>;
}

/// Per-(user, question) answer storage with upsert semantics. Choice
/// validation happens against the injected [`crate::ProfileQuestion`].
#[async_trait]
pub trait Profiling: Send + Sync {
    /// Inserts or replaces the user's answer to the configured
    /// question. Unknown choices fail with `ValidationError`.
    async fn upsert_answer(&self, user: Uuid, selected: &[String]) -> Result<ProfileRecord>;

    async fn answers_for(&self, user: Uuid) -> Result<Vec<ProfileRecord>>;
}

/// Identity collaborator. Password material stays behind this trait.
#[async_trait]
pub trait Authing: Send + Sync {
    /// `Conflict` on duplicate username, `ValidationError` on empty
    /// username or password.
    async fn create(&self, username: &str, password: &str) -> Result<User>;

    /// `Unauthorized` on unknown username or bad password.
    async fn authenticate(&self, username: &str, password: &str) -> Result<User>;

    async fn user_by_id(&self, id: Uuid) -> Result<User>;
    async fn user_by_username(&self, username: &str) -> Result<User>;
}

/// Session lifecycle against an opaque token.
#[async_trait]
pub trait Sessioning: Send + Sync {
    async fn start(&self, user: Uuid) -> Result<Uuid>;

    /// Ending an already-ended session is a no-op.
    async fn end(&self, token: Uuid) -> Result<()>;

    /// `Unauthorized` if the token does not map to a live session.
    async fn user_for(&self, token: Uuid) -> Result<Uuid>;

    async fn is_logged_out(&self, token: Uuid) -> bool;
}
