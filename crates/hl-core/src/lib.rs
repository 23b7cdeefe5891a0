//! hearthline/crates/hl-core/src/lib.rs
//!
//! The central domain models and interface definitions for Hearthline.

pub mod models;
pub mod traits;
pub mod error;

// Re-exporting for easier access in other crates
pub use models::*;
pub use traits::*;
pub use error::*;


#[cfg(test)]
mod tests {
    use super::models::*;
    use uuid::Uuid;

    #[test]
    fn test_post_creation_v7() {
        let id = Uuid::now_v7();
        let post = Post {
            id,
            author: Uuid::now_v7(),
            content: "Hello from the reunion!".to_string(),
            thread: Uuid::now_v7(),
            options: Some(serde_json::json!({ "bold": true })),
            created_at: chrono::Utc::now(),
        };
        assert_eq!(post.id, id);
        assert!(post.options.is_some());
    }

    #[test]
    fn test_document_id_field_name() {
        // The persisted shape is the contract: ids serialize as `_id`.
        let thread = Thread {
            id: Uuid::now_v7(),
            creator: Uuid::now_v7(),
            title: "Family reunion".to_string(),
            members: vec![],
            content: vec![],
            created_at: chrono::Utc::now(),
        };
        let v = serde_json::to_value(&thread).unwrap();
        assert!(v.get("_id").is_some());
        assert!(v.get("id").is_none());
    }

    #[test]
    fn test_profile_question_choice_validation() {
        let q = ProfileQuestion::default_question();
        assert!(q.is_valid_choice("Cousin"));
        assert!(!q.is_valid_choice("Acquaintance"));
    }
}
