//! # Domain Models
//!
//! These structs represent the core entities of Hearthline.
//! We use UUID v7 for time-ordered, globally unique identification.
//!
//! Serialized id fields are named `_id` because the persisted document
//! shape is the external contract (`{_id, creator, title, members,
//! content}` and friends).

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// An ordered collection of posts with a member list and a creator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Immutable after creation; the only user allowed to edit or delete.
    pub creator: Uuid,
    pub title: String,
    /// Ordered, duplicate-free membership list. Set semantics, sequence
    /// representation for deterministic ordering.
    pub members: Vec<Uuid>,
    /// The canonical thread timeline: ordered post ids, append-only on
    /// post creation, entries removed on post deletion.
    pub content: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// The fundamental unit of conversation. Belongs to exactly one thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Immutable after creation.
    pub author: Uuid,
    pub content: String,
    /// Back-reference to the owning thread; immutable once created.
    pub thread: Uuid,
    /// Open JSON bucket for structured formatting/metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// A user's answer to the profile question, keyed by `(user, question)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: Uuid,
    pub question: String,
    #[serde(rename = "selectedChoices")]
    pub selected_choices: Vec<String>,
}

/// Public user shape. Credentials never leave the auth plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
}

/// The single owned configuration object for profiling: one enumerated
/// question and its valid choices, injected wherever answers are
/// validated or persisted so the constants live in exactly one place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileQuestion {
    pub prompt: String,
    pub choices: Vec<String>,
}

impl ProfileQuestion {
    /// The question set Hearthline ships with.
    pub fn default_question() -> Self {
        Self {
            prompt: "How are you related to this family?".to_string(),
            choices: vec![
                "Parent".to_string(),
                "Child".to_string(),
                "Sibling".to_string(),
                "Cousin".to_string(),
                "Grandparent".to_string(),
                "Friend of the family".to_string(),
            ],
        }
    }

    pub fn is_valid_choice(&self, choice: &str) -> bool {
        self.choices.iter().any(|c| c == choice)
    }
}
