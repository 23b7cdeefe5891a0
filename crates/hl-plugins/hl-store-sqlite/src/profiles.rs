//! Profiling over the `profiles` table: upsert-by-(user, question).
//! Choices are validated against the one injected `ProfileQuestion`
//! before anything is written.

use async_trait::async_trait;
use hl_core::error::{AppError, Result};
use hl_core::models::ProfileRecord;
use hl_core::traits::Profiling;
use sqlx::Row;
use uuid::Uuid;

use crate::{db_err, text_to_uuid, uuid_to_text, SqliteDocStore};

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> ProfileRecord {
    ProfileRecord {
        id: text_to_uuid(&row.get::<String, _>("id")),
        user: text_to_uuid(&row.get::<String, _>("user")),
        question: row.get("question"),
        selected_choices: serde_json::from_str(&row.get::<String, _>("selected"))
            .unwrap_or_default(),
    }
}

#[async_trait]
impl Profiling for SqliteDocStore {
    async fn upsert_answer(&self, user: Uuid, selected: &[String]) -> Result<ProfileRecord> {
        for choice in selected {
            if !self.question().is_valid_choice(choice) {
                return Err(AppError::ValidationError(format!(
                    "'{}' is not a valid choice for '{}'",
                    choice,
                    self.question().prompt
                )));
            }
        }

        let prompt = self.question().prompt.clone();
        sqlx::query(
            "INSERT INTO profiles (id, user, question, selected)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (user, question) DO UPDATE SET selected = excluded.selected",
        )
        .bind(uuid_to_text(Uuid::now_v7()))
        .bind(uuid_to_text(user))
        .bind(&prompt)
        .bind(serde_json::to_string(selected)?)
        .execute(self.pool())
        .await
        .map_err(db_err)?;

        // Re-read so the returned record carries the original id on a
        // conflicting upsert.
        let row = sqlx::query("SELECT * FROM profiles WHERE user = ? AND question = ?")
            .bind(uuid_to_text(user))
            .bind(&prompt)
            .fetch_one(self.pool())
            .await
            .map_err(db_err)?;

        Ok(row_to_record(&row))
    }

    async fn answers_for(&self, user: Uuid) -> Result<Vec<ProfileRecord>> {
        let rows = sqlx::query("SELECT * FROM profiles WHERE user = ? ORDER BY question ASC")
            .bind(uuid_to_text(user))
            .fetch_all(self.pool())
            .await
            .map_err(db_err)?;

        Ok(rows.iter().map(row_to_record).collect())
    }
}
