use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, ToSql};
use uuid::Uuid;

use super::SqliteStore;
use crate::domain::{NotificationPreferences, PreferenceChange};
use crate::repository::{PreferencesRepository, StoreError};

/// Builds `UPDATE notification_preferences SET <col> = ?1, ..., updated_at = ?n WHERE user_id = ?n+1`.
///
/// Column names come from [`PreferenceColumn`](crate::domain::PreferenceColumn), never from input.
fn update_statement(changes: &[PreferenceChange]) -> String {
    let mut assignments: Vec<String> = changes
        .iter()
        .enumerate()
        .map(|(idx, change)| format!("{} = ?{}", change.column.column_name(), idx + 1))
        .collect();
    assignments.push(format!("updated_at = ?{}", changes.len() + 1));

    format!(
        "UPDATE notification_preferences SET {} WHERE user_id = ?{}",
        assignments.join(", "),
        changes.len() + 2
    )
}

#[async_trait]
impl PreferencesRepository for SqliteStore {
    async fn preferences(&self, user_id: Uuid) -> Result<Option<NotificationPreferences>, StoreError> {
        self.run(move |conn| {
            let prefs = conn
                .query_row(
                    "SELECT user_id, session_reminders, homework_alerts, payment_alerts, marketing, sms_enabled,
                        quiet_hours_start, quiet_hours_end, updated_at
                     FROM notification_preferences WHERE user_id = ?1",
                    params![user_id],
                    |row| {
                        Ok(NotificationPreferences {
                            user_id: row.get(0)?,
                            session_reminders: row.get(1)?,
                            homework_alerts: row.get(2)?,
                            payment_alerts: row.get(3)?,
                            marketing: row.get(4)?,
                            sms_enabled: row.get(5)?,
                            quiet_hours_start: row.get(6)?,
                            quiet_hours_end: row.get(7)?,
                            updated_at: row.get(8)?,
                        })
                    },
                )
                .optional()?;
            Ok(prefs)
        })
        .await
    }

    async fn ensure_preferences(&self, user_id: Uuid) -> Result<(), StoreError> {
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO notification_preferences(user_id) VALUES (?1) ON CONFLICT(user_id) DO NOTHING",
                params![user_id],
            )?;
            Ok(())
        })
        .await
    }

    async fn apply_changes(
        &self,
        user_id: Uuid,
        changes: &[PreferenceChange],
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let sql = update_statement(changes);

        let changes = changes.to_vec();
        self.run(move |conn| {
            let mut values: Vec<&dyn ToSql> = changes.iter().map(|c| &c.value as &dyn ToSql).collect();
            values.push(&updated_at);
            values.push(&user_id);

            let changed = conn.execute(&sql, values.as_slice())?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
        .await
    }
}
