//! Rows owned by other subsystems (accounts, catalog, scheduling) that the engine joins against.
//! They are synchronised into the store through these methods.

use rusqlite::{params, OptionalExtension};
use service_core::Role;
use uuid::Uuid;

use super::SqliteStore;
use crate::domain::{Session, SessionStatus};
use crate::repository::StoreError;

impl SqliteStore {
    pub fn register_user(&self, user_id: Uuid, display_name: &str, role: Role) -> Result<(), StoreError> {
        let role: &str = role.as_ref();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users(id, display_name, role) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET display_name = excluded.display_name, role = excluded.role",
                params![user_id, display_name, role],
            )?;
            Ok(())
        })
    }

    pub fn register_subject(&self, subject_id: Uuid, name: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO subjects(id, name) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name",
                params![subject_id, name],
            )?;
            Ok(())
        })
    }

    pub fn register_level(&self, level_id: Uuid, name: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO levels(id, name) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name",
                params![level_id, name],
            )?;
            Ok(())
        })
    }

    /// Stores the session and replaces its participant set.
    pub fn register_session(&self, session: &Session) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO sessions(id, teacher_id, status) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET teacher_id = excluded.teacher_id, status = excluded.status",
                params![session.id, session.teacher_id, session.status],
            )?;
            tx.execute("DELETE FROM session_participants WHERE session_id = ?1", params![session.id])?;
            for participant in &session.participant_ids {
                tx.execute(
                    "INSERT OR IGNORE INTO session_participants(session_id, user_id) VALUES (?1, ?2)",
                    params![session.id, participant],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    pub fn set_session_status(&self, session_id: Uuid, status: SessionStatus) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute("UPDATE sessions SET status = ?1 WHERE id = ?2", params![status, session_id])?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
    }

    pub fn display_name(&self, user_id: Uuid) -> Result<String, StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT display_name FROM users WHERE id = ?1", params![user_id], |row| row.get(0))
                .optional()?
                .ok_or(StoreError::NotFound)
        })
    }
}
