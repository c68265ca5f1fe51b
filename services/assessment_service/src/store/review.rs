use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::SqliteStore;
use crate::domain::{RatingSummary, Review, ReviewView, Session, SessionStatus};
use crate::repository::{ReviewRepository, StoreError};

const REVIEW_COLUMNS: &str = "r.id, r.session_id, r.reviewer_id, r.teacher_id, r.rating, r.knowledge_rating,
    r.communication_rating, r.punctuality_rating, r.patience_rating, r.comment, r.teacher_response,
    r.responded_at, r.created_at";

const REVIEW_VIEW_FROM: &str = "reviews r
    JOIN users reviewer ON reviewer.id = r.reviewer_id
    JOIN users teacher ON teacher.id = r.teacher_id";

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        session_id: row.get(1)?,
        reviewer_id: row.get(2)?,
        teacher_id: row.get(3)?,
        rating: row.get(4)?,
        knowledge_rating: row.get(5)?,
        communication_rating: row.get(6)?,
        punctuality_rating: row.get(7)?,
        patience_rating: row.get(8)?,
        comment: row.get(9)?,
        teacher_response: row.get(10)?,
        responded_at: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn review_view_from_row(row: &Row<'_>) -> rusqlite::Result<ReviewView> {
    Ok(ReviewView {
        review: review_from_row(row)?,
        reviewer_name: row.get(13)?,
        teacher_name: row.get(14)?,
    })
}

#[async_trait]
impl ReviewRepository for SqliteStore {
    async fn session(&self, session_id: Uuid) -> Result<Session, StoreError> {
        self.run(move |conn| {
            let (teacher_id, status): (Uuid, SessionStatus) = conn
                .query_row(
                    "SELECT teacher_id, status FROM sessions WHERE id = ?1",
                    params![session_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?
                .ok_or(StoreError::NotFound)?;

            let mut stmt = conn.prepare("SELECT user_id FROM session_participants WHERE session_id = ?1")?;
            let participant_ids = stmt
                .query_map(params![session_id], |row| row.get(0))?
                .collect::<Result<Vec<Uuid>, _>>()?;

            Ok(Session {
                id: session_id,
                teacher_id,
                status,
                participant_ids,
            })
        })
        .await
    }

    async fn insert_review(&self, review: &Review) -> Result<(), StoreError> {
        let review = review.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO reviews(id, session_id, reviewer_id, teacher_id, rating, knowledge_rating,
                    communication_rating, punctuality_rating, patience_rating, comment, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    review.id,
                    review.session_id,
                    review.reviewer_id,
                    review.teacher_id,
                    review.rating,
                    review.knowledge_rating,
                    review.communication_rating,
                    review.punctuality_rating,
                    review.patience_rating,
                    review.comment,
                    review.created_at,
                ],
            )
            .map_err(super::duplicate_on_conflict)?;
            Ok(())
        })
        .await
    }

    async fn review(&self, review_id: Uuid) -> Result<Review, StoreError> {
        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM reviews r WHERE r.id = ?1", REVIEW_COLUMNS),
                params![review_id],
                review_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound)
        })
        .await
    }

    async fn review_view(&self, review_id: Uuid) -> Result<ReviewView, StoreError> {
        self.run(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {}, reviewer.display_name, teacher.display_name FROM {} WHERE r.id = ?1",
                    REVIEW_COLUMNS, REVIEW_VIEW_FROM
                ),
                params![review_id],
                review_view_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound)
        })
        .await
    }

    async fn rating_summary(&self, teacher_id: Uuid) -> Result<RatingSummary, StoreError> {
        self.run(move |conn| {
            // AVG skips NULLs, so unset sub-ratings drop out of their own average only.
            let summary = conn.query_row(
                "SELECT COUNT(*), AVG(rating), AVG(knowledge_rating), AVG(communication_rating),
                    AVG(punctuality_rating), AVG(patience_rating)
                 FROM reviews WHERE teacher_id = ?1",
                params![teacher_id],
                |row| {
                    let total: i64 = row.get(0)?;
                    Ok(RatingSummary {
                        total_reviews: total as u64,
                        average_rating: row.get(1)?,
                        average_knowledge: row.get(2)?,
                        average_communication: row.get(3)?,
                        average_punctuality: row.get(4)?,
                        average_patience: row.get(5)?,
                    })
                },
            )?;
            Ok(summary)
        })
        .await
    }

    async fn reviews_for_teacher(
        &self,
        teacher_id: Uuid,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<ReviewView>, StoreError> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {}, reviewer.display_name, teacher.display_name FROM {}
                 WHERE r.teacher_id = ?1 ORDER BY r.created_at DESC, r.rowid DESC LIMIT ?2 OFFSET ?3",
                REVIEW_COLUMNS, REVIEW_VIEW_FROM
            ))?;
            let reviews = stmt
                .query_map(params![teacher_id, limit, super::sql_offset(offset)], review_view_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(reviews)
        })
        .await
    }

    async fn set_response(&self, review_id: Uuid, response: &str, responded_at: DateTime<Utc>) -> Result<(), StoreError> {
        let response = response.to_owned();
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE reviews SET teacher_response = ?1, responded_at = ?2 WHERE id = ?3",
                params![response, responded_at, review_id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
        .await
    }
}
