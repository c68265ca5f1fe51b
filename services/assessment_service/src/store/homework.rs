use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::{json_column, SqliteStore};
use crate::domain::{AssignmentStatus, Grade, Homework, HomeworkView, Submission, SubmissionView};
use crate::repository::{HomeworkRepository, StoreError};

const HOMEWORK_VIEW_COLUMNS: &str = "h.id, h.teacher_id, h.title, h.description, h.instructions, h.subject_id,
    h.level_id, h.deadline, h.allow_late, h.late_penalty_percent, h.created_at,
    t.display_name, s.name, l.name";

const HOMEWORK_VIEW_FROM: &str = "homework h
    JOIN users t ON t.id = h.teacher_id
    LEFT JOIN subjects s ON s.id = h.subject_id
    LEFT JOIN levels l ON l.id = h.level_id";

const SUBMISSION_VIEW_SELECT: &str = "SELECT sub.id, sub.homework_id, sub.student_id, sub.content, sub.file_refs,
        sub.is_late, sub.submitted_at, sub.grade, sub.max_grade, sub.feedback, sub.graded_at,
        u.display_name, h.late_penalty_percent
    FROM homework_submissions sub
    JOIN users u ON u.id = sub.student_id
    JOIN homework h ON h.id = sub.homework_id";

fn homework_from_row(row: &Row<'_>) -> rusqlite::Result<Homework> {
    Ok(Homework {
        id: row.get(0)?,
        teacher_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        instructions: row.get(4)?,
        subject_id: row.get(5)?,
        level_id: row.get(6)?,
        deadline: row.get(7)?,
        allow_late: row.get(8)?,
        late_penalty_percent: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn homework_view_from_row(row: &Row<'_>) -> rusqlite::Result<HomeworkView> {
    Ok(HomeworkView {
        homework: homework_from_row(row)?,
        teacher_name: row.get(11)?,
        subject_name: row.get(12)?,
        level_name: row.get(13)?,
        assignment_status: None,
    })
}

fn submission_from_row(row: &Row<'_>) -> rusqlite::Result<Submission> {
    Ok(Submission {
        id: row.get(0)?,
        homework_id: row.get(1)?,
        student_id: row.get(2)?,
        content: row.get(3)?,
        file_refs: json_column(row, 4)?,
        is_late: row.get(5)?,
        submitted_at: row.get(6)?,
        grade: row.get(7)?,
        max_grade: row.get(8)?,
        feedback: row.get(9)?,
        graded_at: row.get(10)?,
    })
}

#[async_trait]
impl HomeworkRepository for SqliteStore {
    async fn insert_homework(&self, homework: &Homework) -> Result<(), StoreError> {
        let homework = homework.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO homework(id, teacher_id, title, description, instructions, subject_id, level_id,
                    deadline, allow_late, late_penalty_percent, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    homework.id,
                    homework.teacher_id,
                    homework.title,
                    homework.description,
                    homework.instructions,
                    homework.subject_id,
                    homework.level_id,
                    homework.deadline,
                    homework.allow_late,
                    homework.late_penalty_percent,
                    homework.created_at,
                ],
            )
            .map_err(super::duplicate_on_conflict)?;
            Ok(())
        })
        .await
    }

    async fn assign(&self, homework_id: Uuid, student_id: Uuid) -> Result<bool, StoreError> {
        self.run(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO homework_assignments(homework_id, student_id, status, assigned_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![homework_id, student_id, AssignmentStatus::Assigned, Utc::now()],
            )?;
            Ok(inserted == 1)
        })
        .await
    }

    async fn homework(&self, homework_id: Uuid) -> Result<Homework, StoreError> {
        self.run(move |conn| {
            conn.query_row(
                "SELECT id, teacher_id, title, description, instructions, subject_id, level_id, deadline,
                    allow_late, late_penalty_percent, created_at
                 FROM homework WHERE id = ?1",
                params![homework_id],
                homework_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound)
        })
        .await
    }

    async fn homework_view(&self, homework_id: Uuid) -> Result<HomeworkView, StoreError> {
        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM {} WHERE h.id = ?1", HOMEWORK_VIEW_COLUMNS, HOMEWORK_VIEW_FROM),
                params![homework_id],
                homework_view_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound)
        })
        .await
    }

    async fn assignment_status(
        &self,
        homework_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<AssignmentStatus>, StoreError> {
        self.run(move |conn| {
            let status = conn
                .query_row(
                    "SELECT status FROM homework_assignments WHERE homework_id = ?1 AND student_id = ?2",
                    params![homework_id, student_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(status)
        })
        .await
    }

    async fn homework_by_teacher(
        &self,
        teacher_id: Uuid,
        limit: u32,
        offset: u64,
    ) -> Result<(Vec<HomeworkView>, u64), StoreError> {
        self.run(move |conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM homework WHERE teacher_id = ?1",
                params![teacher_id],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM {} WHERE h.teacher_id = ?1
                 ORDER BY h.created_at DESC, h.rowid DESC LIMIT ?2 OFFSET ?3",
                HOMEWORK_VIEW_COLUMNS, HOMEWORK_VIEW_FROM
            ))?;
            let items = stmt
                .query_map(params![teacher_id, limit, super::sql_offset(offset)], homework_view_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok((items, total as u64))
        })
        .await
    }

    async fn homework_for_student(
        &self,
        student_id: Uuid,
        limit: u32,
        offset: u64,
    ) -> Result<(Vec<HomeworkView>, u64), StoreError> {
        self.run(move |conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM homework_assignments WHERE student_id = ?1",
                params![student_id],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "SELECT {}, a.status FROM {} JOIN homework_assignments a ON a.homework_id = h.id
                 WHERE a.student_id = ?1 ORDER BY h.created_at DESC, h.rowid DESC LIMIT ?2 OFFSET ?3",
                HOMEWORK_VIEW_COLUMNS, HOMEWORK_VIEW_FROM
            ))?;
            let views = stmt
                .query_map(params![student_id, limit, super::sql_offset(offset)], |row| {
                    let mut view = homework_view_from_row(row)?;
                    view.assignment_status = Some(row.get(14)?);
                    Ok(view)
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok((views, total as u64))
        })
        .await
    }

    async fn record_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        let file_refs = serde_json::to_string(&submission.file_refs)?;

        let submission = submission.clone();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO homework_submissions(id, homework_id, student_id, content, file_refs, is_late,
                    submitted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    submission.id,
                    submission.homework_id,
                    submission.student_id,
                    submission.content,
                    file_refs,
                    submission.is_late,
                    submission.submitted_at,
                ],
            )
            .map_err(super::duplicate_on_conflict)?;
            tx.execute(
                "UPDATE homework_assignments SET status = ?1
                 WHERE homework_id = ?2 AND student_id = ?3 AND status = ?4",
                params![
                    AssignmentStatus::Submitted,
                    submission.homework_id,
                    submission.student_id,
                    AssignmentStatus::Assigned,
                ],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn submission(&self, submission_id: Uuid) -> Result<Submission, StoreError> {
        self.run(move |conn| {
            conn.query_row(
                "SELECT id, homework_id, student_id, content, file_refs, is_late, submitted_at, grade, max_grade,
                    feedback, graded_at
                 FROM homework_submissions WHERE id = ?1",
                params![submission_id],
                submission_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound)
        })
        .await
    }

    async fn grade_submission(&self, submission_id: Uuid, grade: &Grade) -> Result<(), StoreError> {
        let grade = grade.clone();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            let (homework_id, student_id): (Uuid, Uuid) = tx
                .query_row(
                    "SELECT homework_id, student_id FROM homework_submissions WHERE id = ?1",
                    params![submission_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?
                .ok_or(StoreError::NotFound)?;

            tx.execute(
                "UPDATE homework_submissions SET grade = ?1, max_grade = ?2, feedback = ?3, graded_at = ?4
                 WHERE id = ?5",
                params![grade.grade, grade.max_grade, grade.feedback, grade.graded_at, submission_id],
            )?;
            tx.execute(
                "UPDATE homework_assignments SET status = ?1 WHERE homework_id = ?2 AND student_id = ?3",
                params![AssignmentStatus::Graded, homework_id, student_id],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn submissions(&self, homework_id: Uuid, student_id: Option<Uuid>) -> Result<Vec<SubmissionView>, StoreError> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE sub.homework_id = ?1 AND (?2 IS NULL OR sub.student_id = ?2)
                 ORDER BY sub.submitted_at, sub.rowid",
                SUBMISSION_VIEW_SELECT
            ))?;
            let views = stmt
                .query_map(params![homework_id, student_id], |row| {
                    let submission = submission_from_row(row)?;
                    let late_penalty_percent: u8 = row.get(12)?;
                    Ok(SubmissionView::new(submission, row.get(11)?, late_penalty_percent))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(views)
        })
        .await
    }
}
