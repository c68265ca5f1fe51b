use std::convert::TryFrom;

use chrono::{DateTime, Duration, Utc};
use rstest::fixture;
use serde_json::json;
use service_core::{Claims, Principal, Role};
use uuid::Uuid;

use crate::domain::{Question, Session, SessionStatus};
use crate::store::SqliteStore;

pub(crate) fn principal(user_id: Uuid, role: Role) -> Principal {
    let role: &str = role.as_ref();
    Principal::try_from(Claims {
        sub: user_id.to_string(),
        role: role.to_owned(),
        display_name: None,
    })
    .unwrap()
}

/// An in-memory store seeded with a small class.
pub(crate) struct World {
    pub store: SqliteStore,
    pub teacher: Principal,
    pub other_teacher: Principal,
    pub student: Principal,
    pub classmate: Principal,
    pub parent: Principal,
    pub subject_id: Uuid,
    pub level_id: Uuid,
}

impl World {
    pub fn new() -> Self {
        let store = SqliteStore::open_in_memory().unwrap();

        let register = |name: &str, role: Role| {
            let id = Uuid::new_v4();
            store.register_user(id, name, role).unwrap();
            principal(id, role)
        };
        let teacher = register("Jennifer Honey", Role::Teacher);
        let other_teacher = register("Agatha Trunchbull", Role::Teacher);
        let student = register("Matilda Wormwood", Role::Student);
        let classmate = register("Lavender Brown", Role::Student);
        let parent = register("Harry Wormwood", Role::Parent);

        let subject_id = Uuid::new_v4();
        let level_id = Uuid::new_v4();
        store.register_subject(subject_id, "Mathematics").unwrap();
        store.register_level(level_id, "Year 3").unwrap();

        World {
            store,
            teacher,
            other_teacher,
            student,
            classmate,
            parent,
            subject_id,
            level_id,
        }
    }

    /// Registers a session taught by `teacher` with the student and the parent attending.
    pub fn session(&self, status: SessionStatus) -> Session {
        let session = Session {
            id: Uuid::new_v4(),
            teacher_id: self.teacher.user_id(),
            status,
            participant_ids: vec![self.student.user_id(), self.parent.user_id()],
        };
        self.store.register_session(&session).unwrap();
        session
    }
}

#[fixture]
pub(crate) fn world() -> World {
    World::new()
}

/// Three questions: two auto-gradable, one essay.
pub(crate) fn questions() -> Vec<Question> {
    serde_json::from_value(json!([
        {"type": "multiple_choice", "prompt": "Pick B", "options": ["A", "B", "C"], "correct_answer": "B"},
        {"type": "essay", "prompt": "Describe your summer."},
        {"type": "short_answer", "prompt": "2 + 2", "correct_answer": "4"}
    ]))
    .unwrap()
}

pub(crate) fn hours_from_now(hours: i64) -> DateTime<Utc> {
    Utc::now() + Duration::hours(hours)
}
