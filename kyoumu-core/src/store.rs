//! Persistence seam consumed by the engines.
//!
//! `Store` scopes a transaction, `StoreTx` is one transaction's view of the
//! data. Adapters map their native failures into `StoreError` so the engines
//! can tell a retryable conflict from a broken backend.

use thiserror::Error;

use crate::error::Error;
use crate::model::{
    Course, CourseId, Grade, GradeId, NewCourse, NewGrade, NewUser, User, UserId,
};

pub mod memory;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("storage connection failed: {message}")]
    Connection { message: String },
    #[error("storage query failed: {message}")]
    Query { message: String },
    /// Lock contention, serialization failure or unique-index violation.
    /// Safe to retry.
    #[error("storage conflict: {message}")]
    Conflict { message: String },
}

impl StoreError {
    pub fn connection(message: impl Into<String>) -> Self {
        StoreError::Connection {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        StoreError::Query {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        StoreError::Conflict {
            message: message.into(),
        }
    }
}

/// Operations available inside one transaction. Reads always reflect the
/// current state, there is no caching layer.
pub trait StoreTx {
    fn user(&mut self, id: UserId) -> Result<Option<User>, StoreError>;
    fn user_by_username(&mut self, username: &str) -> Result<Option<User>, StoreError>;
    fn insert_user(&mut self, user: &NewUser) -> Result<User, StoreError>;

    fn course(&mut self, id: CourseId) -> Result<Option<Course>, StoreError>;
    /// All courses paired with their teacher's user record.
    fn courses_with_teachers(&mut self) -> Result<Vec<(Course, User)>, StoreError>;
    fn courses_taught_by(&mut self, teacher: UserId) -> Result<Vec<Course>, StoreError>;
    fn insert_course(&mut self, course: &NewCourse) -> Result<Course, StoreError>;

    fn is_enrolled(&mut self, user: UserId, course: CourseId) -> Result<bool, StoreError>;
    fn enrolled_count(&mut self, course: CourseId) -> Result<i64, StoreError>;
    fn enrolled_course_ids(&mut self, user: UserId) -> Result<Vec<CourseId>, StoreError>;
    fn enrolled_users(&mut self, course: CourseId) -> Result<Vec<User>, StoreError>;
    fn insert_enrollment(&mut self, user: UserId, course: CourseId) -> Result<(), StoreError>;
    fn delete_enrollment(&mut self, user: UserId, course: CourseId) -> Result<(), StoreError>;

    fn grade(&mut self, course: CourseId, student: UserId) -> Result<Option<Grade>, StoreError>;
    fn grades_for_course(&mut self, course: CourseId) -> Result<Vec<Grade>, StoreError>;
    fn insert_grade(&mut self, grade: &NewGrade) -> Result<Grade, StoreError>;
    fn update_grade_score(&mut self, id: GradeId, score: i32) -> Result<Grade, StoreError>;
}

/// Transactional scoping. A returned `Err` rolls the transaction back.
pub trait Store {
    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E>;
}

pub(crate) const TX_RETRY_LIMIT: u32 = 3;

/// Re-runs a transactional operation a bounded number of times when the
/// store reports a conflict, then surfaces the conflict as-is.
pub(crate) fn run_serialized<T>(mut op: impl FnMut() -> Result<T, Error>) -> Result<T, Error> {
    let mut attempts = 0;
    loop {
        match op() {
            Err(Error::Store(StoreError::Conflict { .. })) if attempts < TX_RETRY_LIMIT => {
                attempts += 1;
            }
            other => return other,
        }
    }
}
