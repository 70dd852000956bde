use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub type UserId = i32;
pub type CourseId = i32;
pub type GradeId = i32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Credential digest produced by the authentication layer. Stored and
    /// handed back verbatim, never interpreted here.
    pub secret_hash: String,
    pub is_admin: bool,
    pub joined_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub secret_hash: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub teacher_id: UserId,
    /// Opaque schedule label, e.g. "月 10:00" or "Tue 14:30".
    pub schedule: String,
    pub capacity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourse {
    pub name: String,
    pub teacher_id: UserId,
    pub schedule: String,
    pub capacity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub id: GradeId,
    pub course_id: CourseId,
    pub user_id: UserId,
    pub score: i32,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGrade {
    pub course_id: CourseId,
    pub user_id: UserId,
    pub score: i32,
}

/// Dashboard row: a course annotated with its live headcount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseInfo {
    pub id: CourseId,
    pub name: String,
    pub teacher: String,
    pub schedule: String,
    pub student_count: i64,
    pub capacity: i32,
}

impl CourseInfo {
    pub(crate) fn new(course: &Course, teacher: &str, student_count: i64) -> Self {
        CourseInfo {
            id: course.id,
            name: course.name.clone(),
            teacher: teacher.to_string(),
            schedule: course.schedule.clone(),
            student_count,
            capacity: course.capacity,
        }
    }
}

/// One line of a course roster: an enrolled student and their grade, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub student: User,
    pub grade: Option<Grade>,
}
