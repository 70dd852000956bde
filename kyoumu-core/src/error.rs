use thiserror::Error;

use crate::model::{CourseId, UserId};
use crate::store::StoreError;

/// Everything an engine call can fail with. All variants are expected,
/// recoverable conditions for the caller to render; none is fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("course {0} does not exist")]
    CourseNotFound(CourseId),
    #[error("student {0} does not exist")]
    StudentNotFound(UserId),
    #[error("already enrolled in course {course_id}")]
    AlreadyEnrolled { course_id: CourseId },
    #[error("not enrolled in course {course_id}")]
    NotEnrolled { course_id: CourseId },
    #[error("course {course_id} is already at full capacity ({capacity})")]
    CourseFull { course_id: CourseId, capacity: i32 },
    #[error("grade {score} is outside the accepted range 0..=100")]
    InvalidGrade { score: i32 },
    #[error("operation requires the course teacher or an admin")]
    Forbidden,
    #[error("username {username:?} is already taken")]
    UsernameTaken { username: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}
