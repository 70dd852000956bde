//! SQLite-backed implementation of the core storage seam.

use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;

use kyoumu_core::model::{
    Course, CourseId, Grade, GradeId, NewCourse, NewGrade, NewUser, User, UserId,
};
use kyoumu_core::{Store, StoreError, StoreTx};

use crate::connection::SqlitePool;
use crate::models::course::{Course as CourseRow, NewCourse as NewCourseRow};
use crate::models::enrollment::{Enrollment, NewEnrollment};
use crate::models::grade::{Grade as GradeRow, NewGrade as NewGradeRow};
use crate::models::user::{NewUser as NewUserRow, User as UserRow};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteStore { pool }
    }
}

struct SqliteTx<'a> {
    conn: &'a SqliteConnection,
}

/// Carries the caller's error type through diesel's transaction plumbing,
/// which only knows how to wrap its own error.
enum TxError<E> {
    Abort(E),
    Db(DieselError),
}

impl<E> From<DieselError> for TxError<E> {
    fn from(err: DieselError) -> Self {
        TxError::Db(err)
    }
}

fn map_error(err: DieselError) -> StoreError {
    match err {
        DieselError::DatabaseError(kind, info) => match kind {
            DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::SerializationFailure => {
                StoreError::conflict(info.message())
            }
            // SQLITE_BUSY surfaces as an unclassified database error
            _ if info.message().contains("database is locked") => {
                StoreError::conflict(info.message())
            }
            _ => StoreError::query(info.message()),
        },
        other => StoreError::query(other.to_string()),
    }
}

fn optional<T>(result: QueryResult<T>) -> Result<Option<T>, StoreError> {
    result.optional().map_err(map_error)
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            secret_hash: row.secret_hash,
            is_admin: row.is_admin,
            joined_at: row.joined_at,
        }
    }
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        Course {
            id: row.id,
            name: row.name,
            teacher_id: row.teacher_id,
            schedule: row.schedule,
            capacity: row.capacity,
        }
    }
}

impl From<GradeRow> for Grade {
    fn from(row: GradeRow) -> Self {
        Grade {
            id: row.id,
            course_id: row.course_id,
            user_id: row.user_id,
            score: row.score,
            updated_at: row.updated_at,
        }
    }
}

impl Store for SqliteStore {
    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E>,
    {
        let conn = self
            .pool
            .get()
            .map_err(|err| StoreError::connection(err.to_string()))?;
        // BEGIN IMMEDIATE takes the write lock up front, so the capacity
        // check and the insert cannot interleave with another writer
        let result = conn.immediate_transaction::<T, TxError<E>, _>(|| {
            let mut tx = SqliteTx { conn: &conn };
            f(&mut tx).map_err(TxError::Abort)
        });
        match result {
            Ok(value) => Ok(value),
            Err(TxError::Abort(err)) => Err(err),
            Err(TxError::Db(err)) => Err(E::from(map_error(err))),
        }
    }
}

impl<'a> StoreTx for SqliteTx<'a> {
    fn user(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(optional(UserRow::get(id, self.conn))?.map(User::from))
    }

    fn user_by_username(&mut self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(optional(UserRow::get_by_username(username, self.conn))?.map(User::from))
    }

    fn insert_user(&mut self, user: &NewUser) -> Result<User, StoreError> {
        NewUserRow {
            username: user.username.clone(),
            secret_hash: user.secret_hash.clone(),
            is_admin: user.is_admin,
        }
        .create(self.conn)
        .map(User::from)
        .map_err(map_error)
    }

    fn course(&mut self, id: CourseId) -> Result<Option<Course>, StoreError> {
        Ok(optional(CourseRow::find(id, self.conn))?.map(Course::from))
    }

    fn courses_with_teachers(&mut self) -> Result<Vec<(Course, User)>, StoreError> {
        CourseRow::list_with_teachers(self.conn)
            .map(|rows| {
                rows.into_iter()
                    .map(|(course, teacher)| (course.into(), teacher.into()))
                    .collect()
            })
            .map_err(map_error)
    }

    fn courses_taught_by(&mut self, teacher: UserId) -> Result<Vec<Course>, StoreError> {
        CourseRow::taught_by(teacher, self.conn)
            .map(|rows| rows.into_iter().map(Course::from).collect())
            .map_err(map_error)
    }

    fn insert_course(&mut self, course: &NewCourse) -> Result<Course, StoreError> {
        NewCourseRow {
            name: course.name.clone(),
            teacher_id: course.teacher_id,
            schedule: course.schedule.clone(),
            capacity: course.capacity,
        }
        .create(self.conn)
        .map(Course::from)
        .map_err(map_error)
    }

    fn is_enrolled(&mut self, user: UserId, course: CourseId) -> Result<bool, StoreError> {
        Enrollment::exists(user, course, self.conn).map_err(map_error)
    }

    fn enrolled_count(&mut self, course: CourseId) -> Result<i64, StoreError> {
        Enrollment::count_for_course(course, self.conn).map_err(map_error)
    }

    fn enrolled_course_ids(&mut self, user: UserId) -> Result<Vec<CourseId>, StoreError> {
        Enrollment::course_ids_for_user(user, self.conn).map_err(map_error)
    }

    fn enrolled_users(&mut self, course: CourseId) -> Result<Vec<User>, StoreError> {
        Enrollment::students_of_course(course, self.conn)
            .map(|rows| rows.into_iter().map(User::from).collect())
            .map_err(map_error)
    }

    fn insert_enrollment(&mut self, user: UserId, course: CourseId) -> Result<(), StoreError> {
        NewEnrollment {
            user_id: user,
            course_id: course,
        }
        .create(self.conn)
        .map(|_| ())
        .map_err(map_error)
    }

    fn delete_enrollment(&mut self, user: UserId, course: CourseId) -> Result<(), StoreError> {
        Enrollment::delete(user, course, self.conn)
            .map(|_| ())
            .map_err(map_error)
    }

    fn grade(&mut self, course: CourseId, student: UserId) -> Result<Option<Grade>, StoreError> {
        Ok(optional(GradeRow::find_for(course, student, self.conn))?.map(Grade::from))
    }

    fn grades_for_course(&mut self, course: CourseId) -> Result<Vec<Grade>, StoreError> {
        GradeRow::for_course(course, self.conn)
            .map(|rows| rows.into_iter().map(Grade::from).collect())
            .map_err(map_error)
    }

    fn insert_grade(&mut self, grade: &NewGrade) -> Result<Grade, StoreError> {
        NewGradeRow {
            course_id: grade.course_id,
            user_id: grade.user_id,
            score: grade.score,
        }
        .create(self.conn)
        .map(Grade::from)
        .map_err(map_error)
    }

    fn update_grade_score(&mut self, id: GradeId, score: i32) -> Result<Grade, StoreError> {
        let row = GradeRow::find(id, self.conn).map_err(map_error)?;
        row.update_score(score, self.conn)
            .map(Grade::from)
            .map_err(map_error)
    }
}
