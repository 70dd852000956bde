//! In-memory store. Backs the test suites and mirrors the relational
//! schema's constraints (unique username, unique edges, one grade per
//! (course, student) pair) so the engines see the same failure modes as
//! against SQLite.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

use super::{Store, StoreError, StoreTx};
use crate::model::{
    Course, CourseId, Grade, GradeId, NewCourse, NewGrade, NewUser, User, UserId,
};

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Default, Clone)]
struct Inner {
    users: HashMap<UserId, User>,
    courses: HashMap<CourseId, Course>,
    enrollments: Vec<(UserId, CourseId)>,
    grades: HashMap<GradeId, Grade>,
    next_user_id: UserId,
    next_course_id: CourseId,
    next_grade_id: GradeId,
}

struct MemoryTx<'a> {
    inner: &'a mut Inner,
}

impl Store for MemoryStore {
    // The mutex serializes transactions, which is what gives the capacity
    // check-then-insert its atomicity here.
    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E>,
    {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| E::from(StoreError::connection("store mutex poisoned")))?;
        let snapshot = inner.clone();
        let mut tx = MemoryTx { inner: &mut inner };
        match f(&mut tx) {
            Ok(value) => Ok(value),
            Err(err) => {
                *inner = snapshot;
                Err(err)
            }
        }
    }
}

impl<'a> StoreTx for MemoryTx<'a> {
    fn user(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.inner.users.get(&id).cloned())
    }

    fn user_by_username(&mut self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .inner
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    fn insert_user(&mut self, user: &NewUser) -> Result<User, StoreError> {
        if self
            .inner
            .users
            .values()
            .any(|existing| existing.username == user.username)
        {
            return Err(StoreError::conflict(format!(
                "username {:?} already exists",
                user.username
            )));
        }
        self.inner.next_user_id += 1;
        let user = User {
            id: self.inner.next_user_id,
            username: user.username.clone(),
            secret_hash: user.secret_hash.clone(),
            is_admin: user.is_admin,
            joined_at: Utc::now().naive_utc(),
        };
        self.inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn course(&mut self, id: CourseId) -> Result<Option<Course>, StoreError> {
        Ok(self.inner.courses.get(&id).cloned())
    }

    fn courses_with_teachers(&mut self) -> Result<Vec<(Course, User)>, StoreError> {
        let mut rows = Vec::with_capacity(self.inner.courses.len());
        for course in self.inner.courses.values() {
            let teacher = self.inner.users.get(&course.teacher_id).ok_or_else(|| {
                StoreError::query(format!(
                    "teacher {} missing for course {}",
                    course.teacher_id, course.id
                ))
            })?;
            rows.push((course.clone(), teacher.clone()));
        }
        rows.sort_by_key(|(course, _)| course.id);
        Ok(rows)
    }

    fn courses_taught_by(&mut self, teacher: UserId) -> Result<Vec<Course>, StoreError> {
        let mut courses: Vec<Course> = self
            .inner
            .courses
            .values()
            .filter(|course| course.teacher_id == teacher)
            .cloned()
            .collect();
        courses.sort_by_key(|course| course.id);
        Ok(courses)
    }

    fn insert_course(&mut self, course: &NewCourse) -> Result<Course, StoreError> {
        if course.capacity < 0 {
            return Err(StoreError::query("course capacity must be non-negative"));
        }
        self.inner.next_course_id += 1;
        let course = Course {
            id: self.inner.next_course_id,
            name: course.name.clone(),
            teacher_id: course.teacher_id,
            schedule: course.schedule.clone(),
            capacity: course.capacity,
        };
        self.inner.courses.insert(course.id, course.clone());
        Ok(course)
    }

    fn is_enrolled(&mut self, user: UserId, course: CourseId) -> Result<bool, StoreError> {
        Ok(self.inner.enrollments.contains(&(user, course)))
    }

    fn enrolled_count(&mut self, course: CourseId) -> Result<i64, StoreError> {
        Ok(self
            .inner
            .enrollments
            .iter()
            .filter(|(_, cid)| *cid == course)
            .count() as i64)
    }

    fn enrolled_course_ids(&mut self, user: UserId) -> Result<Vec<CourseId>, StoreError> {
        Ok(self
            .inner
            .enrollments
            .iter()
            .filter(|(uid, _)| *uid == user)
            .map(|(_, cid)| *cid)
            .collect())
    }

    fn enrolled_users(&mut self, course: CourseId) -> Result<Vec<User>, StoreError> {
        let mut students: Vec<User> = self
            .inner
            .enrollments
            .iter()
            .filter(|(_, cid)| *cid == course)
            .filter_map(|(uid, _)| self.inner.users.get(uid).cloned())
            .collect();
        students.sort_by_key(|student| student.id);
        Ok(students)
    }

    fn insert_enrollment(&mut self, user: UserId, course: CourseId) -> Result<(), StoreError> {
        if self.inner.enrollments.contains(&(user, course)) {
            return Err(StoreError::conflict(format!(
                "user {} already enrolled in course {}",
                user, course
            )));
        }
        self.inner.enrollments.push((user, course));
        Ok(())
    }

    fn delete_enrollment(&mut self, user: UserId, course: CourseId) -> Result<(), StoreError> {
        self.inner
            .enrollments
            .retain(|edge| *edge != (user, course));
        Ok(())
    }

    fn grade(&mut self, course: CourseId, student: UserId) -> Result<Option<Grade>, StoreError> {
        Ok(self
            .inner
            .grades
            .values()
            .find(|grade| grade.course_id == course && grade.user_id == student)
            .cloned())
    }

    fn grades_for_course(&mut self, course: CourseId) -> Result<Vec<Grade>, StoreError> {
        let mut grades: Vec<Grade> = self
            .inner
            .grades
            .values()
            .filter(|grade| grade.course_id == course)
            .cloned()
            .collect();
        grades.sort_by_key(|grade| grade.user_id);
        Ok(grades)
    }

    fn insert_grade(&mut self, grade: &NewGrade) -> Result<Grade, StoreError> {
        if self
            .inner
            .grades
            .values()
            .any(|existing| existing.course_id == grade.course_id && existing.user_id == grade.user_id)
        {
            return Err(StoreError::conflict(format!(
                "grade for course {} and user {} already exists",
                grade.course_id, grade.user_id
            )));
        }
        self.inner.next_grade_id += 1;
        let grade = Grade {
            id: self.inner.next_grade_id,
            course_id: grade.course_id,
            user_id: grade.user_id,
            score: grade.score,
            updated_at: Utc::now().naive_utc(),
        };
        self.inner.grades.insert(grade.id, grade.clone());
        Ok(grade)
    }

    fn update_grade_score(&mut self, id: GradeId, score: i32) -> Result<Grade, StoreError> {
        let grade = self
            .inner
            .grades
            .get_mut(&id)
            .ok_or_else(|| StoreError::query(format!("grade {} does not exist", id)))?;
        grade.score = score;
        grade.updated_at = Utc::now().naive_utc();
        Ok(grade.clone())
    }
}
