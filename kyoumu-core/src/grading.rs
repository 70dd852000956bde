//! Grading engine: per-course rosters and grade upserts.
//!
//! Authorization lives here, not at the call sites: only the course's
//! teacher or an admin may view a roster or record grades.

use tracing::info;

use crate::error::Error;
use crate::identity::Identity;
use crate::model::{Course, CourseId, Grade, NewGrade, RosterEntry, UserId};
use crate::store::{run_serialized, Store, StoreTx};

pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 100;

fn authorize(actor: &Identity, course: &Course) -> Result<(), Error> {
    if actor.is_admin || course.teacher_id == actor.id {
        Ok(())
    } else {
        Err(Error::Forbidden)
    }
}

/// The enrolled students of a course, each with their grade if one exists.
pub fn roster<S: Store>(
    store: &S,
    actor: &Identity,
    course_id: CourseId,
) -> Result<Vec<RosterEntry>, Error> {
    store.transaction(|tx| {
        let course = tx
            .course(course_id)?
            .ok_or(Error::CourseNotFound(course_id))?;
        authorize(actor, &course)?;
        let grades = tx.grades_for_course(course_id)?;
        let entries = tx
            .enrolled_users(course_id)?
            .into_iter()
            .map(|student| {
                let grade = grades.iter().find(|g| g.user_id == student.id).cloned();
                RosterEntry { student, grade }
            })
            .collect();
        Ok(entries)
    })
}

/// Records a score for (course, student), updating the existing grade row in
/// place when there is one. Keyed on the pair, never on the grade id, so two
/// submissions for the same student end up in a single row.
pub fn upsert_grade<S: Store>(
    store: &S,
    actor: &Identity,
    course_id: CourseId,
    student_id: UserId,
    score: i32,
) -> Result<Grade, Error> {
    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(Error::InvalidGrade { score });
    }
    let grade = run_serialized(|| {
        store.transaction(|tx| {
            let course = tx
                .course(course_id)?
                .ok_or(Error::CourseNotFound(course_id))?;
            authorize(actor, &course)?;
            tx.user(student_id)?
                .ok_or(Error::StudentNotFound(student_id))?;
            let grade = match tx.grade(course_id, student_id)? {
                Some(existing) => tx.update_grade_score(existing.id, score)?,
                None => tx.insert_grade(&NewGrade {
                    course_id,
                    user_id: student_id,
                    score,
                })?,
            };
            Ok(grade)
        })
    })?;
    info!(course = course_id, student = student_id, score, "grade recorded");
    Ok(grade)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::enrollment;
    use crate::model::{NewCourse, NewUser, User};
    use crate::store::memory::MemoryStore;

    struct Fixture {
        store: MemoryStore,
        teacher: Identity,
        course_id: CourseId,
        student: User,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let (teacher, course, student) = store
            .transaction(|tx| {
                let teacher = tx.insert_user(&NewUser {
                    username: "sensei".to_string(),
                    secret_hash: "$2b$fake".to_string(),
                    is_admin: false,
                })?;
                let course = tx.insert_course(&NewCourse {
                    name: "Algebra".to_string(),
                    teacher_id: teacher.id,
                    schedule: "Mon 10:00".to_string(),
                    capacity: 30,
                })?;
                let student = tx.insert_user(&NewUser {
                    username: "akira".to_string(),
                    secret_hash: "$2b$fake".to_string(),
                    is_admin: false,
                })?;
                Ok::<_, crate::store::StoreError>((teacher, course, student))
            })
            .expect("seed");
        enrollment::enroll(&store, &Identity::from(&student), course.id).expect("enroll");
        Fixture {
            store,
            teacher: Identity::from(&teacher),
            course_id: course.id,
            student,
        }
    }

    #[test]
    fn upserting_twice_keeps_a_single_row() {
        let fx = fixture();

        let first = upsert_grade(&fx.store, &fx.teacher, fx.course_id, fx.student.id, 70)
            .expect("first upsert");
        let second = upsert_grade(&fx.store, &fx.teacher, fx.course_id, fx.student.id, 85)
            .expect("second upsert");

        assert_eq!(second.id, first.id);
        assert_eq!(second.score, 85);

        let rows = fx
            .store
            .transaction(|tx| tx.grades_for_course(fx.course_id))
            .expect("grades");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].score, 85);
    }

    #[rstest]
    #[case(-1)]
    #[case(101)]
    fn out_of_range_scores_are_rejected(#[case] score: i32) {
        let fx = fixture();
        assert_eq!(
            upsert_grade(&fx.store, &fx.teacher, fx.course_id, fx.student.id, score),
            Err(Error::InvalidGrade { score })
        );
    }

    #[rstest]
    #[case(0)]
    #[case(100)]
    fn boundary_scores_are_accepted(#[case] score: i32) {
        let fx = fixture();
        let grade = upsert_grade(&fx.store, &fx.teacher, fx.course_id, fx.student.id, score)
            .expect("boundary score");
        assert_eq!(grade.score, score);
    }

    #[test]
    fn roster_pairs_students_with_their_grades() {
        let fx = fixture();
        let ungraded = fx
            .store
            .transaction(|tx| {
                tx.insert_user(&NewUser {
                    username: "beni".to_string(),
                    secret_hash: "$2b$fake".to_string(),
                    is_admin: false,
                })
            })
            .expect("insert user");
        enrollment::enroll(&fx.store, &Identity::from(&ungraded), fx.course_id).expect("enroll");

        upsert_grade(&fx.store, &fx.teacher, fx.course_id, fx.student.id, 92).expect("upsert");

        let roster = roster(&fx.store, &fx.teacher, fx.course_id).expect("roster");
        assert_eq!(roster.len(), 2);
        let graded = roster
            .iter()
            .find(|entry| entry.student.id == fx.student.id)
            .expect("graded student");
        assert_eq!(graded.grade.as_ref().map(|g| g.score), Some(92));
        let blank = roster
            .iter()
            .find(|entry| entry.student.id == ungraded.id)
            .expect("ungraded student");
        assert_eq!(blank.grade, None);
    }

    #[test]
    fn only_the_teacher_or_an_admin_may_grade() {
        let fx = fixture();
        let outsider = Identity {
            id: fx.student.id,
            username: fx.student.username.clone(),
            is_admin: false,
        };
        assert_eq!(
            upsert_grade(&fx.store, &outsider, fx.course_id, fx.student.id, 50),
            Err(Error::Forbidden)
        );
        assert_eq!(
            roster(&fx.store, &outsider, fx.course_id),
            Err(Error::Forbidden)
        );

        let admin = Identity {
            id: 9999,
            username: "kanri".to_string(),
            is_admin: true,
        };
        upsert_grade(&fx.store, &admin, fx.course_id, fx.student.id, 50).expect("admin grades");
        roster(&fx.store, &admin, fx.course_id).expect("admin reads roster");
    }

    #[test]
    fn missing_course_or_student_is_reported() {
        let fx = fixture();
        assert_eq!(
            upsert_grade(&fx.store, &fx.teacher, 42, fx.student.id, 50),
            Err(Error::CourseNotFound(42))
        );
        assert_eq!(
            upsert_grade(&fx.store, &fx.teacher, fx.course_id, 4242, 50),
            Err(Error::StudentNotFound(4242))
        );
        assert_eq!(
            roster(&fx.store, &fx.teacher, 42),
            Err(Error::CourseNotFound(42))
        );
    }

    #[test]
    fn grades_survive_dropping_the_course() {
        let fx = fixture();
        upsert_grade(&fx.store, &fx.teacher, fx.course_id, fx.student.id, 88).expect("upsert");
        enrollment::drop_course(&fx.store, &Identity::from(&fx.student), fx.course_id)
            .expect("drop");

        let kept = fx
            .store
            .transaction(|tx| tx.grade(fx.course_id, fx.student.id))
            .expect("grade lookup");
        assert_eq!(kept.map(|g| g.score), Some(88));

        // the roster only shows enrolled students, so the row disappears
        // from view without its grade being deleted
        let roster = roster(&fx.store, &fx.teacher, fx.course_id).expect("roster");
        assert!(roster.is_empty());
    }
}
