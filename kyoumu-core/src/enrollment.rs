//! Enrollment engine: dashboard projections plus the enroll/drop toggle.
//!
//! Every operation takes the store and the acting identity explicitly and
//! runs against current state inside one transaction.

use tracing::info;

use crate::error::Error;
use crate::identity::Identity;
use crate::model::{CourseId, CourseInfo};
use crate::store::{run_serialized, Store, StoreTx};

/// Courses the actor is not enrolled in, annotated with live headcounts.
pub fn available_courses<S: Store>(store: &S, actor: &Identity) -> Result<Vec<CourseInfo>, Error> {
    store.transaction(|tx| {
        let enrolled = tx.enrolled_course_ids(actor.id)?;
        let mut infos = Vec::new();
        for (course, teacher) in tx.courses_with_teachers()? {
            if enrolled.contains(&course.id) {
                continue;
            }
            let count = tx.enrolled_count(course.id)?;
            infos.push(CourseInfo::new(&course, &teacher.username, count));
        }
        Ok(infos)
    })
}

/// Courses the actor is currently enrolled in (the student dashboard).
pub fn enrolled_courses<S: Store>(store: &S, actor: &Identity) -> Result<Vec<CourseInfo>, Error> {
    store.transaction(|tx| {
        let enrolled = tx.enrolled_course_ids(actor.id)?;
        let mut infos = Vec::new();
        for (course, teacher) in tx.courses_with_teachers()? {
            if !enrolled.contains(&course.id) {
                continue;
            }
            let count = tx.enrolled_count(course.id)?;
            infos.push(CourseInfo::new(&course, &teacher.username, count));
        }
        Ok(infos)
    })
}

/// Courses the actor teaches (the teacher dashboard).
pub fn teaching_courses<S: Store>(store: &S, actor: &Identity) -> Result<Vec<CourseInfo>, Error> {
    store.transaction(|tx| {
        let mut infos = Vec::new();
        for course in tx.courses_taught_by(actor.id)? {
            let count = tx.enrolled_count(course.id)?;
            infos.push(CourseInfo::new(&course, &actor.username, count));
        }
        Ok(infos)
    })
}

/// Adds the (actor, course) enrollment edge, enforcing capacity.
///
/// The headcount check and the insert share one transaction so two racing
/// calls cannot both take the last seat.
pub fn enroll<S: Store>(store: &S, actor: &Identity, course_id: CourseId) -> Result<(), Error> {
    run_serialized(|| {
        store.transaction(|tx| {
            let course = tx
                .course(course_id)?
                .ok_or(Error::CourseNotFound(course_id))?;
            if tx.is_enrolled(actor.id, course_id)? {
                return Err(Error::AlreadyEnrolled { course_id });
            }
            if tx.enrolled_count(course_id)? >= i64::from(course.capacity) {
                return Err(Error::CourseFull {
                    course_id,
                    capacity: course.capacity,
                });
            }
            tx.insert_enrollment(actor.id, course_id)?;
            Ok(())
        })
    })?;
    info!(user = actor.id, course = course_id, "enrolled");
    Ok(())
}

/// Removes the (actor, course) enrollment edge. Grade history is kept.
pub fn drop_course<S: Store>(store: &S, actor: &Identity, course_id: CourseId) -> Result<(), Error> {
    store.transaction(|tx| {
        tx.course(course_id)?
            .ok_or(Error::CourseNotFound(course_id))?;
        if !tx.is_enrolled(actor.id, course_id)? {
            return Err(Error::NotEnrolled { course_id });
        }
        tx.delete_enrollment(actor.id, course_id)?;
        Ok(())
    })?;
    info!(user = actor.id, course = course_id, "dropped");
    Ok(())
}
