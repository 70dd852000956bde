//! The core engines running against a real SQLite file.

use std::sync::Arc;
use std::thread;

use diesel::prelude::*;
use tempfile::TempDir;

use kyoumu_core::model::NewCourse;
use kyoumu_core::{account, enrollment, grading, Error, Identity, Store, StoreTx};
use kyoumu_db::connection::{pool_for_url, SqlitePool};
use kyoumu_db::store::SqliteStore;
use kyoumu_db::{run_migrations, schema};

fn test_store() -> (TempDir, SqlitePool, SqliteStore) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("kyoumu.sqlite3");
    let pool = pool_for_url(path.to_str().expect("utf-8 path"));
    run_migrations(&pool);
    (dir, pool.clone(), SqliteStore::new(pool))
}

#[test]
fn a_term_at_the_school_on_sqlite() {
    let (_dir, _pool, store) = test_store();

    let sensei = account::sign_up(&store, "sensei", "$2b$fake").expect("teacher signs up");
    let akira = account::sign_up(&store, "akira", "$2b$fake").expect("student signs up");
    let beni = account::sign_up(&store, "beni", "$2b$fake").expect("student signs up");

    let algebra = store
        .transaction(|tx| {
            tx.insert_course(&NewCourse {
                name: "Algebra".to_string(),
                teacher_id: sensei.id,
                schedule: "Mon 10:00".to_string(),
                capacity: 1,
            })
        })
        .expect("create course");

    let sensei = Identity::from(&sensei);
    let akira_id = Identity::from(&akira);
    let beni_id = Identity::from(&beni);

    enrollment::enroll(&store, &akira_id, algebra.id).expect("akira enrolls");
    assert_eq!(
        enrollment::enroll(&store, &beni_id, algebra.id),
        Err(Error::CourseFull {
            course_id: algebra.id,
            capacity: 1
        })
    );
    assert_eq!(
        enrollment::enroll(&store, &akira_id, algebra.id),
        Err(Error::AlreadyEnrolled {
            course_id: algebra.id
        })
    );

    grading::upsert_grade(&store, &sensei, algebra.id, akira.id, 70).expect("first grade");
    grading::upsert_grade(&store, &sensei, algebra.id, akira.id, 85).expect("revised grade");

    let roster = grading::roster(&store, &sensei, algebra.id).expect("roster");
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].grade.as_ref().map(|g| g.score), Some(85));

    let rows = store
        .transaction(|tx| tx.grades_for_course(algebra.id))
        .expect("grades");
    assert_eq!(rows.len(), 1, "upsert must not duplicate the grade row");

    // dropping frees the seat and keeps the grade
    enrollment::drop_course(&store, &akira_id, algebra.id).expect("akira drops");
    enrollment::enroll(&store, &beni_id, algebra.id).expect("beni takes the seat");

    let kept = store
        .transaction(|tx| tx.grade(algebra.id, akira.id))
        .expect("grade lookup");
    assert_eq!(kept.map(|g| g.score), Some(85));

    let available = enrollment::available_courses(&store, &akira_id).expect("dashboard");
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].student_count, 1);
    let teaching = enrollment::teaching_courses(&store, &sensei).expect("teacher dashboard");
    assert_eq!(teaching.len(), 1);
}

#[test]
fn deleting_a_course_cascades_to_grades() {
    let (_dir, pool, store) = test_store();

    let sensei = account::sign_up(&store, "sensei", "$2b$fake").expect("sign up");
    let akira = account::sign_up(&store, "akira", "$2b$fake").expect("sign up");
    let algebra = store
        .transaction(|tx| {
            tx.insert_course(&NewCourse {
                name: "Algebra".to_string(),
                teacher_id: sensei.id,
                schedule: "Mon 10:00".to_string(),
                capacity: 5,
            })
        })
        .expect("create course");

    enrollment::enroll(&store, &Identity::from(&akira), algebra.id).expect("enroll");
    grading::upsert_grade(&store, &Identity::from(&sensei), algebra.id, akira.id, 77)
        .expect("grade");

    // raw record management belongs to the admin surface; emulate it here
    let conn = pool.get().expect("conn");
    diesel::delete(schema::courses::table.find(algebra.id))
        .execute(&conn)
        .expect("delete course");

    let gone = store
        .transaction(|tx| tx.grade(algebra.id, akira.id))
        .expect("grade lookup");
    assert_eq!(gone, None);
    let edges = store
        .transaction(|tx| tx.enrolled_course_ids(akira.id))
        .expect("edges");
    assert!(edges.is_empty());
}

#[test]
fn racing_enrolls_never_overshoot_capacity_on_sqlite() {
    let (_dir, _pool, store) = test_store();
    let store = Arc::new(store);

    let sensei = account::sign_up(&*store, "sensei", "$2b$fake").expect("sign up");
    let algebra = store
        .transaction(|tx| {
            tx.insert_course(&NewCourse {
                name: "Algebra".to_string(),
                teacher_id: sensei.id,
                schedule: "Mon 10:00".to_string(),
                capacity: 1,
            })
        })
        .expect("create course");

    let students: Vec<Identity> = (0..4)
        .map(|n| {
            Identity::from(
                &account::sign_up(&*store, &format!("student{}", n), "$2b$fake")
                    .expect("sign up"),
            )
        })
        .collect();

    let handles: Vec<_> = students
        .into_iter()
        .map(|student| {
            let store = Arc::clone(&store);
            let course_id = algebra.id;
            thread::spawn(move || enrollment::enroll(&*store, &student, course_id).is_ok())
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread"))
        .filter(|enrolled| *enrolled)
        .count();
    assert_eq!(successes, 1);

    let count = store
        .transaction(|tx| tx.enrolled_count(algebra.id))
        .expect("count");
    assert_eq!(count, 1);
}

#[test]
fn admin_flag_is_flipped_operationally() {
    let (_dir, pool, store) = test_store();
    let user = account::sign_up(&store, "kanri", "$2b$fake").expect("sign up");
    assert!(!user.is_admin);

    let conn = pool.get().expect("conn");
    let row = kyoumu_db::models::user::User::get(user.id, &conn).expect("row");
    row.update_admin(true, &conn).expect("promote");

    let promoted = store
        .transaction(|tx| tx.user(user.id))
        .expect("lookup")
        .expect("present");
    assert!(promoted.is_admin);
}
