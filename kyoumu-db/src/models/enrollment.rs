use crate::schema::enrollments;
use crate::schema::enrollments::dsl::*;
use chrono::NaiveDateTime;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::{Deserialize, Serialize};

use super::user::User;

#[derive(Queryable, Debug, Serialize, Deserialize, Clone)]
pub struct Enrollment {
    pub id: i32,
    pub user_id: i32,
    pub course_id: i32,
    pub enrolled_at: NaiveDateTime,
}

impl Enrollment {
    pub fn exists(uid: i32, cid: i32, conn: &SqliteConnection) -> QueryResult<bool> {
        diesel::select(exists(
            enrollments
                .filter(user_id.eq(uid))
                .filter(course_id.eq(cid)),
        ))
        .get_result(conn)
    }

    pub fn count_for_course(cid: i32, conn: &SqliteConnection) -> QueryResult<i64> {
        enrollments
            .filter(course_id.eq(cid))
            .count()
            .get_result(conn)
    }

    pub fn course_ids_for_user(uid: i32, conn: &SqliteConnection) -> QueryResult<Vec<i32>> {
        enrollments
            .filter(user_id.eq(uid))
            .select(course_id)
            .load(conn)
    }

    pub fn students_of_course(cid: i32, conn: &SqliteConnection) -> QueryResult<Vec<User>> {
        enrollments
            .inner_join(crate::schema::users::table)
            .filter(course_id.eq(cid))
            .select(crate::schema::users::all_columns)
            .order(crate::schema::users::id.asc())
            .load(conn)
    }

    pub fn delete(uid: i32, cid: i32, conn: &SqliteConnection) -> QueryResult<usize> {
        diesel::delete(
            enrollments
                .filter(user_id.eq(uid))
                .filter(course_id.eq(cid)),
        )
        .execute(conn)
    }
}

#[derive(Insertable, Debug)]
#[table_name = "enrollments"]
pub struct NewEnrollment {
    pub user_id: i32,
    pub course_id: i32,
}

impl NewEnrollment {
    pub fn create(&self, conn: &SqliteConnection) -> QueryResult<usize> {
        diesel::insert_into(enrollments::table)
            .values(self)
            .execute(conn)
    }
}
