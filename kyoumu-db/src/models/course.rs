use crate::schema::courses;
use crate::schema::courses::dsl::*;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::{Deserialize, Serialize};

use super::user::User;

#[derive(Queryable, Debug, Serialize, Deserialize, Clone, Identifiable)]
pub struct Course {
    pub id: i32,
    pub name: String,
    pub teacher_id: i32,
    pub schedule: String,
    pub capacity: i32,
}

impl Course {
    pub fn find(cid: i32, conn: &SqliteConnection) -> QueryResult<Self> {
        courses.find(cid).first(conn)
    }

    pub fn list_with_teachers(conn: &SqliteConnection) -> QueryResult<Vec<(Course, User)>> {
        courses
            .inner_join(crate::schema::users::table)
            .order(id.asc())
            .load(conn)
    }

    pub fn taught_by(uid: i32, conn: &SqliteConnection) -> QueryResult<Vec<Self>> {
        courses.filter(teacher_id.eq(uid)).order(id.asc()).load(conn)
    }
}

#[derive(Insertable, Serialize, Deserialize, Debug)]
#[table_name = "courses"]
pub struct NewCourse {
    pub name: String,
    pub teacher_id: i32,
    pub schedule: String,
    pub capacity: i32,
}

impl NewCourse {
    pub fn create(&self, conn: &SqliteConnection) -> QueryResult<Course> {
        diesel::insert_into(courses::table)
            .values(self)
            .execute(conn)?;
        courses.order(id.desc()).first(conn)
    }
}
