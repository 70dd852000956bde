use crate::schema::grades;
use crate::schema::grades::dsl::*;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::{Deserialize, Serialize};

#[derive(Queryable, Debug, Serialize, Deserialize, Clone, Identifiable)]
pub struct Grade {
    pub id: i32,
    pub course_id: i32,
    pub user_id: i32,
    pub score: i32,
    pub updated_at: NaiveDateTime,
}

impl Grade {
    pub fn find(gid: i32, conn: &SqliteConnection) -> QueryResult<Self> {
        grades.find(gid).first(conn)
    }

    pub fn find_for(cid: i32, uid: i32, conn: &SqliteConnection) -> QueryResult<Self> {
        grades
            .filter(course_id.eq(cid))
            .filter(user_id.eq(uid))
            .first(conn)
    }

    pub fn for_course(cid: i32, conn: &SqliteConnection) -> QueryResult<Vec<Self>> {
        grades
            .filter(course_id.eq(cid))
            .order(user_id.asc())
            .load(conn)
    }

    pub fn update_score(&self, new_score: i32, conn: &SqliteConnection) -> QueryResult<Grade> {
        diesel::update(self)
            .set((score.eq(new_score), updated_at.eq(diesel::dsl::now)))
            .execute(conn)?;
        grades.find(self.id).first(conn)
    }
}

#[derive(Insertable, Serialize, Deserialize, Debug)]
#[table_name = "grades"]
pub struct NewGrade {
    pub course_id: i32,
    pub user_id: i32,
    pub score: i32,
}

impl NewGrade {
    pub fn create(&self, conn: &SqliteConnection) -> QueryResult<Grade> {
        diesel::insert_into(grades::table)
            .values(self)
            .execute(conn)?;
        grades.order(id.desc()).first(conn)
    }
}
