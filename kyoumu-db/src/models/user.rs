use crate::schema::users;
use crate::schema::users::dsl::*;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::{Deserialize, Serialize};

#[derive(Queryable, Debug, Serialize, Deserialize, Clone, Identifiable)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub secret_hash: String,
    pub is_admin: bool,
    pub joined_at: NaiveDateTime,
}

impl User {
    pub fn get(uid: i32, conn: &SqliteConnection) -> QueryResult<Self> {
        users.find(uid).first(conn)
    }

    pub fn get_by_username(name: &str, conn: &SqliteConnection) -> QueryResult<Self> {
        users.filter(username.eq(name)).first(conn)
    }

    /// Operational action; there is no user-facing path to the admin flag.
    pub fn update_admin(&self, admin: bool, conn: &SqliteConnection) -> QueryResult<()> {
        diesel::update(self).set(is_admin.eq(admin)).execute(conn)?;
        Ok(())
    }
}

#[derive(Insertable, Serialize, Deserialize, Debug)]
#[table_name = "users"]
pub struct NewUser {
    pub username: String,
    pub secret_hash: String,
    pub is_admin: bool,
}

impl NewUser {
    pub fn create(&self, conn: &SqliteConnection) -> QueryResult<User> {
        // no RETURNING on the sqlite backend, re-read the inserted row
        diesel::insert_into(users::table).values(self).execute(conn)?;
        users.order(id.desc()).first(conn)
    }
}
