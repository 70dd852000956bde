use connection::SqlitePool;

#[macro_use]
extern crate diesel;
#[macro_use]
extern crate diesel_migrations;

embed_migrations!();

pub fn run_migrations(pool: &SqlitePool) {
    let conn = pool.get().expect("Can't get DB connection");
    embedded_migrations::run(&conn).expect("Failed to run database migrations");
}

pub mod connection;
pub mod models;
pub mod schema;
pub mod store;
