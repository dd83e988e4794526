use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::connection::DbConnection;

#[derive(Queryable, Selectable, Debug, Clone, PartialEq, serde::Serialize)]
#[diesel(table_name = crate::schema::readings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Reading {
    pub id: i64,
    pub weight: f64,
    /// `YYYY-MM-DD HH:MM:SS`, UTC, stamped by the database on insert.
    pub created_at: String,
}

#[derive(Insertable, Debug, Clone, Copy)]
#[diesel(table_name = crate::schema::readings)]
pub struct NewReading {
    pub weight: f64,
}

impl Reading {
    /// Insert a reading and return the row as stored, including the id and
    /// timestamp assigned by the database.
    pub async fn create(
        entry: NewReading,
        conn: &mut DbConnection,
    ) -> Result<Self, diesel::result::Error> {
        use crate::schema::readings::dsl::*;

        diesel::insert_into(readings)
            .values(&entry)
            .returning(Reading::as_returning())
            .get_result(conn)
            .await
    }

    /// Get the last N readings ordered by most recent first.
    pub async fn get_latest(
        limit: i64,
        conn: &mut DbConnection,
    ) -> Result<Vec<Self>, diesel::result::Error> {
        use crate::schema::readings::dsl::*;

        readings
            .order(id.desc())
            .limit(limit)
            .select(Reading::as_select())
            .load(conn)
            .await
    }
}
