use chrono::{DateTime, Utc};
use exemplar::Model;
use rusqlite::{Connection, OptionalExtension};
use sea_query::{enum_def, Expr, Query, SelectStatement, SqliteQueryBuilder};
use sea_query_rusqlite::RusqliteBinder;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Model, Serialize, Deserialize)]
#[table("user")]
#[check("../../../server/migrations/001-user/up.sql")]
#[enum_def]
pub struct User {
    pub id: i64,
    pub username: String,
    pub creation_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Model, Serialize, Deserialize)]
#[table("user")]
#[check("../../../server/migrations/001-user/up.sql")]
pub struct NewUser {
    pub username: String,
    pub creation_date: DateTime<Utc>,
}

impl NewUser {
    pub fn new<T: Into<String>>(username: T) -> Self {
        Self {
            username: username.into(),
            creation_date: Utc::now(),
        }
    }
}

impl User {
    fn select() -> SelectStatement {
        let mut stmt = Query::select();
        stmt.columns([
            UserIden::Id,
            UserIden::Username,
            UserIden::CreationDate,
        ])
        .from(UserIden::Table);
        stmt
    }

    pub fn fetch(conn: &Connection, id: i64) -> Result<User, rusqlite::Error> {
        let (sql, values) = Self::select()
            .and_where(Expr::col(UserIden::Id).eq(id))
            .limit(1)
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let user = stmt.query_row(&*values.as_params(), User::from_row)?;
        Ok(user)
    }

    pub fn fetch_by_username<T: AsRef<str>>(
        conn: &Connection,
        username: T,
    ) -> Result<Option<User>, rusqlite::Error> {
        let (sql, values) = Self::select()
            .and_where(Expr::col(UserIden::Username).eq(username.as_ref()))
            .limit(1)
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let user = stmt
            .query_row(&*values.as_params(), User::from_row)
            .optional()?;
        Ok(user)
    }

    pub fn create(conn: &mut Connection, new_user: NewUser) -> Result<User, Error> {
        let tx = conn.transaction()?;
        let user = {
            new_user.insert(&tx)?;
            User::fetch(&tx, tx.last_insert_rowid())?
        };
        tx.commit()?;

        Ok(user)
    }
}
