use chrono::{DateTime, NaiveDate, Utc};
use exemplar::Model;
use rusqlite::{Connection, OptionalExtension};
use sea_query::{enum_def, Expr, Query, SelectStatement, SqliteQueryBuilder};
use sea_query_rusqlite::RusqliteBinder;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, ValidationError},
    model::{calendar_date, ValidateModel},
};

#[derive(Debug, Clone, PartialEq, Model, Serialize, Deserialize)]
#[table("workout")]
#[check("../../../server/migrations/002-workout/up.sql")]
#[enum_def]
pub struct Workout {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    /// Date the workout is intended to be performed
    pub day: DateTime<Utc>,
    pub sets: i64,
    pub reps: i64,
    pub weight: f64,
    pub creation_date: DateTime<Utc>,
    pub last_updated_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Model, Serialize, Deserialize)]
#[table("workout")]
#[check("../../../server/migrations/002-workout/up.sql")]
pub struct NewWorkout {
    pub user_id: i64,
    pub name: String,
    pub day: DateTime<Utc>,
    pub sets: i64,
    pub reps: i64,
    pub weight: f64,
    pub creation_date: DateTime<Utc>,
    pub last_updated_date: DateTime<Utc>,
}

impl NewWorkout {
    pub fn new<T: Into<String>>(
        user_id: i64,
        name: T,
        day: DateTime<Utc>,
        sets: i64,
        reps: i64,
        weight: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            name: name.into(),
            day,
            sets,
            reps,
            weight,
            creation_date: now,
            last_updated_date: now,
        }
    }
}

impl ValidateModel for NewWorkout {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut error_messages = Vec::new();
        if self.name.trim().is_empty() {
            error_messages.push("Workout name must not be empty".to_owned());
        }
        if self.sets <= 0 {
            error_messages.push("Sets must be greater than zero".to_owned());
        }
        if self.reps <= 0 {
            error_messages.push("Reps must be greater than zero".to_owned());
        }
        if self.weight < 0.0 {
            error_messages.push("Weight must not be negative".to_owned());
        }

        if error_messages.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { error_messages })
        }
    }
}

impl Workout {
    fn select() -> SelectStatement {
        let mut stmt = Query::select();
        stmt.columns([
            WorkoutIden::Id,
            WorkoutIden::UserId,
            WorkoutIden::Name,
            WorkoutIden::Day,
            WorkoutIden::Sets,
            WorkoutIden::Reps,
            WorkoutIden::Weight,
            WorkoutIden::CreationDate,
            WorkoutIden::LastUpdatedDate,
        ])
        .from(WorkoutIden::Table);
        stmt
    }

    pub fn fetch(conn: &Connection, id: i64) -> Result<Workout, rusqlite::Error> {
        let (sql, values) = Self::select()
            .and_where(Expr::col(WorkoutIden::Id).eq(id))
            .limit(1)
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let workout = stmt.query_row(&*values.as_params(), Workout::from_row)?;
        Ok(workout)
    }

    pub fn try_fetch(conn: &Connection, id: i64) -> Result<Option<Workout>, rusqlite::Error> {
        let (sql, values) = Self::select()
            .and_where(Expr::col(WorkoutIden::Id).eq(id))
            .limit(1)
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let workout = stmt
            .query_row(&*values.as_params(), Workout::from_row)
            .optional()?;
        Ok(workout)
    }

    pub fn fetch_all_for_user(
        conn: &Connection,
        user_id: i64,
    ) -> Result<Vec<Workout>, rusqlite::Error> {
        let (sql, values) = Self::select()
            .and_where(Expr::col(WorkoutIden::UserId).eq(user_id))
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let workouts = stmt
            .query_map(&*values.as_params(), Workout::from_row)?
            .collect::<Result<_, _>>()?;
        Ok(workouts)
    }

    /// Workouts scheduled for the given calendar date.
    pub fn fetch_for_day(
        conn: &Connection,
        user_id: i64,
        day: NaiveDate,
    ) -> Result<Vec<Workout>, rusqlite::Error> {
        let (sql, values) = Self::select()
            .and_where(Expr::col(WorkoutIden::UserId).eq(user_id))
            .and_where(
                Expr::expr(calendar_date(Expr::col(WorkoutIden::Day)))
                    .eq(calendar_date(Expr::val(day))),
            )
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let workouts = stmt
            .query_map(&*values.as_params(), Workout::from_row)?
            .collect::<Result<_, _>>()?;
        Ok(workouts)
    }

    /// Substring match on the workout name. `%` and `_` in the term keep
    /// their SQL wildcard meaning.
    pub fn search<T: AsRef<str>>(
        conn: &Connection,
        user_id: i64,
        term: T,
    ) -> Result<Vec<Workout>, rusqlite::Error> {
        let (sql, values) = Self::select()
            .and_where(Expr::col(WorkoutIden::UserId).eq(user_id))
            .and_where(Expr::col(WorkoutIden::Name).like(format!("%{}%", term.as_ref())))
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let workouts = stmt
            .query_map(&*values.as_params(), Workout::from_row)?
            .collect::<Result<_, _>>()?;
        Ok(workouts)
    }

    pub fn create(conn: &mut Connection, new_workout: NewWorkout) -> Result<Workout, Error> {
        new_workout.validate()?;

        let tx = conn.transaction()?;
        let workout = {
            new_workout.insert(&tx)?;
            Workout::fetch(&tx, tx.last_insert_rowid())?
        };
        tx.commit()?;

        Ok(workout)
    }

    pub fn update(&self, conn: &Connection) -> Result<(), rusqlite::Error> {
        let (sql, values) = Query::update()
            .table(WorkoutIden::Table)
            .values([
                (WorkoutIden::Name, self.name.clone().into()),
                (WorkoutIden::Day, self.day.into()),
                (WorkoutIden::Sets, self.sets.into()),
                (WorkoutIden::Reps, self.reps.into()),
                (WorkoutIden::Weight, self.weight.into()),
                (WorkoutIden::LastUpdatedDate, self.last_updated_date.into()),
            ])
            .and_where(Expr::col(WorkoutIden::Id).eq(self.id))
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        stmt.execute(&*values.as_params())?;

        Ok(())
    }

    pub fn delete(conn: &Connection, id: i64) -> Result<usize, rusqlite::Error> {
        let (sql, values) = Query::delete()
            .from_table(WorkoutIden::Table)
            .and_where(Expr::col(WorkoutIden::Id).eq(id))
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let deleted = stmt.execute(&*values.as_params())?;
        Ok(deleted)
    }
}
