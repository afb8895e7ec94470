use chrono::{DateTime, Utc};
use exemplar::Model;
use rusqlite::Connection;
use sea_query::{enum_def, Expr, OnConflict, Query, SqliteQueryBuilder};
use sea_query_rusqlite::RusqliteBinder;
use serde::{Deserialize, Serialize};

use crate::model::{Workout, WorkoutIden};

/// One entry in a user's "today's workouts" list. The list has no date
/// dimension: it is the user's current intent, replaced wholesale when a day
/// is saved to history.
#[derive(Debug, Clone, PartialEq, Model, Serialize, Deserialize)]
#[table("user_workout")]
#[check("../../../server/migrations/003-user_workout/up.sql")]
#[enum_def]
pub struct UserWorkout {
    pub user_id: i64,
    pub workout_id: i64,
    pub creation_date: DateTime<Utc>,
}

impl UserWorkout {
    /// Inserts the (user, workout) pair, leaving an existing pair untouched.
    pub fn upsert(
        conn: &Connection,
        user_id: i64,
        workout_id: i64,
    ) -> Result<(), rusqlite::Error> {
        let (sql, values) = Query::insert()
            .into_table(UserWorkoutIden::Table)
            .columns([
                UserWorkoutIden::UserId,
                UserWorkoutIden::WorkoutId,
                UserWorkoutIden::CreationDate,
            ])
            .values_panic([user_id.into(), workout_id.into(), Utc::now().into()])
            .on_conflict(
                OnConflict::columns([UserWorkoutIden::UserId, UserWorkoutIden::WorkoutId])
                    .do_nothing()
                    .to_owned(),
            )
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        stmt.execute(&*values.as_params())?;
        Ok(())
    }

    /// Removes the pair if present. Returns the number of rows removed, so
    /// removing an absent pair is just `Ok(0)`.
    pub fn remove(
        conn: &Connection,
        user_id: i64,
        workout_id: i64,
    ) -> Result<usize, rusqlite::Error> {
        let (sql, values) = Query::delete()
            .from_table(UserWorkoutIden::Table)
            .and_where(Expr::col(UserWorkoutIden::UserId).eq(user_id))
            .and_where(Expr::col(UserWorkoutIden::WorkoutId).eq(workout_id))
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let removed = stmt.execute(&*values.as_params())?;
        Ok(removed)
    }

    /// The workout definitions currently on the user's list, in database
    /// order.
    pub fn selected_workouts(
        conn: &Connection,
        user_id: i64,
    ) -> Result<Vec<Workout>, rusqlite::Error> {
        let (sql, values) = Query::select()
            .columns([
                (WorkoutIden::Table, WorkoutIden::Id),
                (WorkoutIden::Table, WorkoutIden::UserId),
                (WorkoutIden::Table, WorkoutIden::Name),
                (WorkoutIden::Table, WorkoutIden::Day),
                (WorkoutIden::Table, WorkoutIden::Sets),
                (WorkoutIden::Table, WorkoutIden::Reps),
                (WorkoutIden::Table, WorkoutIden::Weight),
                (WorkoutIden::Table, WorkoutIden::CreationDate),
                (WorkoutIden::Table, WorkoutIden::LastUpdatedDate),
            ])
            .from(UserWorkoutIden::Table)
            .inner_join(
                WorkoutIden::Table,
                Expr::col((UserWorkoutIden::Table, UserWorkoutIden::WorkoutId))
                    .equals((WorkoutIden::Table, WorkoutIden::Id)),
            )
            .and_where(Expr::col((UserWorkoutIden::Table, UserWorkoutIden::UserId)).eq(user_id))
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let workouts = stmt
            .query_map(&*values.as_params(), Workout::from_row)?
            .collect::<Result<_, _>>()?;
        Ok(workouts)
    }
}
