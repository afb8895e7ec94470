use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use exemplar::Model;
use rusqlite::Connection;
use sea_query::{enum_def, Alias, Asterisk, Expr, Order, Query, SelectStatement, SqliteQueryBuilder};
use sea_query_rusqlite::RusqliteBinder;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, ValidationError},
    model::{calendar_date, UserWorkout, ValidateModel, Workout, WorkoutIden},
};

/// A completed workout as it was performed. Rows are written once and only
/// ever removed by the date-scoped bulk delete; edits happen by
/// delete-and-rewrite.
#[derive(Debug, Clone, PartialEq, Model, Serialize, Deserialize)]
#[table("workout_history")]
#[check("../../../server/migrations/004-workout_history/up.sql")]
#[enum_def]
pub struct WorkoutHistory {
    pub id: i64,
    pub workout_id: i64,
    pub user_id: i64,
    /// Instant the entry was written; "same day" comparisons only use the
    /// calendar date.
    pub date: DateTime<Utc>,
    pub sets_completed: i64,
    pub reps_completed: i64,
    pub weight_used: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Model, Serialize, Deserialize)]
#[table("workout_history")]
#[check("../../../server/migrations/004-workout_history/up.sql")]
pub struct NewWorkoutHistory {
    pub workout_id: i64,
    pub user_id: i64,
    pub date: DateTime<Utc>,
    pub sets_completed: i64,
    pub reps_completed: i64,
    pub weight_used: f64,
    pub notes: Option<String>,
}

impl ValidateModel for NewWorkoutHistory {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut error_messages = Vec::new();
        if self.sets_completed < 0 {
            error_messages.push("Completed sets must not be negative".to_owned());
        }
        if self.reps_completed < 0 {
            error_messages.push("Completed reps must not be negative".to_owned());
        }
        if self.weight_used < 0.0 {
            error_messages.push("Weight used must not be negative".to_owned());
        }

        if error_messages.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { error_messages })
        }
    }
}

/// History row plus the display name of the workout it refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub history: WorkoutHistory,
    pub workout_name: String,
}

/// History row joined with the full workout definition, for a single day's
/// detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryDetail {
    pub history: WorkoutHistory,
    pub workout: Workout,
}

impl WorkoutHistory {
    /// Total load moved for this entry, the second series the progress chart
    /// plots next to the raw weight.
    pub fn volume(&self) -> f64 {
        self.reps_completed as f64 * self.sets_completed as f64 * self.weight_used
    }

    fn select() -> SelectStatement {
        let mut stmt = Query::select();
        stmt.columns([
            WorkoutHistoryIden::Id,
            WorkoutHistoryIden::WorkoutId,
            WorkoutHistoryIden::UserId,
            WorkoutHistoryIden::Date,
            WorkoutHistoryIden::SetsCompleted,
            WorkoutHistoryIden::RepsCompleted,
            WorkoutHistoryIden::WeightUsed,
            WorkoutHistoryIden::Notes,
        ])
        .from(WorkoutHistoryIden::Table);
        stmt
    }

    pub fn fetch(conn: &Connection, id: i64) -> Result<WorkoutHistory, rusqlite::Error> {
        let (sql, values) = Self::select()
            .and_where(Expr::col(WorkoutHistoryIden::Id).eq(id))
            .limit(1)
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let history = stmt.query_row(&*values.as_params(), WorkoutHistory::from_row)?;
        Ok(history)
    }

    /// Direct append of a single caller-supplied entry. No duplicate
    /// prevention: logging the same workout twice records it twice.
    pub fn create(conn: &mut Connection, entry: NewWorkoutHistory) -> Result<WorkoutHistory, Error> {
        entry.validate()?;

        let tx = conn.transaction()?;
        let history = {
            entry.insert(&tx)?;
            WorkoutHistory::fetch(&tx, tx.last_insert_rowid())?
        };
        tx.commit()?;

        Ok(history)
    }

    /// Replaces the user's ledger entries for `now`'s calendar date with a
    /// snapshot of their current "today's workouts" list, copying each
    /// workout's target metrics verbatim. Runs as one transaction: a failed
    /// save never leaves the day half-written, and re-saving an unchanged
    /// list reproduces the same ledger state.
    pub fn save_snapshot(
        conn: &mut Connection,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<WorkoutHistory>, Error> {
        let tx = conn.transaction()?;
        let written = {
            let selected = UserWorkout::selected_workouts(&tx, user_id)?;
            Self::delete_for_date(&tx, user_id, now.date_naive())?;

            let mut written = Vec::with_capacity(selected.len());
            for workout in selected {
                let entry = NewWorkoutHistory {
                    workout_id: workout.id,
                    user_id,
                    date: now,
                    sets_completed: workout.sets,
                    reps_completed: workout.reps,
                    weight_used: workout.weight,
                    notes: None,
                };
                entry.insert(&tx)?;
                written.push(WorkoutHistory::fetch(&tx, tx.last_insert_rowid())?);
            }
            written
        };
        tx.commit()?;

        Ok(written)
    }

    /// Bulk delete of the user's entries on one calendar date.
    pub fn delete_for_date(
        conn: &Connection,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<usize, rusqlite::Error> {
        let (sql, values) = Query::delete()
            .from_table(WorkoutHistoryIden::Table)
            .and_where(Expr::col(WorkoutHistoryIden::UserId).eq(user_id))
            .and_where(
                Expr::expr(calendar_date(Expr::col(WorkoutHistoryIden::Date)))
                    .eq(calendar_date(Expr::val(date))),
            )
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let deleted = stmt.execute(&*values.as_params())?;
        Ok(deleted)
    }

    /// Every entry for the user with its workout's name, newest first.
    pub fn fetch_all_with_name(
        conn: &Connection,
        user_id: i64,
    ) -> Result<Vec<HistoryEntry>, rusqlite::Error> {
        let (sql, values) = Query::select()
            .column((WorkoutHistoryIden::Table, Asterisk))
            .expr_as(
                Expr::col((WorkoutIden::Table, WorkoutIden::Name)),
                Alias::new("workout_name"),
            )
            .from(WorkoutHistoryIden::Table)
            .inner_join(
                WorkoutIden::Table,
                Expr::col((WorkoutHistoryIden::Table, WorkoutHistoryIden::WorkoutId))
                    .equals((WorkoutIden::Table, WorkoutIden::Id)),
            )
            .and_where(
                Expr::col((WorkoutHistoryIden::Table, WorkoutHistoryIden::UserId)).eq(user_id),
            )
            .order_by(
                (WorkoutHistoryIden::Table, WorkoutHistoryIden::Date),
                Order::Desc,
            )
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let entries = stmt
            .query_map(&*values.as_params(), |row| {
                Ok(HistoryEntry {
                    history: WorkoutHistory::from_row(row)?,
                    workout_name: row.get("workout_name")?,
                })
            })?
            .collect::<Result<_, _>>()?;
        Ok(entries)
    }

    /// The user's entries on one calendar date with their full workout
    /// definitions, oldest first. The flattened join rows are grouped by
    /// history id before domain records are built: the same entry must never
    /// surface twice however many rows the join produces for it.
    pub fn fetch_for_date_with_workout(
        conn: &Connection,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<HistoryDetail>, rusqlite::Error> {
        let (sql, values) = Query::select()
            .column((WorkoutHistoryIden::Table, Asterisk))
            .expr_as(Expr::col((WorkoutIden::Table, WorkoutIden::Id)), Alias::new("w_id"))
            .expr_as(
                Expr::col((WorkoutIden::Table, WorkoutIden::UserId)),
                Alias::new("w_user_id"),
            )
            .expr_as(Expr::col((WorkoutIden::Table, WorkoutIden::Name)), Alias::new("w_name"))
            .expr_as(Expr::col((WorkoutIden::Table, WorkoutIden::Day)), Alias::new("w_day"))
            .expr_as(Expr::col((WorkoutIden::Table, WorkoutIden::Sets)), Alias::new("w_sets"))
            .expr_as(Expr::col((WorkoutIden::Table, WorkoutIden::Reps)), Alias::new("w_reps"))
            .expr_as(
                Expr::col((WorkoutIden::Table, WorkoutIden::Weight)),
                Alias::new("w_weight"),
            )
            .expr_as(
                Expr::col((WorkoutIden::Table, WorkoutIden::CreationDate)),
                Alias::new("w_creation_date"),
            )
            .expr_as(
                Expr::col((WorkoutIden::Table, WorkoutIden::LastUpdatedDate)),
                Alias::new("w_last_updated_date"),
            )
            .from(WorkoutHistoryIden::Table)
            .inner_join(
                WorkoutIden::Table,
                Expr::col((WorkoutHistoryIden::Table, WorkoutHistoryIden::WorkoutId))
                    .equals((WorkoutIden::Table, WorkoutIden::Id)),
            )
            .and_where(
                Expr::col((WorkoutHistoryIden::Table, WorkoutHistoryIden::UserId)).eq(user_id),
            )
            .and_where(
                Expr::expr(calendar_date(Expr::col((
                    WorkoutHistoryIden::Table,
                    WorkoutHistoryIden::Date,
                ))))
                .eq(calendar_date(Expr::val(date))),
            )
            .order_by(
                (WorkoutHistoryIden::Table, WorkoutHistoryIden::Date),
                Order::Asc,
            )
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(&*values.as_params(), |row| {
            Ok(HistoryDetail {
                history: WorkoutHistory::from_row(row)?,
                workout: Workout {
                    id: row.get("w_id")?,
                    user_id: row.get("w_user_id")?,
                    name: row.get("w_name")?,
                    day: row.get("w_day")?,
                    sets: row.get("w_sets")?,
                    reps: row.get("w_reps")?,
                    weight: row.get("w_weight")?,
                    creation_date: row.get("w_creation_date")?,
                    last_updated_date: row.get("w_last_updated_date")?,
                },
            })
        })?;

        let mut seen = HashSet::new();
        let mut details = Vec::new();
        for detail in rows {
            let detail = detail?;
            if seen.insert(detail.history.id) {
                details.push(detail);
            }
        }
        Ok(details)
    }

    /// Workout definitions the user has logged at least once, sorted by
    /// name. Feeds the drilldown selector on the progress page.
    pub fn distinct_workouts(
        conn: &Connection,
        user_id: i64,
    ) -> Result<Vec<Workout>, rusqlite::Error> {
        let (sql, values) = Query::select()
            .distinct()
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
            .from(WorkoutHistoryIden::Table)
            .inner_join(
                WorkoutIden::Table,
                Expr::col((WorkoutHistoryIden::Table, WorkoutHistoryIden::WorkoutId))
                    .equals((WorkoutIden::Table, WorkoutIden::Id)),
            )
            .and_where(
                Expr::col((WorkoutHistoryIden::Table, WorkoutHistoryIden::UserId)).eq(user_id),
            )
            .order_by((WorkoutIden::Table, WorkoutIden::Name), Order::Asc)
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let workouts = stmt
            .query_map(&*values.as_params(), Workout::from_row)?
            .collect::<Result<_, _>>()?;
        Ok(workouts)
    }

    /// Every entry for one workout in ascending date order. Gaps between
    /// days are simply absent points.
    pub fn fetch_series(
        conn: &Connection,
        user_id: i64,
        workout_id: i64,
    ) -> Result<Vec<WorkoutHistory>, rusqlite::Error> {
        let (sql, values) = Self::select()
            .and_where(Expr::col(WorkoutHistoryIden::UserId).eq(user_id))
            .and_where(Expr::col(WorkoutHistoryIden::WorkoutId).eq(workout_id))
            .order_by(WorkoutHistoryIden::Date, Order::Asc)
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let series = stmt
            .query_map(&*values.as_params(), WorkoutHistory::from_row)?
            .collect::<Result<_, _>>()?;
        Ok(series)
    }

    pub fn count_for_workout(conn: &Connection, workout_id: i64) -> Result<i64, rusqlite::Error> {
        let (sql, values) = Query::select()
            .expr(Expr::col(WorkoutHistoryIden::Id).count())
            .from(WorkoutHistoryIden::Table)
            .and_where(Expr::col(WorkoutHistoryIden::WorkoutId).eq(workout_id))
            .build_rusqlite(SqliteQueryBuilder);

        let mut stmt = conn.prepare_cached(&sql)?;
        let count = stmt.query_row(&*values.as_params(), |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn volume_is_reps_times_sets_times_weight() {
        let history = WorkoutHistory {
            id: 1,
            workout_id: 1,
            user_id: 1,
            date: Utc::now(),
            sets_completed: 5,
            reps_completed: 5,
            weight_used: 100.0,
            notes: None,
        };
        assert_eq!(history.volume(), 2500.0);
    }

    #[test]
    fn new_history_validates_fields() {
        let entry = NewWorkoutHistory {
            workout_id: 1,
            user_id: 1,
            date: Utc::now(),
            sets_completed: -1,
            reps_completed: 8,
            weight_used: -10.0,
            notes: None,
        };
        let err = entry.validate().expect_err("expected validation failure");
        assert_eq!(err.error_messages.len(), 2);
    }
}
