use chrono::{NaiveDate, Utc};
use deadpool_sqlite::Pool;
use shared::{
    error::Error,
    model::{HistoryDetail, HistoryEntry, NewWorkoutHistory, Workout, WorkoutHistory},
};
use tracing::instrument;

use super::get_conn;

/// The per-user, per-day ledger of completed workouts.
#[derive(Debug, Clone)]
pub struct HistoryService {
    pool: Pool,
}

impl HistoryService {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Replaces today's ledger entries with a snapshot of the user's current
    /// "today's workouts" list. Saving again with an unchanged list leaves
    /// the ledger in the same state.
    #[instrument(skip(self))]
    pub async fn save_today(&self, user_id: i64) -> Result<Vec<WorkoutHistory>, Error> {
        let conn = get_conn(&self.pool).await?;
        let written = conn
            .interact(move |conn| WorkoutHistory::save_snapshot(conn, user_id, Utc::now()))
            .await??;

        Ok(written)
    }

    /// Appends one manually logged entry, bypassing the today list. Multiple
    /// logs of the same workout on the same day all land in the ledger.
    #[instrument(skip(self))]
    pub async fn log(&self, entry: NewWorkoutHistory) -> Result<WorkoutHistory, Error> {
        let conn = get_conn(&self.pool).await?;
        let history = conn
            .interact(move |conn| {
                Workout::try_fetch(conn, entry.workout_id)?.ok_or(Error::NotFound {
                    entity: "workout",
                    id: entry.workout_id,
                })?;
                WorkoutHistory::create(conn, entry)
            })
            .await??;

        Ok(history)
    }

    /// Drops every entry the user has on the given calendar date.
    #[instrument(skip(self))]
    pub async fn delete_for_date(&self, user_id: i64, date: NaiveDate) -> Result<usize, Error> {
        let conn = get_conn(&self.pool).await?;
        let deleted = conn
            .interact(move |conn| {
                Ok::<_, Error>(WorkoutHistory::delete_for_date(conn, user_id, date)?)
            })
            .await??;

        Ok(deleted)
    }

    /// The user's full ledger with workout names, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, user_id: i64) -> Result<Vec<HistoryEntry>, Error> {
        let conn = get_conn(&self.pool).await?;
        let entries = conn
            .interact(move |conn| {
                Ok::<_, Error>(WorkoutHistory::fetch_all_with_name(conn, user_id)?)
            })
            .await??;

        Ok(entries)
    }

    /// One day's entries with their full workout definitions, oldest first.
    #[instrument(skip(self))]
    pub async fn list_for_date(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<HistoryDetail>, Error> {
        let conn = get_conn(&self.pool).await?;
        let details = conn
            .interact(move |conn| {
                Ok::<_, Error>(WorkoutHistory::fetch_for_date_with_workout(
                    conn, user_id, date,
                )?)
            })
            .await??;

        Ok(details)
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use chrono::{DateTime, TimeZone};

    use super::{
        super::{test_support::*, TodayService},
        *,
    };

    fn entry(
        user_id: i64,
        workout_id: i64,
        date: DateTime<Utc>,
        sets: i64,
        reps: i64,
        weight: f64,
    ) -> NewWorkoutHistory {
        NewWorkoutHistory {
            workout_id,
            user_id,
            date,
            sets_completed: sets,
            reps_completed: reps,
            weight_used: weight,
            notes: None,
        }
    }

    #[tokio::test]
    async fn save_snapshots_the_current_today_list() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "ada").await;
        let squat = seed_workout(&pool, user.id, "Squat", 5, 5, 100.0).await;
        let bench = seed_workout(&pool, user.id, "Bench", 3, 8, 60.0).await;

        let today = TodayService::new(pool.clone());
        today.add(user.id, squat.id).await.expect("add squat");
        today.add(user.id, bench.id).await.expect("add bench");

        let history = HistoryService::new(pool);
        let written = history.save_today(user.id).await.expect("save");
        assert_eq!(written.len(), 2);

        let details = history
            .list_for_date(user.id, Utc::now().date_naive())
            .await
            .expect("list for date");
        assert_eq!(details.len(), 2);
        for detail in &details {
            assert_eq!(detail.history.sets_completed, detail.workout.sets);
            assert_eq!(detail.history.reps_completed, detail.workout.reps);
            assert_eq!(detail.history.weight_used, detail.workout.weight);
        }
    }

    #[tokio::test]
    async fn save_twice_with_unchanged_list_is_idempotent() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "ada").await;
        let squat = seed_workout(&pool, user.id, "Squat", 5, 5, 100.0).await;
        let bench = seed_workout(&pool, user.id, "Bench", 3, 8, 60.0).await;

        let today = TodayService::new(pool.clone());
        today.add(user.id, squat.id).await.expect("add squat");
        today.add(user.id, bench.id).await.expect("add bench");

        let history = HistoryService::new(pool);
        let first = history.save_today(user.id).await.expect("first save");
        let second = history.save_today(user.id).await.expect("second save");

        let key = |h: &WorkoutHistory| (h.workout_id, h.sets_completed, h.reps_completed, h.weight_used.to_bits());
        let first_keys: HashSet<_> = first.iter().map(key).collect();
        let second_keys: HashSet<_> = second.iter().map(key).collect();
        assert_eq!(first_keys, second_keys);

        // The ledger holds exactly one snapshot, not both
        let entries = history.list(user.id).await.expect("list");
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn resave_after_removal_replaces_the_day() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "ada").await;
        let squat = seed_workout(&pool, user.id, "Squat", 5, 5, 100.0).await;
        let bench = seed_workout(&pool, user.id, "Bench", 3, 8, 60.0).await;

        let today = TodayService::new(pool.clone());
        today.add(user.id, squat.id).await.expect("add squat");
        today.add(user.id, bench.id).await.expect("add bench");

        let history = HistoryService::new(pool);
        history.save_today(user.id).await.expect("first save");
        assert_eq!(history.list(user.id).await.expect("list").len(), 2);

        today.remove(user.id, bench.id).await.expect("remove bench");
        history.save_today(user.id).await.expect("second save");

        let details = history
            .list_for_date(user.id, Utc::now().date_naive())
            .await
            .expect("list for date");
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].workout.name, "Squat");
    }

    #[tokio::test]
    async fn list_joins_names_newest_first() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "ada").await;
        let squat = seed_workout(&pool, user.id, "Squat", 5, 5, 100.0).await;

        let history = HistoryService::new(pool);
        let d1 = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let d2 = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        history.log(entry(user.id, squat.id, d1, 5, 5, 100.0)).await.expect("log 1");
        history.log(entry(user.id, squat.id, d2, 5, 5, 102.5)).await.expect("log 2");

        let entries = history.list(user.id).await.expect("list");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].workout_name, "Squat");
        assert!(entries[0].history.date > entries[1].history.date);
    }

    #[tokio::test]
    async fn list_for_date_never_repeats_an_entry() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "ada").await;
        let squat = seed_workout(&pool, user.id, "Squat", 5, 5, 100.0).await;

        let history = HistoryService::new(pool);
        let morning = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2026, 3, 1, 19, 0, 0).unwrap();
        history.log(entry(user.id, squat.id, morning, 5, 5, 100.0)).await.expect("log 1");
        history.log(entry(user.id, squat.id, evening, 3, 5, 90.0)).await.expect("log 2");

        let details = history
            .list_for_date(user.id, morning.date_naive())
            .await
            .expect("list for date");
        assert_eq!(details.len(), 2);

        let ids: HashSet<_> = details.iter().map(|d| d.history.id).collect();
        assert_eq!(ids.len(), details.len());
        // Oldest first
        assert!(details[0].history.date < details[1].history.date);
    }

    #[tokio::test]
    async fn log_appends_without_duplicate_prevention() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "ada").await;
        let squat = seed_workout(&pool, user.id, "Squat", 5, 5, 100.0).await;

        let history = HistoryService::new(pool);
        let date = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        history.log(entry(user.id, squat.id, date, 5, 5, 100.0)).await.expect("log 1");
        history.log(entry(user.id, squat.id, date, 5, 5, 100.0)).await.expect("log 2");

        assert_eq!(history.list(user.id).await.expect("list").len(), 2);
    }

    #[tokio::test]
    async fn log_unknown_workout_is_not_found() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "ada").await;

        let history = HistoryService::new(pool);
        let err = history
            .log(entry(user.id, 999, Utc::now(), 5, 5, 100.0))
            .await
            .expect_err("log should fail");
        assert!(matches!(
            err,
            Error::NotFound { entity: "workout", id: 999 }
        ));
    }

    #[tokio::test]
    async fn delete_for_date_only_touches_that_date() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "ada").await;
        let squat = seed_workout(&pool, user.id, "Squat", 5, 5, 100.0).await;

        let history = HistoryService::new(pool);
        let d1 = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let d2 = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        history.log(entry(user.id, squat.id, d1, 5, 5, 100.0)).await.expect("log 1");
        history.log(entry(user.id, squat.id, d2, 5, 5, 102.5)).await.expect("log 2");

        let deleted = history
            .delete_for_date(user.id, d1.date_naive())
            .await
            .expect("delete");
        assert_eq!(deleted, 1);

        let remaining = history.list(user.id).await.expect("list");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].history.date, d2);
    }
}
