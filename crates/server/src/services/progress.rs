use deadpool_sqlite::Pool;
use shared::{
    error::Error,
    model::{Workout, WorkoutHistory},
};
use tracing::instrument;

use super::get_conn;

/// Read-only projections over the history ledger for trend display.
#[derive(Debug, Clone)]
pub struct ProgressService {
    pool: Pool,
}

impl ProgressService {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// The workouts the user has logged at least once, sorted by name.
    #[instrument(skip(self))]
    pub async fn logged_workouts(&self, user_id: i64) -> Result<Vec<Workout>, Error> {
        let conn = get_conn(&self.pool).await?;
        let workouts = conn
            .interact(move |conn| Ok::<_, Error>(WorkoutHistory::distinct_workouts(conn, user_id)?))
            .await??;

        Ok(workouts)
    }

    /// One workout's history in ascending date order; the caller charts the
    /// recorded weight and the derived volume per point.
    #[instrument(skip(self))]
    pub async fn series(
        &self,
        user_id: i64,
        workout_id: i64,
    ) -> Result<Vec<WorkoutHistory>, Error> {
        let conn = get_conn(&self.pool).await?;
        let series = conn
            .interact(move |conn| {
                Ok::<_, Error>(WorkoutHistory::fetch_series(conn, user_id, workout_id)?)
            })
            .await??;

        Ok(series)
    }
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};
    use shared::model::NewWorkoutHistory;

    use super::{
        super::{test_support::*, HistoryService},
        *,
    };

    #[tokio::test]
    async fn series_is_date_ascending_with_volume() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "ada").await;
        let squat = seed_workout(&pool, user.id, "Squat", 5, 5, 100.0).await;

        let history = HistoryService::new(pool.clone());
        // Logged out of order on three distinct days
        for (day, weight) in [(2, 102.5), (1, 100.0), (3, 105.0)] {
            history
                .log(NewWorkoutHistory {
                    workout_id: squat.id,
                    user_id: user.id,
                    date: Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap(),
                    sets_completed: 5,
                    reps_completed: 5,
                    weight_used: weight,
                    notes: None,
                })
                .await
                .expect("log");
        }

        let progress = ProgressService::new(pool);
        let series = progress.series(user.id, squat.id).await.expect("series");

        assert_eq!(series.len(), 3);
        assert!(series.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(
            series.iter().map(|h| h.weight_used).collect::<Vec<_>>(),
            vec![100.0, 102.5, 105.0]
        );
        assert_eq!(
            series.iter().map(|h| h.volume()).collect::<Vec<_>>(),
            vec![2500.0, 2562.5, 2625.0]
        );
    }

    #[tokio::test]
    async fn logged_workouts_are_distinct_and_sorted_by_name() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "ada").await;
        let squat = seed_workout(&pool, user.id, "Squat", 5, 5, 100.0).await;
        let bench = seed_workout(&pool, user.id, "Bench", 3, 8, 60.0).await;
        let never_logged = seed_workout(&pool, user.id, "Deadlift", 1, 5, 140.0).await;

        let history = HistoryService::new(pool.clone());
        for (workout_id, day) in [(squat.id, 1), (squat.id, 2), (bench.id, 1)] {
            history
                .log(NewWorkoutHistory {
                    workout_id,
                    user_id: user.id,
                    date: Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap(),
                    sets_completed: 3,
                    reps_completed: 5,
                    weight_used: 80.0,
                    notes: None,
                })
                .await
                .expect("log");
        }

        let progress = ProgressService::new(pool);
        let logged = progress.logged_workouts(user.id).await.expect("logged");

        let names: Vec<_> = logged.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Bench", "Squat"]);
        assert!(!logged.iter().any(|w| w.id == never_logged.id));
    }
}
