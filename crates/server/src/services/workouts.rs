use chrono::{NaiveDate, Utc};
use deadpool_sqlite::Pool;
use shared::{
    error::{Error, ValidationError},
    model::{NewWorkout, Workout, WorkoutHistory},
};
use tracing::instrument;

use super::get_conn;

/// CRUD over the workout definitions themselves.
#[derive(Debug, Clone)]
pub struct WorkoutService {
    pool: Pool,
}

impl WorkoutService {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, new_workout: NewWorkout) -> Result<Workout, Error> {
        let conn = get_conn(&self.pool).await?;
        let workout = conn
            .interact(move |conn| Workout::create(conn, new_workout))
            .await??;

        Ok(workout)
    }

    #[instrument(skip(self))]
    pub async fn fetch(&self, id: i64) -> Result<Workout, Error> {
        let conn = get_conn(&self.pool).await?;
        let workout = conn
            .interact(move |conn| {
                Workout::try_fetch(conn, id)?.ok_or(Error::NotFound { entity: "workout", id })
            })
            .await??;

        Ok(workout)
    }

    #[instrument(skip(self))]
    pub async fn list(&self, user_id: i64) -> Result<Vec<Workout>, Error> {
        let conn = get_conn(&self.pool).await?;
        let workouts = conn
            .interact(move |conn| Ok::<_, Error>(Workout::fetch_all_for_user(conn, user_id)?))
            .await??;

        Ok(workouts)
    }

    /// Writes back an edited definition. Editing a deleted workout fails
    /// with `NotFound`; history snapshots taken before the edit keep their
    /// old metrics.
    #[instrument(skip(self, workout))]
    pub async fn update(&self, workout: Workout) -> Result<Workout, Error> {
        let conn = get_conn(&self.pool).await?;
        let updated = conn
            .interact(move |conn| {
                Workout::try_fetch(conn, workout.id)?.ok_or(Error::NotFound {
                    entity: "workout",
                    id: workout.id,
                })?;

                let mut workout = workout;
                workout.last_updated_date = Utc::now();
                workout.update(conn)?;
                Ok::<_, Error>(Workout::fetch(conn, workout.id)?)
            })
            .await??;

        Ok(updated)
    }

    /// Deletes a definition. The delete is refused while ledger entries
    /// still reference the workout, since the history must stay joinable;
    /// entries on the today list just disappear with the workout.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), Error> {
        let conn = get_conn(&self.pool).await?;
        conn.interact(move |conn| {
            Workout::try_fetch(conn, id)?.ok_or(Error::NotFound { entity: "workout", id })?;

            let history_count = WorkoutHistory::count_for_workout(conn, id)?;
            if history_count > 0 {
                Err(ValidationError::new(format!(
                    "workout {id} has {history_count} history entries and cannot be deleted"
                )))?;
            }

            Workout::delete(conn, id)?;
            Ok::<_, Error>(())
        })
        .await??;

        Ok(())
    }

    /// Name substring search within the user's workouts.
    #[instrument(skip(self))]
    pub async fn search(&self, user_id: i64, term: String) -> Result<Vec<Workout>, Error> {
        let conn = get_conn(&self.pool).await?;
        let workouts = conn
            .interact(move |conn| Ok::<_, Error>(Workout::search(conn, user_id, term)?))
            .await??;

        Ok(workouts)
    }

    /// The user's workouts scheduled on a calendar date.
    #[instrument(skip(self))]
    pub async fn for_day(&self, user_id: i64, day: NaiveDate) -> Result<Vec<Workout>, Error> {
        let conn = get_conn(&self.pool).await?;
        let workouts = conn
            .interact(move |conn| Ok::<_, Error>(Workout::fetch_for_day(conn, user_id, day)?))
            .await??;

        Ok(workouts)
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;
    use shared::model::NewWorkoutHistory;

    use super::{
        super::{test_support::*, HistoryService, TodayService},
        *,
    };

    #[tokio::test]
    async fn create_rejects_invalid_definitions() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "ada").await;

        let workouts = WorkoutService::new(pool);
        let err = workouts
            .create(NewWorkout::new(user.id, "", Utc::now(), 0, 5, 100.0))
            .await
            .expect_err("create should fail");
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn update_of_deleted_workout_is_not_found() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "ada").await;
        let workout = seed_workout(&pool, user.id, "Squat", 5, 5, 100.0).await;

        let workouts = WorkoutService::new(pool);
        workouts.delete(workout.id).await.expect("delete");

        let err = workouts.update(workout).await.expect_err("update should fail");
        assert!(matches!(err, Error::NotFound { entity: "workout", .. }));
    }

    #[tokio::test]
    async fn update_refreshes_the_definition() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "ada").await;
        let workout = seed_workout(&pool, user.id, "Squat", 5, 5, 100.0).await;

        let workouts = WorkoutService::new(pool);
        let mut edited = workout.clone();
        edited.weight = 102.5;
        let updated = workouts.update(edited).await.expect("update");

        assert_eq!(updated.weight, 102.5);
        assert!(updated.last_updated_date >= workout.last_updated_date);
    }

    #[tokio::test]
    async fn delete_with_history_is_refused() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "ada").await;
        let workout = seed_workout(&pool, user.id, "Squat", 5, 5, 100.0).await;

        let history = HistoryService::new(pool.clone());
        history
            .log(NewWorkoutHistory {
                workout_id: workout.id,
                user_id: user.id,
                date: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
                sets_completed: 5,
                reps_completed: 5,
                weight_used: 100.0,
                notes: None,
            })
            .await
            .expect("log");

        let workouts = WorkoutService::new(pool);
        let err = workouts.delete(workout.id).await.expect_err("delete should fail");
        assert!(matches!(err, Error::Validation(_)));

        // Still fetchable, history still joinable
        workouts.fetch(workout.id).await.expect("fetch");
        assert_eq!(history.list(user.id).await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn delete_clears_today_list_entries() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "ada").await;
        let workout = seed_workout(&pool, user.id, "Squat", 5, 5, 100.0).await;

        let today = TodayService::new(pool.clone());
        today.add(user.id, workout.id).await.expect("add");

        let workouts = WorkoutService::new(pool);
        workouts.delete(workout.id).await.expect("delete");

        assert!(today.list(user.id).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn search_matches_name_substring() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "ada").await;
        seed_workout(&pool, user.id, "Back Squat", 5, 5, 100.0).await;
        seed_workout(&pool, user.id, "Front Squat", 5, 3, 80.0).await;
        seed_workout(&pool, user.id, "Bench", 3, 8, 60.0).await;

        let workouts = WorkoutService::new(pool);
        let found = workouts
            .search(user.id, "Squat".to_owned())
            .await
            .expect("search");
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|w| w.name.contains("Squat")));
    }

    #[tokio::test]
    async fn for_day_filters_by_calendar_date() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "ada").await;

        let workouts = WorkoutService::new(pool);
        let monday = Utc.with_ymd_and_hms(2026, 3, 2, 7, 0, 0).unwrap();
        let tuesday = Utc.with_ymd_and_hms(2026, 3, 3, 7, 0, 0).unwrap();
        workouts
            .create(NewWorkout::new(user.id, "Squat", monday, 5, 5, 100.0))
            .await
            .expect("create squat");
        workouts
            .create(NewWorkout::new(user.id, "Bench", tuesday, 3, 8, 60.0))
            .await
            .expect("create bench");

        let scheduled = workouts
            .for_day(user.id, monday.date_naive())
            .await
            .expect("for day");
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].name, "Squat");
    }
}
