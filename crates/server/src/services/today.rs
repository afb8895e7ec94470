use deadpool_sqlite::Pool;
use shared::{
    error::Error,
    model::{UserWorkout, Workout},
};
use tracing::instrument;

use super::get_conn;

/// The user's "today's workouts" list: a dateless set of chosen workouts
/// that the history save turns into ledger entries.
#[derive(Debug, Clone)]
pub struct TodayService {
    pool: Pool,
}

impl TodayService {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Puts a workout on the list. The workout must exist; re-adding a
    /// listed workout changes nothing.
    #[instrument(skip(self))]
    pub async fn add(&self, user_id: i64, workout_id: i64) -> Result<(), Error> {
        let conn = get_conn(&self.pool).await?;
        conn.interact(move |conn| {
            Workout::try_fetch(conn, workout_id)?.ok_or(Error::NotFound {
                entity: "workout",
                id: workout_id,
            })?;
            UserWorkout::upsert(conn, user_id, workout_id)?;
            Ok::<_, Error>(())
        })
        .await??;

        Ok(())
    }

    /// Takes a workout off the list; removing one that isn't listed is a
    /// no-op. Store failures surface to the caller.
    #[instrument(skip(self))]
    pub async fn remove(&self, user_id: i64, workout_id: i64) -> Result<(), Error> {
        let conn = get_conn(&self.pool).await?;
        conn.interact(move |conn| {
            UserWorkout::remove(conn, user_id, workout_id)?;
            Ok::<_, Error>(())
        })
        .await??;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list(&self, user_id: i64) -> Result<Vec<Workout>, Error> {
        let conn = get_conn(&self.pool).await?;
        let workouts = conn
            .interact(move |conn| Ok::<_, Error>(UserWorkout::selected_workouts(conn, user_id)?))
            .await??;

        Ok(workouts)
    }
}
