use deadpool_sqlite::{Object, Pool};
use shared::error::Error;

mod workouts;
pub use workouts::*;

mod today;
pub use today::*;

mod history;
pub use history::*;

mod progress;
pub use progress::*;

pub(crate) async fn get_conn(pool: &Pool) -> Result<Object, Error> {
    pool.get().await.map_err(|e| Error::Pool(e.to_string()))
}
