use sea_query::{Func, FunctionCall, Iden, SimpleExpr};

mod user;
pub use user::*;

mod workout;
pub use workout::*;

mod user_workout;
pub use user_workout::*;

mod workout_history;
pub use workout_history::*;

use crate::error::ValidationError;

pub trait ValidateModel {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// SQLite `date(...)`
#[derive(Iden)]
#[iden = "date"]
struct DateFn;

/// Truncates a datetime expression to its calendar date. Both sides of every
/// "same day" comparison go through this.
pub(crate) fn calendar_date<E: Into<SimpleExpr>>(expr: E) -> FunctionCall {
    Func::cust(DateFn).arg(expr)
}
