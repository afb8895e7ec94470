use shared::error::Error;

/// The caller's resolved identity. The request layer builds one of these
/// from whatever transport-level session it manages and passes it in;
/// nothing below this type ever looks at ambient session state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Identity {
    user_id: Option<i64>,
}

impl Identity {
    pub fn user(user_id: i64) -> Self {
        Self { user_id: Some(user_id) }
    }

    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    /// The authenticated user id, or `NotAuthenticated` when the request
    /// carried no resolvable user.
    pub fn user_id(&self) -> Result<i64, Error> {
        self.user_id.ok_or(Error::NotAuthenticated)
    }
}
