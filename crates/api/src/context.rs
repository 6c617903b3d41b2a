use billing_auth::Caller;

/// Authenticated caller for a request.
///
/// Inserted by the auth middleware and required by every bill route; handlers
/// pass it explicitly into the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    caller: Caller,
}

impl CallerContext {
    pub fn new(caller: Caller) -> Self {
        Self { caller }
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }
}
