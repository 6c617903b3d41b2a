//! Bill visibility and ownership rules.
//!
//! Pure policy checks: no IO, no panics.

use thiserror::Error;

use billing_core::UserId;

use crate::Caller;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Access denied: {0}")]
pub struct AccessDenied(pub String);

/// Admins may act on any bill; everyone else only on bills they own.
pub fn ensure_owner_or_admin(caller: &Caller, owner: UserId) -> Result<(), AccessDenied> {
    if caller.is_admin() || caller.user_id == owner {
        Ok(())
    } else {
        Err(AccessDenied("You can only view your own bills".to_string()))
    }
}

pub fn ensure_admin(caller: &Caller) -> Result<(), AccessDenied> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(AccessDenied(
            "Only admins can view other users' bills".to_string(),
        ))
    }
}

/// A non-admin may only place orders billed to themselves.
pub fn ensure_can_order_for(caller: &Caller, user_id: UserId) -> Result<(), AccessDenied> {
    if caller.is_admin() || caller.user_id == user_id {
        Ok(())
    } else {
        Err(AccessDenied(
            "You can only create bills for yourself".to_string(),
        ))
    }
}
