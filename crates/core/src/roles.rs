//! Well-known role name constants.
//!
//! These must match the seed data in the `users` table migration.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_COLLECTOR: &str = "collector";
pub const ROLE_ANALYST: &str = "analyst";
