//! API handlers for the portal service.

pub mod health;
