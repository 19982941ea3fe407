pub mod balloon;
pub mod schedule;
