//! Request-independent orchestration that spans several collaborators.

pub mod submission;
