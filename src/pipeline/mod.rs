//! The dialogue pipeline: internal events, intent dispatch and the
//! coordinator that sequences them.

pub mod coordinator;
pub mod dispatch;
pub mod messages;
