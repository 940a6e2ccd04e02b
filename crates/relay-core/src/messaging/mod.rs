//! Messenger abstractions: the port, its throttling decorator and the
//! rich-then-plain outbound dispatcher.

pub mod outbound;
pub mod port;
pub mod throttled;
pub mod types;
