//! Message router: one handler per inbound message kind.

pub mod dispatcher;

pub use dispatcher::Dispatcher;
