//! REST-backed gateway adapter.

mod gateway;

pub use gateway::LiveGateway;
