//! Concrete backends for the `IssueGateway` port.

pub mod live;
pub mod memory;

pub use live::LiveGateway;
pub use memory::MemoryGateway;
