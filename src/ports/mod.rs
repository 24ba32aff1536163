//! Port traits defining external boundaries.
//!
//! The gateway trait represents the boundary between the tool layer and
//! the remote issue tracker. Implementations live in `src/adapters/`.

pub mod gateway;

pub use gateway::{
    Account, Comment, CustomField, FieldUpdate, GatewayFuture, Issue, IssueGateway, IssueLink,
    LinkType, LinkedIssue, Project, Tag,
};
