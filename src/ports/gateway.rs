//! Issue-tracker gateway port and the backend entity types that cross it.
//!
//! The gateway is the only boundary to the remote tracker. Every optional
//! backend attribute is modeled as an explicit `Option` field so callers
//! never probe for presence at runtime; a partially populated payload
//! deserializes into `None`s instead of failing.

use std::error::Error;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Boxed future type alias used by [`IssueGateway`] to keep the trait
/// dyn-compatible.
pub type GatewayFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, Box<dyn Error + Send + Sync>>> + Send + 'a>>;

/// An issue as the backend reports it.
///
/// Timestamps are ISO-8601 strings (adapters render the backend's native
/// representation before the value crosses this boundary) or absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Issue {
    /// Internal identifier (e.g. `"2-42"`).
    pub id: String,
    /// Human-readable identifier (e.g. `"DEMO-1"`).
    pub id_readable: Option<String>,
    /// One-line summary.
    pub summary: Option<String>,
    /// Full description text.
    pub description: Option<String>,
    /// Description rendered through the tracker's wiki markup.
    pub wikified_description: Option<String>,
    /// Owning project.
    pub project: Option<Project>,
    /// Creation timestamp.
    pub created: Option<String>,
    /// Last-update timestamp.
    pub updated: Option<String>,
    /// Resolution timestamp, when resolved.
    pub resolved: Option<String>,
    /// Account that reported the issue.
    pub reporter: Option<Account>,
    /// Account that last updated the issue.
    pub updater: Option<Account>,
    /// Number of comments on the issue.
    pub comments_count: Option<i64>,
    /// Tags attached to the issue, when the payload includes them.
    pub tags: Option<Vec<Tag>>,
    /// Custom fields, when the payload includes them.
    pub custom_fields: Option<Vec<CustomField>>,
}

/// A project reference on an issue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    /// Project identifier.
    pub id: String,
    /// Project display name.
    pub name: Option<String>,
}

/// A user account reference (reporter, updater, comment author).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Account {
    /// Display name.
    pub name: Option<String>,
    /// Login handle.
    pub login: Option<String>,
}

/// A custom field on an issue.
///
/// `value` is kept as raw JSON: the backend encodes a dozen field types
/// with different value shapes (scalar, object, list of objects) and the
/// normalization layer is the single place that interprets them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomField {
    /// Field identifier.
    pub id: String,
    /// Field display name.
    pub name: String,
    /// Canonical field kind string (e.g. `"enum"`, `"user[]"`, `"state"`),
    /// absent when the backend did not report one.
    pub kind: Option<String>,
    /// Raw field value.
    pub value: Option<Value>,
}

/// A replacement value for one custom field, submitted on update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldUpdate {
    /// Identifier of the field being updated.
    pub id: String,
    /// Display name of the field being updated.
    pub name: String,
    /// Canonical kind string of the field being updated.
    pub kind: Option<String>,
    /// New value, already shaped for the field's kind.
    pub value: Value,
}

/// A comment on an issue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Comment {
    /// Comment identifier.
    pub id: String,
    /// Comment body text.
    pub text: Option<String>,
    /// Shortened preview of the body.
    pub text_preview: Option<String>,
    /// Creation timestamp.
    pub created: Option<String>,
    /// Last-update timestamp.
    pub updated: Option<String>,
    /// Comment author.
    pub author: Option<Account>,
    /// Whether the comment is marked deleted.
    pub deleted: Option<bool>,
}

/// A tag known to the tracker. Tag existence is global; attachment to an
/// issue is many-to-many.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tag {
    /// Tag identifier.
    pub id: String,
    /// Tag display name.
    pub name: Option<String>,
}

/// A directed, typed link from one issue to others.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueLink {
    /// The named relation (e.g. "depends on").
    pub link_type: Option<LinkType>,
    /// Link direction as the backend reports it.
    pub direction: Option<String>,
    /// Issues on the other end of the link.
    pub issues: Option<Vec<LinkedIssue>>,
}

/// The named relation of an [`IssueLink`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkType {
    /// Relation name.
    pub name: Option<String>,
    /// Relation identifier.
    pub id: Option<String>,
}

/// A lightweight reference to an issue on the far side of a link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkedIssue {
    /// Internal identifier.
    pub id: String,
    /// Human-readable identifier.
    pub id_readable: Option<String>,
    /// One-line summary.
    pub summary: Option<String>,
}

/// Remote issue-tracker operations.
///
/// All calls are potentially slow and may fail; callers own timeout and
/// recovery policy. Implementations live in `src/adapters/`.
pub trait IssueGateway: Send + Sync {
    /// Searches issues with the tracker's own query syntax. The query
    /// string is passed through opaquely.
    fn get_issues(&self, query: &str) -> GatewayFuture<'_, Vec<Issue>>;

    /// Fetches one issue by id, or `None` when it does not exist.
    fn get_issue(&self, issue_id: &str) -> GatewayFuture<'_, Option<Issue>>;

    /// Fetches the custom fields of one issue.
    fn get_issue_custom_fields(&self, issue_id: &str) -> GatewayFuture<'_, Vec<CustomField>>;

    /// Fetches the comments of one issue, oldest first.
    fn get_issue_comments(&self, issue_id: &str) -> GatewayFuture<'_, Vec<Comment>>;

    /// Creates a comment on an issue and returns it as stored.
    fn create_issue_comment(&self, issue_id: &str, text: &str) -> GatewayFuture<'_, Comment>;

    /// Submits a replacement value for one custom field and returns the
    /// field as stored after the update.
    fn update_issue_custom_field(
        &self,
        issue_id: &str,
        field: &FieldUpdate,
    ) -> GatewayFuture<'_, CustomField>;

    /// Fetches the links of one issue.
    fn get_issue_links(&self, issue_id: &str) -> GatewayFuture<'_, Vec<IssueLink>>;

    /// Fetches the tracker's global tag catalog.
    fn get_tags(&self) -> GatewayFuture<'_, Vec<Tag>>;

    /// Attaches an existing tag to an issue.
    fn add_issue_tag(&self, issue_id: &str, tag: &Tag) -> GatewayFuture<'_, ()>;

    /// Detaches a tag from an issue by tag id.
    fn remove_issue_tag(&self, issue_id: &str, tag_id: &str) -> GatewayFuture<'_, ()>;
}
