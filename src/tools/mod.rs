//! Tool dispatch over the issue gateway.
//!
//! Each tool is a typed operation that calls the gateway under a shared
//! concurrency bound and a per-call timeout, then shapes the result into
//! the stable response forms. [`ToolDispatcher::call_tool`] exposes the
//! same operations under stable string ids for transports and runners.
//!
//! Read tools degrade: a failed or unconfigured backend yields an empty
//! or null result and an error log, never an error to the caller.
//! Mutating tools report failure explicitly through the
//! `{success, error}` envelope.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use crate::normalize::{normalize_field, FieldKind, NormalizedField};
use crate::ports::{CustomField, FieldUpdate, GatewayFuture, Issue, IssueGateway, Tag};
use crate::project::{project_comment, project_issue_detail, project_issue_summary, CommentView, IssueDetail, IssueSummary};

/// Upper bound on concurrent gateway calls across all tools.
pub const MAX_CONCURRENT_CALLS: usize = 10;

/// Per-call timeout applied on top of the gateway's own transport timeout.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Issue count returned by a search when the caller gives no limit.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Stable tool identifiers, in registry order.
pub const TOOL_NAMES: [&str; 8] = [
    "get_issues",
    "get_issue_details",
    "get_issue_custom_fields",
    "get_issue_comments",
    "comment_issue",
    "update_field",
    "set_issue_tags",
    "remove_issue_tags",
];

type GatewayError = Box<dyn std::error::Error + Send + Sync>;

/// Routes tool calls to an optional issue gateway.
pub struct ToolDispatcher {
    gateway: Option<Arc<dyn IssueGateway>>,
    permits: Arc<Semaphore>,
    call_timeout: Duration,
}

impl ToolDispatcher {
    /// Creates a dispatcher. Passing `None` yields a dispatcher whose read
    /// tools return empty results and whose mutations report failure.
    #[must_use]
    pub fn new(gateway: Option<Arc<dyn IssueGateway>>) -> Self {
        Self {
            gateway,
            permits: Arc::new(Semaphore::new(MAX_CONCURRENT_CALLS)),
            call_timeout: CALL_TIMEOUT,
        }
    }

    /// Overrides the per-call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Runs one gateway future under the concurrency bound and timeout.
    async fn bounded<T>(&self, call: GatewayFuture<'_, T>) -> Result<T, GatewayError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| "dispatcher shut down")?;
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err("backend call timed out".into()),
        }
    }

    fn gateway(&self) -> Option<&Arc<dyn IssueGateway>> {
        if self.gateway.is_none() {
            error!("tracker gateway not configured, serving degraded response");
        }
        self.gateway.as_ref()
    }

    /// Searches issues and projects the first `limit` hits, in backend
    /// order. Failures degrade to an empty list.
    pub async fn get_issues(&self, query: &str, limit: usize) -> Vec<IssueSummary> {
        let Some(gateway) = self.gateway() else {
            return Vec::new();
        };
        match self.bounded(gateway.get_issues(query)).await {
            Ok(issues) => issues
                .iter()
                .take(limit)
                .map(project_issue_summary)
                .collect(),
            Err(e) => {
                error!(query, error = %e, "issue search failed");
                Vec::new()
            }
        }
    }

    /// Fetches one issue with normalized custom fields and its links.
    /// Returns `None` when the issue does not exist or the backend fails;
    /// a link fetch failure alone degrades to a detail without links.
    pub async fn get_issue_details(&self, issue_id: &str) -> Option<IssueDetail> {
        let gateway = self.gateway()?;
        let issue = match self.bounded(gateway.get_issue(issue_id)).await {
            Ok(found) => found?,
            Err(e) => {
                error!(issue_id, error = %e, "issue detail fetch failed");
                return None;
            }
        };
        let links = match self.bounded(gateway.get_issue_links(issue_id)).await {
            Ok(links) => Some(links),
            Err(e) => {
                warn!(issue_id, error = %e, "issue link fetch failed, omitting links");
                None
            }
        };
        Some(project_issue_detail(&issue, links.as_deref()))
    }

    /// Fetches and normalizes the custom fields of one issue. Failures
    /// degrade to an empty list.
    pub async fn get_issue_custom_fields(&self, issue_id: &str) -> Vec<NormalizedField> {
        let Some(gateway) = self.gateway() else {
            return Vec::new();
        };
        match self.bounded(gateway.get_issue_custom_fields(issue_id)).await {
            Ok(fields) => fields.iter().map(normalize_field).collect(),
            Err(e) => {
                error!(issue_id, error = %e, "custom field fetch failed");
                Vec::new()
            }
        }
    }

    /// Fetches the comments of one issue. Failures degrade to an empty
    /// list.
    pub async fn get_issue_comments(&self, issue_id: &str) -> Vec<CommentView> {
        let Some(gateway) = self.gateway() else {
            return Vec::new();
        };
        match self.bounded(gateway.get_issue_comments(issue_id)).await {
            Ok(comments) => comments
                .iter()
                .map(|comment| project_comment(issue_id, comment))
                .collect(),
            Err(e) => {
                error!(issue_id, error = %e, "comment fetch failed");
                Vec::new()
            }
        }
    }

    /// Posts a comment and reports the stored comment in the success
    /// envelope.
    pub async fn comment_issue(&self, issue_id: &str, text: &str) -> Value {
        let Some(gateway) = self.gateway() else {
            return failure("Tracker connection is not configured");
        };
        match self.bounded(gateway.create_issue_comment(issue_id, text)).await {
            Ok(comment) => {
                debug!(issue_id, comment_id = %comment.id, "comment created");
                json!({
                    "success": true,
                    "comment_id": comment.id,
                    "text": comment.text,
                    "created": comment.created,
                    "author": comment.author.map(|a| json!({"name": a.name, "login": a.login})),
                })
            }
            Err(e) => {
                error!(issue_id, error = %e, "comment creation failed");
                failure(&format!("Failed to add comment: {e}"))
            }
        }
    }

    /// Updates one custom field of an issue.
    ///
    /// The target field is looked up among the issue's current fields by
    /// id first, then by exact name. An unknown field reports failure
    /// without touching the backend. String values for single-select
    /// kinds are wrapped into the name-bundle shape the backend expects.
    pub async fn update_field(&self, issue_id: &str, field_id: &str, value: &Value) -> Value {
        let Some(gateway) = self.gateway() else {
            return failure("Tracker connection is not configured");
        };
        let fields = match self.bounded(gateway.get_issue_custom_fields(issue_id)).await {
            Ok(fields) => fields,
            Err(e) => {
                error!(issue_id, field_id, error = %e, "field lookup failed");
                return failure(&format!("Failed to update field: {e}"));
            }
        };
        let Some(target) = find_field(&fields, field_id) else {
            return failure(&format!("Field {field_id} not found"));
        };
        let update = FieldUpdate {
            id: target.id.clone(),
            name: target.name.clone(),
            kind: target.kind.clone(),
            value: coerce_update_value(target.kind.as_deref(), value),
        };
        match self.bounded(gateway.update_issue_custom_field(issue_id, &update)).await {
            Ok(updated) => {
                let normalized = normalize_field(&updated);
                json!({
                    "success": true,
                    "field_id": normalized.id,
                    "field_name": normalized.name,
                    "updated_value": normalized.value,
                })
            }
            Err(e) => {
                error!(issue_id, field_id, error = %e, "field update failed");
                failure(&format!("Failed to update field: {e}"))
            }
        }
    }

    /// Attaches catalog tags to an issue by name.
    ///
    /// Names already on the issue or absent from the tag catalog are
    /// skipped; the rest are added one by one. `added` and `skipped` are
    /// deduplicated and together cover the request exactly.
    pub async fn set_issue_tags(&self, issue_id: &str, tag_names: &[String]) -> Value {
        let Some(gateway) = self.gateway() else {
            return failure("Tracker connection is not configured");
        };
        let existing = match self.bounded(gateway.get_issue(issue_id)).await {
            Ok(issue) => issue.as_ref().map(issue_tag_names).unwrap_or_default(),
            Err(e) => {
                error!(issue_id, error = %e, "issue fetch failed");
                return failure(&format!("Failed to set tags: {e}"));
            }
        };
        let catalog = match self.bounded(gateway.get_tags()).await {
            Ok(tags) => tags,
            Err(e) => {
                error!(issue_id, error = %e, "tag catalog fetch failed");
                return failure(&format!("Failed to set tags: {e}"));
            }
        };
        let mut added: Vec<String> = Vec::new();
        let mut skipped: Vec<String> = Vec::new();
        for name in tag_names {
            if added.contains(name) || skipped.contains(name) {
                continue;
            }
            if existing.contains(name) {
                skipped.push(name.clone());
                continue;
            }
            let Some(tag) = catalog_tag(&catalog, name) else {
                warn!(issue_id, tag = %name, "tag not in catalog, skipping");
                skipped.push(name.clone());
                continue;
            };
            if let Err(e) = self.bounded(gateway.add_issue_tag(issue_id, tag)).await {
                error!(issue_id, tag = %name, error = %e, "tag add failed");
                return failure(&format!("Failed to set tags: {e}"));
            }
            added.push(name.clone());
        }
        json!({
            "success": true,
            "issue_id": issue_id,
            "added_tags": added,
            "skipped_tags": skipped,
        })
    }

    /// Detaches tags from an issue by name. Names not currently on the
    /// issue are skipped.
    pub async fn remove_issue_tags(&self, issue_id: &str, tag_names: &[String]) -> Value {
        let Some(gateway) = self.gateway() else {
            return failure("Tracker connection is not configured");
        };
        let attached = match self.bounded(gateway.get_issue(issue_id)).await {
            Ok(issue) => issue.and_then(|i| i.tags).unwrap_or_default(),
            Err(e) => {
                error!(issue_id, error = %e, "issue fetch failed");
                return failure(&format!("Failed to remove tags: {e}"));
            }
        };
        let mut removed: Vec<String> = Vec::new();
        let mut skipped: Vec<String> = Vec::new();
        for name in tag_names {
            if removed.contains(name) || skipped.contains(name) {
                continue;
            }
            let Some(tag) = attached.iter().find(|t| t.name.as_ref() == Some(name)) else {
                skipped.push(name.clone());
                continue;
            };
            if let Err(e) = self.bounded(gateway.remove_issue_tag(issue_id, &tag.id)).await {
                error!(issue_id, tag = %name, error = %e, "tag removal failed");
                return failure(&format!("Failed to remove tags: {e}"));
            }
            removed.push(name.clone());
        }
        json!({
            "success": true,
            "issue_id": issue_id,
            "removed_tags": removed,
            "skipped_tags": skipped,
        })
    }

    /// Invokes a tool by its stable id with a JSON argument object.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown tool id or missing/ill-typed
    /// arguments. Backend failures do not surface here; they are folded
    /// into the tool's own degraded or envelope response.
    pub async fn call_tool(&self, name: &str, args: &Value) -> Result<Value, String> {
        match name {
            "get_issues" => {
                let query = require_str(args, "query")?;
                let limit = args
                    .get("limit")
                    .and_then(Value::as_u64)
                    .and_then(|n| usize::try_from(n).ok())
                    .unwrap_or(DEFAULT_SEARCH_LIMIT);
                to_json(&self.get_issues(query, limit).await)
            }
            "get_issue_details" => {
                let issue_id = require_str(args, "issue_id")?;
                to_json(&self.get_issue_details(issue_id).await)
            }
            "get_issue_custom_fields" => {
                let issue_id = require_str(args, "issue_id")?;
                to_json(&self.get_issue_custom_fields(issue_id).await)
            }
            "get_issue_comments" => {
                let issue_id = require_str(args, "issue_id")?;
                to_json(&self.get_issue_comments(issue_id).await)
            }
            "comment_issue" => {
                let issue_id = require_str(args, "issue_id")?;
                let text = require_str(args, "text")?;
                Ok(self.comment_issue(issue_id, text).await)
            }
            "update_field" => {
                let issue_id = require_str(args, "issue_id")?;
                let field_id = require_str(args, "field_id")?;
                let value = args.get("field_value").cloned().unwrap_or(Value::Null);
                Ok(self.update_field(issue_id, field_id, &value).await)
            }
            "set_issue_tags" => {
                let issue_id = require_str(args, "issue_id")?;
                let tags = require_str_list(args, "tags")?;
                Ok(self.set_issue_tags(issue_id, &tags).await)
            }
            "remove_issue_tags" => {
                let issue_id = require_str(args, "issue_id")?;
                let tags = require_str_list(args, "tags")?;
                Ok(self.remove_issue_tags(issue_id, &tags).await)
            }
            other => Err(format!("Unknown tool: {other}")),
        }
    }
}

/// Builds the `{success: false, error}` envelope.
#[must_use]
pub fn failure(message: &str) -> Value {
    json!({ "success": false, "error": message })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| format!("failed to encode tool result: {e}"))
}

fn require_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, String> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing or invalid '{key}' argument"))
}

fn require_str_list(args: &Value, key: &str) -> Result<Vec<String>, String> {
    let items = args
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| format!("missing or invalid '{key}' argument"))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("'{key}' must be a list of strings"))
        })
        .collect()
}

fn find_field<'a>(fields: &'a [CustomField], field_id: &str) -> Option<&'a CustomField> {
    fields
        .iter()
        .find(|f| f.id == field_id)
        .or_else(|| fields.iter().find(|f| f.name == field_id))
}

/// Wraps plain string values into the bundle-element shape that single
/// and multi select kinds expect. Structured values pass through as
/// given.
fn coerce_update_value(kind: Option<&str>, value: &Value) -> Value {
    let Some(text) = value.as_str() else {
        return value.clone();
    };
    match kind.and_then(FieldKind::parse) {
        Some(FieldKind::SingleEnum | FieldKind::State) => json!({ "name": text }),
        Some(FieldKind::MultiEnum) => json!([{ "name": text }]),
        _ => value.clone(),
    }
}

fn issue_tag_names(issue: &Issue) -> Vec<String> {
    issue
        .tags
        .iter()
        .flatten()
        .filter_map(|tag| tag.name.clone())
        .collect()
}

fn catalog_tag<'a>(catalog: &'a [Tag], name: &str) -> Option<&'a Tag> {
    catalog.iter().find(|tag| tag.name.as_deref() == Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryGateway;
    use crate::ports::{Comment, IssueGateway};
    use serde_json::json;

    struct FailingGateway;

    impl IssueGateway for FailingGateway {
        fn get_issues(&self, _query: &str) -> GatewayFuture<'_, Vec<Issue>> {
            Box::pin(async { Err("backend unreachable".into()) })
        }
        fn get_issue(&self, _issue_id: &str) -> GatewayFuture<'_, Option<Issue>> {
            Box::pin(async { Err("backend unreachable".into()) })
        }
        fn get_issue_custom_fields(&self, _issue_id: &str) -> GatewayFuture<'_, Vec<CustomField>> {
            Box::pin(async { Err("backend unreachable".into()) })
        }
        fn get_issue_comments(&self, _issue_id: &str) -> GatewayFuture<'_, Vec<Comment>> {
            Box::pin(async { Err("backend unreachable".into()) })
        }
        fn create_issue_comment(&self, _issue_id: &str, _text: &str) -> GatewayFuture<'_, Comment> {
            Box::pin(async { Err("backend unreachable".into()) })
        }
        fn update_issue_custom_field(
            &self,
            _issue_id: &str,
            _field: &FieldUpdate,
        ) -> GatewayFuture<'_, CustomField> {
            Box::pin(async { Err("backend unreachable".into()) })
        }
        fn get_issue_links(&self, _issue_id: &str) -> GatewayFuture<'_, Vec<crate::ports::IssueLink>> {
            Box::pin(async { Err("backend unreachable".into()) })
        }
        fn get_tags(&self) -> GatewayFuture<'_, Vec<Tag>> {
            Box::pin(async { Err("backend unreachable".into()) })
        }
        fn add_issue_tag(&self, _issue_id: &str, _tag: &Tag) -> GatewayFuture<'_, ()> {
            Box::pin(async { Err("backend unreachable".into()) })
        }
        fn remove_issue_tag(&self, _issue_id: &str, _tag_id: &str) -> GatewayFuture<'_, ()> {
            Box::pin(async { Err("backend unreachable".into()) })
        }
    }

    struct SlowGateway;

    impl IssueGateway for SlowGateway {
        fn get_issues(&self, _query: &str) -> GatewayFuture<'_, Vec<Issue>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok(Vec::new())
            })
        }
        fn get_issue(&self, _issue_id: &str) -> GatewayFuture<'_, Option<Issue>> {
            Box::pin(async { Ok(None) })
        }
        fn get_issue_custom_fields(&self, _issue_id: &str) -> GatewayFuture<'_, Vec<CustomField>> {
            Box::pin(async { Ok(Vec::new()) })
        }
        fn get_issue_comments(&self, _issue_id: &str) -> GatewayFuture<'_, Vec<Comment>> {
            Box::pin(async { Ok(Vec::new()) })
        }
        fn create_issue_comment(&self, _issue_id: &str, _text: &str) -> GatewayFuture<'_, Comment> {
            Box::pin(async { Ok(Comment::default()) })
        }
        fn update_issue_custom_field(
            &self,
            _issue_id: &str,
            _field: &FieldUpdate,
        ) -> GatewayFuture<'_, CustomField> {
            Box::pin(async { Ok(CustomField::default()) })
        }
        fn get_issue_links(&self, _issue_id: &str) -> GatewayFuture<'_, Vec<crate::ports::IssueLink>> {
            Box::pin(async { Ok(Vec::new()) })
        }
        fn get_tags(&self) -> GatewayFuture<'_, Vec<Tag>> {
            Box::pin(async { Ok(Vec::new()) })
        }
        fn add_issue_tag(&self, _issue_id: &str, _tag: &Tag) -> GatewayFuture<'_, ()> {
            Box::pin(async { Ok(()) })
        }
        fn remove_issue_tag(&self, _issue_id: &str, _tag_id: &str) -> GatewayFuture<'_, ()> {
            Box::pin(async { Ok(()) })
        }
    }

    fn issue(id: &str, readable: &str, summary: &str) -> Issue {
        Issue {
            id: id.to_string(),
            id_readable: Some(readable.to_string()),
            summary: Some(summary.to_string()),
            ..Issue::default()
        }
    }

    fn memory_dispatcher(gateway: MemoryGateway) -> ToolDispatcher {
        ToolDispatcher::new(Some(Arc::new(gateway)))
    }

    #[tokio::test]
    async fn search_truncates_to_limit_in_order() {
        let gateway = MemoryGateway::new();
        for n in 1..=8 {
            gateway.add_issue(issue(&format!("2-{n}"), &format!("DEMO-{n}"), "issue"));
        }
        let dispatcher = memory_dispatcher(gateway);

        let hits = dispatcher.get_issues("project: DEMO", 3).await;
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].id, "2-1");
        assert_eq!(hits[2].id, "2-3");
    }

    #[tokio::test]
    async fn details_carry_normalized_fields_and_links() {
        let gateway = MemoryGateway::new();
        let mut subject = issue("2-1", "DEMO-1", "Crash on save");
        subject.custom_fields = Some(vec![CustomField {
            id: "f-1".into(),
            name: "Priority".into(),
            kind: Some("enum".into()),
            value: Some(json!({"name": "Critical", "id": "e-1", "color": {"id": "c-9"}})),
        }]);
        gateway.add_issue(subject);
        gateway.set_links(
            "2-1",
            vec![crate::ports::IssueLink {
                link_type: Some(crate::ports::LinkType {
                    name: Some("Duplicate".into()),
                    id: Some("l-1".into()),
                }),
                direction: Some("outward".into()),
                issues: Some(vec![crate::ports::LinkedIssue {
                    id: "2-2".into(),
                    id_readable: Some("DEMO-2".into()),
                    summary: Some("Other crash".into()),
                }]),
            }],
        );
        let dispatcher = memory_dispatcher(gateway);

        let detail = dispatcher.get_issue_details("DEMO-1").await.unwrap();
        let fields = detail.custom_fields.unwrap();
        assert_eq!(fields[0].value, json!({"name": "Critical", "id": "e-1"}));
        assert_eq!(detail.links.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_issue_detail_is_none() {
        let dispatcher = memory_dispatcher(MemoryGateway::new());
        assert!(dispatcher.get_issue_details("DEMO-404").await.is_none());
    }

    #[tokio::test]
    async fn unconfigured_gateway_degrades_reads_and_fails_mutations() {
        let dispatcher = ToolDispatcher::new(None);

        assert!(dispatcher.get_issues("anything", 5).await.is_empty());
        assert!(dispatcher.get_issue_details("DEMO-1").await.is_none());
        assert!(dispatcher.get_issue_custom_fields("DEMO-1").await.is_empty());
        assert!(dispatcher.get_issue_comments("DEMO-1").await.is_empty());

        let result = dispatcher.comment_issue("DEMO-1", "hello").await;
        assert_eq!(result["success"], json!(false));
        assert_eq!(result["error"], json!("Tracker connection is not configured"));
    }

    #[tokio::test]
    async fn failing_backend_degrades_reads() {
        let dispatcher = ToolDispatcher::new(Some(Arc::new(FailingGateway)));
        assert!(dispatcher.get_issues("q", 5).await.is_empty());
        assert!(dispatcher.get_issue_custom_fields("DEMO-1").await.is_empty());
        assert!(dispatcher.get_issue_comments("DEMO-1").await.is_empty());
        assert!(dispatcher.get_issue_details("DEMO-1").await.is_none());
    }

    #[tokio::test]
    async fn slow_backend_times_out_as_degraded_read() {
        let dispatcher = ToolDispatcher::new(Some(Arc::new(SlowGateway)))
            .with_timeout(Duration::from_millis(20));
        assert!(dispatcher.get_issues("q", 5).await.is_empty());
    }

    #[tokio::test]
    async fn comment_reports_stored_comment() {
        let gateway = MemoryGateway::new();
        gateway.add_issue(issue("2-1", "DEMO-1", "issue"));
        let dispatcher = memory_dispatcher(gateway);

        let result = dispatcher.comment_issue("DEMO-1", "Reproduced on 2024.1").await;
        assert_eq!(result["success"], json!(true));
        assert_eq!(result["comment_id"], json!("c-1"));
        assert_eq!(result["text"], json!("Reproduced on 2024.1"));
    }

    #[tokio::test]
    async fn unknown_field_fails_without_update() {
        let gateway = MemoryGateway::new();
        gateway.add_issue(issue("2-1", "DEMO-1", "issue"));
        let dispatcher = memory_dispatcher(gateway);

        let result = dispatcher.update_field("DEMO-1", "f-404", &json!("whatever")).await;
        assert_eq!(result["success"], json!(false));
        assert_eq!(result["error"], json!("Field f-404 not found"));
    }

    #[tokio::test]
    async fn update_resolves_field_by_name_and_wraps_state_string() {
        let gateway = MemoryGateway::new();
        let mut subject = issue("2-1", "DEMO-1", "issue");
        subject.custom_fields = Some(vec![CustomField {
            id: "f-1".into(),
            name: "State".into(),
            kind: Some("state".into()),
            value: Some(json!({"name": "Open", "id": "s-1"})),
        }]);
        gateway.add_issue(subject);
        let dispatcher = memory_dispatcher(gateway);

        let result = dispatcher.update_field("DEMO-1", "State", &json!("Fixed")).await;
        assert_eq!(result["success"], json!(true));
        assert_eq!(result["field_id"], json!("f-1"));
        assert_eq!(result["field_name"], json!("State"));
        // The memory gateway stores the coerced value verbatim, so the
        // normalized state value is its compact rendering.
        assert_eq!(result["updated_value"], json!(r#"{"name":"Fixed"}"#));
    }

    #[tokio::test]
    async fn tag_set_partitions_added_and_skipped() {
        let gateway = MemoryGateway::new();
        let mut subject = issue("2-1", "DEMO-1", "issue");
        subject.tags = Some(vec![Tag { id: "t-1".into(), name: Some("urgent".into()) }]);
        gateway.add_issue(subject);
        gateway.set_tag_catalog(vec![
            Tag { id: "t-1".into(), name: Some("urgent".into()) },
            Tag { id: "t-2".into(), name: Some("regression".into()) },
        ]);
        let dispatcher = memory_dispatcher(gateway);

        let names = vec![
            "urgent".to_string(),
            "regression".to_string(),
            "regression".to_string(),
            "made-up".to_string(),
        ];
        let result = dispatcher.set_issue_tags("DEMO-1", &names).await;
        assert_eq!(result["success"], json!(true));
        assert_eq!(result["added_tags"], json!(["regression"]));
        assert_eq!(result["skipped_tags"], json!(["urgent", "made-up"]));
    }

    #[tokio::test]
    async fn repeated_tag_set_adds_nothing_new() {
        let gateway = MemoryGateway::new();
        gateway.add_issue(issue("2-1", "DEMO-1", "issue"));
        gateway.set_tag_catalog(vec![
            Tag { id: "t-1".into(), name: Some("urgent".into()) },
            Tag { id: "t-2".into(), name: Some("regression".into()) },
        ]);
        let dispatcher = memory_dispatcher(gateway);
        let names = vec!["urgent".to_string(), "regression".to_string()];

        let first = dispatcher.set_issue_tags("DEMO-1", &names).await;
        assert_eq!(first["added_tags"], json!(["urgent", "regression"]));

        let second = dispatcher.set_issue_tags("DEMO-1", &names).await;
        assert_eq!(second["added_tags"], json!([]));
        assert_eq!(second["skipped_tags"], json!(["urgent", "regression"]));
    }

    #[tokio::test]
    async fn tag_removal_skips_unattached_names() {
        let gateway = MemoryGateway::new();
        let mut subject = issue("2-1", "DEMO-1", "issue");
        subject.tags = Some(vec![Tag { id: "t-1".into(), name: Some("urgent".into()) }]);
        gateway.add_issue(subject);
        let dispatcher = memory_dispatcher(gateway);

        let names = vec!["urgent".to_string(), "regression".to_string()];
        let result = dispatcher.remove_issue_tags("DEMO-1", &names).await;
        assert_eq!(result["removed_tags"], json!(["urgent"]));
        assert_eq!(result["skipped_tags"], json!(["regression"]));

        let stored = dispatcher.get_issue_details("DEMO-1").await.unwrap();
        assert_eq!(stored.tags.map(|tags| tags.len()), Some(0));
    }

    #[tokio::test]
    async fn call_tool_routes_by_stable_id() {
        let gateway = MemoryGateway::new();
        gateway.add_issue(issue("2-1", "DEMO-1", "Crash on save"));
        let dispatcher = memory_dispatcher(gateway);

        let hits = dispatcher
            .call_tool("get_issues", &json!({"query": "project: DEMO", "limit": 1}))
            .await
            .unwrap();
        assert_eq!(hits.as_array().unwrap().len(), 1);

        let detail = dispatcher
            .call_tool("get_issue_details", &json!({"issue_id": "DEMO-1"}))
            .await
            .unwrap();
        assert_eq!(detail["id_readable"], json!("DEMO-1"));

        let missing = dispatcher
            .call_tool("get_issue_details", &json!({"issue_id": "DEMO-404"}))
            .await
            .unwrap();
        assert!(missing.is_null());
    }

    #[tokio::test]
    async fn call_tool_rejects_unknown_names_and_bad_args() {
        let dispatcher = ToolDispatcher::new(None);

        let unknown = dispatcher.call_tool("explode", &json!({})).await;
        assert_eq!(unknown.unwrap_err(), "Unknown tool: explode");

        let bad = dispatcher.call_tool("get_issues", &json!({})).await;
        assert_eq!(bad.unwrap_err(), "missing or invalid 'query' argument");

        let bad_tags = dispatcher
            .call_tool("set_issue_tags", &json!({"issue_id": "DEMO-1", "tags": [1]}))
            .await;
        assert_eq!(bad_tags.unwrap_err(), "'tags' must be a list of strings");
    }
}
