//! Live adapter for the `IssueGateway` port over the tracker's REST API.
//!
//! Wire types mirror the backend's camelCase JSON (with `$type`
//! discriminators and epoch-millisecond timestamps) and are mapped into
//! the port entities at the boundary: timestamps become RFC 3339 strings
//! and `$type` names become the canonical short field kinds.

use std::error::Error;

use chrono::DateTime;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::GatewayConfig;
use crate::ports::{
    Account, Comment, CustomField, FieldUpdate, GatewayFuture, Issue, IssueGateway, IssueLink,
    LinkType, LinkedIssue, Project, Tag,
};

const ISSUE_FIELDS: &str = "id,idReadable,summary,description,wikifiedDescription,\
                            project(id,name),created,updated,resolved,\
                            reporter(name,login),updater(name,login),commentsCount,\
                            tags(id,name),\
                            customFields(id,name,$type,value(id,name,login,minutes,presentation,text))";
const FIELD_FIELDS: &str = "id,name,$type,value(id,name,login,minutes,presentation,text)";
const COMMENT_FIELDS: &str = "id,text,textPreview,created,updated,author(name,login),deleted";
const LINK_FIELDS: &str = "direction,linkType(name,id),issues(id,idReadable,summary)";
const TAG_FIELDS: &str = "id,name";

type PortError = Box<dyn Error + Send + Sync>;

/// Live tracker client with bearer-token auth and a per-request timeout.
pub struct LiveGateway {
    client: Client,
    base_url: String,
    token: String,
}

impl LiveGateway {
    /// Creates a client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &GatewayConfig) -> Result<Self, PortError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, PortError> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| format!("tracker request failed: {e}"))?;
        decode(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &Value,
    ) -> Result<T, PortError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.token)
            .query(query)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("tracker request failed: {e}"))?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, PortError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| format!("failed to read tracker response: {e}"))?;
    if !status.is_success() {
        return Err(format!("tracker API error ({}): {}", status.as_u16(), snippet(&text)).into());
    }
    serde_json::from_str(&text).map_err(|e| format!("failed to parse tracker response: {e}").into())
}

async fn expect_success(response: reqwest::Response) -> Result<(), PortError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let text = response.text().await.unwrap_or_default();
    Err(format!("tracker API error ({}): {}", status.as_u16(), snippet(&text)).into())
}

fn snippet(body: &str) -> &str {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(200) {
        Some((idx, _)) => &trimmed[..idx],
        None => trimmed,
    }
}

/// Renders an epoch-millisecond timestamp as RFC 3339, dropping values
/// outside chrono's representable range.
fn millis_to_iso(millis: i64) -> Option<String> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.to_rfc3339())
}

/// Maps a wire `$type` discriminator to the canonical short kind string.
/// Unrecognized discriminators pass through so the normalizer's fallback
/// rule can still render their values.
fn field_kind(type_name: &str) -> String {
    match type_name {
        "SingleEnumIssueCustomField" => "enum",
        "MultiEnumIssueCustomField" => "enum[]",
        "StateIssueCustomField" | "StateMachineIssueCustomField" => "state",
        "SingleUserIssueCustomField" => "user",
        "MultiUserIssueCustomField" => "user[]",
        "SingleGroupIssueCustomField" => "group",
        "MultiGroupIssueCustomField" => "group[]",
        "SingleBuildIssueCustomField" => "build",
        "MultiBuildIssueCustomField" => "build[]",
        "SingleVersionIssueCustomField" => "version",
        "MultiVersionIssueCustomField" => "version[]",
        "SingleOwnedIssueCustomField" => "ownedField",
        "MultiOwnedIssueCustomField" => "ownedField[]",
        "SimpleIssueCustomField" => "simple",
        "DateIssueCustomField" => "date",
        "PeriodIssueCustomField" => "period",
        "TextIssueCustomField" => "text",
        other => other,
    }
    .to_string()
}

/// Maps a canonical short kind back to the wire `$type` discriminator for
/// update payloads.
fn wire_type(kind: &str) -> Option<&'static str> {
    Some(match kind {
        "enum" => "SingleEnumIssueCustomField",
        "enum[]" => "MultiEnumIssueCustomField",
        "state" => "StateIssueCustomField",
        "user" => "SingleUserIssueCustomField",
        "user[]" => "MultiUserIssueCustomField",
        "group" => "SingleGroupIssueCustomField",
        "group[]" => "MultiGroupIssueCustomField",
        "build" => "SingleBuildIssueCustomField",
        "build[]" => "MultiBuildIssueCustomField",
        "version" => "SingleVersionIssueCustomField",
        "version[]" => "MultiVersionIssueCustomField",
        "ownedField" => "SingleOwnedIssueCustomField",
        "ownedField[]" => "MultiOwnedIssueCustomField",
        "simple" => "SimpleIssueCustomField",
        "date" => "DateIssueCustomField",
        "period" => "PeriodIssueCustomField",
        "text" => "TextIssueCustomField",
        _ => return None,
    })
}

// --- Wire types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireIssue {
    id: String,
    #[serde(default)]
    id_readable: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    wikified_description: Option<String>,
    #[serde(default)]
    project: Option<WireProject>,
    #[serde(default)]
    created: Option<i64>,
    #[serde(default)]
    updated: Option<i64>,
    #[serde(default)]
    resolved: Option<i64>,
    #[serde(default)]
    reporter: Option<WireAccount>,
    #[serde(default)]
    updater: Option<WireAccount>,
    #[serde(default)]
    comments_count: Option<i64>,
    #[serde(default)]
    tags: Option<Vec<WireTag>>,
    #[serde(default)]
    custom_fields: Option<Vec<WireCustomField>>,
}

#[derive(Deserialize)]
struct WireProject {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct WireAccount {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    login: Option<String>,
}

#[derive(Deserialize)]
struct WireTag {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct WireCustomField {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "$type", default)]
    type_name: Option<String>,
    #[serde(default)]
    value: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireComment {
    id: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    text_preview: Option<String>,
    #[serde(default)]
    created: Option<i64>,
    #[serde(default)]
    updated: Option<i64>,
    #[serde(default)]
    author: Option<WireAccount>,
    #[serde(default)]
    deleted: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLink {
    #[serde(default)]
    direction: Option<String>,
    #[serde(default)]
    link_type: Option<WireLinkType>,
    #[serde(default)]
    issues: Option<Vec<WireLinkedIssue>>,
}

#[derive(Deserialize)]
struct WireLinkType {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLinkedIssue {
    id: String,
    #[serde(default)]
    id_readable: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireIssueFields {
    #[serde(default)]
    custom_fields: Option<Vec<WireCustomField>>,
}

#[derive(Serialize)]
struct CommentBody<'a> {
    text: &'a str,
}

// --- Wire-to-port conversions ---

fn issue_from_wire(wire: WireIssue) -> Issue {
    Issue {
        id: wire.id,
        id_readable: wire.id_readable,
        summary: wire.summary,
        description: wire.description,
        wikified_description: wire.wikified_description,
        project: wire.project.map(|p| Project { id: p.id, name: p.name }),
        created: wire.created.and_then(millis_to_iso),
        updated: wire.updated.and_then(millis_to_iso),
        resolved: wire.resolved.and_then(millis_to_iso),
        reporter: wire.reporter.map(account_from_wire),
        updater: wire.updater.map(account_from_wire),
        comments_count: wire.comments_count,
        tags: wire.tags.map(|tags| tags.into_iter().map(tag_from_wire).collect()),
        custom_fields: wire
            .custom_fields
            .map(|fields| fields.into_iter().map(custom_field_from_wire).collect()),
    }
}

fn account_from_wire(wire: WireAccount) -> Account {
    Account { name: wire.name, login: wire.login }
}

fn tag_from_wire(wire: WireTag) -> Tag {
    Tag { id: wire.id, name: wire.name }
}

fn custom_field_from_wire(wire: WireCustomField) -> CustomField {
    CustomField {
        id: wire.id,
        name: wire.name.unwrap_or_default(),
        kind: wire.type_name.as_deref().map(field_kind),
        value: wire.value,
    }
}

fn comment_from_wire(wire: WireComment) -> Comment {
    Comment {
        id: wire.id,
        text: wire.text,
        text_preview: wire.text_preview,
        created: wire.created.and_then(millis_to_iso),
        updated: wire.updated.and_then(millis_to_iso),
        author: wire.author.map(account_from_wire),
        deleted: wire.deleted,
    }
}

fn link_from_wire(wire: WireLink) -> IssueLink {
    IssueLink {
        link_type: wire.link_type.map(|t| LinkType { name: t.name, id: t.id }),
        direction: wire.direction,
        issues: wire.issues.map(|issues| {
            issues
                .into_iter()
                .map(|i| LinkedIssue { id: i.id, id_readable: i.id_readable, summary: i.summary })
                .collect()
        }),
    }
}

impl IssueGateway for LiveGateway {
    fn get_issues(&self, query: &str) -> GatewayFuture<'_, Vec<Issue>> {
        let query = query.to_string();
        Box::pin(async move {
            let wire: Vec<WireIssue> = self
                .get_json("issues", &[("query", query.as_str()), ("fields", ISSUE_FIELDS)])
                .await?;
            Ok(wire.into_iter().map(issue_from_wire).collect())
        })
    }

    fn get_issue(&self, issue_id: &str) -> GatewayFuture<'_, Option<Issue>> {
        let issue_id = issue_id.to_string();
        Box::pin(async move {
            let response = self
                .client
                .get(self.url(&format!("issues/{issue_id}")))
                .bearer_auth(&self.token)
                .query(&[("fields", ISSUE_FIELDS)])
                .send()
                .await
                .map_err(|e| format!("tracker request failed: {e}"))?;
            if response.status() == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            let wire: WireIssue = decode(response).await?;
            Ok(Some(issue_from_wire(wire)))
        })
    }

    fn get_issue_custom_fields(&self, issue_id: &str) -> GatewayFuture<'_, Vec<CustomField>> {
        let path = format!("issues/{issue_id}/customFields");
        Box::pin(async move {
            let wire: Vec<WireCustomField> =
                self.get_json(&path, &[("fields", FIELD_FIELDS)]).await?;
            Ok(wire.into_iter().map(custom_field_from_wire).collect())
        })
    }

    fn get_issue_comments(&self, issue_id: &str) -> GatewayFuture<'_, Vec<Comment>> {
        let path = format!("issues/{issue_id}/comments");
        Box::pin(async move {
            let wire: Vec<WireComment> =
                self.get_json(&path, &[("fields", COMMENT_FIELDS)]).await?;
            Ok(wire.into_iter().map(comment_from_wire).collect())
        })
    }

    fn create_issue_comment(&self, issue_id: &str, text: &str) -> GatewayFuture<'_, Comment> {
        let path = format!("issues/{issue_id}/comments");
        let body = serde_json::to_value(CommentBody { text }).unwrap_or(Value::Null);
        Box::pin(async move {
            let wire: WireComment =
                self.post_json(&path, &[("fields", COMMENT_FIELDS)], &body).await?;
            Ok(comment_from_wire(wire))
        })
    }

    fn update_issue_custom_field(
        &self,
        issue_id: &str,
        field: &FieldUpdate,
    ) -> GatewayFuture<'_, CustomField> {
        let path = format!("issues/{issue_id}");
        let mut element = json!({ "id": field.id, "value": field.value });
        if let Some(type_name) = field.kind.as_deref().and_then(wire_type) {
            element["$type"] = json!(type_name);
        }
        let body = json!({ "customFields": [element] });
        let field_id = field.id.clone();
        Box::pin(async move {
            let fields_selector = format!("customFields({FIELD_FIELDS})");
            let wire: WireIssueFields =
                self.post_json(&path, &[("fields", fields_selector.as_str())], &body).await?;
            wire.custom_fields
                .unwrap_or_default()
                .into_iter()
                .find(|f| f.id == field_id)
                .map(custom_field_from_wire)
                .ok_or_else(|| format!("updated field {field_id} missing from response").into())
        })
    }

    fn get_issue_links(&self, issue_id: &str) -> GatewayFuture<'_, Vec<IssueLink>> {
        let path = format!("issues/{issue_id}/links");
        Box::pin(async move {
            let wire: Vec<WireLink> = self.get_json(&path, &[("fields", LINK_FIELDS)]).await?;
            Ok(wire.into_iter().map(link_from_wire).collect())
        })
    }

    fn get_tags(&self) -> GatewayFuture<'_, Vec<Tag>> {
        Box::pin(async move {
            let wire: Vec<WireTag> = self.get_json("tags", &[("fields", TAG_FIELDS)]).await?;
            Ok(wire.into_iter().map(tag_from_wire).collect())
        })
    }

    fn add_issue_tag(&self, issue_id: &str, tag: &Tag) -> GatewayFuture<'_, ()> {
        let path = format!("issues/{issue_id}/tags");
        let body = json!({ "id": tag.id });
        Box::pin(async move {
            let response = self
                .client
                .post(self.url(&path))
                .bearer_auth(&self.token)
                .query(&[("fields", TAG_FIELDS)])
                .json(&body)
                .send()
                .await
                .map_err(|e| format!("tracker request failed: {e}"))?;
            expect_success(response).await
        })
    }

    fn remove_issue_tag(&self, issue_id: &str, tag_id: &str) -> GatewayFuture<'_, ()> {
        let path = format!("issues/{issue_id}/tags/{tag_id}");
        Box::pin(async move {
            let response = self
                .client
                .delete(self.url(&path))
                .bearer_auth(&self.token)
                .send()
                .await
                .map_err(|e| format!("tracker request failed: {e}"))?;
            expect_success(response).await
        })
    }
}
