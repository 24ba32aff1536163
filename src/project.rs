//! Projection of backend entities into stable response shapes.
//!
//! Response types have a fixed key set: optional data serializes as null
//! rather than disappearing, so consumers can rely on the shape regardless
//! of how much of the backend payload was populated.

use serde::Serialize;

use crate::normalize::{normalize_field, NormalizedField};
use crate::ports::{Account, Comment, Issue, IssueLink, LinkType, Project, Tag};

/// An issue summary as returned by search.
#[derive(Debug, Clone, Serialize)]
pub struct IssueSummary {
    /// Internal identifier.
    pub id: String,
    /// Human-readable identifier.
    pub id_readable: String,
    /// One-line summary (empty when the backend omitted it).
    pub summary: String,
    /// Full description.
    pub description: Option<String>,
    /// Wiki-rendered description.
    pub wikified_description: Option<String>,
    /// Owning project.
    pub project: Option<ProjectRef>,
    /// Creation timestamp.
    pub created: Option<String>,
    /// Last-update timestamp.
    pub updated: Option<String>,
    /// Reporting account.
    pub reporter: Option<AccountRef>,
    /// Normalized custom fields; null when the payload carried none.
    pub custom_fields: Option<Vec<NormalizedField>>,
}

/// Full detail for a single issue.
#[derive(Debug, Clone, Serialize)]
pub struct IssueDetail {
    /// Internal identifier.
    pub id: String,
    /// Human-readable identifier.
    pub id_readable: String,
    /// One-line summary (empty when the backend omitted it).
    pub summary: String,
    /// Full description.
    pub description: Option<String>,
    /// Wiki-rendered description.
    pub wikified_description: Option<String>,
    /// Owning project.
    pub project: Option<ProjectRef>,
    /// Creation timestamp.
    pub created: Option<String>,
    /// Last-update timestamp.
    pub updated: Option<String>,
    /// Resolution timestamp.
    pub resolved: Option<String>,
    /// Reporting account.
    pub reporter: Option<AccountRef>,
    /// Last-updating account.
    pub updater: Option<AccountRef>,
    /// Comment count.
    pub comments_count: Option<i64>,
    /// Tags on the issue; null when the payload carried no tag list
    /// (distinct from an empty list).
    pub tags: Option<Vec<TagRef>>,
    /// Normalized custom fields; null when the payload carried none.
    pub custom_fields: Option<Vec<NormalizedField>>,
    /// Issue links; null when links were unavailable.
    pub links: Option<Vec<LinkView>>,
}

/// A comment in response shape.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    /// Issue the comment belongs to.
    pub issue_id: String,
    /// Comment identifier.
    pub id: String,
    /// Body text (empty when the backend omitted it).
    pub text: String,
    /// Shortened preview.
    pub text_preview: Option<String>,
    /// Creation timestamp.
    pub created: Option<String>,
    /// Last-update timestamp.
    pub updated: Option<String>,
    /// Comment author.
    pub author: Option<AccountRef>,
    /// Deletion flag.
    pub deleted: Option<bool>,
}

/// A project reference in response shape.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectRef {
    /// Project identifier.
    pub id: String,
    /// Project display name.
    pub name: Option<String>,
}

/// An account reference in response shape.
#[derive(Debug, Clone, Serialize)]
pub struct AccountRef {
    /// Display name.
    pub name: Option<String>,
    /// Login handle.
    pub login: Option<String>,
}

/// A tag reference in response shape.
#[derive(Debug, Clone, Serialize)]
pub struct TagRef {
    /// Tag display name.
    pub name: Option<String>,
    /// Tag identifier.
    pub id: String,
}

/// One issue link in response shape.
#[derive(Debug, Clone, Serialize)]
pub struct LinkView {
    /// The named relation.
    #[serde(rename = "type")]
    pub link_type: Option<LinkTypeRef>,
    /// Link direction.
    pub direction: Option<String>,
    /// Issues on the other end.
    pub issues: Vec<LinkIssueRef>,
}

/// The relation of a [`LinkView`].
#[derive(Debug, Clone, Serialize)]
pub struct LinkTypeRef {
    /// Relation name.
    pub name: Option<String>,
    /// Relation identifier.
    pub id: Option<String>,
}

/// A linked-issue reference in response shape.
#[derive(Debug, Clone, Serialize)]
pub struct LinkIssueRef {
    /// Internal identifier.
    pub id: String,
    /// Human-readable identifier.
    pub id_readable: String,
    /// One-line summary.
    pub summary: String,
}

/// Projects an issue into its search-result summary shape.
#[must_use]
pub fn project_issue_summary(issue: &Issue) -> IssueSummary {
    IssueSummary {
        id: issue.id.clone(),
        id_readable: issue.id_readable.clone().unwrap_or_default(),
        summary: issue.summary.clone().unwrap_or_default(),
        description: issue.description.clone(),
        wikified_description: issue.wikified_description.clone(),
        project: issue.project.as_ref().map(project_ref),
        created: issue.created.clone(),
        updated: issue.updated.clone(),
        reporter: issue.reporter.as_ref().map(account_ref),
        custom_fields: issue
            .custom_fields
            .as_ref()
            .map(|fields| fields.iter().map(normalize_field).collect()),
    }
}

/// Projects an issue into its detail shape.
///
/// `links` is whatever the caller's best-effort secondary fetch produced:
/// `None` when links were unavailable, which projects to null rather than
/// failing the detail response.
#[must_use]
pub fn project_issue_detail(issue: &Issue, links: Option<&[IssueLink]>) -> IssueDetail {
    IssueDetail {
        id: issue.id.clone(),
        id_readable: issue.id_readable.clone().unwrap_or_default(),
        summary: issue.summary.clone().unwrap_or_default(),
        description: issue.description.clone(),
        wikified_description: issue.wikified_description.clone(),
        project: issue.project.as_ref().map(project_ref),
        created: issue.created.clone(),
        updated: issue.updated.clone(),
        resolved: issue.resolved.clone(),
        reporter: issue.reporter.as_ref().map(account_ref),
        updater: issue.updater.as_ref().map(account_ref),
        comments_count: issue.comments_count,
        tags: issue.tags.as_ref().map(|tags| tags.iter().map(tag_ref).collect()),
        custom_fields: issue
            .custom_fields
            .as_ref()
            .map(|fields| fields.iter().map(normalize_field).collect()),
        links: links.map(|links| links.iter().map(link_view).collect()),
    }
}

/// Projects a comment into its response shape.
#[must_use]
pub fn project_comment(issue_id: &str, comment: &Comment) -> CommentView {
    CommentView {
        issue_id: issue_id.to_string(),
        id: comment.id.clone(),
        text: comment.text.clone().unwrap_or_default(),
        text_preview: comment.text_preview.clone(),
        created: comment.created.clone(),
        updated: comment.updated.clone(),
        author: comment.author.as_ref().map(account_ref),
        deleted: comment.deleted,
    }
}

fn project_ref(project: &Project) -> ProjectRef {
    ProjectRef { id: project.id.clone(), name: project.name.clone() }
}

fn account_ref(account: &Account) -> AccountRef {
    AccountRef { name: account.name.clone(), login: account.login.clone() }
}

fn tag_ref(tag: &Tag) -> TagRef {
    TagRef { name: tag.name.clone(), id: tag.id.clone() }
}

fn link_view(link: &IssueLink) -> LinkView {
    LinkView {
        link_type: link.link_type.as_ref().map(link_type_ref),
        direction: link.direction.clone(),
        issues: link
            .issues
            .as_ref()
            .map(|issues| {
                issues
                    .iter()
                    .map(|linked| LinkIssueRef {
                        id: linked.id.clone(),
                        id_readable: linked.id_readable.clone().unwrap_or_default(),
                        summary: linked.summary.clone().unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn link_type_ref(link_type: &LinkType) -> LinkTypeRef {
    LinkTypeRef { name: link_type.name.clone(), id: link_type.id.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{CustomField, LinkedIssue};
    use serde_json::json;

    fn full_issue() -> Issue {
        Issue {
            id: "2-42".into(),
            id_readable: Some("DEMO-42".into()),
            summary: Some("Crash on save".into()),
            description: Some("Steps to reproduce".into()),
            wikified_description: Some("<p>Steps</p>".into()),
            project: Some(Project { id: "0-1".into(), name: Some("Demo".into()) }),
            created: Some("2024-03-01T10:00:00+00:00".into()),
            updated: Some("2024-03-02T11:00:00+00:00".into()),
            resolved: Some("2024-03-03T12:00:00+00:00".into()),
            reporter: Some(Account { name: Some("Ada".into()), login: Some("ada".into()) }),
            updater: Some(Account { name: Some("Grace".into()), login: Some("grace".into()) }),
            comments_count: Some(3),
            tags: Some(vec![Tag { id: "t-1".into(), name: Some("regression".into()) }]),
            custom_fields: Some(vec![CustomField {
                id: "f-1".into(),
                name: "State".into(),
                kind: Some("state".into()),
                value: Some(json!("Open")),
            }]),
        }
    }

    fn bare_issue() -> Issue {
        Issue { id: "2-43".into(), ..Issue::default() }
    }

    fn key_set(value: &serde_json::Value) -> Vec<String> {
        value.as_object().unwrap().keys().cloned().collect()
    }

    #[test]
    fn detail_key_set_is_stable_across_presence() {
        let full = serde_json::to_value(project_issue_detail(&full_issue(), Some(&[]))).unwrap();
        let bare = serde_json::to_value(project_issue_detail(&bare_issue(), None)).unwrap();
        assert_eq!(key_set(&full), key_set(&bare));
    }

    #[test]
    fn fully_populated_detail_has_no_nulls() {
        let detail = project_issue_detail(&full_issue(), Some(&[]));
        let encoded = serde_json::to_value(detail).unwrap();
        for (key, value) in encoded.as_object().unwrap() {
            assert!(!value.is_null(), "key {key} unexpectedly null");
        }
    }

    #[test]
    fn bare_detail_has_nulls_not_missing_keys() {
        let encoded = serde_json::to_value(project_issue_detail(&bare_issue(), None)).unwrap();
        assert_eq!(encoded["summary"], json!(""));
        assert_eq!(encoded["id_readable"], json!(""));
        assert!(encoded["tags"].is_null());
        assert!(encoded["links"].is_null());
        assert!(encoded["custom_fields"].is_null());
    }

    #[test]
    fn empty_tag_list_projects_to_empty_not_null() {
        let mut issue = bare_issue();
        issue.tags = Some(vec![]);
        let detail = project_issue_detail(&issue, None);
        assert_eq!(detail.tags.map(|tags| tags.len()), Some(0));
    }

    #[test]
    fn summary_normalizes_custom_fields() {
        let summary = project_issue_summary(&full_issue());
        let fields = summary.custom_fields.unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "State");
        assert_eq!(fields[0].value, json!("Open"));
    }

    #[test]
    fn link_view_flattens_linked_issues() {
        let link = IssueLink {
            link_type: Some(LinkType { name: Some("depends on".into()), id: Some("l-1".into()) }),
            direction: Some("OUTWARD".into()),
            issues: Some(vec![LinkedIssue {
                id: "2-7".into(),
                id_readable: Some("DEMO-7".into()),
                summary: Some("Upstream fix".into()),
            }]),
        };
        let detail = project_issue_detail(&bare_issue(), Some(&[link]));
        let links = detail.links.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].direction.as_deref(), Some("OUTWARD"));
        assert_eq!(links[0].issues[0].id_readable, "DEMO-7");
        let encoded = serde_json::to_value(&links[0]).unwrap();
        assert_eq!(encoded["type"]["name"], json!("depends on"));
    }

    #[test]
    fn comment_projection_defaults_text() {
        let comment = Comment { id: "c-1".into(), ..Comment::default() };
        let view = project_comment("DEMO-1", &comment);
        assert_eq!(view.issue_id, "DEMO-1");
        assert_eq!(view.text, "");
        assert!(view.author.is_none());
    }
}
