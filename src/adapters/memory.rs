//! In-memory adapter for the `IssueGateway` port.
//!
//! Serves canned issues, comments, tags, and links from process memory and
//! applies mutations to them, so the whole dispatch layer can be exercised
//! without a reachable tracker. Used by tests and offline experiments.

use std::sync::Mutex;

use crate::ports::{
    Account, Comment, CustomField, FieldUpdate, GatewayFuture, Issue, IssueGateway, IssueLink, Tag,
};

/// In-memory issue tracker state behind the gateway trait.
#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    issues: Vec<Issue>,
    comments: Vec<(String, Vec<Comment>)>,
    links: Vec<(String, Vec<IssueLink>)>,
    catalog: Vec<Tag>,
    next_comment_id: u64,
}

impl MemoryGateway {
    /// Creates an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an issue to the store.
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned.
    pub fn add_issue(&self, issue: Issue) {
        self.state.lock().expect("memory gateway state poisoned").issues.push(issue);
    }

    /// Adds a comment under an issue id.
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned.
    pub fn add_comment(&self, issue_id: &str, comment: Comment) {
        let mut state = self.state.lock().expect("memory gateway state poisoned");
        if let Some((_, comments)) = state.comments.iter_mut().find(|(id, _)| id == issue_id) {
            comments.push(comment);
        } else {
            state.comments.push((issue_id.to_string(), vec![comment]));
        }
    }

    /// Replaces the global tag catalog.
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned.
    pub fn set_tag_catalog(&self, tags: Vec<Tag>) {
        self.state.lock().expect("memory gateway state poisoned").catalog = tags;
    }

    /// Replaces the links recorded for an issue id.
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned.
    pub fn set_links(&self, issue_id: &str, links: Vec<IssueLink>) {
        let mut state = self.state.lock().expect("memory gateway state poisoned");
        state.links.retain(|(id, _)| id != issue_id);
        state.links.push((issue_id.to_string(), links));
    }
}

/// Matches an issue by internal or human-readable id.
fn matches_id(issue: &Issue, issue_id: &str) -> bool {
    issue.id == issue_id || issue.id_readable.as_deref() == Some(issue_id)
}

type LockedState<'a> = std::sync::MutexGuard<'a, State>;

fn lock(state: &Mutex<State>) -> Result<LockedState<'_>, Box<dyn std::error::Error + Send + Sync>> {
    state.lock().map_err(|_| "memory gateway state poisoned".into())
}

impl IssueGateway for MemoryGateway {
    fn get_issues(&self, _query: &str) -> GatewayFuture<'_, Vec<Issue>> {
        // The query syntax belongs to the real tracker; here every issue
        // matches, in insertion order.
        Box::pin(async move { Ok(lock(&self.state)?.issues.clone()) })
    }

    fn get_issue(&self, issue_id: &str) -> GatewayFuture<'_, Option<Issue>> {
        let issue_id = issue_id.to_string();
        Box::pin(async move {
            Ok(lock(&self.state)?.issues.iter().find(|i| matches_id(i, &issue_id)).cloned())
        })
    }

    fn get_issue_custom_fields(&self, issue_id: &str) -> GatewayFuture<'_, Vec<CustomField>> {
        let issue_id = issue_id.to_string();
        Box::pin(async move {
            Ok(lock(&self.state)?
                .issues
                .iter()
                .find(|i| matches_id(i, &issue_id))
                .and_then(|i| i.custom_fields.clone())
                .unwrap_or_default())
        })
    }

    fn get_issue_comments(&self, issue_id: &str) -> GatewayFuture<'_, Vec<Comment>> {
        let issue_id = issue_id.to_string();
        Box::pin(async move {
            Ok(lock(&self.state)?
                .comments
                .iter()
                .find(|(id, _)| *id == issue_id)
                .map(|(_, comments)| comments.clone())
                .unwrap_or_default())
        })
    }

    fn create_issue_comment(&self, issue_id: &str, text: &str) -> GatewayFuture<'_, Comment> {
        let issue_id = issue_id.to_string();
        let text = text.to_string();
        Box::pin(async move {
            let mut state = lock(&self.state)?;
            state.next_comment_id += 1;
            let comment = Comment {
                id: format!("c-{}", state.next_comment_id),
                text: Some(text),
                text_preview: None,
                created: Some("2024-01-01T00:00:00+00:00".to_string()),
                updated: None,
                author: Some(Account {
                    name: Some("Memory User".to_string()),
                    login: Some("memory".to_string()),
                }),
                deleted: Some(false),
            };
            if let Some((_, comments)) = state.comments.iter_mut().find(|(id, _)| *id == issue_id)
            {
                comments.push(comment.clone());
            } else {
                state.comments.push((issue_id, vec![comment.clone()]));
            }
            Ok(comment)
        })
    }

    fn update_issue_custom_field(
        &self,
        issue_id: &str,
        field: &FieldUpdate,
    ) -> GatewayFuture<'_, CustomField> {
        let issue_id = issue_id.to_string();
        let field = field.clone();
        Box::pin(async move {
            let mut state = lock(&self.state)?;
            let issue = state
                .issues
                .iter_mut()
                .find(|i| matches_id(i, &issue_id))
                .ok_or_else(|| format!("issue {issue_id} not found"))?;
            let stored = issue
                .custom_fields
                .as_mut()
                .and_then(|fields| fields.iter_mut().find(|f| f.id == field.id))
                .ok_or_else(|| format!("field {} not found on issue {issue_id}", field.id))?;
            stored.value = Some(field.value.clone());
            Ok(stored.clone())
        })
    }

    fn get_issue_links(&self, issue_id: &str) -> GatewayFuture<'_, Vec<IssueLink>> {
        let issue_id = issue_id.to_string();
        Box::pin(async move {
            Ok(lock(&self.state)?
                .links
                .iter()
                .find(|(id, _)| *id == issue_id)
                .map(|(_, links)| links.clone())
                .unwrap_or_default())
        })
    }

    fn get_tags(&self) -> GatewayFuture<'_, Vec<Tag>> {
        Box::pin(async move { Ok(lock(&self.state)?.catalog.clone()) })
    }

    fn add_issue_tag(&self, issue_id: &str, tag: &Tag) -> GatewayFuture<'_, ()> {
        let issue_id = issue_id.to_string();
        let tag = tag.clone();
        Box::pin(async move {
            let mut state = lock(&self.state)?;
            let issue = state
                .issues
                .iter_mut()
                .find(|i| matches_id(i, &issue_id))
                .ok_or_else(|| format!("issue {issue_id} not found"))?;
            issue.tags.get_or_insert_with(Vec::new).push(tag);
            Ok(())
        })
    }

    fn remove_issue_tag(&self, issue_id: &str, tag_id: &str) -> GatewayFuture<'_, ()> {
        let issue_id = issue_id.to_string();
        let tag_id = tag_id.to_string();
        Box::pin(async move {
            let mut state = lock(&self.state)?;
            let issue = state
                .issues
                .iter_mut()
                .find(|i| matches_id(i, &issue_id))
                .ok_or_else(|| format!("issue {issue_id} not found"))?;
            if let Some(tags) = issue.tags.as_mut() {
                tags.retain(|t| t.id != tag_id);
            }
            Ok(())
        })
    }
}
