//! Interactive command session over a tool transport.
//!
//! Reads line commands, maps them to tool calls, and renders the results
//! as readable text or pretty JSON. Generic over reader and writer so
//! tests drive it with in-memory buffers.

use std::io::{BufRead, Write};

use serde_json::{json, Value};

use crate::transport::ToolTransport;

/// Help metadata for one session command.
pub struct CommandInfo {
    /// Command word.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Usage line.
    pub usage: &'static str,
    /// Worked example.
    pub example: &'static str,
}

/// The session command set, in help order.
pub const COMMANDS: &[CommandInfo] = &[
    CommandInfo {
        name: "help",
        description: "Show available commands or details for one command",
        usage: "help [command]",
        example: "help issues",
    },
    CommandInfo {
        name: "issues",
        description: "Search issues with a tracker query",
        usage: "issues <query>",
        example: "issues project: DEMO #Unresolved",
    },
    CommandInfo {
        name: "issue",
        description: "Show full details for one issue",
        usage: "issue <issue-id>",
        example: "issue DEMO-1",
    },
    CommandInfo {
        name: "fields",
        description: "Show the custom fields of an issue",
        usage: "fields <issue-id>",
        example: "fields DEMO-1",
    },
    CommandInfo {
        name: "comments",
        description: "Show the comments on an issue",
        usage: "comments <issue-id>",
        example: "comments DEMO-1",
    },
    CommandInfo {
        name: "comment",
        description: "Add a comment to an issue",
        usage: "comment <issue-id> <text>",
        example: "comment DEMO-1 Reproduced on the latest build",
    },
    CommandInfo {
        name: "update",
        description: "Update a custom field of an issue",
        usage: "update <issue-id> <field> <value>",
        example: "update DEMO-1 State Fixed",
    },
    CommandInfo {
        name: "tag",
        description: "Attach tags to an issue by name",
        usage: "tag <issue-id> <tag> [tag...]",
        example: "tag DEMO-1 urgent regression",
    },
    CommandInfo {
        name: "untag",
        description: "Detach tags from an issue by name",
        usage: "untag <issue-id> <tag> [tag...]",
        example: "untag DEMO-1 urgent",
    },
    CommandInfo {
        name: "quit",
        description: "Exit the interactive client",
        usage: "quit",
        example: "quit",
    },
];

/// Line-oriented session over a tool transport.
pub struct SessionLoop<R, W> {
    transport: Box<dyn ToolTransport>,
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> SessionLoop<R, W> {
    /// Creates a session reading commands from `reader` and writing
    /// responses to `writer`.
    #[must_use]
    pub fn new(transport: Box<dyn ToolTransport>, reader: R, writer: W) -> Self {
        Self { transport, reader, writer }
    }

    /// Runs the session until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error when reading a command or writing a response
    /// fails.
    pub async fn run(mut self) -> Result<(), String> {
        writeln!(
            self.writer,
            "Issue tracker interactive client. Type 'help' for available commands, 'quit' to exit."
        )
        .map_err(|e| format!("failed to write to session: {e}"))?;
        loop {
            write!(self.writer, "\n> ").map_err(|e| format!("failed to write to session: {e}"))?;
            self.writer.flush().map_err(|e| format!("failed to write to session: {e}"))?;

            let mut line = String::new();
            let read = self
                .reader
                .read_line(&mut line)
                .map_err(|e| format!("failed to read command: {e}"))?;
            if read == 0 {
                break;
            }

            let (proceed, response) = self.process_command(line.trim()).await;
            writeln!(self.writer, "\n{response}")
                .map_err(|e| format!("failed to write to session: {e}"))?;
            if !proceed {
                break;
            }
        }
        Ok(())
    }

    /// Handles one command line. Returns whether the session continues
    /// and the text to show.
    async fn process_command(&self, input: &str) -> (bool, String) {
        if input.is_empty() {
            return (true, "Please enter a command. Type 'help' for available commands.".into());
        }
        let (word, rest) = split_head(input);
        let command = word.to_lowercase();
        match command.as_str() {
            "quit" => (false, "Exiting interactive client...".into()),
            "help" => (true, help_text(rest)),
            "issues" => (true, self.search_issues(rest).await),
            "issue" => (true, self.show_issue(rest).await),
            "fields" => (true, self.show_fields(rest).await),
            "comments" => (true, self.show_comments(rest).await),
            "comment" => (true, self.add_comment(rest).await),
            "update" => (true, self.update_field(rest).await),
            "tag" => (true, self.change_tags(rest, "set_issue_tags").await),
            "untag" => (true, self.change_tags(rest, "remove_issue_tags").await),
            other => (true, format!("Unknown command: {other}. Type 'help' for available commands.")),
        }
    }

    async fn search_issues(&self, query: &str) -> String {
        if query.is_empty() {
            return "Please provide a search query. Example: issues project: DEMO #Unresolved"
                .into();
        }
        match self.transport.call_tool("get_issues", &json!({ "query": query })).await {
            Ok(Value::Array(hits)) if hits.is_empty() => "No issues found.".into(),
            Ok(result) => pretty(&result),
            Err(e) => format!("Error: {e}"),
        }
    }

    async fn show_issue(&self, issue_id: &str) -> String {
        if issue_id.is_empty() {
            return "Please provide an issue ID. Example: issue DEMO-1".into();
        }
        match self.transport.call_tool("get_issue_details", &json!({ "issue_id": issue_id })).await
        {
            Ok(Value::Null) => format!("Issue {issue_id} not found."),
            Ok(result) => pretty(&result),
            Err(e) => format!("Error: {e}"),
        }
    }

    async fn show_fields(&self, issue_id: &str) -> String {
        if issue_id.is_empty() {
            return "Please provide an issue ID. Example: fields DEMO-1".into();
        }
        match self
            .transport
            .call_tool("get_issue_custom_fields", &json!({ "issue_id": issue_id }))
            .await
        {
            Ok(Value::Array(fields)) if fields.is_empty() => {
                format!("No custom fields found for issue {issue_id}.")
            }
            Ok(result) => pretty(&result),
            Err(e) => format!("Error: {e}"),
        }
    }

    async fn show_comments(&self, issue_id: &str) -> String {
        if issue_id.is_empty() {
            return "Please provide an issue ID. Example: comments DEMO-1".into();
        }
        match self
            .transport
            .call_tool("get_issue_comments", &json!({ "issue_id": issue_id }))
            .await
        {
            Ok(Value::Array(comments)) if comments.is_empty() => {
                format!("No comments found for issue {issue_id}.")
            }
            Ok(result) => pretty(&result),
            Err(e) => format!("Error: {e}"),
        }
    }

    async fn add_comment(&self, rest: &str) -> String {
        let (issue_id, text) = split_head(rest);
        if issue_id.is_empty() || text.is_empty() {
            return "Please provide an issue ID and comment text. \
                    Example: comment DEMO-1 Reproduced on the latest build"
                .into();
        }
        match self
            .transport
            .call_tool("comment_issue", &json!({ "issue_id": issue_id, "text": text }))
            .await
        {
            Ok(result) => pretty(&result),
            Err(e) => format!("Error: {e}"),
        }
    }

    async fn update_field(&self, rest: &str) -> String {
        let (issue_id, rest) = split_head(rest);
        let (field, value) = split_head(rest);
        if issue_id.is_empty() || field.is_empty() || value.is_empty() {
            return "Please provide an issue ID, a field, and a value. \
                    Example: update DEMO-1 State Fixed"
                .into();
        }
        let args = json!({ "issue_id": issue_id, "field_id": field, "field_value": value });
        match self.transport.call_tool("update_field", &args).await {
            Ok(result) => pretty(&result),
            Err(e) => format!("Error: {e}"),
        }
    }

    async fn change_tags(&self, rest: &str, tool: &str) -> String {
        let (issue_id, names) = split_head(rest);
        let tags: Vec<&str> = names.split_whitespace().collect();
        if issue_id.is_empty() || tags.is_empty() {
            return "Please provide an issue ID and at least one tag name. \
                    Example: tag DEMO-1 urgent"
                .into();
        }
        match self
            .transport
            .call_tool(tool, &json!({ "issue_id": issue_id, "tags": tags }))
            .await
        {
            Ok(result) => pretty(&result),
            Err(e) => format!("Error: {e}"),
        }
    }
}

/// Splits the first whitespace-delimited word off an input line.
fn split_head(input: &str) -> (&str, &str) {
    match input.find(char::is_whitespace) {
        Some(idx) => (&input[..idx], input[idx..].trim_start()),
        None => (input, ""),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn help_text(topic: &str) -> String {
    if topic.is_empty() {
        let mut text = String::from("Available commands:\n\n");
        for command in COMMANDS {
            text.push_str(&format!("  {}: {}\n", command.name, command.description));
        }
        text.push_str("\nType 'help <command>' for usage details.");
        return text;
    }
    let topic = topic.to_lowercase();
    match COMMANDS.iter().find(|c| c.name == topic) {
        Some(command) => format!(
            "Command: {}\nDescription: {}\nUsage: {}\nExample: {}",
            command.name, command.description, command.usage, command.example
        ),
        None => format!("Unknown command: {topic}. Type 'help' for available commands."),
    }
}
