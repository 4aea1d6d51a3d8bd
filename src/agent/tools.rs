use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::UserUpdate;
use crate::directory::Reconciler;

/// Defines a tool that the LLM can invoke.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A parsed tool call from the LLM's response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Deserialize)]
struct PhoneArgs {
    phone: String,
}

#[derive(Debug, Deserialize)]
struct UserListArgs {
    user_list: String,
}

#[derive(Debug, Deserialize)]
struct AddUserArgs {
    phone: String,
    first_name: String,
    last_name: String,
}

#[derive(Debug, Deserialize)]
struct EditUserArgs {
    phone: String,
    new_first_name: Option<String>,
    new_last_name: Option<String>,
    new_phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ListUsersArgs {
    limit: Option<i64>,
}

fn tool(name: &str, description: &str, parameters: Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        parameters,
    }
}

fn string_param(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

/// Registry of the directory tools. Generates descriptions for the system prompt
/// and dispatches parsed calls to the [`Reconciler`].
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        let user_list = json!({
            "type": "object",
            "properties": {
                "user_list": string_param("Users, one per line: phone first_name last_name")
            },
            "required": ["user_list"]
        });

        let tools = vec![
            tool(
                "check_user",
                "Check whether a phone number exists in the directory.",
                json!({
                    "type": "object",
                    "properties": { "phone": string_param("Phone number to check") },
                    "required": ["phone"]
                }),
            ),
            tool(
                "check_multiple_users",
                "Check a list of users by phone number. Use for any multi-line list.",
                user_list.clone(),
            ),
            tool(
                "add_user",
                "Add a new user to the directory.",
                json!({
                    "type": "object",
                    "properties": {
                        "phone": string_param("Phone number"),
                        "first_name": string_param("First name"),
                        "last_name": string_param("Last name")
                    },
                    "required": ["phone", "first_name", "last_name"]
                }),
            ),
            tool(
                "add_multiple_users",
                "Add several users at once. Lines that are malformed or already present are reported.",
                user_list,
            ),
            tool(
                "delete_user",
                "Delete a user by phone number.",
                json!({
                    "type": "object",
                    "properties": { "phone": string_param("Phone number of the user to delete") },
                    "required": ["phone"]
                }),
            ),
            tool(
                "edit_user",
                "Change a user's first name, last name or phone number.",
                json!({
                    "type": "object",
                    "properties": {
                        "phone": string_param("Current phone number of the user"),
                        "new_first_name": string_param("New first name"),
                        "new_last_name": string_param("New last name"),
                        "new_phone": string_param("New phone number")
                    },
                    "required": ["phone"]
                }),
            ),
            tool(
                "get_user_count",
                "Get the total number of users in the directory.",
                json!({ "type": "object", "properties": {} }),
            ),
            tool(
                "list_users",
                "List the most recently added users.",
                json!({
                    "type": "object",
                    "properties": {
                        "limit": { "type": "integer", "description": "Maximum number of users to return" }
                    }
                }),
            ),
        ];

        Self { tools }
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Generate a human-readable description of all tools for the system prompt.
    pub fn describe_for_prompt(&self) -> String {
        let mut desc = String::from(
            "To use a tool, respond with ONLY a JSON object in the format: \
             {\"tool\": \"tool_name\", \"args\": {...}}\n\n",
        );

        for tool in self.definitions() {
            desc.push_str(&format!(
                "- **{}**: {}\n  Parameters: {}\n\n",
                tool.name,
                tool.description,
                serde_json::to_string(&tool.parameters).unwrap_or_default()
            ));
        }

        desc
    }

    /// Try to parse a tool call from the LLM's text response.
    pub fn parse_tool_call(text: &str) -> Option<ToolCall> {
        let trimmed = text.trim();
        let start = trimmed.find('{')?;
        let end = trimmed.rfind('}')?;
        if end < start {
            return None;
        }

        let val: Value = serde_json::from_str(&trimmed[start..=end]).ok()?;
        let name = val.get("tool")?.as_str()?;
        let arguments = val.get("args").cloned().unwrap_or_else(|| json!({}));

        Some(ToolCall {
            name: name.to_string(),
            arguments,
        })
    }

    /// Run a tool call against the directory and return its JSON result.
    ///
    /// Unknown tools and malformed arguments come back as `{"error": ...}` for the
    /// model to read; store failures are returned as `Err`.
    pub async fn execute(&self, directory: &Reconciler, call: &ToolCall) -> anyhow::Result<Value> {
        tracing::info!("Executing tool {} with {}", call.name, call.arguments);

        let result = match call.name.as_str() {
            "check_user" => match args::<PhoneArgs>(call) {
                Ok(a) => json!(directory.check_single(&a.phone).await?),
                Err(e) => e,
            },
            "check_multiple_users" => match args::<UserListArgs>(call) {
                Ok(a) => json!(directory.check_batch(a.user_list.lines()).await?),
                Err(e) => e,
            },
            "add_user" => match args::<AddUserArgs>(call) {
                Ok(a) => json!(
                    directory
                        .insert_single(&a.phone, &a.first_name, &a.last_name)
                        .await?
                ),
                Err(e) => e,
            },
            "add_multiple_users" => match args::<UserListArgs>(call) {
                Ok(a) => json!(directory.insert_batch(a.user_list.lines()).await),
                Err(e) => e,
            },
            "delete_user" => match args::<PhoneArgs>(call) {
                Ok(a) => json!(directory.delete_single(&a.phone).await?),
                Err(e) => e,
            },
            "edit_user" => match args::<EditUserArgs>(call) {
                Ok(a) => {
                    let update =
                        UserUpdate::from_inputs(a.new_first_name, a.new_last_name, a.new_phone);
                    json!(directory.edit_single(&a.phone, update).await?)
                }
                Err(e) => e,
            },
            "get_user_count" => json!({ "count": directory.count().await? }),
            "list_users" => match args::<ListUsersArgs>(call) {
                Ok(a) => json!(directory.list(a.limit).await?),
                Err(e) => e,
            },
            other => {
                tracing::warn!("Model asked for unknown tool {}", other);
                json!({ "error": format!("Unknown tool '{}'", other) })
            }
        };

        Ok(result)
    }
}

/// Deserialize a call's arguments, or produce the error payload to hand back.
fn args<T: DeserializeOwned>(call: &ToolCall) -> Result<T, Value> {
    let raw = if call.arguments.is_null() {
        json!({})
    } else {
        call.arguments.clone()
    };
    serde_json::from_value(raw).map_err(|e| {
        tracing::warn!("Invalid arguments for {}: {}", call.name, e);
        json!({ "error": format!("Invalid arguments for '{}': {}", call.name, e) })
    })
}
