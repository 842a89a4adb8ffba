//! Tool lookup: mapping a caller-supplied identifier to a tool name
//!
//! Registered tools are addressed by either their `num` (the public tool
//! number) or their `id` (the row identity). Callers hand over one integer
//! without saying which it is, so [`resolve_tool_name`] tries the number
//! first and falls back to the id.
//!
//! The persistence layer that stores tools lives outside this crate; it is
//! consumed through the [`ToolLookup`] trait. [`InMemoryToolLookup`] serves
//! the table declared in the configuration file.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolregError};

/// Stable identity of a registered tool.
///
/// # Examples
///
/// ```
/// use toolreg::registry::ToolRecord;
///
/// let yaml = "{ id: 7, num: 1007, name: weather_query }";
/// let tool: ToolRecord = serde_yaml::from_str(yaml).unwrap();
/// assert!(tool.valid);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRecord {
    /// Row identity.
    pub id: i64,
    /// Public tool number.
    pub num: i64,
    /// Name the remote MCP server knows the tool by.
    pub name: String,
    /// Whether the tool is currently published.
    #[serde(default = "default_valid")]
    pub valid: bool,
}

fn default_valid() -> bool {
    true
}

/// Read access to the tool registry.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ToolLookup: Send + Sync {
    /// All tools with number `num` whose validity flag equals `valid`.
    async fn find_valid_by_number(&self, num: i64, valid: bool) -> Result<Vec<ToolRecord>>;

    /// The tool with row identity `id`, if any.
    async fn find_by_id(&self, id: i64) -> Result<Option<ToolRecord>>;

    /// Every known tool. Used for diagnostics only.
    async fn list_all(&self) -> Result<Vec<ToolRecord>>;
}

/// Resolve `tool_key` to a tool name.
///
/// Lookup by number (valid tools only) runs first; lookup by id runs only
/// when that yields nothing or fails. When both miss, every known tool is
/// logged for diagnostics and [`ToolregError::ToolNotFound`] names the
/// original key.
///
/// # Errors
///
/// Returns [`ToolregError::ToolNotFound`] when neither lookup matches.
pub async fn resolve_tool_name(lookup: &dyn ToolLookup, tool_key: i64) -> Result<String> {
    match lookup.find_valid_by_number(tool_key, true).await {
        Ok(tools) => {
            if let Some(tool) = tools.into_iter().next() {
                tracing::debug!(tool_key, tool_name = %tool.name, "tool resolved by number");
                return Ok(tool.name);
            }
        }
        Err(e) => {
            tracing::debug!(tool_key, error = %e, "lookup by number failed, trying id");
        }
    }

    match lookup.find_by_id(tool_key).await {
        Ok(Some(tool)) => {
            tracing::debug!(tool_key, tool_name = %tool.name, "tool resolved by id");
            return Ok(tool.name);
        }
        Ok(None) => {}
        Err(e) => {
            tracing::debug!(tool_key, error = %e, "lookup by id failed");
        }
    }

    match lookup.list_all().await {
        Ok(all) => {
            let known: Vec<String> = all
                .iter()
                .map(|t| format!("{}(id={}, num={}, valid={})", t.name, t.id, t.num, t.valid))
                .collect();
            tracing::warn!(tool_key, known_tools = ?known, "tool not found");
        }
        Err(e) => {
            tracing::warn!(tool_key, error = %e, "tool not found; listing known tools failed");
        }
    }

    Err(ToolregError::ToolNotFound(tool_key).into())
}

/// Parse a caller-supplied tool identifier.
///
/// Accepts a JSON integer or a string holding one (surrounding whitespace
/// allowed). Fractions, blanks, and any other type are rejected.
///
/// # Errors
///
/// Returns [`ToolregError::InvalidToolIdentifier`] naming the rejected input.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use toolreg::registry::parse_tool_key;
///
/// assert_eq!(parse_tool_key(&json!(1001)).unwrap(), 1001);
/// assert_eq!(parse_tool_key(&json!(" 42 ")).unwrap(), 42);
/// assert!(parse_tool_key(&json!("abc")).is_err());
/// ```
pub fn parse_tool_key(value: &serde_json::Value) -> Result<i64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        let shown = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => "missing".to_string(),
            other => other.to_string(),
        };
        ToolregError::InvalidToolIdentifier(shown).into()
    })
}

/// [`ToolLookup`] over a fixed, in-memory table.
#[derive(Debug, Clone, Default)]
pub struct InMemoryToolLookup {
    tools: Vec<ToolRecord>,
}

impl InMemoryToolLookup {
    /// Build a lookup over `tools`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolregError::Config`] if two tools share an `id`.
    pub fn new(tools: Vec<ToolRecord>) -> Result<Self> {
        let mut seen = HashSet::new();
        for tool in &tools {
            if !seen.insert(tool.id) {
                return Err(
                    ToolregError::Config(format!("duplicate tool id: {}", tool.id)).into(),
                );
            }
        }
        Ok(Self { tools })
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` when no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[async_trait::async_trait]
impl ToolLookup for InMemoryToolLookup {
    async fn find_valid_by_number(&self, num: i64, valid: bool) -> Result<Vec<ToolRecord>> {
        Ok(self
            .tools
            .iter()
            .filter(|t| t.num == num && t.valid == valid)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ToolRecord>> {
        Ok(self.tools.iter().find(|t| t.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<ToolRecord>> {
        Ok(self.tools.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn tool(id: i64, num: i64, name: &str) -> ToolRecord {
        ToolRecord {
            id,
            num,
            name: name.to_string(),
            valid: true,
        }
    }

    #[tokio::test]
    async fn test_number_hit_short_circuits_id_lookup() {
        let mut lookup = MockToolLookup::new();
        lookup
            .expect_find_valid_by_number()
            .with(eq(1001), eq(true))
            .times(1)
            .returning(|_, _| Ok(vec![tool(1, 1001, "weather")]));
        lookup.expect_find_by_id().times(0);
        lookup.expect_list_all().times(0);

        let name = resolve_tool_name(&lookup, 1001).await.unwrap();
        assert_eq!(name, "weather");
    }

    #[tokio::test]
    async fn test_empty_number_lookup_falls_back_to_id() {
        let mut lookup = MockToolLookup::new();
        lookup
            .expect_find_valid_by_number()
            .times(1)
            .returning(|_, _| Ok(vec![]));
        lookup
            .expect_find_by_id()
            .with(eq(5))
            .times(1)
            .returning(|_| Ok(Some(tool(5, 9005, "stock_quote"))));
        lookup.expect_list_all().times(0);

        assert_eq!(resolve_tool_name(&lookup, 5).await.unwrap(), "stock_quote");
    }

    #[tokio::test]
    async fn test_failed_number_lookup_falls_back_to_id() {
        let mut lookup = MockToolLookup::new();
        lookup
            .expect_find_valid_by_number()
            .returning(|_, _| Err(anyhow::anyhow!("database unavailable")));
        lookup
            .expect_find_by_id()
            .returning(|_| Ok(Some(tool(5, 9005, "stock_quote"))));

        assert_eq!(resolve_tool_name(&lookup, 5).await.unwrap(), "stock_quote");
    }

    #[tokio::test]
    async fn test_both_misses_enumerate_and_report_original_key() {
        let mut lookup = MockToolLookup::new();
        lookup
            .expect_find_valid_by_number()
            .returning(|_, _| Ok(vec![]));
        lookup
            .expect_find_by_id()
            .returning(|_| Err(anyhow::anyhow!("no row")));
        lookup
            .expect_list_all()
            .times(1)
            .returning(|| Ok(vec![tool(1, 1001, "weather")]));

        let err = resolve_tool_name(&lookup, 777).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ToolregError>(),
            Some(ToolregError::ToolNotFound(777))
        ));
        assert!(!err.to_string().contains("weather"));
    }

    #[tokio::test]
    async fn test_in_memory_lookup_ignores_invalid_tools_by_number() {
        let mut retired = tool(2, 1001, "retired");
        retired.valid = false;
        let lookup = InMemoryToolLookup::new(vec![retired, tool(3, 3, "by_id_only")]).unwrap();

        assert!(lookup.find_valid_by_number(1001, true).await.unwrap().is_empty());
        // 2 is not a tool number, so the id lookup supplies it.
        assert_eq!(resolve_tool_name(&lookup, 2).await.unwrap(), "retired");
        assert_eq!(resolve_tool_name(&lookup, 3).await.unwrap(), "by_id_only");
    }

    #[test]
    fn test_parse_tool_key_variants() {
        use serde_json::json;

        assert_eq!(parse_tool_key(&json!(7)).unwrap(), 7);
        assert_eq!(parse_tool_key(&json!("1001")).unwrap(), 1001);
        assert_eq!(parse_tool_key(&json!("-3")).unwrap(), -3);

        for bad in [json!(1.5), json!(""), json!("12a"), json!(null), json!([1]), json!(true)] {
            let err = parse_tool_key(&bad).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<ToolregError>(),
                Some(ToolregError::InvalidToolIdentifier(_))
            ));
        }
        let err = parse_tool_key(&json!(null)).unwrap_err();
        assert_eq!(err.to_string(), "invalid tool identifier: missing");
    }

    #[test]
    fn test_in_memory_lookup_rejects_duplicate_ids() {
        let result = InMemoryToolLookup::new(vec![tool(1, 10, "a"), tool(1, 11, "b")]);
        assert!(result.is_err());
    }
}
