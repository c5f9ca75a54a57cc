//! Toolkit commands for data processing and conversion

pub mod convert;
pub mod selector;
pub mod timestamp;

use serde_json::{Map, Value};

/// Result of a toolkit operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub title: String,
    pub content: Vec<(String, String)>, // (label, value) pairs
}

impl ToolResult {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: Vec::new(),
        }
    }

    pub fn add(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.content.push((label.into(), value.into()));
        self
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.content
            .iter()
            .find(|(k, _)| k == label)
            .map(|(_, v)| v.as_str())
    }

    /// Aligned `label  value` lines under the title
    pub fn render_text(&self) -> String {
        let width = self.content.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        let mut out = format!("{}\n", self.title);
        for (label, value) in &self.content {
            out.push_str(&format!("  {:<width$}  {}\n", label, value, width = width));
        }
        out
    }

    /// Flat JSON object; later duplicates of a label win
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (label, value) in &self.content {
            map.insert(label.clone(), Value::String(value.clone()));
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let result = ToolResult::new("Selector")
            .add("signature", "deposit()")
            .add("selector", "0xd0e30db0");

        assert_eq!(
            result.render_text(),
            "Selector\n  signature  deposit()\n  selector   0xd0e30db0\n"
        );
        assert_eq!(result.to_json()["selector"], "0xd0e30db0");
        assert_eq!(result.get("missing"), None);
    }
}
