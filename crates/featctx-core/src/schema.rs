//! JSON (de)serialization of finished dependency trees.

use crate::tree::DependencyTree;
use anyhow::{Context, Result};

/// Check arena consistency: ids match positions and links stay in bounds.
pub fn validate(tree: &DependencyTree) -> Result<()> {
    tree.check()?;
    Ok(())
}

/// Serialize a tree to a pretty-printed JSON string.
pub fn to_json(tree: &DependencyTree) -> Result<String> {
    serde_json::to_string_pretty(tree).context("failed to serialize dependency tree to JSON")
}

/// Deserialize a tree from a JSON string.
pub fn from_json(json: &str) -> Result<DependencyTree> {
    serde_json::from_str(json).context("failed to deserialize dependency tree from JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::tree::NodeContent;

    #[test]
    fn test_rejects_dangling_child() {
        let tree = DependencyTree::new_root(
            "/p/a.py",
            Language::Python,
            NodeContent::WholeModule {
                text: String::new(),
            },
        );
        let mut value = serde_json::to_value(&tree).unwrap();
        value["nodes"][0]["children"] = serde_json::json!([5]);
        let err = from_json(&value.to_string()).unwrap_err();
        assert!(format!("{err:#}").contains("dangling child"));
    }
}
