//! Tree descriptions as written in rigger.yml
//!
//! ```yaml
//! tree:
//!   app:
//!     static:
//!       css: ~
//!       js: ~
//!   logs: ~
//! ```

use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

/// An ordered mapping from folder name to an optional subtree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeSpec {
    entries: Vec<(String, Option<TreeSpec>)>,
}

impl TreeSpec {
    /// Create an empty tree description
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a leaf folder
    pub fn leaf(mut self, name: impl Into<String>) -> Self {
        self.insert(name.into(), None);
        self
    }

    /// Add a folder with children
    pub fn branch(mut self, name: impl Into<String>, children: TreeSpec) -> Self {
        self.insert(name.into(), Some(children));
        self
    }

    /// Iterate entries in declaration order
    pub fn entries(&self) -> impl Iterator<Item = (&str, Option<&TreeSpec>)> {
        self.entries
            .iter()
            .map(|(name, sub)| (name.as_str(), sub.as_ref()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Later declarations replace earlier ones so names stay unique.
    fn insert(&mut self, name: String, children: Option<TreeSpec>) {
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = children;
        } else {
            self.entries.push((name, children));
        }
    }

    fn from_value(value: Value) -> Result<Self, String> {
        let mapping = match value {
            Value::Mapping(mapping) => mapping,
            Value::Null => return Ok(TreeSpec::new()),
            other => return Err(format!("tree must be a mapping, found {:?}", other)),
        };

        let mut spec = TreeSpec::new();
        for (key, child) in mapping {
            let name = match key {
                Value::String(s) => s,
                other => return Err(format!("folder names must be strings, found {:?}", other)),
            };
            if name.is_empty()
                || name == "."
                || name == ".."
                || name.contains('/')
                || name.contains('\\')
            {
                return Err(format!("invalid folder name '{}'", name));
            }
            let children = match child {
                Value::Null => None,
                mapping @ Value::Mapping(_) => Some(TreeSpec::from_value(mapping)?),
                other => {
                    return Err(format!(
                        "folder '{}' must be null or a mapping, found {:?}",
                        name, other
                    ))
                }
            };
            spec.insert(name, children);
        }
        Ok(spec)
    }
}

impl<'de> Deserialize<'de> for TreeSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let value = Value::deserialize(deserializer)?;
        TreeSpec::from_value(value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_preserves_order() {
        let yaml = r#"
working:
  app: ~
app:
  static:
    css: ~
logs:
"#;
        let spec: TreeSpec = serde_yaml::from_str(yaml).unwrap();
        let names: Vec<&str> = spec.entries().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["working", "app", "logs"]);

        let (_, app) = spec.entries().nth(1).unwrap();
        let app = app.unwrap();
        let (name, children) = app.entries().next().unwrap();
        assert_eq!(name, "static");
        assert!(children.is_some());
    }

    #[test]
    fn test_rejects_scalar_children() {
        let yaml = "app: 3\n";
        let result: Result<TreeSpec, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_nested_path_names() {
        let yaml = "app/static: ~\n";
        let result: Result<TreeSpec, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_dot_names() {
        for yaml in ["\"..\": ~\n", "\".\": ~\n", "app:\n  \"..\":\n    etc: ~\n"] {
            let result: Result<TreeSpec, _> = serde_yaml::from_str(yaml);
            assert!(result.is_err(), "accepted {:?}", yaml);
        }

        let hidden: TreeSpec = serde_yaml::from_str(".sass-cache: ~\n").unwrap();
        assert_eq!(hidden.entries().next().unwrap().0, ".sass-cache");
    }

    #[test]
    fn test_builder_replaces_duplicate_names() {
        let spec = TreeSpec::new()
            .leaf("logs")
            .branch("logs", TreeSpec::new().leaf("old"));
        assert_eq!(spec.entries().count(), 1);
        assert!(spec.entries().next().unwrap().1.is_some());
    }
}
