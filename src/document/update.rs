//! Single-field document updates

use super::value::{Document, FieldPath, Value};

/// A targeted write against one field of a document
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Set the field, creating intermediate documents as needed
    Set(FieldPath, Value),
    /// Remove the field if present
    Unset(FieldPath),
}

impl Update {
    pub fn set(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Update::Set(path.into(), value.into())
    }

    pub fn unset(path: impl Into<FieldPath>) -> Self {
        Update::Unset(path.into())
    }

    pub fn path(&self) -> &FieldPath {
        match self {
            Update::Set(path, _) | Update::Unset(path) => path,
        }
    }

    /// Apply to `document`, returning whether it was modified
    pub fn apply(&self, document: &mut Document) -> bool {
        match self {
            Update::Set(path, value) => document.set_path(path, value.clone()),
            Update::Unset(path) => document.remove_path(path).is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_reports_modification() {
        let mut doc = Document::new().with("id", 1);
        let update = Update::set(FieldPath::new("properties").child("age"), 30);

        assert!(update.apply(&mut doc));
        assert!(!update.apply(&mut doc));
        assert_eq!(
            doc.get_path(&FieldPath::from("properties.age")),
            Some(&Value::Integer(30))
        );
    }

    #[test]
    fn test_unset_missing_field_is_noop() {
        let mut doc = Document::new().with("id", 1);
        let update = Update::unset(FieldPath::new("properties").child("age"));
        assert!(!update.apply(&mut doc));
        assert_eq!(doc, Document::new().with("id", 1));
    }

    #[test]
    fn test_unset_keeps_siblings() {
        let mut doc = Document::new().with(
            "properties",
            Document::new().with("key1", "val1").with("key2", "val2"),
        );
        assert!(Update::unset("properties.key1").apply(&mut doc));

        let props = doc.get("properties").unwrap().as_document().unwrap();
        assert!(!props.contains_key("key1"));
        assert_eq!(props.get("key2").unwrap().as_string(), Some("val2"));
    }
}
