//! Attribute projection between source entities and target post operations.
//!
//! Different providers accept different field subsets when posting. Each
//! target operation declares the fields it expects as a descriptor constant;
//! projecting a source snapshot against a descriptor keeps exactly the fields
//! present on both sides, values untouched. The descriptors are the whole
//! contract: nothing here inspects types at runtime.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::forge::{Comment, ItemState};

/// Canonical field names shared by every entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    Title,
    Description,
    Author,
    Status,
    Created,
    Url,
    Labels,
    Assignees,
    Comments,
    SourceBranch,
    TargetBranch,
    Tag,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Description => "description",
            Self::Author => "author",
            Self::Status => "status",
            Self::Created => "created",
            Self::Url => "url",
            Self::Labels => "labels",
            Self::Assignees => "assignees",
            Self::Comments => "comments",
            Self::SourceBranch => "source_branch",
            Self::TargetBranch => "target_branch",
            Self::Tag => "tag",
        };
        f.write_str(name)
    }
}

/// A field's value, copied verbatim from the source snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Id(u64),
    Text(String),
    TextList(Vec<String>),
    Status(ItemState),
    Comments(Vec<Comment>),
}

/// Projected fields keyed by canonical name.
pub type FieldMap = BTreeMap<Field, FieldValue>;

/// Fields the issue-post operation consumes.
pub const ISSUE_POST_FIELDS: &[Field] = &[
    Field::Id,
    Field::Title,
    Field::Description,
    Field::Author,
    Field::Status,
    Field::Created,
    Field::Url,
    Field::Labels,
    Field::Assignees,
    Field::Comments,
];

/// Fields the pr-post operation consumes.
pub const PR_POST_FIELDS: &[Field] = &[
    Field::Id,
    Field::Title,
    Field::Description,
    Field::Author,
    Field::Status,
    Field::Created,
    Field::Url,
    Field::Labels,
    Field::Comments,
    Field::SourceBranch,
    Field::TargetBranch,
];

/// Fields the release-post operation consumes.
pub const RELEASE_POST_FIELDS: &[Field] = &[
    Field::Tag,
    Field::Title,
    Field::Description,
    Field::Created,
    Field::Url,
];

/// Keep the fields present in both the source snapshot and the descriptor.
///
/// Fields the descriptor names but the source did not populate (gated off by
/// configuration, or simply absent on that provider) are omitted.
pub fn project(source: &FieldMap, descriptor: &[Field]) -> FieldMap {
    descriptor
        .iter()
        .filter_map(|field| source.get(field).map(|value| (*field, value.clone())))
        .collect()
}

/// Typed accessors over a projected map, used by the writers.
pub trait FieldMapExt {
    fn text(&self, field: Field) -> Option<&str>;
    fn id(&self) -> Option<u64>;
    fn status(&self) -> Option<ItemState>;
    fn text_list(&self, field: Field) -> Option<&[String]>;
    fn comments(&self) -> &[Comment];
}

impl FieldMapExt for FieldMap {
    fn text(&self, field: Field) -> Option<&str> {
        match self.get(&field) {
            Some(FieldValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    fn id(&self) -> Option<u64> {
        match self.get(&Field::Id) {
            Some(FieldValue::Id(id)) => Some(*id),
            _ => None,
        }
    }

    fn status(&self) -> Option<ItemState> {
        match self.get(&Field::Status) {
            Some(FieldValue::Status(state)) => Some(*state),
            _ => None,
        }
    }

    fn text_list(&self, field: Field) -> Option<&[String]> {
        match self.get(&field) {
            Some(FieldValue::TextList(items)) => Some(items.as_slice()),
            _ => None,
        }
    }

    fn comments(&self) -> &[Comment] {
        match self.get(&Field::Comments) {
            Some(FieldValue::Comments(comments)) => comments.as_slice(),
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> FieldMap {
        let mut map = FieldMap::new();
        map.insert(Field::Id, FieldValue::Id(7));
        map.insert(Field::Title, FieldValue::Text("fix the widget".into()));
        map.insert(Field::Status, FieldValue::Status(ItemState::Closed));
        map.insert(
            Field::Labels,
            FieldValue::TextList(vec!["bug".into(), "p1".into()]),
        );
        map.insert(Field::SourceBranch, FieldValue::Text("feature".into()));
        map
    }

    #[test]
    fn keeps_only_fields_on_both_sides() {
        let projected = project(&snapshot(), ISSUE_POST_FIELDS);
        assert!(projected.contains_key(&Field::Title));
        assert!(projected.contains_key(&Field::Labels));
        // issue-post does not take branches
        assert!(!projected.contains_key(&Field::SourceBranch));
        // never populated by the source
        assert!(!projected.contains_key(&Field::Url));
    }

    #[test]
    fn values_are_copied_verbatim() {
        let projected = project(&snapshot(), PR_POST_FIELDS);
        assert_eq!(projected.text(Field::SourceBranch), Some("feature"));
        assert_eq!(projected.status(), Some(ItemState::Closed));
        assert_eq!(
            projected.text_list(Field::Labels),
            Some(&["bug".to_string(), "p1".to_string()][..])
        );
    }

    #[test]
    fn projection_is_idempotent() {
        let source = snapshot();
        let once = project(&source, ISSUE_POST_FIELDS);
        let twice = project(&source, ISSUE_POST_FIELDS);
        assert_eq!(once, twice);
        // projecting a projection changes nothing either
        assert_eq!(project(&once, ISSUE_POST_FIELDS), once);
    }

    #[test]
    fn missing_fields_read_as_none() {
        let projected = project(&snapshot(), RELEASE_POST_FIELDS);
        assert_eq!(projected.text(Field::Tag), None);
        assert!(projected.comments().is_empty());
    }
}
