//! Data-only mutations, as loaded from directive files.

use crate::class_list::ClassList;
use crate::directive::{DirectiveError, Operator, Position};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Append,
    Set,
    Remove,
}

/// A mutation described as plain data.
///
/// `attribute` is either a real attribute name or one of the pseudo
/// attributes `html`, `class`, `position` and `clone`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declarative {
    pub selector: String,
    pub attribute: String,
    pub action: Action,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, alias = "parent_selector")]
    pub parent_selector: Option<String>,
    #[serde(default, alias = "insert_before_selector")]
    pub insert_before_selector: Option<String>,
}

impl Declarative {
    pub fn new(selector: &str, attribute: &str, action: Action, value: &str) -> Self {
        Self {
            selector: selector.to_string(),
            attribute: attribute.to_string(),
            action,
            value: Some(value.to_string()),
            parent_selector: None,
            insert_before_selector: None,
        }
    }

    pub fn with_parent(mut self, parent_selector: &str) -> Self {
        self.parent_selector = Some(parent_selector.to_string());
        self
    }

    pub fn with_insert_before(mut self, selector: &str) -> Self {
        self.insert_before_selector = Some(selector.to_string());
        self
    }

    /// Maps this description onto one of the primitive operators.
    pub fn to_operator(&self) -> Result<Operator, DirectiveError> {
        let value = self.value.clone().unwrap_or_default();
        let op = match (self.attribute.as_str(), self.action) {
            ("html", Action::Append) => Operator::Content(Box::new(move |v: &str| format!("{v}{value}"))),
            ("html", Action::Set) => Operator::Content(Box::new(move |_: &str| value.clone())),
            ("class", Action::Append) => Operator::Classes(Box::new(move |c: &mut ClassList| {
                c.add(&value);
            })),
            ("class", Action::Remove) => Operator::Classes(Box::new(move |c: &mut ClassList| {
                c.remove(&value);
            })),
            ("class", Action::Set) => Operator::Classes(Box::new(move |c: &mut ClassList| {
                c.clear();
                c.add(&value);
            })),
            ("position", Action::Set) => {
                let parent = self
                    .parent_selector
                    .clone()
                    .ok_or(DirectiveError::MissingParentSelector)?;
                let position = Position {
                    parent_selector: parent,
                    insert_before_selector: self.insert_before_selector.clone(),
                };
                Operator::Position(Box::new(move || position.clone()))
            }
            ("clone", Action::Set | Action::Append) => Operator::Mirror {
                parent_selector: self.parent_selector.clone(),
            },
            ("html" | "position" | "clone", action) => {
                return Err(DirectiveError::Unsupported {
                    attribute: self.attribute.clone(),
                    action,
                });
            }
            (name, Action::Append) => Operator::attribute(
                name,
                Box::new(move |v: Option<&str>| Some(v.map_or_else(|| value.clone(), |v| format!("{v}{value}")))),
            )?,
            (name, Action::Set) => Operator::attribute(name, Box::new(move |_: Option<&str>| Some(value.clone())))?,
            (name, Action::Remove) => Operator::attribute(name, Box::new(|_: Option<&str>| None))?,
        };
        Ok(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PropertyKey;

    #[test]
    fn html_append_concatenates() {
        let Operator::Content(f) = Declarative::new("h1", "html", Action::Append, " world")
            .to_operator()
            .unwrap()
        else {
            panic!("expected content operator");
        };
        assert_eq!(f("hello"), "hello world");
    }

    #[test]
    fn class_actions_edit_token_list() {
        let run = |action, value| {
            let Operator::Classes(edit) = Declarative::new("p", "class", action, value)
                .to_operator()
                .unwrap()
            else {
                panic!("expected class operator");
            };
            let mut list = ClassList::parse("a b");
            edit(&mut list);
            list.to_string()
        };
        assert_eq!(run(Action::Append, "c"), "a b c");
        assert_eq!(run(Action::Remove, "a"), "b");
        assert_eq!(run(Action::Set, "z"), "z");
    }

    #[test]
    fn plain_attribute_actions() {
        let transform = |action| {
            let Operator::Attribute { transform, .. } =
                Declarative::new("a", "title", action, "x").to_operator().unwrap()
            else {
                panic!("expected attribute operator");
            };
            (transform(None), transform(Some("a")))
        };
        assert_eq!(transform(Action::Append), (Some("x".into()), Some("ax".into())));
        assert_eq!(transform(Action::Set), (Some("x".into()), Some("x".into())));
        assert_eq!(transform(Action::Remove), (None, None));
    }

    #[test]
    fn position_requires_parent_selector() {
        let decl = Declarative::new("h1", "position", Action::Set, "");
        assert_eq!(
            decl.to_operator().unwrap_err(),
            DirectiveError::MissingParentSelector
        );
        let op = decl.with_parent(".box").with_insert_before("p").to_operator().unwrap();
        let Operator::Position(producer) = op else {
            panic!("expected position operator");
        };
        assert_eq!(producer(), Position::append_to(".box").before("p"));
    }

    #[test]
    fn unsupported_and_invalid_combinations_fail() {
        let err = Declarative::new("h1", "html", Action::Remove, "")
            .to_operator()
            .unwrap_err();
        assert!(matches!(err, DirectiveError::Unsupported { .. }));
        let err = Declarative::new("h1", "bad name", Action::Set, "")
            .to_operator()
            .unwrap_err();
        assert_eq!(err, DirectiveError::InvalidAttributeName("bad name".into()));
    }

    #[test]
    fn clone_maps_to_mirror() {
        let op = Declarative::new("h1", "clone", Action::Set, "")
            .with_parent("footer")
            .to_operator()
            .unwrap();
        assert_eq!(op.key(), PropertyKey::Mirror);
    }

    #[test]
    fn deserializes_camel_case_fields() {
        let decl: Declarative = toml::from_str(
            r#"
            selector = "h1"
            attribute = "position"
            action = "set"
            parentSelector = ".box"
            "#,
        )
        .unwrap();
        assert_eq!(decl.action, Action::Set);
        assert_eq!(decl.parent_selector.as_deref(), Some(".box"));
        assert_eq!(decl.value, None);
    }
}
