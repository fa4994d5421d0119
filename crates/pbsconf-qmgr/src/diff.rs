//! Attribute differ and command synthesizer.
//!
//! Given the observed and desired value of one attribute, the [`Differ`]
//! emits the smallest list of qmgr commands that moves PBS from one to the
//! other:
//!
//! | old      | new      | commands                 |
//! |----------|----------|--------------------------|
//! | absent   | absent   | none                     |
//! | absent   | v        | `set attr=v`             |
//! | v        | absent   | `unset attr`             |
//! | v        | v        | none                     |
//! | v1       | v2       | `set attr=v2`            |
//!
//! Maps are diffed entry by entry in key order (`set attr.key=value` and
//! `unset attr.key`), never replaced wholesale.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::command::{Command, CommandBuilder};
use crate::error::{QmgrError, QmgrResult};
use crate::kind::ObjectKind;
use crate::quote;

/// Shape of a typed attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueShape {
    Bool,
    OptionalBool,
    Int32,
    OptionalInt32,
    String,
    OptionalString,
    StringMap,
}

impl ValueShape {
    /// Whether an absent value is meaningful for this shape.
    pub fn is_optional(&self) -> bool {
        matches!(
            self,
            ValueShape::OptionalBool | ValueShape::OptionalInt32 | ValueShape::OptionalString
        )
    }
}

/// A typed attribute value. `None` means the attribute is unset in PBS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypedValue {
    Bool(bool),
    OptionalBool(Option<bool>),
    Int32(i32),
    OptionalInt32(Option<i32>),
    String(String),
    OptionalString(Option<String>),
    StringMap(BTreeMap<String, String>),
}

impl TypedValue {
    /// The shape of this value.
    pub fn shape(&self) -> ValueShape {
        match self {
            TypedValue::Bool(_) => ValueShape::Bool,
            TypedValue::OptionalBool(_) => ValueShape::OptionalBool,
            TypedValue::Int32(_) => ValueShape::Int32,
            TypedValue::OptionalInt32(_) => ValueShape::OptionalInt32,
            TypedValue::String(_) => ValueShape::String,
            TypedValue::OptionalString(_) => ValueShape::OptionalString,
            TypedValue::StringMap(_) => ValueShape::StringMap,
        }
    }

    /// The empty value of a shape: absent, `false`, `0`, `""` or `{}`.
    pub fn empty(shape: ValueShape) -> Self {
        match shape {
            ValueShape::Bool => TypedValue::Bool(false),
            ValueShape::OptionalBool => TypedValue::OptionalBool(None),
            ValueShape::Int32 => TypedValue::Int32(0),
            ValueShape::OptionalInt32 => TypedValue::OptionalInt32(None),
            ValueShape::String => TypedValue::String(String::new()),
            ValueShape::OptionalString => TypedValue::OptionalString(None),
            ValueShape::StringMap => TypedValue::StringMap(BTreeMap::new()),
        }
    }
}

impl From<bool> for TypedValue {
    fn from(value: bool) -> Self {
        TypedValue::Bool(value)
    }
}

impl From<Option<bool>> for TypedValue {
    fn from(value: Option<bool>) -> Self {
        TypedValue::OptionalBool(value)
    }
}

impl From<i32> for TypedValue {
    fn from(value: i32) -> Self {
        TypedValue::Int32(value)
    }
}

impl From<Option<i32>> for TypedValue {
    fn from(value: Option<i32>) -> Self {
        TypedValue::OptionalInt32(value)
    }
}

impl From<String> for TypedValue {
    fn from(value: String) -> Self {
        TypedValue::String(value)
    }
}

impl From<Option<String>> for TypedValue {
    fn from(value: Option<String>) -> Self {
        TypedValue::OptionalString(value)
    }
}

impl From<BTreeMap<String, String>> for TypedValue {
    fn from(value: BTreeMap<String, String>) -> Self {
        TypedValue::StringMap(value)
    }
}

/// The object a diff applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target<'a> {
    pub kind: ObjectKind,
    pub name: &'a str,
}

impl<'a> Target<'a> {
    pub fn new(kind: ObjectKind, name: &'a str) -> Self {
        Self { kind, name }
    }
}

/// Options controlling how values are embedded in commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOptions {
    /// Quote map entry values like scalar strings. Off by default: map values
    /// are emitted verbatim.
    pub escape_map_values: bool,
    /// Fail on values containing both quote characters instead of emitting
    /// a command that the shell cannot parse.
    pub reject_quote_collisions: bool,
}

/// Computes per-attribute command sequences.
#[derive(Debug, Clone, Default)]
pub struct Differ {
    builder: CommandBuilder,
    options: DiffOptions,
}

impl Differ {
    /// Create a differ rendering commands with `builder`.
    pub fn new(builder: CommandBuilder, options: DiffOptions) -> Self {
        Self { builder, options }
    }

    /// The command builder in use.
    pub fn builder(&self) -> &CommandBuilder {
        &self.builder
    }

    /// The embedding options in use.
    pub fn options(&self) -> DiffOptions {
        self.options
    }

    /// Diff one attribute.
    pub fn diff(
        &self,
        target: Target<'_>,
        attribute: &str,
        old: &TypedValue,
        new: &TypedValue,
    ) -> QmgrResult<Vec<Command>> {
        let mut commands = Vec::new();
        self.diff_into(target, attribute, old, new, &mut commands)?;
        Ok(commands)
    }

    /// Diff one attribute, appending to an existing batch.
    pub fn diff_into(
        &self,
        target: Target<'_>,
        attribute: &str,
        old: &TypedValue,
        new: &TypedValue,
        out: &mut Vec<Command>,
    ) -> QmgrResult<()> {
        match (old, new) {
            (TypedValue::Bool(old), TypedValue::Bool(new)) => {
                self.diff_required(target, attribute, old, new, format_bool(*new), out);
            }
            (TypedValue::Int32(old), TypedValue::Int32(new)) => {
                self.diff_required(target, attribute, old, new, new.to_string(), out);
            }
            (TypedValue::String(old), TypedValue::String(new)) => {
                if old != new {
                    let value = self.format_string(attribute, new)?;
                    out.push(self.builder.set(target.kind, target.name, attribute, &value));
                }
            }
            (TypedValue::OptionalBool(old), TypedValue::OptionalBool(new)) => {
                let value = new.map(format_bool);
                self.diff_optional(target, attribute, old, new, value, out);
            }
            (TypedValue::OptionalInt32(old), TypedValue::OptionalInt32(new)) => {
                let value = new.map(|v| v.to_string());
                self.diff_optional(target, attribute, old, new, value, out);
            }
            (TypedValue::OptionalString(old), TypedValue::OptionalString(new)) => {
                let value = match new {
                    Some(v) if old.as_ref() != Some(v) => Some(self.format_string(attribute, v)?),
                    _ => None,
                };
                self.diff_optional(target, attribute, old, new, value, out);
            }
            (TypedValue::StringMap(old), TypedValue::StringMap(new)) => {
                self.diff_map(target, attribute, old, new, out)?;
            }
            _ => {
                return Err(QmgrError::ShapeMismatch {
                    attribute: attribute.to_string(),
                    old: old.shape(),
                    new: new.shape(),
                });
            }
        }
        Ok(())
    }

    fn diff_required<T: PartialEq>(
        &self,
        target: Target<'_>,
        attribute: &str,
        old: &T,
        new: &T,
        formatted: String,
        out: &mut Vec<Command>,
    ) {
        if old != new {
            out.push(
                self.builder
                    .set(target.kind, target.name, attribute, &formatted),
            );
        }
    }

    /// `formatted` is only read when `new` is present and differs.
    fn diff_optional<T: PartialEq>(
        &self,
        target: Target<'_>,
        attribute: &str,
        old: &Option<T>,
        new: &Option<T>,
        formatted: Option<String>,
        out: &mut Vec<Command>,
    ) {
        if old == new {
            return;
        }
        match formatted {
            Some(value) if new.is_some() => {
                out.push(self.builder.set(target.kind, target.name, attribute, &value));
            }
            _ if new.is_none() => {
                out.push(self.builder.unset(target.kind, target.name, attribute));
            }
            _ => {}
        }
    }

    fn diff_map(
        &self,
        target: Target<'_>,
        attribute: &str,
        old: &BTreeMap<String, String>,
        new: &BTreeMap<String, String>,
        out: &mut Vec<Command>,
    ) -> QmgrResult<()> {
        for key in old.keys().filter(|key| !new.contains_key(*key)) {
            let entry = format!("{attribute}.{key}");
            out.push(self.builder.unset(target.kind, target.name, &entry));
        }

        for (key, value) in new {
            if old.get(key) == Some(value) {
                continue;
            }
            let entry = format!("{attribute}.{key}");
            let value = if self.options.escape_map_values {
                self.format_string(&entry, value)?
            } else {
                value.clone()
            };
            out.push(self.builder.set(target.kind, target.name, &entry, &value));
        }
        Ok(())
    }

    fn format_string(&self, attribute: &str, value: &str) -> QmgrResult<String> {
        if self.options.reject_quote_collisions {
            quote::check_embeddable(attribute, value)?;
        }
        Ok(quote::escape_for_command(value))
    }
}

/// Format a bool the way qmgr accepts it.
pub fn format_bool(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn differ() -> Differ {
        Differ::new(CommandBuilder::new("qmgr"), DiffOptions::default())
    }

    fn queue() -> Target<'static> {
        Target::new(ObjectKind::Queue, "workq")
    }

    fn run(old: TypedValue, new: TypedValue) -> Vec<String> {
        differ()
            .diff(queue(), "attr", &old, &new)
            .unwrap()
            .into_iter()
            .map(Command::into_string)
            .collect()
    }

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_optional_bool_transitions() {
        assert!(run(None::<bool>.into(), None::<bool>.into()).is_empty());
        assert_eq!(
            run(None::<bool>.into(), Some(true).into()),
            vec!["qmgr -c 'set queue workq attr=true'"]
        );
        assert_eq!(
            run(Some(true).into(), None::<bool>.into()),
            vec!["qmgr -c 'unset queue workq attr'"]
        );
        assert!(run(Some(false).into(), Some(false).into()).is_empty());
        assert_eq!(
            run(Some(true).into(), Some(false).into()),
            vec!["qmgr -c 'set queue workq attr=false'"]
        );
    }

    #[test]
    fn test_optional_int_transitions() {
        assert!(run(None::<i32>.into(), None::<i32>.into()).is_empty());
        assert_eq!(
            run(None::<i32>.into(), Some(-5).into()),
            vec!["qmgr -c 'set queue workq attr=-5'"]
        );
        assert_eq!(
            run(Some(10).into(), None::<i32>.into()),
            vec!["qmgr -c 'unset queue workq attr'"]
        );
        assert!(run(Some(7).into(), Some(7).into()).is_empty());
        assert_eq!(
            run(Some(7).into(), Some(70).into()),
            vec!["qmgr -c 'set queue workq attr=70'"]
        );
    }

    #[test]
    fn test_optional_string_transitions() {
        assert!(run(None::<String>.into(), None::<String>.into()).is_empty());
        assert_eq!(
            run(None::<String>.into(), Some("batch jobs".to_string()).into()),
            vec!["qmgr -c 'set queue workq attr=\"batch jobs\"'"]
        );
        assert_eq!(
            run(Some("x".to_string()).into(), None::<String>.into()),
            vec!["qmgr -c 'unset queue workq attr'"]
        );
        assert!(run(Some("x".to_string()).into(), Some("x".to_string()).into()).is_empty());
        assert_eq!(
            run(
                Some("x".to_string()).into(),
                Some("say \"y\"".to_string()).into()
            ),
            vec!["qmgr -c 'set queue workq attr='say \"y\"''"]
        );
    }

    #[test]
    fn test_required_scalars_never_unset() {
        assert_eq!(
            run(true.into(), false.into()),
            vec!["qmgr -c 'set queue workq attr=false'"]
        );
        assert_eq!(
            run(1_i32.into(), 0_i32.into()),
            vec!["qmgr -c 'set queue workq attr=0'"]
        );
        assert_eq!(
            run("a".to_string().into(), String::new().into()),
            vec!["qmgr -c 'set queue workq attr=\"\"'"]
        );
        assert!(run(3_i32.into(), 3_i32.into()).is_empty());
    }

    #[test]
    fn test_map_diff() {
        let old = map(&[("ncpus", "1"), ("mem", "1gb")]);
        let new = map(&[("ncpus", "1"), ("mem", "2gb"), ("walltime", "01:00:00")]);
        let commands = differ()
            .diff(
                queue(),
                "resources_default",
                &old.into(),
                &new.into(),
            )
            .unwrap();
        let commands: Vec<&str> = commands.iter().map(Command::as_str).collect();
        assert_eq!(
            commands,
            vec![
                "qmgr -c 'set queue workq resources_default.mem=2gb'",
                "qmgr -c 'set queue workq resources_default.walltime=01:00:00'",
            ]
        );
        assert!(!commands.iter().any(|c| c.contains("ncpus")));
    }

    #[test]
    fn test_map_removed_keys_are_unset_first() {
        let old = map(&[("b", "1"), ("a", "1"), ("c", "1")]);
        let new = map(&[("c", "2")]);
        assert_eq!(
            run(old.into(), new.into()),
            vec![
                "qmgr -c 'unset queue workq attr.a'",
                "qmgr -c 'unset queue workq attr.b'",
                "qmgr -c 'set queue workq attr.c=2'",
            ]
        );
    }

    #[test]
    fn test_map_values_unescaped_by_default() {
        let new = map(&[("comment", "two words")]);
        assert_eq!(
            run(BTreeMap::<String, String>::new().into(), new.into()),
            vec!["qmgr -c 'set queue workq attr.comment=two words'"]
        );
    }

    #[test]
    fn test_map_values_escaped_when_enabled() {
        let differ = Differ::new(
            CommandBuilder::new("qmgr"),
            DiffOptions {
                escape_map_values: true,
                ..DiffOptions::default()
            },
        );
        let new = map(&[("comment", "two words")]);
        let commands = differ
            .diff(queue(), "attr", &BTreeMap::<String, String>::new().into(), &new.into())
            .unwrap();
        assert_eq!(
            commands[0].as_str(),
            "qmgr -c 'set queue workq attr.comment=\"two words\"'"
        );
    }

    #[test]
    fn test_quote_collision_rejected_when_enabled() {
        let differ = Differ::new(
            CommandBuilder::new("qmgr"),
            DiffOptions {
                reject_quote_collisions: true,
                ..DiffOptions::default()
            },
        );
        let result = differ.diff(
            queue(),
            "comment",
            &None::<String>.into(),
            &Some("a'b\"c".to_string()).into(),
        );
        assert!(matches!(result, Err(QmgrError::QuoteCollision { .. })));

        // Default behaviour keeps emitting the single-quoted form.
        assert_eq!(
            run(None::<String>.into(), Some("a'b\"c".to_string()).into()),
            vec!["qmgr -c 'set queue workq attr='a'b\"c''"]
        );
    }

    #[test]
    fn test_shape_mismatch() {
        let result = differ().diff(queue(), "attr", &true.into(), &Some(true).into());
        assert!(matches!(
            result,
            Err(QmgrError::ShapeMismatch {
                old: ValueShape::Bool,
                new: ValueShape::OptionalBool,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_values() {
        for shape in [
            ValueShape::Bool,
            ValueShape::OptionalBool,
            ValueShape::Int32,
            ValueShape::OptionalInt32,
            ValueShape::String,
            ValueShape::OptionalString,
            ValueShape::StringMap,
        ] {
            assert_eq!(TypedValue::empty(shape).shape(), shape);
        }
        assert!(ValueShape::OptionalInt32.is_optional());
        assert!(!ValueShape::StringMap.is_optional());
    }

    fn typed_value() -> impl Strategy<Value = TypedValue> {
        prop_oneof![
            any::<bool>().prop_map(TypedValue::Bool),
            any::<Option<bool>>().prop_map(TypedValue::OptionalBool),
            any::<i32>().prop_map(TypedValue::Int32),
            any::<Option<i32>>().prop_map(TypedValue::OptionalInt32),
            "[a-z \"']{0,12}".prop_map(TypedValue::String),
            proptest::option::of("[a-z \"']{0,12}").prop_map(TypedValue::OptionalString),
            proptest::collection::btree_map("[a-z]{1,6}", "[a-z0-9:]{0,6}", 0..5)
                .prop_map(TypedValue::StringMap),
        ]
    }

    proptest! {
        #[test]
        fn prop_diff_against_self_is_empty(value in typed_value()) {
            let commands = differ().diff(queue(), "attr", &value, &value).unwrap();
            prop_assert!(commands.is_empty());
        }

        #[test]
        fn prop_diff_from_empty_sets_everything(
            entries in proptest::collection::btree_map("[a-z]{1,6}", "[a-z0-9]{1,6}", 0..6)
        ) {
            let commands = differ()
                .diff(queue(), "attr", &BTreeMap::<String, String>::new().into(), &entries.clone().into())
                .unwrap();
            prop_assert_eq!(commands.len(), entries.len());
            prop_assert!(commands.iter().all(|c| c.as_str().contains("'set queue workq attr.")));
        }
    }
}
