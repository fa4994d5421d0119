//! Typed PBS objects and their attribute tables.
//!
//! Each object kind declares, in a fixed order, which typed field maps to
//! which qmgr attribute. Reading converts a [`RawRecord`] field by field;
//! writing diffs old and new field values through the [`Differ`] and
//! concatenates the resulting commands.
//!
//! Fields that can only be given at creation time (a node's `Mom` and
//! `Port`, a resource's `type`) are left out of [`PbsObject::fields`] and
//! never diffed.

mod hook;
mod node;
mod queue;
mod resource;
mod server;

pub use hook::Hook;
pub use node::Node;
pub use queue::Queue;
pub use resource::Resource;
pub use server::Server;

use std::collections::BTreeMap;

use crate::command::Command;
use crate::diff::{Differ, Target, TypedValue};
use crate::error::{QmgrError, QmgrResult};
use crate::kind::ObjectKind;
use crate::parser::{AttributeValue, RawRecord};

/// One entry of an object's attribute table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// qmgr attribute name.
    pub attribute: &'static str,
    /// Current value.
    pub value: TypedValue,
}

impl Field {
    pub fn new(attribute: &'static str, value: impl Into<TypedValue>) -> Self {
        Self {
            attribute,
            value: value.into(),
        }
    }
}

/// A typed qmgr object.
pub trait PbsObject: Clone + Default + Send + Sync + Sized {
    /// Object kind.
    const KIND: ObjectKind;

    /// Object name.
    fn name(&self) -> &str;

    /// Name used in commands addressing this object.
    fn target_name(&self) -> &str {
        self.name()
    }

    /// Convert a listed record. Fails on the first attribute that does not
    /// convert; no partial object is returned.
    fn from_record(record: &RawRecord) -> QmgrResult<Self>;

    /// Diffable attributes, in declared order.
    fn fields(&self) -> Vec<Field>;

    /// Attributes given on the `create` command only.
    fn creation_attributes(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Commands turning `old` into `new`, field by field in declared order.
pub fn diff_objects<T: PbsObject>(differ: &Differ, old: &T, new: &T) -> QmgrResult<Vec<Command>> {
    let target = Target::new(T::KIND, new.target_name());
    let mut commands = Vec::new();
    for (old_field, new_field) in old.fields().iter().zip(new.fields().iter()) {
        differ.diff_into(
            target,
            new_field.attribute,
            &old_field.value,
            &new_field.value,
            &mut commands,
        )?;
    }
    tracing::debug!(
        kind = T::KIND.keyword(),
        name = new.name(),
        commands = commands.len(),
        "computed update batch"
    );
    Ok(commands)
}

/// Commands creating `new`: one `create` followed by a `set` for every
/// field that differs from its empty value.
pub fn create_batch<T: PbsObject>(differ: &Differ, new: &T) -> QmgrResult<Vec<Command>> {
    if !T::KIND.supports_create_delete() {
        return Err(QmgrError::Unsupported {
            kind: T::KIND,
            operation: "create",
        });
    }

    let mut commands = vec![differ.builder().create(
        T::KIND,
        new.name(),
        &new.creation_attributes(),
    )];
    commands.extend(diff_objects(differ, &T::default(), new)?);
    Ok(commands)
}

/// Command deleting the named object.
pub fn delete_batch<T: PbsObject>(differ: &Differ, name: &str) -> QmgrResult<Vec<Command>> {
    if !T::KIND.supports_create_delete() {
        return Err(QmgrError::Unsupported {
            kind: T::KIND,
            operation: "delete",
        });
    }
    Ok(vec![differ.builder().delete(T::KIND, name)])
}

/// Convert every record whose header matches `T::KIND`.
pub fn from_records<T: PbsObject>(records: &[RawRecord]) -> QmgrResult<Vec<T>> {
    records
        .iter()
        .filter(|record| ObjectKind::from_label(&record.object_kind) == Some(T::KIND))
        .map(T::from_record)
        .collect()
}

/// Convert the record of kind `T` with the given name, if listed.
///
/// Other records are not converted, so a malformed neighbour does not fail
/// the lookup.
pub fn find_record<T: PbsObject>(records: &[RawRecord], name: &str) -> QmgrResult<Option<T>> {
    records
        .iter()
        .filter(|record| ObjectKind::from_label(&record.object_kind) == Some(T::KIND))
        .find(|record| record.name == name)
        .map(T::from_record)
        .transpose()
}

/// Typed access to the attributes of one record.
///
/// Attribute names match case-insensitively. Missing attributes read as
/// absent (or the empty value for required fields); present attributes that
/// do not convert are errors naming the kind and attribute.
pub struct RecordReader<'a> {
    kind: ObjectKind,
    record: &'a RawRecord,
}

impl<'a> RecordReader<'a> {
    /// Create a reader for a record of the given kind.
    pub fn new(kind: ObjectKind, record: &'a RawRecord) -> Self {
        Self { kind, record }
    }

    /// The record's object name.
    pub fn name(&self) -> String {
        self.record.name.clone()
    }

    fn scalar(&self, attribute: &str) -> QmgrResult<Option<&'a str>> {
        match self.record.attributes.get_ignore_case(attribute) {
            None => Ok(None),
            Some(AttributeValue::Scalar(value)) => Ok(Some(value.as_str())),
            Some(AttributeValue::SubMap(_)) => Err(QmgrError::invalid_attribute(
                self.kind,
                attribute,
                "expected a single value, found compound entries",
            )),
        }
    }

    pub fn optional_string(&self, attribute: &str) -> QmgrResult<Option<String>> {
        Ok(self.scalar(attribute)?.map(str::to_string))
    }

    pub fn string(&self, attribute: &str) -> QmgrResult<String> {
        Ok(self.optional_string(attribute)?.unwrap_or_default())
    }

    pub fn optional_bool(&self, attribute: &str) -> QmgrResult<Option<bool>> {
        self.scalar(attribute)?
            .map(|value| {
                parse_bool(value).ok_or_else(|| {
                    QmgrError::invalid_attribute(
                        self.kind,
                        attribute,
                        format!("not a boolean: {value}"),
                    )
                })
            })
            .transpose()
    }

    pub fn bool(&self, attribute: &str) -> QmgrResult<bool> {
        Ok(self.optional_bool(attribute)?.unwrap_or_default())
    }

    pub fn optional_int(&self, attribute: &str) -> QmgrResult<Option<i32>> {
        self.scalar(attribute)?
            .map(|value| {
                value.trim().parse::<i32>().map_err(|e| {
                    QmgrError::invalid_attribute(
                        self.kind,
                        attribute,
                        format!("not a 32-bit integer: {value} ({e})"),
                    )
                })
            })
            .transpose()
    }

    pub fn int(&self, attribute: &str) -> QmgrResult<i32> {
        Ok(self.optional_int(attribute)?.unwrap_or_default())
    }

    pub fn string_map(&self, attribute: &str) -> QmgrResult<BTreeMap<String, String>> {
        match self.record.attributes.get_ignore_case(attribute) {
            None => Ok(BTreeMap::new()),
            Some(AttributeValue::SubMap(map)) => Ok(map.clone()),
            Some(AttributeValue::Scalar(value)) => Err(QmgrError::invalid_attribute(
                self.kind,
                attribute,
                format!("expected compound entries, found single value: {value}"),
            )),
        }
    }
}

/// Parse a qmgr boolean (`True`, `false`, `1`, ...).
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "y" | "yes" => Some(true),
        "false" | "f" | "0" | "n" | "no" => Some(false),
        _ => None,
    }
}
