//! Custom resource attribute table.

use serde::{Deserialize, Serialize};

use crate::error::QmgrResult;
use crate::kind::ObjectKind;
use crate::objects::{Field, PbsObject, RecordReader};
use crate::parser::RawRecord;

/// A custom resource definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resource {
    pub name: String,
    /// `string`, `long`, `boolean`, `size`, `float` or `string_array`.
    /// Only passed on `create resource`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    /// Flags such as `h`, `nh`, `q`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
}

impl PbsObject for Resource {
    const KIND: ObjectKind = ObjectKind::Resource;

    fn name(&self) -> &str {
        &self.name
    }

    fn from_record(record: &RawRecord) -> QmgrResult<Self> {
        let r = RecordReader::new(Self::KIND, record);
        Ok(Self {
            name: r.name(),
            resource_type: r.optional_string("type")?,
            flag: r.optional_string("flag")?,
        })
    }

    fn fields(&self) -> Vec<Field> {
        vec![Field::new("flag", self.flag.clone())]
    }

    fn creation_attributes(&self) -> Vec<(&'static str, String)> {
        self.resource_type
            .iter()
            .map(|t| ("type", t.clone()))
            .collect()
    }
}
