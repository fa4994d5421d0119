//! Node attribute table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::QmgrResult;
use crate::kind::ObjectKind;
use crate::objects::{Field, PbsObject, RecordReader};
use crate::parser::RawRecord;

/// A PBS compute node.
///
/// `mom` and `port` are only passed on `create node`; changing them on an
/// existing node means recreating it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    pub name: String,
    /// Host running the MoM daemon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mom: Option<String>,
    /// MoM listening port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resv_enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provision_enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_aoe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_provisioning: Option<bool>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub resources_available: BTreeMap<String, String>,
}

impl PbsObject for Node {
    const KIND: ObjectKind = ObjectKind::Node;

    fn name(&self) -> &str {
        &self.name
    }

    fn from_record(record: &RawRecord) -> QmgrResult<Self> {
        let r = RecordReader::new(Self::KIND, record);
        Ok(Self {
            name: r.name(),
            mom: r.optional_string("Mom")?,
            port: r.optional_int("Port")?,
            comment: r.optional_string("comment")?,
            priority: r.optional_int("priority")?,
            queue: r.optional_string("queue")?,
            resv_enable: r.optional_bool("resv_enable")?,
            partition: r.optional_string("partition")?,
            provision_enable: r.optional_bool("provision_enable")?,
            current_aoe: r.optional_string("current_aoe")?,
            power_provisioning: r.optional_bool("power_provisioning")?,
            resources_available: r.string_map("resources_available")?,
        })
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("comment", self.comment.clone()),
            Field::new("priority", self.priority),
            Field::new("queue", self.queue.clone()),
            Field::new("resv_enable", self.resv_enable),
            Field::new("partition", self.partition.clone()),
            Field::new("provision_enable", self.provision_enable),
            Field::new("current_aoe", self.current_aoe.clone()),
            Field::new("power_provisioning", self.power_provisioning),
            Field::new("resources_available", self.resources_available.clone()),
        ]
    }

    fn creation_attributes(&self) -> Vec<(&'static str, String)> {
        let mut attributes = Vec::new();
        if let Some(mom) = &self.mom {
            attributes.push(("Mom", mom.clone()));
        }
        if let Some(port) = self.port {
            attributes.push(("Port", port.to_string()));
        }
        attributes
    }
}
