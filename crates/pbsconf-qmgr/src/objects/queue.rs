//! Queue attribute table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::QmgrResult;
use crate::kind::ObjectKind;
use crate::objects::{Field, PbsObject, RecordReader};
use crate::parser::RawRecord;

/// A PBS queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Queue {
    pub name: String,
    /// `Execution` or `Route`. Required in desired state: PBS cannot unset
    /// it, and the empty default is rejected by `DesiredState::validate`.
    pub queue_type: String,
    pub enabled: bool,
    pub started: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_running: Option<i32>,
    /// Limit expression, e.g. `[o:PBS_ALL=100]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_queued: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_user_run: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_group_run: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_route_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_destinations: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acl_host_enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acl_hosts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acl_user_enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acl_users: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acl_group_enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acl_groups: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub resources_default: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub resources_max: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub resources_min: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub resources_available: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub default_chunk: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub max_group_res: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub max_user_res: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_group_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kill_delay: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Queue {
    /// An enabled, started execution queue.
    pub fn execution(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            queue_type: "Execution".to_string(),
            enabled: true,
            started: true,
            ..Self::default()
        }
    }
}

impl PbsObject for Queue {
    const KIND: ObjectKind = ObjectKind::Queue;

    fn name(&self) -> &str {
        &self.name
    }

    fn from_record(record: &RawRecord) -> QmgrResult<Self> {
        let r = RecordReader::new(Self::KIND, record);
        Ok(Self {
            name: r.name(),
            queue_type: r.string("queue_type")?,
            enabled: r.bool("enabled")?,
            started: r.bool("started")?,
            priority: r.optional_int("priority")?,
            max_running: r.optional_int("max_running")?,
            max_queued: r.optional_string("max_queued")?,
            max_user_run: r.optional_int("max_user_run")?,
            max_group_run: r.optional_int("max_group_run")?,
            from_route_only: r.optional_bool("from_route_only")?,
            route_destinations: r.optional_string("route_destinations")?,
            acl_host_enable: r.optional_bool("acl_host_enable")?,
            acl_hosts: r.optional_string("acl_hosts")?,
            acl_user_enable: r.optional_bool("acl_user_enable")?,
            acl_users: r.optional_string("acl_users")?,
            acl_group_enable: r.optional_bool("acl_group_enable")?,
            acl_groups: r.optional_string("acl_groups")?,
            resources_default: r.string_map("resources_default")?,
            resources_max: r.string_map("resources_max")?,
            resources_min: r.string_map("resources_min")?,
            resources_available: r.string_map("resources_available")?,
            default_chunk: r.string_map("default_chunk")?,
            max_group_res: r.string_map("max_group_res")?,
            max_user_res: r.string_map("max_user_res")?,
            node_group_key: r.optional_string("node_group_key")?,
            partition: r.optional_string("partition")?,
            kill_delay: r.optional_int("kill_delay")?,
            comment: r.optional_string("comment")?,
        })
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("queue_type", self.queue_type.clone()),
            Field::new("enabled", self.enabled),
            Field::new("started", self.started),
            Field::new("priority", self.priority),
            Field::new("max_running", self.max_running),
            Field::new("max_queued", self.max_queued.clone()),
            Field::new("max_user_run", self.max_user_run),
            Field::new("max_group_run", self.max_group_run),
            Field::new("from_route_only", self.from_route_only),
            Field::new("route_destinations", self.route_destinations.clone()),
            Field::new("acl_host_enable", self.acl_host_enable),
            Field::new("acl_hosts", self.acl_hosts.clone()),
            Field::new("acl_user_enable", self.acl_user_enable),
            Field::new("acl_users", self.acl_users.clone()),
            Field::new("acl_group_enable", self.acl_group_enable),
            Field::new("acl_groups", self.acl_groups.clone()),
            Field::new("resources_default", self.resources_default.clone()),
            Field::new("resources_max", self.resources_max.clone()),
            Field::new("resources_min", self.resources_min.clone()),
            Field::new("resources_available", self.resources_available.clone()),
            Field::new("default_chunk", self.default_chunk.clone()),
            Field::new("max_group_res", self.max_group_res.clone()),
            Field::new("max_user_res", self.max_user_res.clone()),
            Field::new("node_group_key", self.node_group_key.clone()),
            Field::new("partition", self.partition.clone()),
            Field::new("kill_delay", self.kill_delay),
            Field::new("comment", self.comment.clone()),
        ]
    }
}
