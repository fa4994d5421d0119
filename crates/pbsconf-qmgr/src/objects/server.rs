//! Server attribute table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::QmgrResult;
use crate::kind::ObjectKind;
use crate::objects::{Field, PbsObject, RecordReader};
use crate::parser::RawRecord;

/// The PBS server object. There is exactly one; it is never created or
/// deleted, and commands address it without a name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduling: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_queue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_events: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_other_jobs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flatuid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resv_enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_fail_requeue: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_array_size: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_history_enable: Option<bool>,
    /// Duration such as `336:00:00`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_history_duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligible_time_enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_provision: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acl_host_enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acl_hosts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acl_roots: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operators: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub resources_default: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub resources_max: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub default_chunk: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_run: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_queued: Option<String>,
}

impl PbsObject for Server {
    const KIND: ObjectKind = ObjectKind::Server;

    fn name(&self) -> &str {
        &self.name
    }

    fn target_name(&self) -> &str {
        ""
    }

    fn from_record(record: &RawRecord) -> QmgrResult<Self> {
        let r = RecordReader::new(Self::KIND, record);
        Ok(Self {
            name: r.name(),
            scheduling: r.optional_bool("scheduling")?,
            default_queue: r.optional_string("default_queue")?,
            comment: r.optional_string("comment")?,
            log_events: r.optional_int("log_events")?,
            mail_from: r.optional_string("mail_from")?,
            query_other_jobs: r.optional_bool("query_other_jobs")?,
            flatuid: r.optional_bool("flatuid")?,
            resv_enable: r.optional_bool("resv_enable")?,
            node_fail_requeue: r.optional_int("node_fail_requeue")?,
            max_array_size: r.optional_int("max_array_size")?,
            job_history_enable: r.optional_bool("job_history_enable")?,
            job_history_duration: r.optional_string("job_history_duration")?,
            eligible_time_enable: r.optional_bool("eligible_time_enable")?,
            max_concurrent_provision: r.optional_int("max_concurrent_provision")?,
            acl_host_enable: r.optional_bool("acl_host_enable")?,
            acl_hosts: r.optional_string("acl_hosts")?,
            acl_roots: r.optional_string("acl_roots")?,
            managers: r.optional_string("managers")?,
            operators: r.optional_string("operators")?,
            resources_default: r.string_map("resources_default")?,
            resources_max: r.string_map("resources_max")?,
            default_chunk: r.string_map("default_chunk")?,
            max_run: r.optional_string("max_run")?,
            max_queued: r.optional_string("max_queued")?,
        })
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("scheduling", self.scheduling),
            Field::new("default_queue", self.default_queue.clone()),
            Field::new("comment", self.comment.clone()),
            Field::new("log_events", self.log_events),
            Field::new("mail_from", self.mail_from.clone()),
            Field::new("query_other_jobs", self.query_other_jobs),
            Field::new("flatuid", self.flatuid),
            Field::new("resv_enable", self.resv_enable),
            Field::new("node_fail_requeue", self.node_fail_requeue),
            Field::new("max_array_size", self.max_array_size),
            Field::new("job_history_enable", self.job_history_enable),
            Field::new("job_history_duration", self.job_history_duration.clone()),
            Field::new("eligible_time_enable", self.eligible_time_enable),
            Field::new("max_concurrent_provision", self.max_concurrent_provision),
            Field::new("acl_host_enable", self.acl_host_enable),
            Field::new("acl_hosts", self.acl_hosts.clone()),
            Field::new("acl_roots", self.acl_roots.clone()),
            Field::new("managers", self.managers.clone()),
            Field::new("operators", self.operators.clone()),
            Field::new("resources_default", self.resources_default.clone()),
            Field::new("resources_max", self.resources_max.clone()),
            Field::new("default_chunk", self.default_chunk.clone()),
            Field::new("max_run", self.max_run.clone()),
            Field::new("max_queued", self.max_queued.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, CommandBuilder};
    use crate::diff::{DiffOptions, Differ};
    use crate::objects::diff_objects;
    use crate::parser::parse;

    const LISTING: &str = "Server pbs-head
    server_state = Active
    scheduling = True
    default_queue = workq
    log_events = 511
    mail_from = adm
    query_other_jobs = True
    resources_default.ncpus = 1
    default_chunk.ncpus = 1
    resv_enable = True
    node_fail_requeue = 310
    max_array_size = 10000
    pbs_license_min = 0
    eligible_time_enable = False
    max_concurrent_provision = 5
    managers = root@pbs-head
";

    #[test]
    fn test_server_from_record() {
        let records = parse(LISTING);
        let server = Server::from_record(&records[0]).unwrap();
        assert_eq!(server.name, "pbs-head");
        assert_eq!(server.scheduling, Some(true));
        assert_eq!(server.default_queue.as_deref(), Some("workq"));
        assert_eq!(server.log_events, Some(511));
        assert_eq!(server.node_fail_requeue, Some(310));
        assert_eq!(server.eligible_time_enable, Some(false));
        assert_eq!(server.default_chunk["ncpus"], "1");
        assert_eq!(server.managers.as_deref(), Some("root@pbs-head"));
    }

    #[test]
    fn test_server_commands_omit_name() {
        let records = parse(LISTING);
        let old = Server::from_record(&records[0]).unwrap();
        let mut new = old.clone();
        new.scheduling = Some(false);
        new.mail_from = None;

        let differ = Differ::new(CommandBuilder::new("qmgr"), DiffOptions::default());
        let commands = diff_objects(&differ, &old, &new).unwrap();
        let commands: Vec<&str> = commands.iter().map(Command::as_str).collect();
        assert_eq!(
            commands,
            vec![
                "qmgr -c 'set server scheduling=false'",
                "qmgr -c 'unset server mail_from'",
            ]
        );
    }
}
