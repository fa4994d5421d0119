//! Hook attribute table.

use serde::{Deserialize, Serialize};

use crate::error::QmgrResult;
use crate::kind::ObjectKind;
use crate::objects::{Field, PbsObject, RecordReader};
use crate::parser::RawRecord;

/// A PBS hook.
///
/// `hook_type` is reported by the server (`site` or `pbs`) and never written:
/// qmgr only creates site hooks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hook {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_type: Option<String>,
    pub enabled: bool,
    /// Comma separated event list, e.g. `execjob_begin,execjob_end`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_action: Option<String>,
    /// Position among hooks of the same event, 1 to 1000. Required in desired
    /// state; the zero default is rejected by `DesiredState::validate`.
    pub order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freq: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

impl PbsObject for Hook {
    const KIND: ObjectKind = ObjectKind::Hook;

    fn name(&self) -> &str {
        &self.name
    }

    fn from_record(record: &RawRecord) -> QmgrResult<Self> {
        let r = RecordReader::new(Self::KIND, record);
        Ok(Self {
            name: r.name(),
            hook_type: r.optional_string("type")?,
            enabled: r.bool("enabled")?,
            event: r.optional_string("event")?,
            user: r.optional_string("user")?,
            fail_action: r.optional_string("fail_action")?,
            order: r.int("order")?,
            alarm: r.optional_int("alarm")?,
            freq: r.optional_int("freq")?,
            debug: r.optional_bool("debug")?,
        })
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("enabled", self.enabled),
            Field::new("event", self.event.clone()),
            Field::new("user", self.user.clone()),
            Field::new("fail_action", self.fail_action.clone()),
            Field::new("order", self.order),
            Field::new("alarm", self.alarm),
            Field::new("freq", self.freq),
            Field::new("debug", self.debug),
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

    #[test]
    fn test_hook_from_wrapped_listing() {
        let records = parse(
            "Hook pbs_cgroups
    type = pbs
    enabled = false
    event = execjob_begin,execjob_epilogue,execjob_end,execjob_launch,
        execjob_attach,
        execjob_resize
    user = pbsadmin
    alarm = 90
    freq = 120
    order = 100
    debug = false
    fail_action = offline_vnodes
",
        );
        let hook = Hook::from_record(&records[0]).unwrap();
        assert_eq!(hook.hook_type.as_deref(), Some("pbs"));
        assert!(!hook.enabled);
        assert_eq!(
            hook.event.as_deref(),
            Some("execjob_begin,execjob_epilogue,execjob_end,execjob_launch,execjob_attach,execjob_resize")
        );
        assert_eq!(hook.order, 100);
        assert_eq!(hook.alarm, Some(90));
        assert_eq!(hook.fail_action.as_deref(), Some("offline_vnodes"));
    }

    #[test]
    fn test_hook_update() {
        let old = Hook {
            name: "h1".to_string(),
            enabled: false,
            event: Some("queuejob".to_string()),
            order: 1,
            ..Hook::default()
        };
        let new = Hook {
            enabled: true,
            event: Some("queuejob,modifyjob".to_string()),
            order: 5,
            ..old.clone()
        };
        let differ = Differ::new(CommandBuilder::new("qmgr"), DiffOptions::default());
        let commands = diff_objects(&differ, &old, &new).unwrap();
        let commands: Vec<&str> = commands.iter().map(Command::as_str).collect();
        assert_eq!(
            commands,
            vec![
                "qmgr -c 'set hook h1 enabled=true'",
                "qmgr -c 'set hook h1 event=\"queuejob,modifyjob\"'",
                "qmgr -c 'set hook h1 order=5'",
            ]
        );
    }
}
