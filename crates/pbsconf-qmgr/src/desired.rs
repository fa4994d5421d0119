//! Desired-state documents.
//!
//! A desired state lists the objects that should exist and the attribute
//! values they should carry:
//!
//! ```yaml
//! resources:
//!   - name: ngpus
//!     type: long
//!     flag: nh
//! queues:
//!   - name: gpu
//!     queue_type: Execution
//!     enabled: true
//!     started: true
//!     resources_default:
//!       ngpus: "1"
//! server:
//!   default_queue: gpu
//! ```
//!
//! Objects not mentioned are left alone; nothing is deleted implicitly.
//! Within a mentioned object the entry is the complete desired state: an
//! optional attribute left out is `unset` if PBS currently has it. The
//! `server` entry above therefore also unsets `scheduling`, `log_events`,
//! `managers` and every other optional server attribute it does not list.
//!
//! Attributes PBS cannot unset must be given: `queue_type` for queues and
//! `order` for hooks. [`DesiredState::validate`] rejects documents missing
//! them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{QmgrError, QmgrResult};
use crate::kind::ObjectKind;
use crate::objects::{Hook, Node, PbsObject, Queue, Resource, Server};

/// Objects to reconcile, applied in field order: resources first so that
/// queues and nodes may reference them, the server last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesiredState {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub queues: Vec<Queue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hooks: Vec<Hook>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<Server>,
}

impl DesiredState {
    /// Parse and validate a YAML document.
    pub fn from_yaml(text: &str) -> QmgrResult<Self> {
        let state: Self = serde_yaml_ng::from_str(text)?;
        state.validate()?;
        Ok(state)
    }

    /// Check that every object has a name and the attributes PBS requires.
    pub fn validate(&self) -> QmgrResult<()> {
        require_names(&self.resources)?;
        require_names(&self.queues)?;
        require_names(&self.nodes)?;
        require_names(&self.hooks)?;

        for queue in &self.queues {
            if !QUEUE_TYPES
                .iter()
                .any(|t| t.eq_ignore_ascii_case(&queue.queue_type))
            {
                return Err(QmgrError::invalid_attribute(
                    ObjectKind::Queue,
                    "queue_type",
                    format!(
                        "queue '{}' needs queue_type Execution or Route, got '{}'",
                        queue.name, queue.queue_type
                    ),
                ));
            }
        }

        for hook in &self.hooks {
            if !HOOK_ORDER.contains(&hook.order) {
                return Err(QmgrError::invalid_attribute(
                    ObjectKind::Hook,
                    "order",
                    format!(
                        "hook '{}' needs an order between 1 and 1000, got {}",
                        hook.name, hook.order
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Load a YAML document from disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> QmgrResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&text)
    }

    /// Total number of objects named.
    pub fn len(&self) -> usize {
        self.resources.len()
            + self.queues.len()
            + self.nodes.len()
            + self.hooks.len()
            + usize::from(self.server.is_some())
    }

    /// Whether the document names no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names that appear more than once within one kind, as `kind/name`.
    pub fn duplicates(&self) -> Vec<String> {
        let mut duplicates = Vec::new();
        collect_duplicates(&self.resources, &mut duplicates);
        collect_duplicates(&self.queues, &mut duplicates);
        collect_duplicates(&self.nodes, &mut duplicates);
        collect_duplicates(&self.hooks, &mut duplicates);
        duplicates
    }
}

const QUEUE_TYPES: [&str; 2] = ["Execution", "Route"];

/// Valid `order` of a site hook.
const HOOK_ORDER: std::ops::RangeInclusive<i32> = 1..=1000;

fn require_names<T: PbsObject>(objects: &[T]) -> QmgrResult<()> {
    match objects.iter().find(|o| o.name().trim().is_empty()) {
        Some(_) => Err(QmgrError::invalid_attribute(
            T::KIND,
            "name",
            "every object needs a name",
        )),
        None => Ok(()),
    }
}

fn collect_duplicates<T: PbsObject>(objects: &[T], out: &mut Vec<String>) {
    let mut seen = std::collections::BTreeSet::new();
    for object in objects {
        if !seen.insert(object.name()) {
            out.push(format!("{}/{}", T::KIND, object.name()));
        }
    }
}
