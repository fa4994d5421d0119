//! PBS object kinds managed through qmgr.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A manageable qmgr object type.
///
/// Each kind has two spellings:
/// - the lowercase keyword used on the qmgr command line (`queue`)
/// - the capitalised label heading each block of `qmgr list` output (`Queue`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Execution or routing queue.
    Queue,
    /// Compute node (vnode).
    Node,
    /// Site or built-in hook.
    Hook,
    /// Custom resource definition.
    Resource,
    /// The server object itself.
    Server,
}

impl ObjectKind {
    /// All object kinds, in listing order.
    pub const ALL: [ObjectKind; 5] = [
        ObjectKind::Server,
        ObjectKind::Resource,
        ObjectKind::Queue,
        ObjectKind::Node,
        ObjectKind::Hook,
    ];

    /// Keyword used in qmgr directives.
    pub fn keyword(&self) -> &'static str {
        match self {
            ObjectKind::Queue => "queue",
            ObjectKind::Node => "node",
            ObjectKind::Hook => "hook",
            ObjectKind::Resource => "resource",
            ObjectKind::Server => "server",
        }
    }

    /// Header label used in `qmgr list` output.
    pub fn label(&self) -> &'static str {
        match self {
            ObjectKind::Queue => "Queue",
            ObjectKind::Node => "Node",
            ObjectKind::Hook => "Hook",
            ObjectKind::Resource => "Resource",
            ObjectKind::Server => "Server",
        }
    }

    /// Whether qmgr can create and delete objects of this kind.
    pub fn supports_create_delete(&self) -> bool {
        !matches!(self, ObjectKind::Server)
    }

    /// Match a listing header label or a keyword, ignoring case.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.keyword().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for ObjectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "queue" | "queues" | "q" => Ok(ObjectKind::Queue),
            "node" | "nodes" | "n" => Ok(ObjectKind::Node),
            "hook" | "hooks" | "h" => Ok(ObjectKind::Hook),
            "resource" | "resources" | "r" => Ok(ObjectKind::Resource),
            "server" | "s" => Ok(ObjectKind::Server),
            other => Err(format!("Unknown object kind: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_and_label() {
        assert_eq!(ObjectKind::Queue.keyword(), "queue");
        assert_eq!(ObjectKind::Queue.label(), "Queue");
        assert_eq!(ObjectKind::Resource.to_string(), "resource");
    }

    #[test]
    fn test_from_label() {
        assert_eq!(ObjectKind::from_label("Queue"), Some(ObjectKind::Queue));
        assert_eq!(ObjectKind::from_label("HOOK"), Some(ObjectKind::Hook));
        assert_eq!(ObjectKind::from_label("server"), Some(ObjectKind::Server));
        assert_eq!(ObjectKind::from_label("Job"), None);
    }

    #[test]
    fn test_from_str_aliases() {
        assert_eq!("nodes".parse::<ObjectKind>(), Ok(ObjectKind::Node));
        assert_eq!("Resource".parse::<ObjectKind>(), Ok(ObjectKind::Resource));
        assert!("sched".parse::<ObjectKind>().is_err());
    }

    #[test]
    fn test_create_delete_support() {
        assert!(ObjectKind::Queue.supports_create_delete());
        assert!(!ObjectKind::Server.supports_create_delete());
    }
}
