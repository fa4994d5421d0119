//! qmgr command rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::kind::ObjectKind;

/// Default location of the qmgr binary on PBS Professional installs.
pub const DEFAULT_QMGR_PATH: &str = "/opt/pbs/bin/qmgr";

/// One formatted shell command, executed as-is by a
/// [`CommandExecutor`](crate::executor::CommandExecutor).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Command(String);

impl Command {
    /// Wrap an already formatted command line.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The command line.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the command line.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Command {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// qmgr directive verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Create,
    Set,
    Unset,
    Delete,
    List,
}

impl Verb {
    /// Verb as written in a directive.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Create => "create",
            Verb::Set => "set",
            Verb::Unset => "unset",
            Verb::Delete => "delete",
            Verb::List => "list",
        }
    }
}

/// Renders `<qmgr> -c '<verb> <kind> <name> [<attr>[=<value>]]'` lines.
///
/// Values passed in must already be formatted (quoted where needed); the
/// builder only assembles the directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBuilder {
    qmgr_path: String,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_QMGR_PATH)
    }
}

impl CommandBuilder {
    /// Create a builder for the given qmgr binary path.
    pub fn new(qmgr_path: impl Into<String>) -> Self {
        Self {
            qmgr_path: qmgr_path.into(),
        }
    }

    /// The qmgr binary path.
    pub fn qmgr_path(&self) -> &str {
        &self.qmgr_path
    }

    /// `create <kind> <name> [attr=value,...]`
    pub fn create(&self, kind: ObjectKind, name: &str, attributes: &[(&str, String)]) -> Command {
        let mut directive = self.head(Verb::Create, kind, name);
        if !attributes.is_empty() {
            let joined = attributes
                .iter()
                .map(|(attr, value)| format!("{attr}={value}"))
                .collect::<Vec<_>>()
                .join(",");
            directive.push(' ');
            directive.push_str(&joined);
        }
        self.wrap(&directive)
    }

    /// `set <kind> <name> <attr>=<value>`
    pub fn set(&self, kind: ObjectKind, name: &str, attribute: &str, value: &str) -> Command {
        let directive = format!("{} {attribute}={value}", self.head(Verb::Set, kind, name));
        self.wrap(&directive)
    }

    /// `unset <kind> <name> <attr>`
    pub fn unset(&self, kind: ObjectKind, name: &str, attribute: &str) -> Command {
        let directive = format!("{} {attribute}", self.head(Verb::Unset, kind, name));
        self.wrap(&directive)
    }

    /// `delete <kind> <name>`
    pub fn delete(&self, kind: ObjectKind, name: &str) -> Command {
        self.wrap(&self.head(Verb::Delete, kind, name))
    }

    /// `list <kind> @default`, or plain `list server` for the server.
    pub fn list(&self, kind: ObjectKind) -> Command {
        let scope = match kind {
            ObjectKind::Server => "",
            _ => "@default",
        };
        self.wrap(&self.head(Verb::List, kind, scope))
    }

    fn head(&self, verb: Verb, kind: ObjectKind, name: &str) -> String {
        if name.is_empty() {
            format!("{} {}", verb.as_str(), kind.keyword())
        } else {
            format!("{} {} {name}", verb.as_str(), kind.keyword())
        }
    }

    fn wrap(&self, directive: &str) -> Command {
        Command(format!("{} -c '{directive}'", self.qmgr_path))
    }
}

/// Extract the kind of a `list <kind> ...` command, if it is one.
pub fn listed_kind(command: &Command) -> Option<ObjectKind> {
    let (_, directive) = command.as_str().split_once(" -c '")?;
    let mut words = directive.trim_end_matches('\'').split_whitespace();
    if words.next()? != Verb::List.as_str() {
        return None;
    }
    ObjectKind::from_label(words.next()?)
}
