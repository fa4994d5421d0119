//! Parser for `qmgr list` output.
//!
//! `qmgr -c 'list queue @default'` output format:
//! ```text
//! Queue workq
//!     queue_type = Execution
//!     resources_default.ncpus = 1
//!     resources_default.mem = 1gb
//!     enabled = True
//!
//! Hook pbs_cgroups
//!     type = pbs
//!     event = execjob_begin,execjob_epilogue,
//!         execjob_attach,
//!         execjob_resize
//! ```
//!
//! Blocks are separated by blank lines. Each block starts with an unindented
//! `<Kind> <name>` header followed by indented `key = value` lines. A line that
//! is not a `key = value` pair and is indented deeper than the previous
//! attribute line continues that attribute's value; qmgr wraps long lists this
//! way, so the pieces are concatenated without a separator.
//!
//! Parsing never fails: lines that fit no rule are skipped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Column width of a tab when measuring indentation.
const TAB_WIDTH: usize = 8;

/// Value of one listed attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Plain `key = value` attribute.
    Scalar(String),
    /// Entries of compound `base.key = value` attributes sharing one base.
    SubMap(BTreeMap<String, String>),
}

impl AttributeValue {
    /// The scalar text, if this is a scalar.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            AttributeValue::Scalar(s) => Some(s),
            AttributeValue::SubMap(_) => None,
        }
    }

    /// The entries, if this is a compound attribute.
    pub fn as_sub_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            AttributeValue::Scalar(_) => None,
            AttributeValue::SubMap(map) => Some(map),
        }
    }
}

/// Attributes of one listed object, in the order they first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes {
    entries: Vec<(String, AttributeValue)>,
}

impl Attributes {
    /// Create an empty attribute map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct attribute names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no attribute was listed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look an attribute up by its exact name.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Look an attribute up ignoring ASCII case.
    pub fn get_ignore_case(&self, name: &str) -> Option<&AttributeValue> {
        self.get(name).or_else(|| {
            self.entries
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
    }

    /// Iterate attributes in listing order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Store a scalar, replacing any previous value under the same name.
    pub fn insert_scalar(&mut self, name: &str, value: impl Into<String>) {
        let value = AttributeValue::Scalar(value.into());
        match self.position(name) {
            Some(index) => {
                if matches!(self.entries[index].1, AttributeValue::SubMap(_)) {
                    tracing::warn!(attribute = name, "scalar replaces compound attribute");
                }
                self.entries[index].1 = value;
            }
            None => self.entries.push((name.to_string(), value)),
        }
    }

    /// Store one entry of a compound attribute.
    pub fn insert_entry(&mut self, name: &str, key: &str, value: impl Into<String>) {
        let index = match self.position(name) {
            Some(index) => index,
            None => {
                self.entries
                    .push((name.to_string(), AttributeValue::SubMap(BTreeMap::new())));
                self.entries.len() - 1
            }
        };

        let slot = &mut self.entries[index].1;
        if let AttributeValue::Scalar(_) = slot {
            tracing::warn!(attribute = name, "compound attribute replaces scalar");
            *slot = AttributeValue::SubMap(BTreeMap::new());
        }
        if let AttributeValue::SubMap(map) = slot {
            map.insert(key.to_string(), value.into());
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(key, _)| key == name)
    }

    fn append(&mut self, target: &AttributeTarget, text: &str) {
        let Some(index) = self.position(&target.name) else {
            return;
        };
        match (&mut self.entries[index].1, &target.key) {
            (AttributeValue::Scalar(value), None) => value.push_str(text),
            (AttributeValue::SubMap(map), Some(key)) => {
                if let Some(value) = map.get_mut(key) {
                    value.push_str(text);
                }
            }
            _ => {}
        }
    }
}

/// One object block of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Header label as listed (`Queue`, `Node`, ...).
    pub object_kind: String,
    /// Object name: the remainder of the header line.
    pub name: String,
    /// Listed attributes.
    pub attributes: Attributes,
}

impl RawRecord {
    fn new(object_kind: &str, name: &str) -> Self {
        Self {
            object_kind: object_kind.to_string(),
            name: name.to_string(),
            attributes: Attributes::new(),
        }
    }
}

/// The attribute the last `key = value` line wrote to.
struct AttributeTarget {
    name: String,
    key: Option<String>,
    indent: usize,
}

/// Parse `qmgr list` output into one record per object block.
pub fn parse(raw: &str) -> Vec<RawRecord> {
    let mut records = Vec::new();
    let mut current: Option<RawRecord> = None;
    let mut last: Option<AttributeTarget> = None;

    for line in raw.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            records.extend(current.take());
            last = None;
            continue;
        }

        let indent = indentation(line);

        if indent == 0 {
            records.extend(current.take());
            last = None;
            let (kind, name) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
            current = Some(RawRecord::new(kind, name));
            continue;
        }

        let Some(record) = current.as_mut() else {
            tracing::trace!(line, "skipping indented line outside of a block");
            continue;
        };

        if let Some((key, value)) = split_attribute(trimmed) {
            let target = match key.split_once('.') {
                Some((name, sub_key)) => {
                    record.attributes.insert_entry(name, sub_key, value);
                    AttributeTarget {
                        name: name.to_string(),
                        key: Some(sub_key.to_string()),
                        indent,
                    }
                }
                None => {
                    record.attributes.insert_scalar(key, value);
                    AttributeTarget {
                        name: key.to_string(),
                        key: None,
                        indent,
                    }
                }
            };
            last = Some(target);
            continue;
        }

        match &last {
            Some(target) if indent > target.indent => {
                record.attributes.append(target, trimmed);
            }
            _ => tracing::trace!(line, "skipping unrecognized line"),
        }
    }

    records.extend(current);
    records
}

/// Split a trimmed line into `key` and `value` around ` = `.
///
/// The key must be a single non-empty word. A line ending in ` =` has an
/// empty value.
fn split_attribute(line: &str) -> Option<(&str, &str)> {
    let (key, value) = match line.split_once(" = ") {
        Some((key, value)) => (key, value.trim()),
        None => (line.strip_suffix(" =")?, ""),
    };
    let key = key.trim_end();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some((key, value))
}

/// Leading whitespace width in columns.
fn indentation(line: &str) -> usize {
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width += TAB_WIDTH - width % TAB_WIDTH,
            _ => break,
        }
    }
    width
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_QUEUES: &str = "Queue workq
    queue_type = Execution
    total_jobs = 0
    state_count = Transit:0 Queued:0 Held:0 Waiting:0 Running:0 Exiting:0 Begun:0
    enabled = True
    started = True

Queue test
    queue_type = Execution
    total_jobs = 0
    state_count = Transit:0 Queued:0 Held:0 Waiting:0 Running:0 Exiting:0 Begun:0
    resources_default.mem = 1gb
    resources_default.ncpus = 1
    resources_default.nodect = 1
    resources_default.walltime = 01:00:00
    enabled = True
    started = True

";

    fn scalar<'a>(record: &'a RawRecord, name: &str) -> &'a str {
        record
            .attributes
            .get(name)
            .and_then(AttributeValue::as_scalar)
            .unwrap()
    }

    #[test]
    fn test_parse_two_queues() {
        let records = parse(TWO_QUEUES);
        assert_eq!(records.len(), 2);

        let workq = &records[0];
        assert_eq!(workq.object_kind, "Queue");
        assert_eq!(workq.name, "workq");
        assert_eq!(workq.attributes.len(), 5);
        assert_eq!(scalar(workq, "queue_type"), "Execution");
        assert_eq!(scalar(workq, "total_jobs"), "0");
        assert_eq!(
            scalar(workq, "state_count"),
            "Transit:0 Queued:0 Held:0 Waiting:0 Running:0 Exiting:0 Begun:0"
        );
        assert_eq!(scalar(workq, "enabled"), "True");
        assert_eq!(scalar(workq, "started"), "True");

        let test = &records[1];
        assert_eq!(test.name, "test");
        assert_eq!(test.attributes.len(), 6);
        let defaults = test
            .attributes
            .get("resources_default")
            .and_then(AttributeValue::as_sub_map)
            .unwrap();
        assert_eq!(defaults.len(), 4);
        assert_eq!(defaults["mem"], "1gb");
        assert_eq!(defaults["ncpus"], "1");
        assert_eq!(defaults["nodect"], "1");
        assert_eq!(defaults["walltime"], "01:00:00");
    }

    #[test]
    fn test_attribute_order_preserved() {
        let records = parse(TWO_QUEUES);
        let names: Vec<&str> = records[1].attributes.iter().map(|(k, _)| k).collect();
        assert_eq!(
            names,
            vec![
                "queue_type",
                "total_jobs",
                "state_count",
                "resources_default",
                "enabled",
                "started"
            ]
        );
    }

    #[test]
    fn test_continuation_lines_concatenate() {
        let output = "Hook pbs_cgroups
    type = pbs
    event = execjob_begin,execjob_epilogue,
        execjob_attach,
        execjob_resize
    enabled = false
";
        let records = parse(output);
        assert_eq!(records.len(), 1);
        assert_eq!(
            scalar(&records[0], "event"),
            "execjob_begin,execjob_epilogue,execjob_attach,execjob_resize"
        );
        assert_eq!(scalar(&records[0], "enabled"), "false");
    }

    #[test]
    fn test_continuation_with_tabs() {
        let output = "Hook h1\n    event = queuejob,\n\tmodifyjob\n";
        let records = parse(output);
        assert_eq!(scalar(&records[0], "event"), "queuejob,modifyjob");
    }

    #[test]
    fn test_continuation_of_compound_attribute() {
        let output = "Queue q1
    resources_default.host_list = a,b,
        c
    resources_default.ncpus = 2
";
        let records = parse(output);
        let map = records[0]
            .attributes
            .get("resources_default")
            .and_then(AttributeValue::as_sub_map)
            .unwrap();
        assert_eq!(map["host_list"], "a,b,c");
        assert_eq!(map["ncpus"], "2");
    }

    #[test]
    fn test_compound_key_splits_on_first_dot() {
        let records = parse("Server pbs\n    resources_available.a.b = 3\n");
        let map = records[0]
            .attributes
            .get("resources_available")
            .and_then(AttributeValue::as_sub_map)
            .unwrap();
        assert_eq!(map["a.b"], "3");
    }

    #[test]
    fn test_empty_value() {
        let records = parse("Queue q1\n    comment = \n    acl_users =\n");
        assert_eq!(scalar(&records[0], "comment"), "");
        assert_eq!(scalar(&records[0], "acl_users"), "");
    }

    #[test]
    fn test_value_containing_equals() {
        let records = parse("Node n1\n    comment = a = b\n");
        assert_eq!(scalar(&records[0], "comment"), "a = b");
    }

    #[test]
    fn test_record_without_attributes() {
        let records = parse("Resource foo\n\nResource bar\n");
        assert_eq!(records.len(), 2);
        assert!(records[0].attributes.is_empty());
        assert_eq!(records[1].name, "bar");
    }

    #[test]
    fn test_empty_listing() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n   \n").is_empty());
    }

    #[test]
    fn test_header_name_keeps_remainder() {
        let records = parse("Server pbs head node\n");
        assert_eq!(records[0].object_kind, "Server");
        assert_eq!(records[0].name, "pbs head node");
    }

    #[test]
    fn test_unknown_lines_are_ignored() {
        let output = "    orphan = 1
Queue q1
    enabled = True
    not an attribute
";
        let records = parse(output);
        assert_eq!(records.len(), 1);
        assert_eq!(scalar(&records[0], "enabled"), "True");
        assert_eq!(records[0].attributes.len(), 1);
    }

    #[test]
    fn test_get_ignore_case() {
        let records = parse("Node n1\n    Mom = host1\n    Port = 15002\n");
        let attrs = &records[0].attributes;
        assert!(attrs.get("mom").is_none());
        assert_eq!(
            attrs.get_ignore_case("mom").and_then(AttributeValue::as_scalar),
            Some("host1")
        );
    }

    #[test]
    fn test_compound_entry_replaces_scalar() {
        let records = parse("Queue q1\n    a = 1\n    a.b = 2\n");
        let attrs = &records[0].attributes;
        assert_eq!(attrs.len(), 1);
        let map = attrs.get("a").and_then(AttributeValue::as_sub_map).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["b"], "2");
    }

    #[test]
    fn test_scalar_replaces_compound_entries() {
        let records = parse("Queue q1\n    a.b = 2\n    a.c = 3\n    a = 1\n");
        let attrs = &records[0].attributes;
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.get("a"), Some(&AttributeValue::Scalar("1".to_string())));
    }

    #[test]
    fn test_continuation_after_replacement() {
        let records = parse(
            "Queue q1
    a = 1
    a.b = x,
        y
    c.d = 2
    c = long,
        tail
",
        );
        let attrs = &records[0].attributes;
        assert_eq!(attrs.len(), 2);
        let map = attrs.get("a").and_then(AttributeValue::as_sub_map).unwrap();
        assert_eq!(map["b"], "x,y");
        assert_eq!(attrs.get("c"), Some(&AttributeValue::Scalar("long,tail".to_string())));
    }
}
