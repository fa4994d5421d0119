//! qmgr attribute protocol engine for PBS Professional.
//!
//! This crate reads and writes PBS server, queue, node, hook and resource
//! configuration through the `qmgr` command line:
//!
//! - [`parser`] turns `qmgr -c 'list <kind> @default'` output into
//!   [`RawRecord`]s.
//! - [`diff`] computes the `set`/`unset` commands turning one attribute
//!   value into another, quoting strings through [`quote`].
//! - [`objects`] maps records onto typed objects and diffs whole objects.
//! - [`client`] runs the read, diff, execute, re-read pipeline over a
//!   [`CommandExecutor`].
//!
//! # Example
//!
//! ```
//! use pbsconf_qmgr::{CommandBuilder, DiffOptions, Differ, Queue, objects, parse};
//! use pbsconf_qmgr::objects::PbsObject;
//!
//! let listing = "Queue workq\n    queue_type = Execution\n    enabled = True\n";
//! let records = parse(listing);
//! let current = Queue::from_record(&records[0]).unwrap();
//!
//! let mut desired = current.clone();
//! desired.started = true;
//!
//! let differ = Differ::new(CommandBuilder::new("qmgr"), DiffOptions::default());
//! let commands = objects::diff_objects(&differ, &current, &desired).unwrap();
//! assert_eq!(commands[0].as_str(), "qmgr -c 'set queue workq started=true'");
//! ```

pub mod client;
pub mod command;
pub mod config;
pub mod desired;
pub mod diff;
pub mod error;
pub mod executor;
pub mod kind;
pub mod objects;
pub mod parser;
pub mod quote;

pub use client::{ApplyReport, ChangeAction, PlannedChange, QmgrClient, plan_change, plan_from_records};
pub use command::{Command, CommandBuilder, DEFAULT_QMGR_PATH};
pub use config::{ConfigError, ExecutorConfig, QmgrConfig};
pub use desired::DesiredState;
pub use diff::{DiffOptions, Differ, Target, TypedValue, ValueShape};
pub use error::{QmgrError, QmgrResult};
pub use executor::{CommandExecutor, CommandOutput, MockExecutor, ShellExecutor, is_empty_listing_error};
pub use kind::ObjectKind;
pub use objects::{Hook, Node, PbsObject, Queue, Resource, Server};
pub use parser::{AttributeValue, Attributes, RawRecord, parse};
pub use quote::escape_for_command;
