//! Read, diff, execute and re-read pipeline over a [`CommandExecutor`].

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::config::QmgrConfig;
use crate::desired::DesiredState;
use crate::diff::Differ;
use crate::error::{QmgrError, QmgrResult};
use crate::executor::{CommandExecutor, is_empty_listing_error};
use crate::kind::ObjectKind;
use crate::objects::{self, PbsObject, Server};
use crate::parser::{self, RawRecord};

/// What reconciling one object does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Create,
    Update,
    Unchanged,
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Unchanged => "unchanged",
        };
        write!(f, "{s}")
    }
}

/// Commands needed to bring one object to its desired state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedChange {
    pub kind: ObjectKind,
    pub name: String,
    pub action: ChangeAction,
    pub commands: Vec<Command>,
}

/// Outcome of planning or applying a [`DesiredState`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub changes: Vec<PlannedChange>,
    /// Whether the commands were executed.
    pub applied: bool,
}

impl ApplyReport {
    /// All commands in execution order.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.changes.iter().flat_map(|c| c.commands.iter())
    }

    /// Number of objects that need a change.
    pub fn changed(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| c.action != ChangeAction::Unchanged)
            .count()
    }

    pub fn is_noop(&self) -> bool {
        self.changed() == 0
    }
}

/// Plan one object against its current state, if any.
pub fn plan_change<T: PbsObject>(
    differ: &Differ,
    current: Option<&T>,
    desired: &T,
) -> QmgrResult<PlannedChange> {
    let (action, commands) = match current {
        None => (ChangeAction::Create, objects::create_batch(differ, desired)?),
        Some(current) => {
            let commands = objects::diff_objects(differ, current, desired)?;
            let action = if commands.is_empty() {
                ChangeAction::Unchanged
            } else {
                ChangeAction::Update
            };
            (action, commands)
        }
    };
    Ok(PlannedChange {
        kind: T::KIND,
        name: desired.name().to_string(),
        action,
        commands,
    })
}

/// Plan a whole desired state against already listed records.
///
/// Only records named in `state` are converted. A missing server record is
/// planned against an empty server.
pub fn plan_from_records(
    differ: &Differ,
    records: &[RawRecord],
    state: &DesiredState,
) -> QmgrResult<ApplyReport> {
    fn plan_kind<T: PbsObject>(
        differ: &Differ,
        records: &[RawRecord],
        desired: &[T],
        out: &mut Vec<PlannedChange>,
    ) -> QmgrResult<()> {
        for object in desired {
            let existing: Option<T> = objects::find_record(records, object.name())?;
            out.push(plan_change(differ, existing.as_ref(), object)?);
        }
        Ok(())
    }

    state.validate()?;
    let mut changes = Vec::new();
    plan_kind(differ, records, &state.resources, &mut changes)?;
    plan_kind(differ, records, &state.queues, &mut changes)?;
    plan_kind(differ, records, &state.nodes, &mut changes)?;
    plan_kind(differ, records, &state.hooks, &mut changes)?;
    if let Some(server) = &state.server {
        let current = objects::from_records::<Server>(records)?
            .into_iter()
            .next()
            .unwrap_or_default();
        changes.push(plan_change(differ, Some(&current), server)?);
    }

    Ok(ApplyReport {
        changes,
        applied: false,
    })
}

/// qmgr client.
///
/// Every operation is one linear pipeline: read the current state, diff,
/// execute the batch, read again. Nothing is cached between operations.
pub struct QmgrClient<E: CommandExecutor> {
    differ: Differ,
    executor: E,
}

impl<E: CommandExecutor> QmgrClient<E> {
    /// Create a client from a differ and an executor.
    pub fn new(differ: Differ, executor: E) -> Self {
        Self { differ, executor }
    }

    /// Create a client using the configured qmgr path and diff options.
    pub fn from_config(config: &QmgrConfig, executor: E) -> Self {
        Self::new(config.differ(), executor)
    }

    pub fn differ(&self) -> &Differ {
        &self.differ
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// List the raw records of one kind.
    ///
    /// A listing failure that only means "no objects of this kind yet"
    /// yields an empty list.
    pub async fn list_records(&self, kind: ObjectKind) -> QmgrResult<Vec<RawRecord>> {
        let command = self.differ.builder().list(kind);
        match self.executor.run(std::slice::from_ref(&command)).await {
            Ok(outputs) => {
                let stdout = outputs
                    .into_iter()
                    .next()
                    .map(|o| o.stdout)
                    .unwrap_or_default();
                let records = parser::parse(&stdout);
                debug!(kind = kind.keyword(), records = records.len(), "listed objects");
                Ok(records)
            }
            Err(QmgrError::CommandFailed { stderr, .. }) if is_empty_listing_error(&stderr) => {
                warn!(
                    kind = kind.keyword(),
                    stderr = stderr.as_str(),
                    "treating listing failure as empty"
                );
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// List all objects of kind `T`.
    pub async fn list<T: PbsObject>(&self) -> QmgrResult<Vec<T>> {
        let records = self.list_records(T::KIND).await?;
        objects::from_records(&records)
    }

    /// Fetch one object by name. Absent objects are `Ok(None)`.
    pub async fn get<T: PbsObject>(&self, name: &str) -> QmgrResult<Option<T>> {
        let records = self.list_records(T::KIND).await?;
        objects::find_record(&records, name)
    }

    /// Commands that would create `desired`.
    pub fn plan_create<T: PbsObject>(&self, desired: &T) -> QmgrResult<Vec<Command>> {
        objects::create_batch(&self.differ, desired)
    }

    /// Commands that would turn `current` into `desired`.
    pub fn plan_update<T: PbsObject>(&self, current: &T, desired: &T) -> QmgrResult<Vec<Command>> {
        objects::diff_objects(&self.differ, current, desired)
    }

    /// Commands that would delete the named object.
    pub fn plan_delete<T: PbsObject>(&self, name: &str) -> QmgrResult<Vec<Command>> {
        objects::delete_batch::<T>(&self.differ, name)
    }

    /// Create `desired` and return it as PBS reports it afterwards.
    pub async fn create<T: PbsObject>(&self, desired: &T) -> QmgrResult<T> {
        let commands = self.plan_create(desired)?;
        self.execute(&commands).await?;
        info!("Created {} {}", T::KIND, desired.name());

        self.get(desired.name())
            .await?
            .ok_or_else(|| QmgrError::MissingAfterCreate {
                kind: T::KIND,
                name: desired.name().to_string(),
            })
    }

    /// Update an existing object to match `desired`.
    ///
    /// On failure, commands before the failing one stay applied; re-read to
    /// learn the resulting state.
    pub async fn update<T: PbsObject>(&self, desired: &T) -> QmgrResult<T> {
        let current = self.require::<T>(desired.name()).await?;
        let commands = self.plan_update(&current, desired)?;
        if commands.is_empty() {
            debug!(kind = T::KIND.keyword(), name = desired.name(), "already up to date");
            return Ok(current);
        }

        self.execute(&commands).await?;
        info!(
            "Updated {} {} ({} commands)",
            T::KIND,
            desired.name(),
            commands.len()
        );
        self.require(desired.name()).await
    }

    /// Delete the named object.
    pub async fn delete<T: PbsObject>(&self, name: &str) -> QmgrResult<()> {
        let commands = self.plan_delete::<T>(name)?;
        self.execute(&commands).await?;
        info!("Deleted {} {}", T::KIND, name);
        Ok(())
    }

    /// Fetch the server object.
    pub async fn server(&self) -> QmgrResult<Option<Server>> {
        let records = self.list_records(ObjectKind::Server).await?;
        Ok(objects::from_records::<Server>(&records)?.into_iter().next())
    }

    /// Update server attributes to match `desired`.
    pub async fn update_server(&self, desired: &Server) -> QmgrResult<Server> {
        let current = self.require_server().await?;
        let commands = self.plan_update(&current, desired)?;
        if commands.is_empty() {
            return Ok(current);
        }

        self.execute(&commands).await?;
        info!("Updated server ({} commands)", commands.len());
        self.require_server().await
    }

    /// Reconcile every object of a desired state.
    ///
    /// Objects are processed in document order by kind (resources, queues,
    /// nodes, hooks, server). The first failure stops the apply; changes
    /// already made are kept. With `dry_run`, current state is still read
    /// but nothing is executed. An invalid state fails before anything is
    /// read.
    pub async fn apply(&self, state: &DesiredState, dry_run: bool) -> QmgrResult<ApplyReport> {
        state.validate()?;
        let mut report = ApplyReport {
            changes: Vec::with_capacity(state.len()),
            applied: !dry_run,
        };

        self.apply_kind(&state.resources, dry_run, &mut report).await?;
        self.apply_kind(&state.queues, dry_run, &mut report).await?;
        self.apply_kind(&state.nodes, dry_run, &mut report).await?;
        self.apply_kind(&state.hooks, dry_run, &mut report).await?;

        if let Some(server) = &state.server {
            let current = self.require_server().await?;
            let change = plan_change(&self.differ, Some(&current), server)?;
            self.apply_change(&change, dry_run).await?;
            report.changes.push(change);
        }

        Ok(report)
    }

    async fn apply_kind<T: PbsObject>(
        &self,
        desired: &[T],
        dry_run: bool,
        report: &mut ApplyReport,
    ) -> QmgrResult<()> {
        if desired.is_empty() {
            return Ok(());
        }

        // One listing per kind; only the desired names are converted.
        let records = self.list_records(T::KIND).await?;
        for object in desired {
            let existing: Option<T> = objects::find_record(&records, object.name())?;
            let change = plan_change(&self.differ, existing.as_ref(), object)?;
            self.apply_change(&change, dry_run).await?;
            report.changes.push(change);
        }
        Ok(())
    }

    async fn apply_change(&self, change: &PlannedChange, dry_run: bool) -> QmgrResult<()> {
        if dry_run || change.commands.is_empty() {
            return Ok(());
        }
        self.execute(&change.commands).await?;
        info!(
            kind = change.kind.keyword(),
            name = change.name.as_str(),
            action = %change.action,
            commands = change.commands.len(),
            "applied change"
        );
        Ok(())
    }

    async fn require<T: PbsObject>(&self, name: &str) -> QmgrResult<T> {
        self.get(name).await?.ok_or_else(|| QmgrError::NotFound {
            kind: T::KIND,
            name: name.to_string(),
        })
    }

    async fn require_server(&self) -> QmgrResult<Server> {
        self.server().await?.ok_or_else(|| QmgrError::NotFound {
            kind: ObjectKind::Server,
            name: "default".to_string(),
        })
    }

    async fn execute(&self, commands: &[Command]) -> QmgrResult<()> {
        if commands.is_empty() {
            return Ok(());
        }
        debug!(commands = commands.len(), "executing batch");
        self.executor.run(commands).await?;
        Ok(())
    }
}
