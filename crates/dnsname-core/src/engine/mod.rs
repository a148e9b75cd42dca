//! Reconcile engine
//!
//! The engine drives one reconciliation pass per desired record:
//!
//! ```text
//!                ┌──────────────┐
//!   DnsName ───► │    Find      │ ◄── Route53Api / LoadBalancerApi
//!                └──────┬───────┘
//!                       ▼
//!                ┌──────────────┐
//!                │  Diff + Plan │ ─── Delta { Absent, Create, Update, NoOp }
//!                └──────┬───────┘
//!                       ▼
//!                ┌──────────────┐
//!                │ CheckChanges │
//!                └──────┬───────┘
//!                       ▼
//!                ┌──────────────┐
//!                │   Render     │ ─── AWS API / dry-run / Terraform / CloudFormation
//!                └──────────────┘
//! ```
//!
//! ## Dispatch
//!
//! The render backend is fixed when the [`Context`] is built. Live and
//! dry-run backends render only records that need a change; document
//! backends render every record so the emitted document describes the whole
//! desired state.
//!
//! ## Failures
//!
//! A failing record never aborts the pass. [`ReconcileEngine::reconcile_all`]
//! records the error, emits [`EngineEvent::RecordFailed`] and moves on.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::ReconcileConfig;
use crate::error::{Error, Result};
use crate::model::{DnsName, DnsNameChanges, Lifecycle};
use crate::render::{Backend, RenderTarget};
use crate::traits::AwsCloud;

/// Explicit per-pass handle: the cloud clients plus the render target
#[derive(Debug)]
pub struct Context {
    cloud: AwsCloud,
    target: RenderTarget,
}

impl Context {
    /// Build a context rendering into a fresh target for `backend`
    pub fn new(cloud: AwsCloud, backend: Backend) -> Self {
        let target = RenderTarget::for_backend(backend, &cloud);
        Self { cloud, target }
    }

    /// Cloud clients
    pub fn cloud(&self) -> &AwsCloud {
        &self.cloud
    }

    /// The render target
    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    /// The render target, mutably
    pub fn target_mut(&mut self) -> &mut RenderTarget {
        &mut self.target
    }

    /// Consume the context and keep what was rendered
    pub fn into_target(self) -> RenderTarget {
        self.target
    }
}

/// Planned outcome for one record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delta {
    /// Nothing exists and the lifecycle forbids creating it
    Absent,
    /// Nothing exists; the record will be created
    Create,
    /// The record exists and differs
    Update,
    /// The record exists and matches
    NoOp,
}

impl Delta {
    /// Plan the delta for a record
    ///
    /// # Parameters
    ///
    /// - `actual_found`: Whether Find returned a record
    /// - `changes`: Diff between actual and desired
    /// - `lifecycle`: The record's lifecycle
    pub fn plan(actual_found: bool, changes: &DnsNameChanges, lifecycle: Lifecycle) -> Self {
        match (actual_found, changes.is_empty()) {
            (false, _) if lifecycle.may_mutate() => Delta::Create,
            (false, _) => Delta::Absent,
            (true, false) => Delta::Update,
            (true, true) => Delta::NoOp,
        }
    }

    /// Whether a record with this delta is rendered into `backend`
    pub fn renders(&self, backend: Backend) -> bool {
        match self {
            Delta::Create | Delta::Update => true,
            Delta::NoOp => backend.is_generator(),
            Delta::Absent => false,
        }
    }
}

/// What one pass did with a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Lifecycle `Ignore`: nothing was looked up or rendered
    Skipped,
    /// The record was planned, and possibly rendered
    Planned {
        /// Planned delta
        delta: Delta,
        /// Whether a render function was called
        rendered: bool,
    },
}

/// Run one reconciliation pass for a record
///
/// # Returns
///
/// - `Ok(RunOutcome)`: The record was handled
/// - `Err(Error)`: Find, the lifecycle check, CheckChanges or Render failed
pub async fn run(e: &DnsName, ctx: &mut Context) -> Result<RunOutcome> {
    if e.lifecycle == Lifecycle::Ignore {
        debug!("Lifecycle for {:?} is ignore, skipping", e.name);
        return Ok(RunOutcome::Skipped);
    }

    let actual = e.find(ctx).await?;
    let changes = DnsNameChanges::between(actual.as_ref(), e);
    let delta = Delta::plan(actual.is_some(), &changes, e.lifecycle);

    debug!(
        record = %e.name,
        ?delta,
        changed = ?changes.changed_fields(),
        "Planned DNS record"
    );

    match e.lifecycle {
        Lifecycle::ExistsAndValidates => {
            return match delta {
                Delta::Absent => Err(Error::lifecycle(&e.name, "resource was not found")),
                Delta::Update => Err(Error::lifecycle(
                    &e.name,
                    format!(
                        "resource did not match expected state, changed fields: {}",
                        changes.changed_fields().join(", ")
                    ),
                )),
                _ => Ok(RunOutcome::Planned {
                    delta,
                    rendered: false,
                }),
            };
        }
        Lifecycle::ExistsAndWarnIfChanges => {
            match delta {
                Delta::Absent => warn!("DNS record {:?} was not found", e.name),
                Delta::Update => warn!(
                    "DNS record {:?} differs from expected state: {}",
                    e.name,
                    changes.changed_fields().join(", ")
                ),
                _ => {}
            }
            return Ok(RunOutcome::Planned {
                delta,
                rendered: false,
            });
        }
        Lifecycle::Sync | Lifecycle::Ignore => {}
    }

    DnsName::check_changes(actual.as_ref(), e, &changes)?;

    if !delta.renders(ctx.target().backend()) {
        debug!("DNS record {:?} is up to date", e.name);
        return Ok(RunOutcome::Planned {
            delta,
            rendered: false,
        });
    }

    match ctx.target_mut() {
        RenderTarget::Aws(t) => DnsName::render_aws(t, actual.as_ref(), e, &changes).await?,
        RenderTarget::DryRun(t) => DnsName::render_dry_run(t, delta, e, &changes)?,
        RenderTarget::Terraform(t) => DnsName::render_terraform(t, actual.as_ref(), e, &changes)?,
        RenderTarget::CloudFormation(t) => {
            DnsName::render_cloudformation(t, actual.as_ref(), e, &changes)?
        }
    }

    Ok(RunOutcome::Planned {
        delta,
        rendered: true,
    })
}

/// Events emitted by the ReconcileEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Pass started
    Started {
        records_count: usize,
        backend: Backend,
    },

    /// Record planned, and rendered if the backend wanted it
    RecordReconciled {
        record_name: String,
        delta: Delta,
        rendered: bool,
    },

    /// Record skipped by its lifecycle
    RecordSkipped {
        record_name: String,
    },

    /// Record failed; the pass continued
    RecordFailed {
        record_name: String,
        error: String,
    },

    /// Pass finished
    Finished {
        succeeded: usize,
        failed: usize,
    },
}

/// Result of one record in a pass
#[derive(Debug)]
pub struct RecordOutcome {
    /// Record name
    pub record: String,
    /// What happened
    pub result: Result<RunOutcome>,
}

/// Result of a whole pass
#[derive(Debug)]
pub struct ReconcileReport {
    /// Backend the pass rendered into
    pub backend: Backend,
    /// Per-record results, in configuration order
    pub outcomes: Vec<RecordOutcome>,
    /// Everything rendered during the pass
    pub target: RenderTarget,
}

impl ReconcileReport {
    /// Records that failed, with their errors
    pub fn failures(&self) -> Vec<(&str, &Error)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.record.as_str(), e)))
            .collect()
    }

    /// Whether every record succeeded
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Change ids submitted in live mode
    pub fn change_ids(&self) -> Vec<String> {
        match &self.target {
            RenderTarget::Aws(t) => t.change_ids(),
            _ => Vec::new(),
        }
    }
}

/// Reconcile engine
///
/// Owns the desired records and the cloud handle. The backend is chosen at
/// construction and cannot change afterwards.
///
/// ## Lifecycle
///
/// 1. Create with [`ReconcileEngine::new()`]
/// 2. Run passes with [`ReconcileEngine::reconcile_all()`]
/// 3. Drop the engine to close the event channel
pub struct ReconcileEngine {
    /// Cloud clients
    cloud: AwsCloud,

    /// Render backend for every pass
    backend: Backend,

    /// Desired records, in configuration order
    records: Vec<DnsName>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl ReconcileEngine {
    /// Create a new reconcile engine
    ///
    /// # Parameters
    ///
    /// - `cloud`: Cloud client handle
    /// - `config`: Reconcile configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        cloud: AwsCloud,
        config: ReconcileConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let records = config.intents()?;
        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            cloud,
            backend: config.mode,
            records,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Backend every pass renders into
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Desired records
    pub fn records(&self) -> &[DnsName] {
        &self.records
    }

    /// Reconcile every record once
    ///
    /// Records run sequentially in configuration order. Each pass starts
    /// from a fresh render target, so running twice yields two independent
    /// documents.
    pub async fn reconcile_all(&self) -> ReconcileReport {
        self.emit_event(EngineEvent::Started {
            records_count: self.records.len(),
            backend: self.backend,
        });
        info!(
            "Reconciling {} DNS records with backend {}",
            self.records.len(),
            self.backend
        );

        let mut ctx = Context::new(self.cloud.clone(), self.backend);
        let mut outcomes = Vec::with_capacity(self.records.len());

        for record in &self.records {
            let result = run(record, &mut ctx).await;

            match &result {
                Ok(RunOutcome::Skipped) => {
                    self.emit_event(EngineEvent::RecordSkipped {
                        record_name: record.name.clone(),
                    });
                }
                Ok(RunOutcome::Planned { delta, rendered }) => {
                    self.emit_event(EngineEvent::RecordReconciled {
                        record_name: record.name.clone(),
                        delta: *delta,
                        rendered: *rendered,
                    });
                }
                Err(e) => {
                    error!("Failed to reconcile DNS record {:?}: {}", record.name, e);
                    self.emit_event(EngineEvent::RecordFailed {
                        record_name: record.name.clone(),
                        error: e.to_string(),
                    });
                }
            }

            outcomes.push(RecordOutcome {
                record: record.name.clone(),
                result,
            });
        }

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        self.emit_event(EngineEvent::Finished {
            succeeded: outcomes.len() - failed,
            failed,
        });

        ReconcileReport {
            backend: self.backend,
            outcomes,
            target: ctx.into_target(),
        }
    }

    /// Emit an engine event
    ///
    /// Dropped with a warning when the channel is full.
    fn emit_event(&self, event: EngineEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed() -> DnsNameChanges {
        DnsNameChanges {
            target_load_balancer: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_plan_matrix() {
        let none = DnsNameChanges::default();

        assert_eq!(Delta::plan(false, &changed(), Lifecycle::Sync), Delta::Create);
        assert_eq!(Delta::plan(true, &changed(), Lifecycle::Sync), Delta::Update);
        assert_eq!(Delta::plan(true, &none, Lifecycle::Sync), Delta::NoOp);

        assert_eq!(
            Delta::plan(false, &changed(), Lifecycle::ExistsAndValidates),
            Delta::Absent
        );
        assert_eq!(
            Delta::plan(false, &changed(), Lifecycle::ExistsAndWarnIfChanges),
            Delta::Absent
        );
        assert_eq!(
            Delta::plan(true, &changed(), Lifecycle::ExistsAndWarnIfChanges),
            Delta::Update
        );
    }

    #[test]
    fn test_renders_by_backend() {
        for backend in [Backend::Terraform, Backend::CloudFormation] {
            assert!(Delta::NoOp.renders(backend));
            assert!(Delta::Create.renders(backend));
            assert!(!Delta::Absent.renders(backend));
        }
        for backend in [Backend::Live, Backend::DryRun] {
            assert!(!Delta::NoOp.renders(backend));
            assert!(Delta::Update.renders(backend));
            assert!(!Delta::Absent.renders(backend));
        }
    }

    #[test]
    fn test_delta_serializes_snake_case() {
        assert_eq!(serde_json::to_value(Delta::NoOp).unwrap(), serde_json::json!("no_op"));
    }
}
