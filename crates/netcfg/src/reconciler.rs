//! The reconciliation orchestrator.
//!
//! A run has two phases, each under its own [`RetryPolicy`]:
//!
//! 1. **Source**: create a source, open it, read and decode the desired
//!    rules, close it.
//! 2. **Target**: create a target, open it, read what exists, apply the
//!    [`ChangePlan`] in protocol order, commit once, close it.
//!
//! Every attempt starts from a fresh handle obtained from the factory.
//! Between the phases the desired rules pass through the [`Optimizer`] and
//! are projected into the filters and owners they need.
//!
//! [`RetryPolicy`]: netcfg_reconcile::RetryPolicy

use std::collections::HashSet;

use netcfg_core::{decode_rules, Rule};
use netcfg_endpoint::{Session, Source, SourceFactory, Target, TargetFactory};
use netcfg_reconcile::{ApplyReport, ChangePlan, EntitySets, Optimizer, PassThrough, Retried};

use crate::config::ReconcilerConfig;
use crate::error::{ReconcileError, Result};

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Desired rules read from the source.
    pub rules_read: usize,
    pub source_attempts: u32,
    pub target_attempts: u32,
    /// Changes issued against the target.
    pub applied: ApplyReport,
}

/// Desired state after optimization, with the count decoded before it.
struct Desired {
    sets: EntitySets,
    rules_read: usize,
}

/// Drives a source and a target to agreement.
pub struct Reconciler<SF, TF, O = PassThrough> {
    source_factory: SF,
    target_factory: TF,
    optimizer: O,
    config: ReconcilerConfig,
}

impl<SF, TF> Reconciler<SF, TF>
where
    SF: SourceFactory,
    TF: TargetFactory,
{
    pub fn new(source_factory: SF, target_factory: TF, config: ReconcilerConfig) -> Self {
        Self {
            source_factory,
            target_factory,
            optimizer: PassThrough,
            config,
        }
    }
}

impl<SF, TF, O> Reconciler<SF, TF, O>
where
    SF: SourceFactory,
    TF: TargetFactory,
    O: Optimizer,
{
    /// Replace the optimizer applied to the desired rules.
    pub fn with_optimizer<P: Optimizer>(self, optimizer: P) -> Reconciler<SF, TF, P> {
        Reconciler {
            source_factory: self.source_factory,
            target_factory: self.target_factory,
            optimizer,
            config: self.config,
        }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Make the target match the source.
    pub fn run(&self) -> Result<RunReport> {
        let span = tracing::info_span!("reconcile");
        let _enter = span.enter();

        let desired = self.read_desired()?;
        let rules_read = desired.value.rules_read;

        let applied = {
            let span = tracing::info_span!("phase", phase = "target");
            let _enter = span.enter();
            self.config
                .target
                .run("target", |attempt| -> netcfg_endpoint::Result<ApplyReport> {
                    tracing::debug!(attempt, "connecting to target");
                    let mut target = Session::open(self.target_factory.create_target()?)?;
                    let existing = EntitySets::read_from(&mut *target)?;
                    let plan = ChangePlan::compute(&desired.value.sets, &existing);
                    tracing::debug!(changes = plan.len(), "computed change plan");

                    let report = plan.apply(&mut *target)?;
                    target.apply_changes()?;
                    target.finish()?;
                    Ok(report)
                })
                .map_err(ReconcileError::target)?
        };

        tracing::info!(
            rules = rules_read,
            changes = applied.value.total(),
            attempts = applied.attempts,
            "target updated"
        );

        Ok(RunReport {
            rules_read,
            source_attempts: desired.attempts,
            target_attempts: applied.attempts,
            applied: applied.value,
        })
    }

    /// Read both sides and return the changes a run would issue.
    ///
    /// The target is opened and read but never mutated or committed.
    pub fn plan(&self) -> Result<ChangePlan> {
        let span = tracing::info_span!("plan");
        let _enter = span.enter();

        let desired = self.read_desired()?;
        let planned = self
            .config
            .target
            .run("target", |_| -> netcfg_endpoint::Result<ChangePlan> {
                let mut target = Session::open(self.target_factory.create_target()?)?;
                let existing = EntitySets::read_from(&mut *target)?;
                target.finish()?;
                Ok(ChangePlan::compute(&desired.value.sets, &existing))
            })
            .map_err(ReconcileError::target)?;

        Ok(planned.value)
    }

    /// Phase one plus optimization and projection.
    fn read_desired(&self) -> Result<Retried<Desired>> {
        let span = tracing::info_span!("phase", phase = "source");
        let _enter = span.enter();

        let rules = self
            .config
            .source
            .run("source", |attempt| -> netcfg_endpoint::Result<HashSet<Rule>> {
                tracing::debug!(attempt, "connecting to source");
                let mut source = Session::open(self.source_factory.create_source()?)?;
                let records = source.read_all_rules()?;
                source.finish()?;
                Ok(decode_rules(records)?)
            })
            .map_err(ReconcileError::source)?;

        tracing::info!(
            rules = rules.value.len(),
            attempts = rules.attempts,
            "desired rules read"
        );

        let rules_read = rules.value.len();
        let optimized = self.optimizer.optimize(rules.value);
        Ok(Retried {
            value: Desired {
                sets: EntitySets::from_rules(optimized),
                rules_read,
            },
            attempts: rules.attempts,
        })
    }
}
