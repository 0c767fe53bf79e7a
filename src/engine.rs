use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::aki::AkiResult;
use crate::config::{ContextConfig, DecisionContext, EngineSettings, SettingsError};
use crate::error::{DecisionError, FieldError};
use crate::evaluation::Evaluation;
use crate::flare::FlareRiskResult;
use crate::goal_urate::GoalUrateResult;
use crate::ppx::PpxIndicationResult;
use crate::source::{SnapshotSource, SourceError};
use crate::treatment::{RecommendationResult, TreatmentCatalog};
use crate::ult::UltIndicationResult;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Snapshot source error: {0}")]
    Source(#[from] SourceError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

/// Outcome of one calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Decision<T> {
    Decided(T),
    /// A required field was absent.
    Undefined { missing: String },
    /// The input contradicts itself or is malformed.
    Rejected { errors: Vec<FieldError> },
}

impl<T> Decision<T> {
    pub fn decided(&self) -> Option<&T> {
        match self {
            Self::Decided(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_decided(&self) -> bool {
        matches!(self, Self::Decided(_))
    }

    fn rejected(errors: &[FieldError]) -> Self {
        Self::Rejected {
            errors: errors.to_vec(),
        }
    }
}

impl<T> From<Result<T, DecisionError>> for Decision<T> {
    fn from(result: Result<T, DecisionError>) -> Self {
        match result {
            Ok(value) => Self::Decided(value),
            Err(DecisionError::MissingData { field }) => Self::Undefined { missing: field },
            Err(err) => Self::Rejected {
                errors: err.field_errors(),
            },
        }
    }
}

/// Whether a recomputed result differs from the stored one.
pub fn requires_update<T: PartialEq>(previous: Option<&T>, current: &T) -> bool {
    previous != Some(current)
}

/// Everything decided for one snapshot in one context.
/// Calculators that don't belong to the context are left as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionReport {
    pub snapshot_id: Uuid,
    pub context: DecisionContext,
    pub aki: Option<Decision<AkiResult>>,
    pub flare: Option<Decision<FlareRiskResult>>,
    pub ult: Option<Decision<UltIndicationResult>>,
    pub ppx: Option<Decision<PpxIndicationResult>>,
    pub goal_urate: Option<Decision<GoalUrateResult>>,
    pub recommendation: Option<Decision<RecommendationResult>>,
}

impl DecisionReport {
    fn empty(snapshot_id: Uuid, context: DecisionContext) -> Self {
        Self {
            snapshot_id,
            context,
            aki: None,
            flare: None,
            ult: None,
            ppx: None,
            goal_urate: None,
            recommendation: None,
        }
    }

    pub fn decided_count(&self) -> usize {
        [
            self.aki.as_ref().map(Decision::is_decided),
            self.flare.as_ref().map(Decision::is_decided),
            self.ult.as_ref().map(Decision::is_decided),
            self.ppx.as_ref().map(Decision::is_decided),
            self.goal_urate.as_ref().map(Decision::is_decided),
            self.recommendation.as_ref().map(Decision::is_decided),
        ]
        .into_iter()
        .filter(|d| *d == Some(true))
        .count()
    }
}

/// Runs the calculators a clinical context needs for one patient.
pub trait DecisionEngine {
    fn evaluate(
        &self,
        snapshot_id: &Uuid,
        context: DecisionContext,
    ) -> Result<DecisionReport, EngineError>;

    /// Every context, skipping those the stored snapshot can't satisfy.
    fn evaluate_all(&self, snapshot_id: &Uuid) -> Result<Vec<DecisionReport>, EngineError>;
}

pub struct DefaultDecisionEngine<S: SnapshotSource> {
    source: S,
    settings: EngineSettings,
}

impl<S: SnapshotSource> DefaultDecisionEngine<S> {
    pub fn new(source: S, settings: EngineSettings) -> Self {
        Self { source, settings }
    }

    /// Engine with settings read from a JSON file.
    pub fn with_settings_file(source: S, path: &Path) -> Result<Self, EngineError> {
        let settings = EngineSettings::load(path)?;
        Ok(Self::new(source, settings))
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn run_calculators(&self, eval: &Evaluation, config: &ContextConfig, report: &mut DecisionReport) {
        match config.context {
            DecisionContext::Flare => {
                report.flare = Some(eval.flare().into());
                report.aki = Some(eval.aki().into());
            }
            DecisionContext::Ult => report.ult = Some(eval.ult().into()),
            DecisionContext::GoalUrate => report.goal_urate = Some(Decision::Decided(eval.goal_urate())),
            DecisionContext::UltAid => {
                report.goal_urate = Some(Decision::Decided(eval.goal_urate()));
            }
            DecisionContext::PpxAid => report.ppx = Some(eval.ppx().into()),
            DecisionContext::FlareAid => {}
        }

        if let Some(context) = config.catalog {
            let recommendation = TreatmentCatalog::from_settings(context, &self.settings.treatment)
                .and_then(|catalog| eval.recommend(&catalog));
            report.recommendation = Some(recommendation.into());
        }
    }

    /// Mark every calculator of the context as rejected.
    fn reject_all(config: &ContextConfig, report: &mut DecisionReport, errors: &[FieldError]) {
        match config.context {
            DecisionContext::Flare => {
                report.flare = Some(Decision::rejected(errors));
                report.aki = Some(Decision::rejected(errors));
            }
            DecisionContext::Ult => report.ult = Some(Decision::rejected(errors)),
            DecisionContext::GoalUrate | DecisionContext::UltAid => {
                report.goal_urate = Some(Decision::rejected(errors));
            }
            DecisionContext::PpxAid => report.ppx = Some(Decision::rejected(errors)),
            DecisionContext::FlareAid => {}
        }
        if config.catalog.is_some() {
            report.recommendation = Some(Decision::rejected(errors));
        }
    }
}

impl<S: SnapshotSource> DecisionEngine for DefaultDecisionEngine<S> {
    fn evaluate(
        &self,
        snapshot_id: &Uuid,
        context: DecisionContext,
    ) -> Result<DecisionReport, EngineError> {
        let start = Instant::now();
        let config = ContextConfig::for_context(context);
        let snapshot = self.source.assemble(snapshot_id, &config)?;
        let mut report = DecisionReport::empty(*snapshot_id, context);

        let eval = Evaluation::new(&snapshot, &self.settings);
        match eval.validate() {
            Ok(()) => self.run_calculators(&eval, &config, &mut report),
            Err(err) => {
                let errors = err.field_errors();
                tracing::warn!(
                    snapshot_id = %snapshot_id,
                    context = context.as_str(),
                    errors = errors.len(),
                    "Snapshot rejected"
                );
                Self::reject_all(&config, &mut report, &errors);
            }
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            snapshot_id = %snapshot_id,
            context = context.as_str(),
            decided = report.decided_count(),
            processing_ms = processing_time_ms,
            "Decision evaluation complete"
        );

        Ok(report)
    }

    fn evaluate_all(&self, snapshot_id: &Uuid) -> Result<Vec<DecisionReport>, EngineError> {
        let mut reports = Vec::new();
        for context in DecisionContext::ALL {
            match self.evaluate(snapshot_id, context) {
                Ok(report) => reports.push(report),
                Err(EngineError::Source(SourceError::MissingField { field, .. })) => {
                    tracing::debug!(
                        snapshot_id = %snapshot_id,
                        context = context.as_str(),
                        field = %field,
                        "Context skipped"
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(reports)
    }
}
