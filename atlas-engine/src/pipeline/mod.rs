//! The compile pipeline driver.
//!
//! Order of operations per run: observation window pruning, opinion
//! reconciliation, then per category a parallel (period, era) aggregation
//! fan-out followed by the strictly sequential assignment, extralimital,
//! and adjustment passes. Stage failures are collected, never fatal for the
//! pipeline; structural absence (disabled sources) is a checked skip.

use std::sync::{Arc, Mutex};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use atlas_core::config::AtlasConfig;
use atlas_core::errors::{ConfigError, PipelineError, StageError};
use atlas_core::events::{
    CategoryCompiledEvent, CompileEventHandler, EventDispatcher, RunCompletedEvent,
    RunStartedEvent, StageCompletedEvent, StageFailedEvent,
};
use atlas_core::types::{Era, EvidenceCategory, PeriodIndex, PeriodSet, TimePeriod};
use atlas_storage::queries::{compile_runs, legacy, observations, results, units};
use atlas_storage::{BatchWriter, DatabaseManager};
use rayon::prelude::*;

use crate::adjust::CodeAdjuster;
use crate::aggregate::OccurrenceAggregator;
use crate::assign::CodeAssigner;
use crate::extralimital::ExtralimitalDetector;
use crate::reconcile::OpinionReconciler;

/// Codes exported as "present" in the simplified results view.
const SIMPLIFIED_PRESENT_CODES: [i64; 3] = [1, 2, 3];

/// Per-category outcome of a run.
#[derive(Debug, Clone)]
pub struct CategorySummary {
    pub category: EvidenceCategory,
    pub codes_assigned: usize,
    pub codes_adjusted: usize,
    pub extralimital_flags: usize,
}

/// The result of one pipeline run: what was compiled, plus every non-fatal
/// stage error with its context.
#[derive(Debug)]
pub struct CompileReport {
    pub run_id: i64,
    pub categories: Vec<CategorySummary>,
    pub errors: Vec<StageError>,
}

impl CompileReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The compile pipeline.
pub struct CompilePipeline {
    config: AtlasConfig,
    manager: Arc<DatabaseManager>,
    dispatcher: EventDispatcher,
}

impl CompilePipeline {
    pub fn new(config: AtlasConfig, manager: Arc<DatabaseManager>) -> Self {
        Self {
            config,
            manager,
            dispatcher: EventDispatcher::new(),
        }
    }

    /// Register a compile event handler.
    pub fn register_handler(&mut self, handler: Arc<dyn CompileEventHandler>) {
        self.dispatcher.register(handler);
    }

    /// Run the full compilation. Returns the report; errors inside stages
    /// are collected in it. Only setup failures (invalid periods, an
    /// unreachable store) abort the run.
    pub fn run(&self) -> Result<CompileReport, PipelineError> {
        let started = Instant::now();
        let periods = self.config.task.period_set().ok_or_else(|| {
            ConfigError::ValidationFailed {
                field: "task.periods".to_string(),
                message: "must be a non-empty, ordered, non-overlapping list".to_string(),
            }
        })?;
        let categories = self.config.task.enabled_categories();
        let use_observations = self.config.task.effective_use_observations();
        let use_opinions = self.config.task.effective_use_opinions();
        let use_legacy = self.config.task.effective_use_legacy();

        let category_names = categories
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let run_id = self.manager.with_writer(|conn| {
            compile_runs::insert_run_start(
                conn,
                unix_now(),
                &category_names,
                periods.len() as i64,
            )
        })?;

        self.dispatcher.emit_run_started(&RunStartedEvent {
            categories: categories.clone(),
            period_count: periods.len(),
        });
        tracing::info!(
            run_id,
            categories = %category_names,
            periods = periods.len(),
            "starting compile run"
        );

        let mut errors: Vec<StageError> = Vec::new();

        // Observations outside the configured years and months never
        // participate; prune them once up front.
        if use_observations {
            let (min_year, max_year) = periods.year_span();
            let months = self.config.task.months.clone();
            let pruned = self.manager.with_writer(|conn| {
                observations::prune_outside_window(conn, min_year, max_year, &months)
            });
            match pruned {
                Ok(removed) if removed > 0 => {
                    tracing::info!(removed, "pruned observations outside the task window");
                }
                Ok(_) => {}
                Err(e) => self.record_error(
                    &mut errors,
                    StageError {
                        stage: "prune-observations",
                        category: None,
                        period: None,
                        era: None,
                        error: e.into(),
                    },
                ),
            }
        }

        // Opinion reconciliation runs once across all categories.
        let reconciler = OpinionReconciler::new(&self.manager);
        if use_opinions {
            let (min_year, max_year) = periods.year_span();
            match reconciler.reconcile_span(min_year, max_year) {
                Ok(outcome) => {
                    for (category, error) in outcome.skipped {
                        self.record_error(
                            &mut errors,
                            StageError {
                                stage: "reconcile",
                                category: Some(category),
                                period: None,
                                era: None,
                                error: error.into(),
                            },
                        );
                    }
                    self.dispatcher.emit_stage_completed(&StageCompletedEvent {
                        stage: "reconcile",
                        category: None,
                        period: None,
                        era: None,
                    });
                }
                Err(e) => self.record_error(
                    &mut errors,
                    StageError {
                        stage: "reconcile",
                        category: None,
                        period: None,
                        era: None,
                        error: e.into(),
                    },
                ),
            }
        }

        let legacy_records = if use_legacy {
            match self.manager.with_reader(legacy::all_records) {
                Ok(records) => records,
                Err(e) => {
                    self.record_error(
                        &mut errors,
                        StageError {
                            stage: "legacy-load",
                            category: None,
                            period: None,
                            era: None,
                            error: e.into(),
                        },
                    );
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let mut summaries = Vec::with_capacity(categories.len());
        for &category in &categories {
            let summary = self.compile_category(
                category,
                &periods,
                &reconciler,
                &legacy_records,
                use_observations,
                use_opinions,
                &mut errors,
            );
            self.dispatcher.emit_category_compiled(&CategoryCompiledEvent {
                category,
                units_coded: summary.codes_assigned,
                extralimital_flags: summary.extralimital_flags,
            });
            summaries.push(summary);
        }

        // Age of the freshest attributable record per unit.
        if use_observations {
            let aggregator = OccurrenceAggregator::new(
                self.config.evidence.effective_documented_threshold(),
                self.config.evidence.effective_error_tolerance_pct(),
            );
            let assessed = crate::aggregate::dates::format_iso(unix_now() / 86_400);
            if let Err(e) = aggregator.build_last_records(&self.manager, &assessed) {
                self.record_error(
                    &mut errors,
                    StageError {
                        stage: "last-record",
                        category: None,
                        period: None,
                        era: None,
                        error: e.into(),
                    },
                );
            }
        }

        // Simplified binary view for downstream consumers.
        if let Err(e) = self
            .manager
            .with_writer(|conn| results::rebuild(conn, &SIMPLIFIED_PRESENT_CODES))
        {
            self.record_error(
                &mut errors,
                StageError {
                    stage: "simplified-results",
                    category: None,
                    period: None,
                    era: None,
                    error: e.into(),
                },
            );
        }

        let status = if errors.is_empty() {
            "completed"
        } else {
            "completed_with_errors"
        };
        let error_summary = errors.first().map(|e| e.to_string());
        self.manager.with_writer(|conn| {
            compile_runs::update_run_complete(
                conn,
                run_id,
                unix_now(),
                status,
                errors.len() as i64,
                error_summary.as_deref(),
            )
        })?;
        let _ = self.manager.checkpoint();

        let duration_ms = started.elapsed().as_millis() as u64;
        self.dispatcher.emit_run_completed(&RunCompletedEvent {
            stage_error_count: errors.len(),
            duration_ms,
        });
        tracing::info!(run_id, status, duration_ms, "compile run finished");

        Ok(CompileReport {
            run_id,
            categories: summaries,
            errors,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn compile_category(
        &self,
        category: EvidenceCategory,
        periods: &PeriodSet,
        reconciler: &OpinionReconciler<'_>,
        legacy_records: &[atlas_core::types::LegacyRecord],
        use_observations: bool,
        use_opinions: bool,
        errors: &mut Vec<StageError>,
    ) -> CategorySummary {
        tracing::info!(category = %category, "compiling category");

        // Parallel aggregation fan-out: every (period, era) pair is an
        // independent worker; writes funnel through the single-writer actor.
        if use_observations {
            self.aggregate_category(category, periods, errors);
        }

        // Opinion projection per period.
        if use_opinions {
            for (period_index, period) in periods.iter() {
                match reconciler.project_period(category, period_index, period) {
                    Ok(_) => {}
                    Err(e) => self.record_error(
                        errors,
                        StageError {
                            stage: "opinion-projection",
                            category: Some(category),
                            period: Some(period_index),
                            era: None,
                            error: e.into(),
                        },
                    ),
                }
            }
        }

        // Units appended before their grid tile was loaded pick their
        // geometry up here.
        if let Err(e) = self.manager.with_writer(units::fill_missing_geometries) {
            self.record_error(
                errors,
                StageError {
                    stage: "geometry-fill",
                    category: Some(category),
                    period: None,
                    era: None,
                    error: e.into(),
                },
            );
        }

        // Sequential passes: assignment, detection, adjustment, in that
        // order, each consuming the previous pass's finalized output.
        let assigner = CodeAssigner::new(&self.manager, periods, legacy_records.to_vec());
        let codes_assigned = match assigner.assign_category(category) {
            Ok(count) => count,
            Err(e) => {
                self.record_error(
                    errors,
                    StageError {
                        stage: "assign",
                        category: Some(category),
                        period: None,
                        era: None,
                        error: e.into(),
                    },
                );
                0
            }
        };

        let detector = ExtralimitalDetector::new(
            &self.manager,
            self.config.evidence.effective_extralimital_cutoff_m(),
        );
        let mut extralimital_flags = 0usize;
        for (period_index, _) in periods.iter() {
            match detector.flag_period(category, period_index) {
                Ok(count) => extralimital_flags += count,
                Err(e) => self.record_error(
                    errors,
                    StageError {
                        stage: "extralimital",
                        category: Some(category),
                        period: Some(period_index),
                        era: None,
                        error: e.into(),
                    },
                ),
            }
        }

        let adjuster = CodeAdjuster::new(&self.manager, periods);
        let codes_adjusted = match adjuster.adjust_category(category) {
            Ok(count) => count,
            Err(e) => {
                self.record_error(
                    errors,
                    StageError {
                        stage: "adjust",
                        category: Some(category),
                        period: None,
                        era: None,
                        error: e.into(),
                    },
                );
                0
            }
        };

        CategorySummary {
            category,
            codes_assigned,
            codes_adjusted,
            extralimital_flags,
        }
    }

    /// The parallel (period, era) aggregation fan-out for one category.
    fn aggregate_category(
        &self,
        category: EvidenceCategory,
        periods: &PeriodSet,
        errors: &mut Vec<StageError>,
    ) {
        let aggregator = OccurrenceAggregator::new(
            self.config.evidence.effective_documented_threshold(),
            self.config.evidence.effective_error_tolerance_pct(),
        );

        let pairs: Vec<(PeriodIndex, TimePeriod, Era)> = periods
            .iter()
            .flat_map(|(index, period)| {
                Era::BOTH.into_iter().map(move |era| (index, period, era))
            })
            .collect();

        let writer = BatchWriter::spawn(self.manager.clone());
        let worker_errors: Mutex<Vec<StageError>> = Mutex::new(Vec::new());

        pairs.par_iter().for_each(|&(period_index, period, era)| {
            match aggregator.compute(&self.manager, category, period_index, period, era) {
                Ok(weights) => {
                    let submit = writer.submit(move |conn| {
                        aggregator
                            .commit(conn, &weights)
                            .map(|_| ())
                            .map_err(|e| match e {
                                atlas_core::errors::AggregateError::Storage(s) => s,
                                other => atlas_core::errors::StorageError::SqliteError {
                                    message: other.to_string(),
                                },
                            })
                    });
                    if let Err(e) = submit {
                        if let Ok(mut guard) = worker_errors.lock() {
                            guard.push(StageError {
                                stage: "aggregate-submit",
                                category: Some(category),
                                period: Some(period_index),
                                era: Some(era),
                                error: e.into(),
                            });
                        }
                    }
                }
                Err(e) => {
                    if let Ok(mut guard) = worker_errors.lock() {
                        guard.push(StageError {
                            stage: "aggregate",
                            category: Some(category),
                            period: Some(period_index),
                            era: Some(era),
                            error: e.into(),
                        });
                    }
                }
            }
        });

        for error in worker_errors.into_inner().unwrap_or_default() {
            self.record_error(errors, error);
        }

        // Join semantics: wait for every queued write before the sequential
        // passes read the evidence table.
        match writer.shutdown() {
            Ok(0) => {
                self.dispatcher.emit_stage_completed(&StageCompletedEvent {
                    stage: "aggregate",
                    category: Some(category),
                    period: None,
                    era: None,
                });
            }
            Ok(failed) => self.record_error(
                errors,
                StageError {
                    stage: "aggregate-commit",
                    category: Some(category),
                    period: None,
                    era: None,
                    error: atlas_core::errors::StorageError::SqliteError {
                        message: format!("{failed} batched writes failed"),
                    }
                    .into(),
                },
            ),
            Err(e) => self.record_error(
                errors,
                StageError {
                    stage: "aggregate-commit",
                    category: Some(category),
                    period: None,
                    era: None,
                    error: e.into(),
                },
            ),
        }
    }

    fn record_error(&self, errors: &mut Vec<StageError>, error: StageError) {
        tracing::warn!(stage = error.stage, error = %error, "stage failed");
        self.dispatcher.emit_stage_failed(&StageFailedEvent {
            stage: error.stage,
            category: error.category,
            period: error.period,
            era: error.era,
            message: error.error.to_string(),
        });
        errors.push(error);
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
