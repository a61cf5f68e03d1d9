//! Parallel evaluation of the model over a set of sample points.
//!
//! Points are independent, so they are mapped across a bounded worker pool
//! and the outcomes are sorted back into index order before any reduction.
//! Each point runs the model and then every registered feature; any failure
//! (error, panic, timeout or non-finite value) fails that point only.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, mpsc};
use std::time::Duration;

use nalgebra::DMatrix;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, ModelError, Result, UqError};
use crate::model::{FeatureSet, Model};
use crate::parameters::{ParameterSpace, ParameterVector};

/// Worker-pool settings. `workers` is resolved once; zero is not allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub workers: usize,
    pub allow_incomplete: bool,
    pub timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            allow_incomplete: false,
            timeout: None,
        }
    }
}

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Values of the active uncertain parameters for one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePoint {
    pub index: usize,
    pub values: Vec<f64>,
}

impl SamplePoint {
    /// Number a list of value vectors `0..n`.
    pub fn enumerate(samples: Vec<Vec<f64>>) -> Vec<SamplePoint> {
        samples
            .into_iter()
            .enumerate()
            .map(|(index, values)| SamplePoint { index, values })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationOutcome {
    pub index: usize,
    pub time: Option<Vec<f64>>,
    /// One series per quantity: the model output, then each feature.
    pub values: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationFailure {
    pub index: usize,
    pub error: ModelError,
}

/// Surviving outcomes and dropped failures, both sorted by point index.
#[derive(Debug, Clone, Default)]
pub struct Evaluations {
    pub requested: usize,
    pub outcomes: Vec<EvaluationOutcome>,
    pub failures: Vec<EvaluationFailure>,
}

impl Evaluations {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn surviving_indices(&self) -> Vec<usize> {
        self.outcomes.iter().map(|o| o.index).collect()
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.index).collect()
    }

    pub fn require(&self, required: usize) -> Result<&Self> {
        if self.outcomes.len() < required {
            return Err(UqError::InsufficientData {
                survived: self.outcomes.len(),
                required,
            });
        }
        Ok(self)
    }

    /// Time axis shared by every surviving outcome.
    pub fn time(&self) -> Result<Option<Vec<f64>>> {
        let Some(first) = self.outcomes.first() else {
            return Ok(None);
        };
        if let Some(outcome) = self.outcomes.iter().find(|o| o.time != first.time) {
            return Err(UqError::InconsistentTime {
                first: first.index,
                index: outcome.index,
            });
        }
        Ok(first.time.clone())
    }

    /// Survivors × length matrix for quantity `q`. Every survivor must produce
    /// the same length as the first.
    pub fn quantity_matrix(&self, q: usize, name: &str) -> Result<DMatrix<f64>> {
        let Some(first) = self.outcomes.first() else {
            return Err(UqError::InsufficientData {
                survived: 0,
                required: 1,
            });
        };
        let width = first.values[q].len();

        for outcome in &self.outcomes {
            let found = outcome.values[q].len();
            if found != width {
                return Err(UqError::InconsistentOutput {
                    quantity: name.to_string(),
                    index: outcome.index,
                    expected: width,
                    found,
                });
            }
        }

        Ok(DMatrix::from_fn(self.outcomes.len(), width, |row, col| {
            self.outcomes[row].values[q][col]
        }))
    }
}

pub struct EvaluationPool {
    config: PoolConfig,
    #[cfg(feature = "parallel")]
    pool: Arc<rayon::ThreadPool>,
}

impl std::fmt::Debug for EvaluationPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationPool")
            .field("config", &self.config)
            .finish()
    }
}

impl EvaluationPool {
    pub fn new(config: PoolConfig) -> std::result::Result<Self, ConfigurationError> {
        if config.workers == 0 {
            return Err(ConfigurationError::WorkerPool {
                workers: 0,
                reason: "at least one worker is required".to_string(),
            });
        }

        #[cfg(feature = "parallel")]
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("uqprop-eval-{i}"))
            .build()
            .map_err(|e| ConfigurationError::WorkerPool {
                workers: config.workers,
                reason: e.to_string(),
            })?;

        Ok(Self {
            config,
            #[cfg(feature = "parallel")]
            pool: Arc::new(pool),
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn workers(&self) -> usize {
        self.config.workers
    }

    /// Evaluate the model and features at every point.
    ///
    /// Without `allow_incomplete` the first failure aborts the batch with
    /// [`UqError::Propagation`]. Otherwise failures are collected and the
    /// survivors returned.
    pub fn evaluate(
        &self,
        model: &Arc<dyn Model>,
        features: &FeatureSet,
        space: &ParameterSpace,
        uncertain: &[String],
        points: &[SamplePoint],
    ) -> Result<Evaluations> {
        let task = |point: &SamplePoint| {
            let vector = space.vector(uncertain, &point.values);
            run_point(model, features, vector, self.config.timeout).map_or_else(
                |error| {
                    Err(EvaluationFailure {
                        index: point.index,
                        error,
                    })
                },
                |(time, values)| {
                    Ok(EvaluationOutcome {
                        index: point.index,
                        time,
                        values,
                    })
                },
            )
        };

        tracing::debug!(
            points = points.len(),
            workers = self.config.workers,
            allow_incomplete = self.config.allow_incomplete,
            "evaluating model"
        );

        let mut evaluations = if self.config.allow_incomplete {
            let results: Vec<std::result::Result<EvaluationOutcome, EvaluationFailure>> =
                self.map_points(points, task);

            let mut evaluations = Evaluations {
                requested: points.len(),
                ..Default::default()
            };
            for result in results {
                match result {
                    Ok(outcome) => evaluations.outcomes.push(outcome),
                    Err(failure) => {
                        tracing::warn!(
                            index = failure.index,
                            error = %failure.error,
                            "dropping failed sample point"
                        );
                        evaluations.failures.push(failure);
                    }
                }
            }
            evaluations
        } else {
            let outcomes = self.try_map_points(points, |point| {
                task(point).map_err(|failure| UqError::Propagation {
                    index: failure.index,
                    source: failure.error,
                })
            })?;
            Evaluations {
                requested: points.len(),
                outcomes,
                failures: Vec::new(),
            }
        };

        evaluations.outcomes.sort_by_key(|o| o.index);
        evaluations.failures.sort_by_key(|f| f.index);
        Ok(evaluations)
    }

    #[cfg(feature = "parallel")]
    fn map_points<T, F>(&self, points: &[SamplePoint], task: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&SamplePoint) -> T + Sync + Send,
    {
        self.pool
            .install(|| points.par_iter().map(|point| task(point)).collect())
    }

    #[cfg(not(feature = "parallel"))]
    fn map_points<T, F>(&self, points: &[SamplePoint], task: F) -> Vec<T>
    where
        F: Fn(&SamplePoint) -> T,
    {
        points.iter().map(task).collect()
    }

    /// Like `map_points` but stops scheduling new points after the first error.
    #[cfg(feature = "parallel")]
    fn try_map_points<T, F>(&self, points: &[SamplePoint], task: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&SamplePoint) -> Result<T> + Sync + Send,
    {
        self.pool
            .install(|| points.par_iter().map(|point| task(point)).collect())
    }

    #[cfg(not(feature = "parallel"))]
    fn try_map_points<T, F>(&self, points: &[SamplePoint], task: F) -> Result<Vec<T>>
    where
        F: Fn(&SamplePoint) -> Result<T>,
    {
        points.iter().map(task).collect()
    }
}

type PointOutput = (Option<Vec<f64>>, Vec<Vec<f64>>);

fn run_point(
    model: &Arc<dyn Model>,
    features: &FeatureSet,
    vector: ParameterVector,
    timeout: Option<Duration>,
) -> std::result::Result<PointOutput, ModelError> {
    match timeout {
        None => run_guarded(model.as_ref(), features, &vector),
        Some(limit) => {
            // The model call cannot be interrupted, so it runs on its own
            // thread and is abandoned if it does not answer in time.
            let (tx, rx) = mpsc::channel();
            let model = Arc::clone(model);
            let features = features.clone();
            std::thread::Builder::new()
                .name("uqprop-model".to_string())
                .spawn(move || {
                    let _ = tx.send(run_guarded(model.as_ref(), &features, &vector));
                })
                .map_err(|e| ModelError::failed(format!("cannot spawn model thread: {e}")))?;

            match rx.recv_timeout(limit) {
                Ok(result) => result,
                Err(mpsc::RecvTimeoutError::Timeout) => Err(ModelError::Timeout(limit)),
                Err(mpsc::RecvTimeoutError::Disconnected) => Err(ModelError::Panicked(
                    "model thread exited without a result".to_string(),
                )),
            }
        }
    }
}

fn run_guarded(
    model: &dyn Model,
    features: &FeatureSet,
    vector: &ParameterVector,
) -> std::result::Result<PointOutput, ModelError> {
    catch_unwind(AssertUnwindSafe(|| run_model(model, features, vector)))
        .unwrap_or_else(|payload| Err(ModelError::Panicked(panic_message(payload.as_ref()))))
}

fn run_model(
    model: &dyn Model,
    features: &FeatureSet,
    vector: &ParameterVector,
) -> std::result::Result<PointOutput, ModelError> {
    let output = model.run(vector)?;
    if output.values.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::NonFinite);
    }

    let mut values = Vec::with_capacity(features.len() + 1);
    values.push(output.values.clone());
    for feature in features.iter() {
        let series = feature.compute(&output)?.into_values();
        if series.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::Feature {
                feature: feature.name().to_string(),
                reason: "non-finite value".to_string(),
            });
        }
        values.push(series);
    }

    Ok((output.time, values))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
