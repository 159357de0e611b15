//! # Run Context
//!
//! Stato condiviso di un singolo run, passato tramite `Arc` a ogni task.
//! Tutto è immutabile tranne i contatori (atomici) e il limiter.

use crate::config::CompressionConstraints;
use crate::optimizer::backend::TransformBackend;
use crate::optimizer::concurrency::ConcurrencyLimiter;
use crate::optimizer::path_resolver::PathResolver;
use crate::optimizer::progress_tracker::ProgressTracker;
use crate::progress::RunCounters;
use std::sync::Arc;

/// Shared state for one mirroring run
pub struct RunContext {
    pub resolver: PathResolver,
    pub constraints: CompressionConstraints,
    pub counters: RunCounters,
    pub limiter: ConcurrencyLimiter,
    pub backend: Arc<dyn TransformBackend>,
    pub reporter: ProgressTracker,
}

impl RunContext {
    pub fn new(
        resolver: PathResolver,
        constraints: CompressionConstraints,
        workers: usize,
        backend: Arc<dyn TransformBackend>,
        reporter: ProgressTracker,
    ) -> Self {
        Self {
            resolver,
            constraints,
            counters: RunCounters::new(),
            limiter: ConcurrencyLimiter::new(workers),
            backend,
            reporter,
        }
    }
}
