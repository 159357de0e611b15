//! # Optimizer Module
//!
//! Separa le responsabilità del run in sottomoduli:
//! - `media_optimizer`: orchestratore e visita ricorsiva dell'albero
//! - `task_optimizer`: esecuzione di un singolo file
//! - `concurrency`: limite globale sulle trasformazioni in corso
//! - `backend`: trait di trasformazione e implementazione reale
//! - `context`: stato condiviso del run
//! - `progress_tracker`: righe di progresso ed eventi JSON
//! - `path_resolver`: calcolo dei path di destinazione

pub mod backend;
pub mod concurrency;
pub mod context;
pub mod media_optimizer;
pub mod path_resolver;
pub mod progress_tracker;
pub mod task_optimizer;

pub use backend::{MediaBackend, TransformBackend};
pub use concurrency::ConcurrencyLimiter;
pub use context::RunContext;
pub use media_optimizer::{walk_directory, MediaOptimizer};
pub use path_resolver::PathResolver;
pub use progress_tracker::ProgressTracker;
pub use task_optimizer::{FileTask, TaskOptimizer};
