//! # Media Mirror Library
//!
//! Copia un albero di directory in un altro comprimendo le immagini (e
//! opzionalmente i video) lungo la strada. Tutti gli altri file vengono
//! copiati byte per byte.
//!
//! ## Architettura dei moduli:
//! - `config`: configurazione, default e validazione parametri
//! - `error`: tipi di errore del run
//! - `file_manager`: classificazione dei file e copie passthrough
//! - `image_processor`: ricodifica immagini (JPEG/PNG/GIF) in-process
//! - `video_processor`: ricodifica video con FFmpeg
//! - `platform`: ricerca dei tool esterni nel PATH
//! - `optimizer`: visita dell'albero, limite di concorrenza, orchestrazione
//! - `progress`: contatori del run e riepilogo finale
//! - `json_output`: eventi JSON per `--json`
//!
//! ## Utilizzo:
//! ```no_run
//! use media_mirror::{Config, MediaOptimizer};
//! use std::path::Path;
//!
//! # async fn example() -> media_mirror::error::Result<()> {
//! let optimizer = MediaOptimizer::new(Config::default())?;
//! let summary = optimizer.run(Path::new("photos"), Path::new("photos-small")).await?;
//! println!("{}", summary.format_summary());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod file_manager;
pub mod image_processor;
pub mod json_output;
pub mod optimizer;
pub mod platform;
pub mod progress;
pub mod video_processor;

pub use config::{CompressionConstraints, Config};
pub use error::OptimizeError;
pub use file_manager::FileKind;
pub use optimizer::{MediaOptimizer, TransformBackend};
pub use progress::RunSummary;
