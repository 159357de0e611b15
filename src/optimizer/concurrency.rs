//! # Concurrency Limiter
//!
//! Limite globale sul numero di trasformazioni in esecuzione contemporanea.
//! L'ammissione è FIFO (il `Semaphore` di tokio è fair): `submit` attende un
//! permesso e poi avvia il task, che lo trattiene fino alla fine.
//!
//! La ricorsione sulle directory e le copie passthrough non passano di qui.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{AcquireError, Semaphore};
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

/// Tiene aggiornato il conteggio dei task attivi per tutta la vita del task
struct InFlightGuard(Arc<InFlight>);

impl InFlightGuard {
    fn enter(stats: Arc<InFlight>) -> Self {
        let now = stats.current.fetch_add(1, Ordering::SeqCst) + 1;
        stats.peak.fetch_max(now, Ordering::SeqCst);
        Self(stats)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Bounded, FIFO-fair task spawner shared by the whole run
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    limit: usize,
    stats: Arc<InFlight>,
}

impl ConcurrencyLimiter {
    /// `limit` is clamped to at least one slot
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
            stats: Arc::new(InFlight::default()),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Wait for a free slot, then spawn `task` holding it until it finishes.
    ///
    /// Fails only if the limiter has been closed.
    pub async fn submit<F>(&self, task: F) -> Result<JoinHandle<F::Output>, AcquireError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let permit = self.semaphore.clone().acquire_owned().await?;
        let stats = Arc::clone(&self.stats);

        Ok(tokio::spawn(async move {
            let _permit = permit;
            // Dropped before the permit: the count never exceeds the limit
            let _guard = InFlightGuard::enter(stats);
            task.await
        }))
    }

    /// Trasformazioni in esecuzione in questo momento
    pub fn in_flight(&self) -> usize {
        self.stats.current.load(Ordering::SeqCst)
    }

    /// Massimo numero di trasformazioni mai eseguite insieme
    pub fn peak_in_flight(&self) -> usize {
        self.stats.peak.load(Ordering::SeqCst)
    }
}
