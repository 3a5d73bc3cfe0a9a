//! Per-variant admission control
//!
//! One single-permit semaphore per variant: jobs of the same variant run one
//! after another, in the order they asked, while different variants never
//! contend. The permit is released when the [`AdmissionPermit`] drops, on
//! every exit path.

use std::collections::HashMap;
use std::sync::Arc;

use quarry_core::domain::variant::Variant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Admission error type
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("admission gate for {0} is closed")]
    Closed(Variant),
}

pub struct ConcurrencyLimiter {
    gates: HashMap<Variant, Arc<Semaphore>>,
}

/// Held while a job of `variant` is processing
#[derive(Debug)]
pub struct AdmissionPermit {
    variant: Variant,
    _permit: OwnedSemaphorePermit,
}

impl AdmissionPermit {
    pub fn variant(&self) -> Variant {
        self.variant
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        tracing::debug!(variant = %self.variant, "Admission slot released");
    }
}

impl ConcurrencyLimiter {
    pub fn new() -> Self {
        let gates = Variant::ALL
            .into_iter()
            .map(|variant| (variant, Arc::new(Semaphore::new(1))))
            .collect();
        Self { gates }
    }

    /// Wait for the variant's slot
    ///
    /// The semaphore is fair, so waiters are admitted in request order.
    pub async fn acquire(&self, variant: Variant) -> Result<AdmissionPermit, AdmissionError> {
        let gate = self
            .gates
            .get(&variant)
            .ok_or(AdmissionError::Closed(variant))?;
        let permit = Arc::clone(gate)
            .acquire_owned()
            .await
            .map_err(|_| AdmissionError::Closed(variant))?;

        tracing::debug!(variant = %variant, "Admission slot acquired");
        Ok(AdmissionPermit {
            variant,
            _permit: permit,
        })
    }

    /// Whether the variant's slot is currently free
    pub fn is_idle(&self, variant: Variant) -> bool {
        self.gates
            .get(&variant)
            .is_some_and(|gate| gate.available_permits() > 0)
    }

    /// Refuse all future admissions; current holders keep their slot
    pub fn close(&self) {
        for gate in self.gates.values() {
            gate.close();
        }
    }
}

impl Default for ConcurrencyLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_variant_serializes() {
        let limiter = Arc::new(ConcurrencyLimiter::new());
        let first = limiter.acquire(Variant::Sequential).await.unwrap();
        assert!(!limiter.is_idle(Variant::Sequential));

        let waiter = {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.acquire(Variant::Sequential).await.map(|p| p.variant()) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(first);
        assert_eq!(waiter.await.unwrap().unwrap(), Variant::Sequential);
        assert!(limiter.is_idle(Variant::Sequential));
    }

    #[tokio::test]
    async fn test_variants_are_independent() {
        let limiter = ConcurrencyLimiter::new();
        let _a = limiter.acquire(Variant::Sequential).await.unwrap();
        let _b = limiter.acquire(Variant::Bounded).await.unwrap();
        let _c = limiter.acquire(Variant::Concurrent).await.unwrap();
        assert!(!limiter.is_idle(Variant::Concurrent));
    }

    #[tokio::test]
    async fn test_waiters_admitted_in_order() {
        let limiter = Arc::new(ConcurrencyLimiter::new());
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let held = limiter.acquire(Variant::Bounded).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..4 {
            let limiter = Arc::clone(&limiter);
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                let _permit = limiter.acquire(Variant::Bounded).await.unwrap();
                order.lock().unwrap().push(i);
                tokio::task::yield_now().await;
            }));
            // let each waiter enqueue before the next
            tokio::task::yield_now().await;
        }

        drop(held);
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_release_on_panic() {
        let limiter = Arc::new(ConcurrencyLimiter::new());
        let task = {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move {
                let _permit = limiter.acquire(Variant::Concurrent).await.unwrap();
                panic!("strategy blew up");
            })
        };
        assert!(task.await.is_err());
        assert!(limiter.is_idle(Variant::Concurrent));
    }

    #[tokio::test]
    async fn test_closed_limiter_refuses() {
        let limiter = ConcurrencyLimiter::new();
        limiter.close();
        assert!(matches!(
            limiter.acquire(Variant::Sequential).await,
            Err(AdmissionError::Closed(Variant::Sequential))
        ));
    }
}
