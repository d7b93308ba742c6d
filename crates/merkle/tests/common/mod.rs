//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use accumulator_hash::FnHasher;
use accumulator_merkle::{MemoryStore, NodeKey, NodeStore, StoreError};
use ark_ff::fields::{Fp64, MontBackend, MontConfig};
use ark_ff::PrimeField;
use async_trait::async_trait;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Field of order 11, small enough to check roots by hand.
#[derive(MontConfig)]
#[modulus = "11"]
#[generator = "2"]
pub struct F11Config;
pub type F11 = Fp64<MontBackend<F11Config, 1>>;

pub fn f11(value: u64) -> F11 {
    F11::from(value)
}

/// Addition mod p: a transparent stand-in for a real hash.
pub fn additive_hasher<F: PrimeField>(arity: usize) -> FnHasher<F, fn(&[F]) -> F> {
    FnHasher::new("add", arity, sum::<F> as fn(&[F]) -> F)
}

fn sum<F: PrimeField>(inputs: &[F]) -> F {
    inputs.iter().copied().sum()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// Memory store whose writes start failing after a fixed number of successes.
pub struct FlakyStore<F: PrimeField> {
    inner: MemoryStore<F>,
    writes_left: AtomicUsize,
    fail_reads: bool,
}

impl<F: PrimeField> FlakyStore<F> {
    pub fn failing_after(writes: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            writes_left: AtomicUsize::new(writes),
            fail_reads: false,
        }
    }

    pub fn unreadable() -> Self {
        Self {
            inner: MemoryStore::new(),
            writes_left: AtomicUsize::new(usize::MAX),
            fail_reads: true,
        }
    }

    /// Reset the remaining write budget.
    pub fn allow_writes(&self, writes: usize) {
        self.writes_left.store(writes, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &MemoryStore<F> {
        &self.inner
    }
}

#[async_trait]
impl<F: PrimeField> NodeStore<F> for FlakyStore<F> {
    async fn get(&self, key: &NodeKey) -> Result<Option<F>, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Backend(format!("read of {key} timed out")));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &NodeKey, value: F) -> Result<(), StoreError> {
        let allowed = self
            .writes_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if !allowed {
            return Err(StoreError::Backend(format!("write of {key} rejected")));
        }
        self.inner.set(key, value).await
    }
}
