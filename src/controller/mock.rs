//! Scripted controller for unit tests.

use super::{Circuit, CircuitId, DeviceConfig, DeviceStatus, PoolController};
use crate::error::ControllerError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Semaphore;

/// Controller whose status replies are queued by the test.
///
/// When gated, every `get_status` call blocks until the test calls
/// [`MockController::release`], which keeps a fetch in flight for as long
/// as the test needs.
pub(crate) struct MockController {
    config: DeviceConfig,
    fail_config: AtomicBool,
    panic_next: AtomicBool,
    replies: Mutex<VecDeque<Result<DeviceStatus, ControllerError>>>,
    gate: Option<Semaphore>,
    status_calls: AtomicUsize,
    circuit_writes: Mutex<Vec<(CircuitId, bool)>>,
}

impl MockController {
    pub(crate) fn new(is_celsius: bool, circuits: &[(CircuitId, &str)]) -> Self {
        Self {
            config: DeviceConfig {
                gateway_name: "Pentair: AB-CD-EF".to_string(),
                software_version: "POOL: 5.2 Build 738.0 Rel".to_string(),
                is_celsius,
                circuits: circuits
                    .iter()
                    .map(|(id, name)| Circuit::new(*id, *name))
                    .collect(),
            },
            fail_config: AtomicBool::new(false),
            panic_next: AtomicBool::new(false),
            replies: Mutex::new(VecDeque::new()),
            gate: None,
            status_calls: AtomicUsize::new(0),
            circuit_writes: Mutex::new(Vec::new()),
        }
    }

    /// Hold every status fetch until released.
    pub(crate) fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub(crate) fn fail_config(&self) {
        self.fail_config.store(true, Ordering::SeqCst);
    }

    /// Make the next `get_status` call panic instead of answering.
    pub(crate) fn panic_next_status(&self) {
        self.panic_next.store(true, Ordering::SeqCst);
    }

    pub(crate) fn push_status(&self, status: DeviceStatus) {
        self.replies.lock().push_back(Ok(status));
    }

    pub(crate) fn push_error(&self, error: ControllerError) {
        self.replies.lock().push_back(Err(error));
    }

    /// Let `n` gated fetches complete.
    pub(crate) fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub(crate) fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn circuit_writes(&self) -> Vec<(CircuitId, bool)> {
        self.circuit_writes.lock().clone()
    }
}

/// Status snapshot with the given temperatures and circuit map.
pub(crate) fn status(pool: f64, spa: f64, air: f64, circuits: &[(CircuitId, bool)]) -> DeviceStatus {
    DeviceStatus {
        air_temperature: air,
        pool_temperature: pool,
        spa_temperature: spa,
        is_pool_active: true,
        is_spa_active: false,
        circuit_state: circuits.iter().copied().collect::<HashMap<_, _>>(),
    }
}

#[async_trait]
impl PoolController for MockController {
    async fn get_config(&self) -> Result<DeviceConfig, ControllerError> {
        if self.fail_config.load(Ordering::SeqCst) {
            return Err(ControllerError::Connection("connection refused".to_string()));
        }
        Ok(self.config.clone())
    }

    async fn get_status(&self) -> Result<DeviceStatus, ControllerError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_next.swap(false, Ordering::SeqCst) {
            panic!("controller client crashed");
        }
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|_| ControllerError::Interrupted)?
                .forget();
        }
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(DeviceStatus::default()))
    }

    async fn set_circuit_state(&self, id: CircuitId, on: bool) -> Result<(), ControllerError> {
        self.circuit_writes.lock().push((id, on));
        Ok(())
    }
}
