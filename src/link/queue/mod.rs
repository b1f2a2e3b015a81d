//! Priority-serialized operation queue: the sole gatekeeper of the link.
//!
//! Exactly one operation executes at a time; the next starts only after the
//! current one settles, plus a short settle delay so the adapter is never
//! hammered back to back. Completion order follows dequeue order (priority,
//! then FIFO within a class), not submission order.

use crate::core::{DeviceId, ServiceInfo, Uuid, WriteMode};
use crate::error::LinkError;
use crate::link::traits::{LinkAdapter, LinkTimer};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::RefCell;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use futures_util::future::{select, Either};
use futures_util::pin_mut;

/// Pause between two consecutive operations.
pub const SETTLE_DELAY_MS: u64 = 10;
/// Poll interval of [`OperationQueue::wait_until_empty`].
const EMPTY_POLL_INTERVAL_MS: u64 = 100;

//==================================================================================OPERATION
/// Operation class; determines priority and the default timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Connect,
    Discover,
    Notify,
    Write,
    Read,
    Other,
}

impl OperationKind {
    /// Priority class, 0 = highest. Link-establishment operations jump ahead
    /// of data traffic.
    pub fn priority(self) -> u8 {
        match self {
            OperationKind::Connect => 0,
            OperationKind::Discover => 1,
            OperationKind::Notify => 2,
            OperationKind::Write => 3,
            OperationKind::Read => 4,
            OperationKind::Other => 5,
        }
    }

    /// Default timeout, overridable per call.
    pub fn default_timeout_ms(self) -> u64 {
        match self {
            OperationKind::Connect => 15_000,
            OperationKind::Discover => 10_000,
            OperationKind::Notify | OperationKind::Write | OperationKind::Read => 5_000,
            OperationKind::Other => 10_000,
        }
    }
}

/// The GATT action an operation performs, interpreted by the runner against
/// the injected adapter.
#[derive(Debug, Clone)]
pub enum OperationRequest {
    Connect(DeviceId),
    DiscoverServices,
    RequestMtu(u16),
    Write {
        service: Uuid,
        characteristic: Uuid,
        payload: Vec<u8>,
        mode: WriteMode,
    },
    Read {
        service: Uuid,
        characteristic: Uuid,
    },
    Subscribe {
        service: Uuid,
        characteristic: Uuid,
    },
    Disconnect,
}

/// Successful result of an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutput {
    Done,
    Mtu(u16),
    Services(Vec<ServiceInfo>),
    Bytes(Vec<u8>),
}

impl OperationOutput {
    /// Discovered services, empty for any other output shape.
    pub fn into_services(self) -> Vec<ServiceInfo> {
        match self {
            OperationOutput::Services(services) => services,
            _ => Vec::new(),
        }
    }

    /// Negotiated MTU, or `fallback` for any other output shape.
    pub fn into_mtu(self, fallback: u16) -> u16 {
        match self {
            OperationOutput::Mtu(mtu) => mtu,
            _ => fallback,
        }
    }

    /// Read bytes, empty for any other output shape.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            OperationOutput::Bytes(bytes) => bytes,
            _ => Vec::new(),
        }
    }
}

type DoneSignal = Arc<Signal<CriticalSectionRawMutex, Result<OperationOutput, LinkError>>>;

/// One queued operation with its single-fire completion handle.
struct PendingOperation {
    kind: OperationKind,
    request: OperationRequest,
    timeout_ms: u64,
    done: DoneSignal,
}

/// Completion handle returned by [`OperationQueue::enqueue`].
///
/// Invariant: the underlying signal fires exactly once, with `Ok` or with
/// exactly one error; nothing is silently dropped.
pub struct OperationTicket {
    done: DoneSignal,
}

impl OperationTicket {
    /// Wait for the operation to settle.
    pub async fn wait(self) -> Result<OperationOutput, LinkError> {
        self.done.wait().await
    }
}

//==================================================================================QUEUE
struct QueueState {
    pending: Vec<PendingOperation>,
    running: bool,
}

/// Shared queue front. Producers enqueue from any task; a single
/// [`QueueRunner`] drains it.
pub struct OperationQueue {
    state: Mutex<CriticalSectionRawMutex, RefCell<QueueState>>,
    /// Latched by `enqueue` so an idle runner picks up new work.
    wake: Signal<CriticalSectionRawMutex, ()>,
    /// Latched by `clear` to abort the in-flight operation.
    cancel_running: Signal<CriticalSectionRawMutex, ()>,
}

impl OperationQueue {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(QueueState {
                pending: Vec::new(),
                running: false,
            })),
            wake: Signal::new(),
            cancel_running: Signal::new(),
        }
    }

    /// Queue an operation. Insertion is priority-ordered, FIFO within a
    /// class; the returned ticket settles when the runner executes it (or
    /// when the queue is cleared).
    pub fn enqueue(
        &self,
        request: OperationRequest,
        kind: OperationKind,
        timeout_override_ms: Option<u64>,
    ) -> OperationTicket {
        let done: DoneSignal = Arc::new(Signal::new());
        let operation = PendingOperation {
            kind,
            request,
            timeout_ms: timeout_override_ms.unwrap_or_else(|| kind.default_timeout_ms()),
            done: done.clone(),
        };

        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            let index = state
                .pending
                .partition_point(|p| p.kind.priority() <= kind.priority());
            state.pending.insert(index, operation);
        });
        self.wake.signal(());

        OperationTicket { done }
    }

    /// Reject every queued operation and the in-flight one with
    /// [`LinkError::Cancelled`], then return to idle.
    pub fn clear(&self) {
        let (drained, was_running) = self.state.lock(|state| {
            let mut state = state.borrow_mut();
            let drained: Vec<PendingOperation> = state.pending.drain(..).collect();
            (drained, state.running)
        });

        for operation in drained {
            operation.done.signal(Err(LinkError::Cancelled));
        }
        if was_running {
            self.cancel_running.signal(());
        }
    }

    /// Number of queued (not yet started) operations.
    pub fn len(&self) -> usize {
        self.state.lock(|state| state.borrow().pending.len())
    }

    /// True when nothing is queued and nothing is running.
    pub fn is_empty(&self) -> bool {
        self.state
            .lock(|state| state.borrow().pending.is_empty() && !state.borrow().running)
    }

    /// Poll until the queue is fully idle, or fail with a timeout.
    pub async fn wait_until_empty<T: LinkTimer>(
        &self,
        timer: &T,
        timeout_ms: u64,
    ) -> Result<(), LinkError> {
        let mut waited = 0;
        loop {
            if self.is_empty() {
                return Ok(());
            }
            if waited >= timeout_ms {
                return Err(LinkError::Timeout { ms: timeout_ms });
            }
            timer.delay_ms(EMPTY_POLL_INTERVAL_MS).await;
            waited += EMPTY_POLL_INTERVAL_MS;
        }
    }

    /// Pop the highest-priority operation and mark the queue running.
    fn take_next(&self) -> Option<PendingOperation> {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            if state.pending.is_empty() {
                None
            } else {
                state.running = true;
                Some(state.pending.remove(0))
            }
        })
    }

    fn finish_running(&self) {
        self.state.lock(|state| state.borrow_mut().running = false);
    }
}

impl Default for OperationQueue {
    fn default() -> Self {
        Self::new()
    }
}

//==================================================================================RUNNER
/// Runner that drains the queue against the injected adapter. Owns the
/// adapter: one runner, one link, one operation in flight.
pub struct QueueRunner<'q, A: LinkAdapter, T: LinkTimer> {
    queue: &'q OperationQueue,
    adapter: A,
    timer: T,
}

impl<'q, A: LinkAdapter, T: LinkTimer> QueueRunner<'q, A, T> {
    pub fn new(queue: &'q OperationQueue, adapter: A, timer: T) -> Self {
        Self {
            queue,
            adapter,
            timer,
        }
    }

    /// Drive the queue forever. Meant to run as its own task; producers
    /// interact through [`OperationQueue::enqueue`].
    pub async fn drive(mut self) {
        loop {
            let Some(operation) = self.queue.take_next() else {
                self.queue.wake.wait().await;
                continue;
            };

            let result = self.execute(&operation).await;

            #[cfg(feature = "defmt")]
            if result.is_err() {
                defmt::warn!("link operation failed");
            }

            operation.done.signal(result);
            self.queue.finish_running();
            self.timer.delay_ms(SETTLE_DELAY_MS).await;
        }
    }

    /// Race the operation against its timeout and the cancel signal.
    async fn execute(
        &mut self,
        operation: &PendingOperation,
    ) -> Result<OperationOutput, LinkError> {
        // A clear() from a previous idle period must not kill this operation.
        self.queue.cancel_running.reset();

        let cancelled = self.queue.cancel_running.wait();
        let timeout = self.timer.delay_ms(operation.timeout_ms);
        let action = run_request(&mut self.adapter, &operation.request);
        pin_mut!(cancelled, timeout, action);

        match select(cancelled, select(action, timeout)).await {
            Either::Left(_) => Err(LinkError::Cancelled),
            Either::Right((Either::Left((result, _)), _)) => result,
            Either::Right((Either::Right(_), _)) => Err(LinkError::Timeout {
                ms: operation.timeout_ms,
            }),
        }
    }
}

async fn run_request<A: LinkAdapter>(
    adapter: &mut A,
    request: &OperationRequest,
) -> Result<OperationOutput, LinkError> {
    match request {
        OperationRequest::Connect(device) => adapter
            .connect(device)
            .await
            .map(|_| OperationOutput::Done)
            .map_err(LinkError::adapter),
        OperationRequest::DiscoverServices => adapter
            .discover_services()
            .await
            .map(OperationOutput::Services)
            .map_err(LinkError::adapter),
        OperationRequest::RequestMtu(mtu) => adapter
            .request_mtu(*mtu)
            .await
            .map(OperationOutput::Mtu)
            .map_err(LinkError::adapter),
        OperationRequest::Write {
            service,
            characteristic,
            payload,
            mode,
        } => adapter
            .write(service, characteristic, payload, *mode)
            .await
            .map(|_| OperationOutput::Done)
            .map_err(LinkError::adapter),
        OperationRequest::Read {
            service,
            characteristic,
        } => adapter
            .read(service, characteristic)
            .await
            .map(OperationOutput::Bytes)
            .map_err(LinkError::adapter),
        OperationRequest::Subscribe {
            service,
            characteristic,
        } => adapter
            .subscribe(service, characteristic)
            .await
            .map(|_| OperationOutput::Done)
            .map_err(LinkError::adapter),
        OperationRequest::Disconnect => adapter
            .disconnect()
            .await
            .map(|_| OperationOutput::Done)
            .map_err(LinkError::adapter),
    }
}
