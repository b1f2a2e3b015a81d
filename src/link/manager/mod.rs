//! Connection state machine with automatic reconnection and notification
//! dispatch.
//!
//! The manager orchestrates connect → discover → detect-profile → negotiate
//! MTU → subscribe notifications → ready, owns the reconnect backoff timer,
//! and drains inbound link events: notifications feed a rolling log and a
//! waiter registry, link drops trigger the reconnect ladder. Every link
//! access still funnels through the shared [`OperationQueue`].

use crate::core::{DeviceId, Uuid, WriteMode};
use crate::error::{LinkError, ProtocolError, TransportError};
use crate::infra::hex;
use crate::link::queue::{OperationKind, OperationQueue, OperationRequest};
use crate::link::traits::{DeviceStore, LinkTimer};
use crate::profile::device_info::{self, DeviceInfo};
use crate::profile::{detect_profile, DetectedProfile};
use crate::protocol::catalog::TargetRole;
use crate::protocol::engine::{self, CommandParams};
use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::RefCell;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::{Channel, Receiver};
use embassy_sync::signal::Signal;
use futures_util::future::{select, Either};
use futures_util::pin_mut;
use heapless::Deque;

/// MTU requested after discovery.
pub const PREFERRED_MTU: u16 = 247;
/// MTU assumed when negotiation is refused.
pub const FALLBACK_MTU: u16 = 23;
/// Capacity of the rolling notification log.
pub const NOTIFY_LOG_CAP: usize = 64;
/// Capacity of the state-change event channel.
pub const STATE_EVENT_CAP: usize = 8;

//==================================================================================STATE
/// Link lifecycle; transitions are strictly sequential, no stage is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Discovering,
    Ready,
    Reconnecting,
}

/// Inbound events produced by the platform adapter glue and consumed by
/// [`ConnectionManager::drive`].
#[derive(Debug, Clone)]
pub enum LinkEvent {
    Notification { characteristic: Uuid, payload: Vec<u8> },
    LinkDropped,
}

/// One logged notification.
#[derive(Debug, Clone, PartialEq)]
pub struct NotifyRecord {
    pub characteristic: Uuid,
    pub payload: Vec<u8>,
}

/// Automatic reconnection settings.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    /// Backoff ladder in seconds; the last rung repeats.
    pub delays_s: &'static [u64],
    /// Attempts allowed before giving up.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            delays_s: &[1, 2, 4, 8, 16, 30],
            max_attempts: 6,
        }
    }
}

type WaiterSignal = Arc<Signal<CriticalSectionRawMutex, Result<Vec<u8>, LinkError>>>;

/// Registered "await next matching notification" entry. The first inbound
/// payload the predicate accepts resolves it; its owner enforces the
/// deadline.
struct Waiter {
    id: u32,
    predicate: Box<dyn Fn(&[u8]) -> bool + Send>,
    done: WaiterSignal,
}

struct ManagerState<S: DeviceStore> {
    connection: ConnectionState,
    detected: Option<DetectedProfile>,
    mtu: u16,
    last_device: Option<DeviceId>,
    policy: ReconnectPolicy,
    attempts: u32,
    store: S,
    waiters: Vec<Waiter>,
    next_waiter_id: u32,
    notify_log: Deque<NotifyRecord, NOTIFY_LOG_CAP>,
}

//==================================================================================MANAGER
/// Owner of the connection state. External callers interact only through the
/// documented entry points; all mutation happens here.
pub struct ConnectionManager<'q, T: LinkTimer, S: DeviceStore> {
    queue: &'q OperationQueue,
    timer: T,
    state: Mutex<CriticalSectionRawMutex, RefCell<ManagerState<S>>>,
    state_events: Channel<CriticalSectionRawMutex, ConnectionState, STATE_EVENT_CAP>,
    reconnect_cancel: Signal<CriticalSectionRawMutex, ()>,
}

impl<'q, T: LinkTimer, S: DeviceStore> ConnectionManager<'q, T, S> {
    pub fn new(queue: &'q OperationQueue, timer: T, store: S, policy: ReconnectPolicy) -> Self {
        let last_device = store.load();
        Self {
            queue,
            timer,
            state: Mutex::new(RefCell::new(ManagerState {
                connection: ConnectionState::Disconnected,
                detected: None,
                mtu: FALLBACK_MTU,
                last_device,
                policy,
                attempts: 0,
                store,
                waiters: Vec::new(),
                next_waiter_id: 0,
                notify_log: Deque::new(),
            })),
            state_events: Channel::new(),
            reconnect_cancel: Signal::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.lock(|s| s.borrow().connection)
    }

    /// Negotiated MTU of the current connection ([`FALLBACK_MTU`] otherwise).
    pub fn mtu(&self) -> u16 {
        self.state.lock(|s| s.borrow().mtu)
    }

    pub fn detected_profile(&self) -> Option<DetectedProfile> {
        self.state.lock(|s| s.borrow().detected.clone())
    }

    /// Snapshot of the rolling notification log, oldest first.
    pub fn recent_notifications(&self) -> Vec<NotifyRecord> {
        self.state
            .lock(|s| s.borrow().notify_log.iter().cloned().collect())
    }

    /// Receiver for state transitions, for a UI-facing projection. Events
    /// are dropped when the channel is full; poll [`Self::state`] for truth.
    pub fn state_changes(
        &self,
    ) -> Receiver<'_, CriticalSectionRawMutex, ConnectionState, STATE_EVENT_CAP> {
        self.state_events.receiver()
    }

    pub fn set_reconnect_enabled(&self, enabled: bool) {
        self.state.lock(|s| s.borrow_mut().policy.enabled = enabled);
        if !enabled {
            self.reconnect_cancel.signal(());
        }
    }

    //==============================================================================CONNECT
    /// Run the full connection sequence against `device`. Fails with
    /// [`TransportError::LinkBusy`] when a sequence is already in progress;
    /// any stage failure lands back in `Disconnected`.
    pub async fn connect(&self, device: &DeviceId) -> Result<(), LinkError> {
        let admitted = self.state.lock(|s| {
            let mut s = s.borrow_mut();
            match s.connection {
                ConnectionState::Disconnected | ConnectionState::Reconnecting => {
                    s.connection = ConnectionState::Connecting;
                    true
                }
                _ => false,
            }
        });
        if !admitted {
            return Err(TransportError::LinkBusy.into());
        }
        // A pending reconnect backoff yields to the manual attempt.
        self.reconnect_cancel.signal(());
        self.emit(ConnectionState::Connecting);

        match self.run_connect_sequence(device).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.set_state(ConnectionState::Disconnected);
                Err(err)
            }
        }
    }

    async fn run_connect_sequence(&self, device: &DeviceId) -> Result<(), LinkError> {
        self.queue
            .enqueue(
                OperationRequest::Connect(device.clone()),
                OperationKind::Connect,
                None,
            )
            .wait()
            .await?;

        self.set_state(ConnectionState::Discovering);
        let services = self
            .queue
            .enqueue(
                OperationRequest::DiscoverServices,
                OperationKind::Discover,
                None,
            )
            .wait()
            .await?
            .into_services();

        let detected = detect_profile(&services).ok_or(ProtocolError::ProfileNotDetected)?;

        // Best effort: a refused negotiation falls back to the minimum.
        let mtu = match self
            .queue
            .enqueue(
                OperationRequest::RequestMtu(PREFERRED_MTU),
                OperationKind::Other,
                None,
            )
            .wait()
            .await
        {
            Ok(output) => output.into_mtu(FALLBACK_MTU),
            Err(_) => FALLBACK_MTU,
        };

        let to_subscribe: Vec<Uuid> = detected.notify_characteristics().cloned().collect();
        for characteristic in to_subscribe {
            self.queue
                .enqueue(
                    OperationRequest::Subscribe {
                        service: detected.service.clone(),
                        characteristic,
                    },
                    OperationKind::Notify,
                    None,
                )
                .wait()
                .await?;
        }

        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            s.detected = Some(detected);
            s.mtu = mtu;
            s.last_device = Some(device.clone());
            s.store.save(device);
            s.attempts = 0;
            s.connection = ConnectionState::Ready;
        });
        self.emit(ConnectionState::Ready);
        Ok(())
    }

    /// Reconnect to the last known device.
    pub async fn quick_reconnect(&self) -> Result<(), LinkError> {
        let device = self
            .state
            .lock(|s| s.borrow().last_device.clone())
            .ok_or(TransportError::NoKnownDevice)?;
        self.connect(&device).await
    }

    /// Tear down: cancel any pending reconnect, reject outstanding waiters
    /// and queued operations, then release the link best effort.
    pub async fn disconnect(&self) {
        self.reconnect_cancel.signal(());
        self.cancel_waiters();
        self.queue.clear();

        // The peer may already be gone; a failed release changes nothing.
        let _ = self
            .queue
            .enqueue(OperationRequest::Disconnect, OperationKind::Other, None)
            .wait()
            .await;

        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            s.detected = None;
            s.mtu = FALLBACK_MTU;
            s.connection = ConnectionState::Disconnected;
        });
        self.emit(ConnectionState::Disconnected);
    }

    //==============================================================================SEND
    /// Encode a catalog command and write it to the characteristic matching
    /// its target role.
    pub async fn send_command(
        &self,
        category: &str,
        command: &str,
        params: &CommandParams,
    ) -> Result<(), LinkError> {
        let encoded = engine::encode(category, command, params)?;
        let (service, characteristic) = self.resolve_target(encoded.target)?;
        self.queue
            .enqueue(
                OperationRequest::Write {
                    service,
                    characteristic,
                    payload: encoded.payload,
                    mode: encoded.write_mode,
                },
                OperationKind::Write,
                None,
            )
            .wait()
            .await?;
        Ok(())
    }

    /// Write a raw hex string to the primary write characteristic.
    pub async fn send_raw_hex(&self, hex_str: &str) -> Result<(), LinkError> {
        let payload = hex::decode(hex_str).map_err(LinkError::Protocol)?;
        let (service, characteristic) = self.resolve_target(TargetRole::Write)?;
        self.queue
            .enqueue(
                OperationRequest::Write {
                    service,
                    characteristic,
                    payload,
                    mode: WriteMode::WithResponse,
                },
                OperationKind::Write,
                None,
            )
            .wait()
            .await?;
        Ok(())
    }

    /// Send a sequence of pre-built frames (an image transfer, typically) as
    /// one write operation per frame, without response for throughput.
    pub async fn send_chunks(&self, frames: &[Vec<u8>]) -> Result<(), LinkError> {
        let (service, characteristic) = self.resolve_target(TargetRole::WriteNoResponse)?;
        for frame in frames {
            self.queue
                .enqueue(
                    OperationRequest::Write {
                        service: service.clone(),
                        characteristic: characteristic.clone(),
                        payload: frame.clone(),
                        mode: WriteMode::WithoutResponse,
                    },
                    OperationKind::Write,
                    None,
                )
                .wait()
                .await?;
        }
        Ok(())
    }

    fn resolve_target(&self, role: TargetRole) -> Result<(Uuid, Uuid), LinkError> {
        self.state.lock(|s| {
            let s = s.borrow();
            if s.connection != ConnectionState::Ready {
                return Err(TransportError::NotConnected.into());
            }
            let detected = s.detected.as_ref().ok_or(TransportError::NotConnected)?;
            let characteristic = detected
                .write_target(role)
                .ok_or(ProtocolError::NoTargetCharacteristic)?;
            Ok((detected.service.clone(), characteristic.clone()))
        })
    }

    //==============================================================================WAITERS
    /// Wait for the next notification matching `predicate`, up to
    /// `timeout_ms`. Non-matching payloads leave the waiter registered.
    pub async fn wait_for_notification<F>(
        &self,
        predicate: F,
        timeout_ms: u64,
    ) -> Result<Vec<u8>, LinkError>
    where
        F: Fn(&[u8]) -> bool + Send + 'static,
    {
        let done: WaiterSignal = Arc::new(Signal::new());
        let id = self.state.lock(|s| {
            let mut s = s.borrow_mut();
            let id = s.next_waiter_id;
            s.next_waiter_id = s.next_waiter_id.wrapping_add(1);
            s.waiters.push(Waiter {
                id,
                predicate: Box::new(predicate),
                done: done.clone(),
            });
            id
        });

        let resolved = done.wait();
        let timeout = self.timer.delay_ms(timeout_ms);
        pin_mut!(resolved, timeout);

        match select(resolved, timeout).await {
            Either::Left((result, _)) => result,
            Either::Right((_, resolved)) => {
                if self.remove_waiter(id) {
                    Err(LinkError::Timeout { ms: timeout_ms })
                } else {
                    // Dispatched between the timeout firing and removal.
                    resolved.await
                }
            }
        }
    }

    /// Wait for a notification starting with `prefix` (a firmware ack).
    pub async fn wait_for_ack(&self, prefix: &[u8], timeout_ms: u64) -> Result<Vec<u8>, LinkError> {
        let prefix = prefix.to_vec();
        self.wait_for_notification(move |bytes| bytes.starts_with(&prefix), timeout_ms)
            .await
    }

    /// Query the connected display for its hardware tier: write the request
    /// command, then wait for the matching notification.
    pub async fn detect_device(&self, timeout_ms: u64) -> Result<DeviceInfo, LinkError> {
        self.send_raw_hex(device_info::GET_DEVICE_INFO).await?;
        let payload = self
            .wait_for_notification(device_info::is_device_info_response, timeout_ms)
            .await?;
        device_info::parse_device_info(&payload)
            .ok_or(LinkError::Protocol(ProtocolError::MalformedDeviceInfo))
    }

    /// Remove a waiter by id; false when it was already dispatched.
    fn remove_waiter(&self, id: u32) -> bool {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            let before = s.waiters.len();
            s.waiters.retain(|w| w.id != id);
            s.waiters.len() != before
        })
    }

    fn cancel_waiters(&self) {
        let drained = self
            .state
            .lock(|s| core::mem::take(&mut s.borrow_mut().waiters));
        for waiter in drained {
            waiter.done.signal(Err(LinkError::Cancelled));
        }
    }

    //==============================================================================EVENTS
    /// Drain inbound link events forever. Meant to run as its own task next
    /// to the queue runner.
    pub async fn drive<const N: usize>(
        &self,
        events: &Channel<CriticalSectionRawMutex, LinkEvent, N>,
    ) {
        loop {
            match events.receive().await {
                LinkEvent::Notification {
                    characteristic,
                    payload,
                } => self.dispatch_notification(characteristic, payload),
                LinkEvent::LinkDropped => self.handle_link_drop().await,
            }
        }
    }

    /// Log the payload, then resolve the first matching waiter.
    fn dispatch_notification(&self, characteristic: Uuid, payload: Vec<u8>) {
        let resolved = self.state.lock(|s| {
            let mut s = s.borrow_mut();
            if s.notify_log.is_full() {
                s.notify_log.pop_front();
            }
            // Capacity was just ensured.
            let _ = s.notify_log.push_back(NotifyRecord {
                characteristic,
                payload: payload.clone(),
            });

            let index = s.waiters.iter().position(|w| (w.predicate)(&payload));
            index.map(|index| s.waiters.remove(index))
        });

        if let Some(waiter) = resolved {
            waiter.done.signal(Ok(payload));
        }
    }

    /// Reconnect ladder: schedule `delays[min(attempts, last)]`, reconnect,
    /// repeat while attempts remain. A drop mid-sequence is ignored; the
    /// in-flight connect reports its own failure. A manual [`Self::connect`]
    /// admitted during a backoff window cancels the ladder and takes over.
    async fn handle_link_drop(&self) {
        let was_ready = self.state.lock(|s| {
            let mut s = s.borrow_mut();
            if s.connection != ConnectionState::Ready {
                return false;
            }
            s.connection = ConnectionState::Disconnected;
            s.detected = None;
            s.mtu = FALLBACK_MTU;
            true
        });
        if !was_ready {
            return;
        }
        self.emit(ConnectionState::Disconnected);
        self.reconnect_cancel.reset();

        loop {
            let Some((device, delay_s)) = self.state.lock(|s| {
                let s = s.borrow();
                if !s.policy.enabled || s.attempts > s.policy.max_attempts {
                    return None;
                }
                // Anything but Disconnected means another sequence owns the
                // link now; the ladder must not stomp it.
                if s.connection != ConnectionState::Disconnected {
                    return None;
                }
                let device = s.last_device.clone()?;
                let rung = usize::min(s.attempts as usize, s.policy.delays_s.len() - 1);
                Some((device, s.policy.delays_s[rung]))
            }) else {
                break;
            };

            #[cfg(feature = "defmt")]
            defmt::info!("scheduling reconnect in {} s", delay_s);
            self.set_state(ConnectionState::Reconnecting);

            let cancel = self.reconnect_cancel.wait();
            let backoff = self.timer.delay_ms(delay_s * 1_000);
            pin_mut!(cancel, backoff);
            if let Either::Left(_) = select(cancel, backoff).await {
                #[cfg(feature = "defmt")]
                defmt::info!("reconnect cancelled");
                // Step aside; the canceller (manual connect, disconnect,
                // policy change) owns the state from here.
                let stepped_back = self.state.lock(|s| {
                    let mut s = s.borrow_mut();
                    if s.connection == ConnectionState::Reconnecting {
                        s.connection = ConnectionState::Disconnected;
                        return true;
                    }
                    false
                });
                if stepped_back {
                    self.emit(ConnectionState::Disconnected);
                }
                break;
            }

            // The ladder admits itself without touching the cancel signal;
            // a concurrent manual connect already holds the link otherwise.
            let admitted = self.state.lock(|s| {
                let mut s = s.borrow_mut();
                s.attempts += 1;
                if s.connection != ConnectionState::Reconnecting {
                    return false;
                }
                s.connection = ConnectionState::Connecting;
                true
            });
            if !admitted {
                break;
            }
            self.emit(ConnectionState::Connecting);

            match self.run_connect_sequence(&device).await {
                Ok(()) => break,
                Err(_) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("reconnect attempt failed");
                    self.set_state(ConnectionState::Disconnected);
                }
            }
        }
    }

    fn set_state(&self, next: ConnectionState) {
        self.state.lock(|s| s.borrow_mut().connection = next);
        self.emit(next);
    }

    fn emit(&self, state: ConnectionState) {
        #[cfg(feature = "defmt")]
        defmt::info!("link state: {}", state);
        let _ = self.state_events.try_send(state);
    }
}
