//! Shared fakes for link-layer unit tests: a recording timer whose delays
//! elapse after a handful of polls, and a scriptable adapter that logs every
//! call.

use crate::core::{DeviceId, ServiceInfo, Uuid, WriteMode};
use crate::link::traits::LinkAdapter;
use crate::link::LinkTimer;
use crate::profile::UART_PROFILE;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

//==================================================================================TIMER
/// Delay future that stays pending for a few polls before completing. Under
/// the busy-polling test executor this makes instantly-ready work win races
/// against timeouts, while genuinely pending work loses them.
pub struct CountdownDelay {
    remaining: u8,
}

impl Future for CountdownDelay {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.remaining == 0 {
            Poll::Ready(())
        } else {
            self.remaining -= 1;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Test timer recording every requested delay.
#[derive(Clone, Default)]
pub struct FakeTimer {
    delays: Rc<RefCell<Vec<u64>>>,
}

impl FakeTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delay requested so far, in order.
    pub fn recorded(&self) -> Vec<u64> {
        self.delays.borrow().clone()
    }
}

impl LinkTimer for FakeTimer {
    fn delay_ms(&self, millis: u64) -> impl Future<Output = ()> + '_ {
        self.delays.borrow_mut().push(millis);
        CountdownDelay { remaining: 8 }
    }
}

//==================================================================================ADAPTER
/// One recorded adapter invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterCall {
    Connect(String),
    Discover,
    Mtu(u16),
    Write {
        characteristic: String,
        payload: Vec<u8>,
        mode: WriteMode,
    },
    Read(String),
    Subscribe(String),
    Disconnect,
}

#[derive(Debug)]
pub struct FakeError;

/// Scriptable in-memory adapter.
#[derive(Default)]
pub struct FakeAdapter {
    pub calls: Rc<RefCell<Vec<AdapterCall>>>,
    /// Services returned by discovery.
    pub services: Vec<ServiceInfo>,
    /// MTU granted by negotiation; `None` makes the request fail.
    pub granted_mtu: Option<u16>,
    /// Scripted connect outcomes, consumed front to back; empty = success.
    pub connect_script: Rc<RefCell<Vec<bool>>>,
    /// Writes never settle when set.
    pub hang_writes: bool,
}

impl FakeAdapter {
    /// Adapter exposing the full primary UART profile.
    pub fn with_uart_services() -> Self {
        let service = ServiceInfo::new(
            Uuid::new(UART_PROFILE.service_uuid),
            UART_PROFILE
                .notify
                .iter()
                .chain(UART_PROFILE.notify_write)
                .chain(UART_PROFILE.write)
                .chain(UART_PROFILE.write_no_response)
                .map(|c| Uuid::new(*c))
                .collect(),
        );
        Self {
            services: alloc::vec![service],
            granted_mtu: Some(185),
            ..Self::default()
        }
    }
}

impl LinkAdapter for FakeAdapter {
    type Error = FakeError;

    async fn connect<'a>(&'a mut self, device: &'a DeviceId) -> Result<(), FakeError> {
        self.calls
            .borrow_mut()
            .push(AdapterCall::Connect(String::from(device.as_str())));
        let ok = {
            let mut script = self.connect_script.borrow_mut();
            if script.is_empty() {
                true
            } else {
                script.remove(0)
            }
        };
        if ok {
            Ok(())
        } else {
            Err(FakeError)
        }
    }

    async fn discover_services(&mut self) -> Result<Vec<ServiceInfo>, FakeError> {
        self.calls.borrow_mut().push(AdapterCall::Discover);
        Ok(self.services.clone())
    }

    async fn request_mtu(&mut self, mtu: u16) -> Result<u16, FakeError> {
        self.calls.borrow_mut().push(AdapterCall::Mtu(mtu));
        self.granted_mtu.ok_or(FakeError)
    }

    async fn write<'a>(
        &'a mut self,
        _service: &'a Uuid,
        characteristic: &'a Uuid,
        payload: &'a [u8],
        mode: WriteMode,
    ) -> Result<(), FakeError> {
        self.calls.borrow_mut().push(AdapterCall::Write {
            characteristic: String::from(characteristic.as_str()),
            payload: payload.to_vec(),
            mode,
        });
        if self.hang_writes {
            core::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn read<'a>(
        &'a mut self,
        _service: &'a Uuid,
        characteristic: &'a Uuid,
    ) -> Result<Vec<u8>, FakeError> {
        self.calls
            .borrow_mut()
            .push(AdapterCall::Read(String::from(characteristic.as_str())));
        Ok(alloc::vec![0x01, 0x02])
    }

    async fn subscribe<'a>(
        &'a mut self,
        _service: &'a Uuid,
        characteristic: &'a Uuid,
    ) -> Result<(), FakeError> {
        self.calls
            .borrow_mut()
            .push(AdapterCall::Subscribe(String::from(characteristic.as_str())));
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), FakeError> {
        self.calls.borrow_mut().push(AdapterCall::Disconnect);
        Ok(())
    }
}
