//! Test doubles to simulate the display peripheral and timer during
//! integration tests.
use lumilink::core::{DeviceId, ServiceInfo, Uuid, WriteMode};
use lumilink::infra::hex;
use lumilink::link::manager::LinkEvent;
use lumilink::link::traits::{LinkAdapter, LinkTimer};
use lumilink::profile::UART_PROFILE;
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration};

/// Timer based on `tokio::time::sleep` to drive delays in tests.
pub struct TokioTimer;

impl LinkTimer for TokioTimer {
    fn delay_ms(&self, millis: u64) -> impl core::future::Future<Output = ()> + '_ {
        sleep(Duration::from_millis(millis))
    }
}

/// One write observed by the emulated display.
#[derive(Debug, Clone)]
pub struct ObservedWrite {
    pub characteristic: String,
    pub payload: Vec<u8>,
    pub mode: WriteMode,
}

/// In-memory peripheral exposing the primary UART profile. Writes are
/// logged; a device-info request is answered with a notification pushed
/// through the manager's event channel, like real firmware would.
pub struct EmulatedDisplay<'e> {
    pub writes: Arc<Mutex<Vec<ObservedWrite>>>,
    /// Device-info payload the firmware answers with.
    pub device_info_reply: Vec<u8>,
    /// Writes never settle when set.
    pub hang_writes: bool,
    events: embassy_sync::channel::Sender<
        'e,
        embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex,
        LinkEvent,
        8,
    >,
}

impl<'e> EmulatedDisplay<'e> {
    pub fn new(
        events: embassy_sync::channel::Sender<
            'e,
            embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex,
            LinkEvent,
            8,
        >,
    ) -> Self {
        Self {
            writes: Arc::new(Mutex::new(Vec::new())),
            // 32x32 tier, firmware 1.3.
            device_info_reply: vec![0xA5, 0x01, 0x04, 0x02, 0x20, 0x01, 0x03],
            hang_writes: false,
            events,
        }
    }

    /// Shared handle onto the write log.
    pub fn write_log(&self) -> Arc<Mutex<Vec<ObservedWrite>>> {
        self.writes.clone()
    }
}

#[derive(Debug)]
pub struct DisplayError;

impl<'e> LinkAdapter for EmulatedDisplay<'e> {
    type Error = DisplayError;

    async fn connect<'a>(&'a mut self, _device: &'a DeviceId) -> Result<(), DisplayError> {
        Ok(())
    }

    async fn discover_services(&mut self) -> Result<Vec<ServiceInfo>, DisplayError> {
        let characteristics = UART_PROFILE
            .notify
            .iter()
            .chain(UART_PROFILE.notify_write)
            .chain(UART_PROFILE.write)
            .chain(UART_PROFILE.write_no_response)
            .map(|c| Uuid::new(*c))
            .collect();
        Ok(vec![ServiceInfo::new(
            Uuid::new(UART_PROFILE.service_uuid),
            characteristics,
        )])
    }

    async fn request_mtu(&mut self, mtu: u16) -> Result<u16, DisplayError> {
        Ok(mtu)
    }

    async fn write<'a>(
        &'a mut self,
        _service: &'a Uuid,
        characteristic: &'a Uuid,
        payload: &'a [u8],
        mode: WriteMode,
    ) -> Result<(), DisplayError> {
        self.writes.lock().unwrap().push(ObservedWrite {
            characteristic: characteristic.as_str().to_string(),
            payload: payload.to_vec(),
            mode,
        });

        if self.hang_writes {
            std::future::pending::<()>().await;
        }

        // Firmware behavior: a device-info request gets a notification back.
        let request = hex::decode(lumilink::profile::device_info::GET_DEVICE_INFO).unwrap();
        if payload == request {
            self.events
                .send(LinkEvent::Notification {
                    characteristic: Uuid::new(UART_PROFILE.notify[0]),
                    payload: self.device_info_reply.clone(),
                })
                .await;
        }
        Ok(())
    }

    async fn read<'a>(
        &'a mut self,
        _service: &'a Uuid,
        _characteristic: &'a Uuid,
    ) -> Result<Vec<u8>, DisplayError> {
        Ok(vec![])
    }

    async fn subscribe<'a>(
        &'a mut self,
        _service: &'a Uuid,
        _characteristic: &'a Uuid,
    ) -> Result<(), DisplayError> {
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), DisplayError> {
        Ok(())
    }
}
