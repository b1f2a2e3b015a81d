//! Minimal abstraction for the platform BLE stack. Allows the library to plug
//! into various implementations (mobile bridge, desktop driver, test fake).

use crate::core::{DeviceId, ServiceInfo, Uuid, WriteMode};
use alloc::vec::Vec;
use futures_util::Future;

/// Contract for the GATT operations the link layer needs.
///
/// All methods take `&mut self`: the queue runner owns the adapter and is the
/// only caller, which matches the one-operation-at-a-time link model.
pub trait LinkAdapter {
    type Error: core::fmt::Debug;

    /// Establish a connection to the peripheral.
    fn connect<'a>(
        &'a mut self,
        device: &'a DeviceId,
    ) -> impl Future<Output = Result<(), Self::Error>> + 'a;

    /// Enumerate services and their characteristics on the connected
    /// peripheral.
    fn discover_services<'a>(
        &'a mut self,
    ) -> impl Future<Output = Result<Vec<ServiceInfo>, Self::Error>> + 'a;

    /// Negotiate the link MTU; returns the value actually granted.
    fn request_mtu<'a>(
        &'a mut self,
        mtu: u16,
    ) -> impl Future<Output = Result<u16, Self::Error>> + 'a;

    /// Write a characteristic value.
    fn write<'a>(
        &'a mut self,
        service: &'a Uuid,
        characteristic: &'a Uuid,
        payload: &'a [u8],
        mode: WriteMode,
    ) -> impl Future<Output = Result<(), Self::Error>> + 'a;

    /// Read a characteristic value.
    fn read<'a>(
        &'a mut self,
        service: &'a Uuid,
        characteristic: &'a Uuid,
    ) -> impl Future<Output = Result<Vec<u8>, Self::Error>> + 'a;

    /// Enable notifications on a characteristic. Inbound payloads are
    /// delivered out of band as [`crate::link::LinkEvent::Notification`].
    fn subscribe<'a>(
        &'a mut self,
        service: &'a Uuid,
        characteristic: &'a Uuid,
    ) -> impl Future<Output = Result<(), Self::Error>> + 'a;

    /// Tear the connection down.
    fn disconnect<'a>(&'a mut self) -> impl Future<Output = Result<(), Self::Error>> + 'a;
}
