//! Chunked image transfer scenario: pack pixels, frame them, push every
//! frame through the queue as a write, and verify what the display received.

mod helpers;

use helpers::{EmulatedDisplay, TokioTimer};
use lumilink::core::{DeviceId, WriteMode};
use lumilink::image::{check_frame, pack_pixels, plan_rows_per_chunk, FrameDescriptor, PixelFormat};
use lumilink::link::manager::{ConnectionManager, LinkEvent, ReconnectPolicy};
use lumilink::link::queue::{OperationQueue, QueueRunner};
use lumilink::link::traits::MemoryStore;
use lumilink::profile::UART_PROFILE;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

#[tokio::test]
async fn image_frames_arrive_intact_and_in_order() {
    let queue = OperationQueue::new();
    let events: Channel<CriticalSectionRawMutex, LinkEvent, 8> = Channel::new();
    let manager = ConnectionManager::new(
        &queue,
        TokioTimer,
        MemoryStore::default(),
        ReconnectPolicy::default(),
    );
    let display = EmulatedDisplay::new(events.sender());
    let writes = display.write_log();
    let runner = QueueRunner::new(&queue, display, TokioTimer);

    // 16x16 gradient image.
    let width: u16 = 16;
    let height: u16 = 16;
    let rgba: Vec<u8> = (0..width as usize * height as usize)
        .flat_map(|i| [i as u8, (i * 2) as u8, (i * 3) as u8, 0xFF])
        .collect();

    let scenario = async {
        manager.connect(&DeviceId::new("AA:BB:CC")).await.unwrap();

        let format = PixelFormat::Rgb565Le;
        let packed = pack_pixels(&rgba, format);
        let row_bytes = width as usize * format.bytes_per_pixel();
        let rows = plan_rows_per_chunk(width, format, manager.mtu());

        let chunk_payloads: Vec<&[u8]> = packed.chunks(rows as usize * row_bytes).collect();
        let descriptor = FrameDescriptor {
            frame_id: 1,
            width,
            height,
            format,
            chunk_total: chunk_payloads.len() as u16,
        };

        let mut frames = vec![descriptor.build_sof()];
        for (i, payload) in chunk_payloads.iter().enumerate() {
            let row_count = (payload.len() / row_bytes) as u16;
            frames.push(descriptor.build_chunk(i as u16 * rows, row_count, payload));
        }
        frames.push(descriptor.build_eof());

        manager.send_chunks(&frames).await.unwrap();
        frames
    };

    let frames = tokio::select! {
        _ = runner.drive() => unreachable!(),
        _ = manager.drive(&events) => unreachable!(),
        frames = scenario => frames,
    };

    let writes = writes.lock().unwrap();
    let received: Vec<_> = writes
        .iter()
        .filter(|w| w.mode == WriteMode::WithoutResponse)
        .collect();
    assert_eq!(received.len(), frames.len());

    // Bulk traffic goes to the write-no-response characteristic.
    assert!(received
        .iter()
        .all(|w| w.characteristic.eq_ignore_ascii_case(UART_PROFILE.write_no_response[0])));

    // Frames arrive in submission order, each with a valid CRC trailer.
    for (sent, got) in frames.iter().zip(received.iter()) {
        assert_eq!(&got.payload, sent);
        check_frame(&got.payload).unwrap();
    }

    // Reassembling the chunk payloads restores the packed pixel data.
    let mut reassembled = Vec::new();
    for frame in &received[1..received.len() - 1] {
        let body = &frame.payload[11..frame.payload.len() - 2];
        reassembled.extend_from_slice(body);
    }
    assert_eq!(reassembled, pack_pixels(&rgba, PixelFormat::Rgb565Le));
}
