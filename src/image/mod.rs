//! Bulk image transfer encoding.
//!
//! Converts RGBA pixel buffers to the wire pixel formats the displays accept
//! and wraps them in SOF/CHUNK/EOF frames. This module only encodes;
//! transmission and retry of individual chunks is the caller's job, one
//! write per chunk.

pub mod framer;

pub use framer::{
    check_frame, pack_pixels, plan_rows_per_chunk, FrameDescriptor, PixelFormat,
};
