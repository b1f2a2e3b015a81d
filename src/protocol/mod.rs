//! Command protocol: a static, data-driven command catalog and the encoder
//! that turns `(category, command, params)` into wire bytes. Adding a command
//! is a pure data change in [`catalog`]; no encoder change is required.
pub mod catalog;
pub mod engine;
