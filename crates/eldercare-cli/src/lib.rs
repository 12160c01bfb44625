//! Eldercare CLI Library
//!
//! Command implementations for the `eldercare` binary.

pub mod stream_cmd;
