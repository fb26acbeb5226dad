//! Common test utilities and mock infrastructure
//!
//! This module provides shared functionality for integration tests including:
//! - An in-memory block device with short-transfer, hard-error and corruption injection
//! - Deterministic entropy sources
//! - Temp-file devices and content checks
#![allow(dead_code)]

pub mod mock_device;
pub mod test_helpers;
