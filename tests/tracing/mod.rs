//! Tests for tracing functionality
//!
//! These tests verify that the helpers emit the documented events when the tracing feature
//! is enabled.
