//! Unit tests for core library types and internal functions.
//!
//! These tests focus on resource names, key id conventions, configuration
//! and environment parsing. None of them need network access.

mod types;
