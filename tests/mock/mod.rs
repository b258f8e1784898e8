//! Mock-based tests.
//!
//! These tests run against wiremock servers or the in-memory provider and
//! need no network access or credentials.

mod samples;
