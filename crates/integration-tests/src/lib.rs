//! Integration tests for Sari.
//!
//! These tests exercise the workflow logic across crate boundaries: the
//! checkout wizard, cart resolution, order building, and loyalty
//! arithmetic. They run without a database or network - the repositories
//! and external clients are covered by their own unit tests and by staging
//! environments.
