//! Shared helpers for spotigo-server integration tests.

pub mod mock_spotify;
