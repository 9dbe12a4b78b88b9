// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Atomic long-term memory integration tests.
//!
//! Provides deterministic stand-ins for the external collaborators of the
//! memory layer, so tests run without network access or model files.
//!
//! # Components
//!
//! - [`MockEmbedder`] - Scripted embedding provider with call capture
//! - [`RecordingState`] - Conversation state that records every mutation
//! - [`TestHarness`] - Temp-dir vector store, mock embedder, and config

pub mod harness;
pub mod mock_embedder;
pub mod recording_state;

pub use harness::TestHarness;
pub use mock_embedder::MockEmbedder;
pub use recording_state::RecordingState;
