// SPDX-FileCopyrightText: 2026 Atomic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions at the seams of the memory layer.
//!
//! Embedding providers use `#[async_trait]` for dynamic dispatch
//! compatibility; conversation-state views are plain synchronous traits.

pub mod conversation;
pub mod embedding;

pub use conversation::{ConversationState, ConversationStateActions};
pub use embedding::EmbeddingProvider;
