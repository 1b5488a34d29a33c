//! Core engine abstraction and key-wrap operations.
//!
//! This module provides the building blocks for RFC 3394 key wrapping:
//!
//! - [`engine`] - The [`BlockCipher`](engine::BlockCipher) trait, the
//!   software AES engine, and the serialized [`SharedEngine`](engine::SharedEngine)
//! - [`error`] - Error types for key-wrap operations
//! - [`operations`] - The wrap and unwrap transforms

pub mod engine;
pub mod error;
pub mod operations;

// Re-export commonly used items
pub use error::{KeyWrapError, KeyWrapResult};

/// Size of one RFC 3394 semiblock in bytes (64 bits).
pub const SEMIBLOCK_SIZE: usize = 8;

/// AES block size in bytes (128 bits).
///
/// Every cipher invocation in the algorithm transforms exactly one block
/// holding the integrity register concatenated with one semiblock.
pub const BLOCK_SIZE: usize = 16;

/// Initial value of the integrity register, as specified in RFC 3394 §2.2.3.
///
/// The wrap transform seeds the register with this constant; unwrap verifies
/// that the recovered register equals it. Any mismatch means the ciphertext
/// was tampered with or the wrong KEK was supplied.
pub const IV: [u8; SEMIBLOCK_SIZE] = [0xA6; SEMIBLOCK_SIZE];
