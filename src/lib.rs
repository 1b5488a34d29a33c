//! AES Key Wrap (RFC 3394) for key-encryption-key (KEK) workflows.
//!
//! This crate implements the AES Key Wrap algorithm specified in RFC 3394:
//! a deterministic, integrity-checked transform that encrypts (wraps) one
//! key under another using nothing but the AES block cipher. Wrapped output
//! is always exactly 8 bytes longer than the input key material, and
//! unwrapping fails if the ciphertext was tampered with or the wrong KEK is
//! used.
//!
//! # Quick Start
//!
//! ```rust
//! // 128-bit KEK wrapping 128 bits of key data (RFC 3394 Section 4.1).
//! let kek = [
//!     0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07,
//!     0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F,
//! ];
//! let key_data = [
//!     0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77,
//!     0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF,
//! ];
//!
//! let wrapped = keywrap::wrap(&kek, &key_data)?;
//! assert_eq!(wrapped.len(), key_data.len() + 8);
//!
//! let unwrapped = keywrap::unwrap(&kek, &wrapped)?;
//! assert_eq!(unwrapped, key_data);
//! # Ok::<(), keywrap::KeyWrapError>(())
//! ```
//!
//! # Algorithm
//!
//! Key wrap runs six rounds over the key's 64-bit semiblocks. Each step
//! encrypts the 64-bit integrity register concatenated with one semiblock,
//! then folds a round counter into the register. The final register value
//! travels with the ciphertext and is verified against a fixed constant
//! (`0xA6A6A6A6A6A6A6A6`) during unwrap, which is what makes tampering and
//! wrong-KEK use detectable without a separate MAC.
//!
//! The transform is deterministic: the same KEK and key data always produce
//! the same wrapped bytes. That is a feature for key storage and transport,
//! not a substitute for nonce-based AEAD over general data.
//!
//! # Engines
//!
//! The block cipher behind the transform is pluggable via the
//! [`BlockCipher`] trait. The default is a software AES engine
//! (AES-128/192/256, selected by KEK length) behind a process-wide lock,
//! mirroring deployments where one hardware AES peripheral is shared by all
//! callers and must be serialized. [`wrap_with`] and [`unwrap_with`] accept
//! an explicit [`SharedEngine`] for callers that manage their own cipher
//! instances.
//!
//! # Security
//!
//! - Key schedules, scratch blocks, and rejected plaintext are zeroized
//! - The integrity check runs in constant time
//! - Integrity failures are reported without distinguishing the cause
//! - No unsafe code
//!
//! # Modules
//!
//! - [`core`] - Engine abstraction, error types, and the wrap/unwrap
//!   operations

pub mod core;

// Re-export the public surface at the crate root
pub use crate::core::engine::{AesEngine, BlockCipher, EngineGuard, SharedEngine};
pub use crate::core::error::{KeyWrapError, KeyWrapResult};
pub use crate::core::operations::{unwrap, unwrap_with, wrap, wrap_with};
