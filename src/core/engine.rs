//! Block-cipher engines and serialized access to them.
//!
//! The wrap transform only ever needs two things from a cipher: a one-time
//! key-schedule setup and a single-block transform. [`BlockCipher`] captures
//! exactly that surface so the algorithm stays independent of where the
//! cipher lives (software, or a memory-mapped hardware peripheral).
//!
//! [`SharedEngine`] models the common embedded constraint that one AES
//! engine is shared by the whole process: every operation takes an
//! exclusive [`EngineGuard`] for its full duration, and the guard clears
//! the installed key schedule when released, on every exit path.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256};

use crate::core::error::{KeyWrapError, KeyWrapResult};
use crate::core::BLOCK_SIZE;

/// A block cipher usable by the key-wrap transform.
///
/// Implementations hold at most one key schedule at a time. The transform
/// installs the schedule once per operation via [`set_key`](Self::set_key)
/// and then performs only whole-block transforms, with no chaining or
/// padding. Chaining is provided by the wrap algorithm's own round
/// structure, not by the cipher.
pub trait BlockCipher: Send {
    /// Installs the key schedule for `kek`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyWrapError::UnsupportedKekSize`] if the engine does not
    /// support the given key length. This is the only failure the engine
    /// can report; after a successful `set_key`, block transforms are
    /// infallible.
    fn set_key(&mut self, kek: &[u8]) -> KeyWrapResult<()>;

    /// Encrypts one block in place.
    ///
    /// Must only be called after a successful [`set_key`](Self::set_key);
    /// with no schedule installed the block is left untouched.
    fn encrypt_block(&mut self, block: &mut [u8; BLOCK_SIZE]);

    /// Decrypts one block in place.
    ///
    /// Must only be called after a successful [`set_key`](Self::set_key);
    /// with no schedule installed the block is left untouched.
    fn decrypt_block(&mut self, block: &mut [u8; BLOCK_SIZE]);

    /// Discards the installed key schedule, if any.
    ///
    /// Called by [`EngineGuard`] when exclusive access is released, so a
    /// schedule never outlives the operation that installed it.
    fn clear(&mut self);
}

/// AES key schedule, one variant per supported KEK size.
enum AesSchedule {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

/// Software AES engine (AES-128/192/256, selected by KEK length).
///
/// The underlying cipher structs are zeroized on drop, so clearing or
/// replacing the schedule wipes the expanded key material.
#[derive(Default)]
pub struct AesEngine {
    schedule: Option<AesSchedule>,
}

impl AesEngine {
    /// Creates an engine with no key schedule installed.
    #[must_use]
    pub fn new() -> Self {
        Self { schedule: None }
    }
}

impl BlockCipher for AesEngine {
    fn set_key(&mut self, kek: &[u8]) -> KeyWrapResult<()> {
        let schedule = match kek.len() {
            16 => Aes128::new_from_slice(kek).map(AesSchedule::Aes128),
            24 => Aes192::new_from_slice(kek).map(AesSchedule::Aes192),
            32 => Aes256::new_from_slice(kek).map(AesSchedule::Aes256),
            _ => return Err(KeyWrapError::UnsupportedKekSize),
        }
        .map_err(|_| KeyWrapError::UnsupportedKekSize)?;

        self.schedule = Some(schedule);
        Ok(())
    }

    fn encrypt_block(&mut self, block: &mut [u8; BLOCK_SIZE]) {
        let block = GenericArray::from_mut_slice(&mut block[..]);
        match &self.schedule {
            Some(AesSchedule::Aes128(cipher)) => cipher.encrypt_block(block),
            Some(AesSchedule::Aes192(cipher)) => cipher.encrypt_block(block),
            Some(AesSchedule::Aes256(cipher)) => cipher.encrypt_block(block),
            None => {}
        }
    }

    fn decrypt_block(&mut self, block: &mut [u8; BLOCK_SIZE]) {
        let block = GenericArray::from_mut_slice(&mut block[..]);
        match &self.schedule {
            Some(AesSchedule::Aes128(cipher)) => cipher.decrypt_block(block),
            Some(AesSchedule::Aes192(cipher)) => cipher.decrypt_block(block),
            Some(AesSchedule::Aes256(cipher)) => cipher.decrypt_block(block),
            None => {}
        }
    }

    fn clear(&mut self) {
        // Dropping the schedule zeroizes the expanded key (aes `zeroize`
        // feature).
        self.schedule = None;
    }
}

/// A block cipher behind a process-wide mutual-exclusion lock.
///
/// One wrap or unwrap call holds the lock from key-schedule setup through
/// the final block transform; concurrent callers serialize. Independent
/// `SharedEngine` instances run in parallel.
pub struct SharedEngine<C: BlockCipher> {
    cipher: Mutex<C>,
}

impl<C: BlockCipher> SharedEngine<C> {
    /// Wraps `cipher` in a serialized engine.
    pub fn new(cipher: C) -> Self {
        Self {
            cipher: Mutex::new(cipher),
        }
    }

    /// Acquires exclusive use of the cipher, blocking until available.
    ///
    /// The returned guard releases the engine when dropped, so release is
    /// guaranteed on every exit path of the caller, including early error
    /// returns. A previous holder panicking does not poison the engine:
    /// the cipher holds no caller-visible state across operations.
    pub fn lock(&self) -> EngineGuard<'_, C> {
        EngineGuard {
            cipher: self.cipher.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// Exclusive access to a [`SharedEngine`]'s cipher.
///
/// Dropping the guard clears the cipher's key schedule and releases the
/// engine for the next caller.
pub struct EngineGuard<'a, C: BlockCipher> {
    cipher: MutexGuard<'a, C>,
}

impl<C: BlockCipher> EngineGuard<'_, C> {
    /// Installs the key schedule for `kek`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyWrapError::UnsupportedKekSize`] if the cipher rejects
    /// the key length.
    pub fn set_key(&mut self, kek: &[u8]) -> KeyWrapResult<()> {
        self.cipher.set_key(kek)
    }

    /// Encrypts one block in place.
    pub fn encrypt_block(&mut self, block: &mut [u8; BLOCK_SIZE]) {
        self.cipher.encrypt_block(block);
    }

    /// Decrypts one block in place.
    pub fn decrypt_block(&mut self, block: &mut [u8; BLOCK_SIZE]) {
        self.cipher.decrypt_block(block);
    }
}

impl<C: BlockCipher> Drop for EngineGuard<'_, C> {
    fn drop(&mut self) {
        self.cipher.clear();
    }
}

/// Returns the process-wide shared AES engine.
///
/// All calls through [`wrap`](crate::wrap) and [`unwrap`](crate::unwrap)
/// serialize on this instance.
pub fn shared() -> &'static SharedEngine<AesEngine> {
    static ENGINE: OnceLock<SharedEngine<AesEngine>> = OnceLock::new();
    ENGINE.get_or_init(|| SharedEngine::new(AesEngine::new()))
}
