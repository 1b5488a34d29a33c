//! RFC 3394 AES Key Wrap and Unwrap transforms.
//!
//! Both transforms run 6 * n block-cipher invocations over the key's n
//! 64-bit semiblocks, threading a 64-bit integrity register through every
//! step. Wrap folds the round counter `t = n*j + i` into the register
//! *after* encrypting; unwrap folds it in *before* decrypting, walking the
//! rounds in reverse.
//!
//! The wrapped buffer doubles as the algorithm's working state: its first
//! semiblock is the live integrity register and the rest are the live
//! R[i] registers, so the result is fully assembled the moment the last
//! round finishes. This mirrors the layout RFC 3394 §2.2.1 describes and
//! costs no extra allocation.

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::core::engine::{self, BlockCipher, SharedEngine};
use crate::core::error::{KeyWrapError, KeyWrapResult};
use crate::core::{BLOCK_SIZE, IV, SEMIBLOCK_SIZE};

/// Number of outer rounds, fixed by RFC 3394 §2.2.1.
const OUTER_ROUNDS: u64 = 6;

/// Wraps `key_data` under `kek` using the process-wide AES engine.
///
/// `key_data` must be a non-empty multiple of 8 bytes. A single semiblock
/// (8 bytes) is accepted: the transform is well defined for it and the
/// reference implementations allow it, although RFC 3394 conformance
/// requires two or more semiblocks. Enforcing that stricter minimum is
/// left to the caller's policy.
///
/// # Arguments
///
/// * `kek` - Key encryption key; 16, 24, or 32 bytes
/// * `key_data` - Plaintext key material to wrap
///
/// # Returns
///
/// The wrapped key, exactly 8 bytes longer than `key_data`.
///
/// # Errors
///
/// * [`KeyWrapError::UnsupportedKekSize`] - The engine rejected the KEK
///   length
/// * [`KeyWrapError::InvalidKeyDataLength`] - `key_data` is empty or not a
///   multiple of 8 bytes
pub fn wrap(kek: &[u8], key_data: &[u8]) -> KeyWrapResult<Vec<u8>> {
    wrap_with(engine::shared(), kek, key_data)
}

/// Wraps `key_data` under `kek` using an explicit engine.
///
/// The engine is held exclusively from key-schedule setup through the last
/// block transform and released before returning, on success and failure
/// alike. On failure no output is produced.
///
/// # Errors
///
/// Same conditions as [`wrap`].
pub fn wrap_with<C: BlockCipher>(
    engine: &SharedEngine<C>,
    kek: &[u8],
    key_data: &[u8],
) -> KeyWrapResult<Vec<u8>> {
    let n = semiblock_count(key_data)?;

    let mut cipher = engine.lock();
    cipher.set_key(kek)?;

    // A = IV, R[1..n] = P[1..n]; the output buffer is the working state.
    let mut wrapped = vec![0u8; (n + 1) * SEMIBLOCK_SIZE];
    wrapped[..SEMIBLOCK_SIZE].copy_from_slice(&IV);
    wrapped[SEMIBLOCK_SIZE..].copy_from_slice(key_data);

    let mut block = [0u8; BLOCK_SIZE];
    for j in 0..OUTER_ROUNDS {
        for i in 1..=n as u64 {
            let idx = i as usize * SEMIBLOCK_SIZE;

            // B = AES(K, A | R[i])
            block[..SEMIBLOCK_SIZE].copy_from_slice(&wrapped[..SEMIBLOCK_SIZE]);
            block[SEMIBLOCK_SIZE..].copy_from_slice(&wrapped[idx..idx + SEMIBLOCK_SIZE]);
            cipher.encrypt_block(&mut block);

            // A = MSB(64, B) ^ t where t = (n*j)+i
            wrapped[..SEMIBLOCK_SIZE].copy_from_slice(&block[..SEMIBLOCK_SIZE]);
            fold_counter(&mut wrapped[..SEMIBLOCK_SIZE], n as u64 * j + i);

            // R[i] = LSB(64, B)
            wrapped[idx..idx + SEMIBLOCK_SIZE].copy_from_slice(&block[SEMIBLOCK_SIZE..]);
        }
    }
    block.zeroize();

    Ok(wrapped)
}

/// Unwraps `wrapped` under `kek` using the process-wide AES engine.
///
/// # Arguments
///
/// * `kek` - Key encryption key; 16, 24, or 32 bytes
/// * `wrapped` - Wrapped key material, at least 16 bytes and a multiple
///   of 8
///
/// # Returns
///
/// The recovered plaintext key, exactly 8 bytes shorter than `wrapped`.
///
/// # Errors
///
/// * [`KeyWrapError::UnsupportedKekSize`] - The engine rejected the KEK
///   length
/// * [`KeyWrapError::InvalidKeyDataLength`] - `wrapped` is too short or
///   not a multiple of 8 bytes
/// * [`KeyWrapError::IntegrityCheckFailed`] - The recovered integrity
///   register did not match; wrong KEK and tampered ciphertext are not
///   distinguished, and no plaintext is exposed
pub fn unwrap(kek: &[u8], wrapped: &[u8]) -> KeyWrapResult<Vec<u8>> {
    unwrap_with(engine::shared(), kek, wrapped)
}

/// Unwraps `wrapped` under `kek` using an explicit engine.
///
/// # Errors
///
/// Same conditions as [`unwrap`].
pub fn unwrap_with<C: BlockCipher>(
    engine: &SharedEngine<C>,
    kek: &[u8],
    wrapped: &[u8],
) -> KeyWrapResult<Vec<u8>> {
    if wrapped.len() < 2 * SEMIBLOCK_SIZE || wrapped.len() % SEMIBLOCK_SIZE != 0 {
        return Err(KeyWrapError::InvalidKeyDataLength);
    }
    let n = wrapped.len() / SEMIBLOCK_SIZE - 1;

    let mut cipher = engine.lock();
    cipher.set_key(kek)?;

    // A = C[0], R[1..n] = C[1..n]
    let mut register = [0u8; SEMIBLOCK_SIZE];
    register.copy_from_slice(&wrapped[..SEMIBLOCK_SIZE]);
    let mut key_data = wrapped[SEMIBLOCK_SIZE..].to_vec();

    let mut block = [0u8; BLOCK_SIZE];
    for j in (0..OUTER_ROUNDS).rev() {
        for i in (1..=n as u64).rev() {
            let idx = (i as usize - 1) * SEMIBLOCK_SIZE;

            // B = AES-1(K, (A ^ t) | R[i]) where t = (n*j)+i
            fold_counter(&mut register, n as u64 * j + i);
            block[..SEMIBLOCK_SIZE].copy_from_slice(&register);
            block[SEMIBLOCK_SIZE..].copy_from_slice(&key_data[idx..idx + SEMIBLOCK_SIZE]);
            cipher.decrypt_block(&mut block);

            // A = MSB(64, B), R[i] = LSB(64, B)
            register.copy_from_slice(&block[..SEMIBLOCK_SIZE]);
            key_data[idx..idx + SEMIBLOCK_SIZE].copy_from_slice(&block[SEMIBLOCK_SIZE..]);
        }
    }
    block.zeroize();

    if register[..].ct_eq(&IV[..]).into() {
        Ok(key_data)
    } else {
        key_data.zeroize();
        Err(KeyWrapError::IntegrityCheckFailed)
    }
}

/// Validates wrap input and returns its semiblock count.
fn semiblock_count(key_data: &[u8]) -> KeyWrapResult<usize> {
    if key_data.is_empty() || key_data.len() % SEMIBLOCK_SIZE != 0 {
        return Err(KeyWrapError::InvalidKeyDataLength);
    }
    Ok(key_data.len() / SEMIBLOCK_SIZE)
}

/// XORs the big-endian round counter into the integrity register.
///
/// The counter reaches 6 * n, which exceeds one byte for n >= 43, so every
/// counter byte is folded in: the low byte lands in the register's last
/// byte, the next byte above it, and so on.
fn fold_counter(register: &mut [u8], t: u64) {
    debug_assert_eq!(register.len(), SEMIBLOCK_SIZE);
    for (reg, counter) in register.iter_mut().zip(t.to_be_bytes()) {
        *reg ^= counter;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::core::engine::AesEngine;

    const KEK_128: [u8; 16] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E,
        0x0F,
    ];

    #[test]
    fn test_fold_counter_places_low_byte_last() {
        let mut register = [0u8; 8];
        fold_counter(&mut register, 0x0102_0304);
        assert_eq!(register, [0, 0, 0, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_fold_counter_carries_past_one_byte() {
        // t = 300 must touch the second-lowest register byte, not truncate.
        let mut register = [0u8; 8];
        fold_counter(&mut register, 300);
        assert_eq!(register, [0, 0, 0, 0, 0, 0, 0x01, 0x2C]);
    }

    #[test]
    fn test_wrap_output_length() -> KeyWrapResult<()> {
        for n in 1..=8usize {
            let key_data = vec![0x55u8; n * SEMIBLOCK_SIZE];
            let wrapped = wrap(&KEK_128, &key_data)?;
            assert_eq!(wrapped.len(), (n + 1) * SEMIBLOCK_SIZE);
        }
        Ok(())
    }

    #[test]
    fn test_wrap_rejects_bad_lengths() {
        assert_eq!(
            wrap(&KEK_128, &[]),
            Err(KeyWrapError::InvalidKeyDataLength)
        );
        assert_eq!(
            wrap(&KEK_128, &[0u8; 12]),
            Err(KeyWrapError::InvalidKeyDataLength)
        );
    }

    #[test]
    fn test_wrap_rejects_bad_kek() {
        assert_eq!(
            wrap(&[0u8; 15], &[0u8; 16]),
            Err(KeyWrapError::UnsupportedKekSize)
        );
    }

    #[test]
    fn test_unwrap_rejects_bad_lengths() {
        // Shorter than IV + one semiblock, or ragged.
        assert_eq!(unwrap(&KEK_128, &[]), Err(KeyWrapError::InvalidKeyDataLength));
        assert_eq!(
            unwrap(&KEK_128, &[0u8; 8]),
            Err(KeyWrapError::InvalidKeyDataLength)
        );
        assert_eq!(
            unwrap(&KEK_128, &[0u8; 20]),
            Err(KeyWrapError::InvalidKeyDataLength)
        );
    }

    #[test]
    fn test_single_semiblock_roundtrip() -> KeyWrapResult<()> {
        // n = 1 is below the RFC conformance minimum but mechanically valid.
        let key_data = [0xAB; SEMIBLOCK_SIZE];
        let wrapped = wrap(&KEK_128, &key_data)?;
        assert_eq!(wrapped.len(), 2 * SEMIBLOCK_SIZE);

        let unwrapped = unwrap(&KEK_128, &wrapped)?;
        assert_eq!(unwrapped, key_data);
        Ok(())
    }

    #[test]
    fn test_wrap_is_deterministic() -> KeyWrapResult<()> {
        let key_data = [0x13u8; 32];
        let first = wrap(&KEK_128, &key_data)?;
        let second = wrap(&KEK_128, &key_data)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_kek_bit_sensitivity() -> KeyWrapResult<()> {
        let key_data = [0x13u8; 16];
        let baseline = wrap(&KEK_128, &key_data)?;

        for bit in 0..KEK_128.len() * 8 {
            let mut kek = KEK_128;
            kek[bit / 8] ^= 1 << (bit % 8);
            let wrapped = wrap(&kek, &key_data)?;
            assert_ne!(
                wrapped[..SEMIBLOCK_SIZE],
                baseline[..SEMIBLOCK_SIZE],
                "integrity register unchanged after flipping KEK bit {bit}"
            );
        }
        Ok(())
    }

    #[test]
    fn test_key_data_bit_sensitivity() -> KeyWrapResult<()> {
        let key_data = [0x13u8; 16];
        let baseline = wrap(&KEK_128, &key_data)?;

        for bit in 0..key_data.len() * 8 {
            let mut flipped = key_data;
            flipped[bit / 8] ^= 1 << (bit % 8);
            let wrapped = wrap(&KEK_128, &flipped)?;
            assert_ne!(
                wrapped[..SEMIBLOCK_SIZE],
                baseline[..SEMIBLOCK_SIZE],
                "integrity register unchanged after flipping key-data bit {bit}"
            );
        }
        Ok(())
    }

    #[test]
    fn test_roundtrip_with_counter_beyond_one_byte() -> KeyWrapResult<()> {
        // 48 semiblocks drive t up to 288, so a low-byte-only counter fold
        // would corrupt the integrity register here.
        let key_data: Vec<u8> = (0..48 * SEMIBLOCK_SIZE).map(|b| b as u8).collect();
        let wrapped = wrap(&KEK_128, &key_data)?;
        assert_eq!(wrapped.len(), key_data.len() + SEMIBLOCK_SIZE);

        let unwrapped = unwrap(&KEK_128, &wrapped)?;
        assert_eq!(unwrapped, key_data);
        Ok(())
    }

    #[test]
    fn test_unwrap_detects_wrong_kek() -> KeyWrapResult<()> {
        let key_data = [0x13u8; 24];
        let wrapped = wrap(&KEK_128, &key_data)?;

        let mut wrong_kek = KEK_128;
        wrong_kek[0] ^= 0x01;
        assert_eq!(
            unwrap(&wrong_kek, &wrapped),
            Err(KeyWrapError::IntegrityCheckFailed)
        );
        Ok(())
    }

    #[test]
    fn test_unwrap_detects_tampering() -> KeyWrapResult<()> {
        let key_data = [0x13u8; 24];
        let wrapped = wrap(&KEK_128, &key_data)?;

        for index in 0..wrapped.len() {
            let mut tampered = wrapped.clone();
            tampered[index] ^= 0x01;
            assert_eq!(
                unwrap(&KEK_128, &tampered),
                Err(KeyWrapError::IntegrityCheckFailed),
                "tampered byte {index} went undetected"
            );
        }
        Ok(())
    }

    /// Engine probe whose key-schedule setup always fails, counting block
    /// transforms and releases through shared atomics.
    #[derive(Default)]
    struct FailingSetupEngine {
        transforms: Arc<AtomicUsize>,
        releases: Arc<AtomicUsize>,
    }

    impl BlockCipher for FailingSetupEngine {
        fn set_key(&mut self, _kek: &[u8]) -> KeyWrapResult<()> {
            Err(KeyWrapError::UnsupportedKekSize)
        }

        fn encrypt_block(&mut self, _block: &mut [u8; BLOCK_SIZE]) {
            self.transforms.fetch_add(1, Ordering::SeqCst);
        }

        fn decrypt_block(&mut self, _block: &mut [u8; BLOCK_SIZE]) {
            self.transforms.fetch_add(1, Ordering::SeqCst);
        }

        fn clear(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_setup_failure_releases_engine_once() {
        let probe = FailingSetupEngine::default();
        let transforms = Arc::clone(&probe.transforms);
        let releases = Arc::clone(&probe.releases);
        let engine = SharedEngine::new(probe);

        let result = wrap_with(&engine, &KEK_128, &[0u8; 16]);
        assert_eq!(result, Err(KeyWrapError::UnsupportedKekSize));

        // No block was transformed, and the engine was released exactly
        // once and can be re-acquired.
        assert_eq!(transforms.load(Ordering::SeqCst), 0);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        drop(engine.lock());
        assert_eq!(releases.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_explicit_engines_are_independent() -> KeyWrapResult<()> {
        // Separate engines must produce the same bytes as the shared one.
        let engine = SharedEngine::new(AesEngine::new());
        let key_data = [0x13u8; 16];
        assert_eq!(
            wrap_with(&engine, &KEK_128, &key_data)?,
            wrap(&KEK_128, &key_data)?
        );
        Ok(())
    }
}
