//! Fuzz target for `u2fkey_crypto::wrap::{aes_wrap, aes_unwrap}`.
//!
//! Treats the first 32 bytes of the input as the wrapping key and the rest
//! as an arbitrary "wrapped" blob fed to `aes_unwrap`, which must reject
//! anything that isn't a genuine `aes_wrap` output rather than panicking.
//! Also round-trips a fixed-size plaintext through `aes_wrap`/`aes_unwrap`
//! using the fuzzed key to check the pair never panics on arbitrary keys.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use u2fkey_crypto::wrap::{aes_unwrap, aes_wrap};

fuzz_target!(|data: &[u8]| {
    if data.len() < 32 {
        return;
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(&data[..32]);
    let rest = &data[32..];

    let _ = aes_unwrap(&key, rest);

    let mut rng = ChaCha20Rng::seed_from_u64(u64::from_le_bytes(
        key[..8].try_into().expect("8 bytes"),
    ));
    let plaintext = [0x42u8; 64];
    let wrapped = aes_wrap(&key, &plaintext, &mut rng);
    match aes_unwrap(&key, &wrapped) {
        Ok(recovered) => assert_eq!(recovered, plaintext),
        Err(_) => panic!("freshly wrapped plaintext must unwrap"),
    }
});
