//! Random data used for credential identifiers.

use rand::RngCore;

/// Fill a fixed size array with cryptographically secure random bytes.
pub fn random_array<const N: usize>() -> [u8; N] {
    let mut data = [0u8; N];
    rand::thread_rng().fill_bytes(&mut data);
    data
}
