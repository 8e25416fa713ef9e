// src/utils/code.rs

use rand::Rng;

/// Alphabet for generated join codes. Skips 0/O/1/I to keep codes readable
/// when shouted across a room.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const CODE_LENGTH: usize = 6;

/// Generates a short join code. Uniqueness is not guaranteed here; the
/// session registry's unique constraint is the arbiter, and the caller
/// retries on conflict.
pub fn generate_join_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_have_the_right_shape() {
        for _ in 0..100 {
            let code = generate_join_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }
}
