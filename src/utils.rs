// Raffle program - utility functions
use solana_program::pubkey::Pubkey;

use crate::{oracle::RandomWord, state::RAFFLE_SEED};

/// `word mod modulus`, reading `word` as a big-endian 256-bit integer.
pub fn reduce_word(word: &RandomWord, modulus: u64) -> u64 {
    if modulus == 0 {
        return 0;
    }
    let modulus = modulus as u128;
    word.iter()
        .fold(0u128, |acc, byte| ((acc << 8) | *byte as u128) % modulus) as u64
}

/// Encodes `value` as a big-endian random word
pub fn word_from_u64(value: u64) -> RandomWord {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Program derived address of the raffle created by `authority`
pub fn find_raffle_address(program_id: &Pubkey, authority: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[RAFFLE_SEED, authority.as_ref()], program_id)
}

/// Convert lamports to SOL (for display purposes)
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / 1_000_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_small_words() {
        assert_eq!(reduce_word(&word_from_u64(7), 4), 3);
        assert_eq!(reduce_word(&word_from_u64(8), 4), 0);
        assert_eq!(reduce_word(&word_from_u64(5), 1), 0);
    }

    #[test]
    fn reduces_full_width_words() {
        // 2^256 - 1 = 3 * 5 * 17 * 257 * ...; divisible by 3 and 5
        let max = [0xffu8; 32];
        assert_eq!(reduce_word(&max, 3), 0);
        assert_eq!(reduce_word(&max, 5), 0);
        assert_eq!(reduce_word(&max, 2), 1);
        // 2^255 mod 7 = 2^(255 mod 3) = 1
        let mut high_bit = [0u8; 32];
        high_bit[0] = 0x80;
        assert_eq!(reduce_word(&high_bit, 7), 1);
    }

    #[test]
    fn zero_modulus_is_zero() {
        assert_eq!(reduce_word(&[0xab; 32], 0), 0);
    }
}
