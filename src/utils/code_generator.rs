//! Short code generation.
//!
//! Two strategies are provided:
//!
//! - [`generate_code_from_id`] - deterministic base-62 code for a monotonic id
//! - [`generate_random_code`] - cryptographically random code of a given length
//!
//! Every generated code satisfies [`crate::utils::validator::validate_code`].

use crate::utils::validator::{MAX_CODE_LENGTH, MIN_CODE_LENGTH};
use rand::Rng;
use rand::seq::IndexedRandom;

/// Base-62 alphabet, digits first so that a symbol's index equals its value.
const BASE62_ALPHABET: &[u8; 62] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Letters only, used to break up all-digit random codes.
const LETTERS: &[u8; 52] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Character used to pad short id-derived codes.
const PAD_CHAR: char = 'a';

/// Encodes a non-negative integer in base 62, most significant digit first.
///
/// `0` encodes to `"0"`.
pub fn encode_base62(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::with_capacity(11);
    while n > 0 {
        digits.push(BASE62_ALPHABET[(n % 62) as usize]);
        n /= 62;
    }
    digits.reverse();

    // The alphabet is pure ASCII.
    digits.into_iter().map(char::from).collect()
}

/// Decodes a base-62 string.
///
/// Returns `None` if the input is empty, contains a character outside the
/// alphabet, or does not fit in a `u64`.
pub fn decode_base62(s: &str) -> Option<u64> {
    if s.is_empty() {
        return None;
    }

    s.bytes().try_fold(0u64, |acc, b| {
        let digit = base62_value(b)?;
        acc.checked_mul(62)?.checked_add(digit)
    })
}

fn base62_value(b: u8) -> Option<u64> {
    let value = match b {
        b'0'..=b'9' => b - b'0',
        b'A'..=b'Z' => b - b'A' + 10,
        b'a'..=b'z' => b - b'a' + 36,
        _ => return None,
    };
    Some(u64::from(value))
}

/// Derives a valid short code from a monotonic id.
///
/// 1. Base-62 encode the id.
/// 2. Left-pad with `'a'` to at least 6 characters.
/// 3. Keep the rightmost 32 characters if longer.
/// 4. Prepend `'a'` if the result is all digits, then re-apply step 3.
pub fn generate_code_from_id(id: u64) -> String {
    let mut code = encode_base62(id);

    if code.len() < MIN_CODE_LENGTH {
        let padding = PAD_CHAR.to_string().repeat(MIN_CODE_LENGTH - code.len());
        code.insert_str(0, &padding);
    }
    code = keep_rightmost(code, MAX_CODE_LENGTH);

    if is_all_digits(&code) {
        code.insert(0, PAD_CHAR);
        code = keep_rightmost(code, MAX_CODE_LENGTH);
    }

    code
}

fn keep_rightmost(code: String, max: usize) -> String {
    if code.len() > max {
        code[code.len() - max..].to_string()
    } else {
        code
    }
}

fn is_all_digits(code: &str) -> bool {
    code.bytes().all(|b| b.is_ascii_digit())
}

/// Generates a cryptographically random short code.
///
/// `length` is clamped to 6..=32. Symbols are drawn uniformly from the
/// base-62 alphabet with the thread-local CSPRNG. If every symbol drawn is a
/// digit, one uniformly chosen position is replaced by a uniformly chosen
/// letter.
pub fn generate_random_code(length: usize) -> String {
    let length = length.clamp(MIN_CODE_LENGTH, MAX_CODE_LENGTH);
    let mut rng = rand::rng();

    let mut code: Vec<u8> = (0..length)
        .map(|_| BASE62_ALPHABET[rng.random_range(0..BASE62_ALPHABET.len())])
        .collect();

    if code.iter().all(u8::is_ascii_digit) {
        let position = rng.random_range(0..length);
        if let Some(&letter) = LETTERS.choose(&mut rng) {
            code[position] = letter;
        }
    }

    code.into_iter().map(char::from).collect()
}
