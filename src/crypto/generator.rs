//! Random password generation with complexity guarantees.

use rand::Rng;
use rand::seq::SliceRandom;

/// Length used when the caller does not configure one.
pub const DEFAULT_LENGTH: usize = 12;

/// One character per class is mandatory, so this is the floor.
pub const MIN_LENGTH: usize = 4;

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()-_=+";

const CLASSES: [&[u8]; 4] = [LOWERCASE, UPPERCASE, DIGITS, SYMBOLS];

/// Generates a password of `length` characters containing at least one
/// lowercase letter, one uppercase letter, one digit, and one symbol.
///
/// The remainder is drawn uniformly from the union of all classes and the
/// whole string is shuffled so the mandatory characters are not
/// predictably positioned. Lengths below [`MIN_LENGTH`] are raised to it.
#[must_use]
pub fn generate(length: usize) -> String {
    let length = length.max(MIN_LENGTH);
    let mut rng = rand::rng();

    let mut chars: Vec<u8> = Vec::with_capacity(length);
    for class in CLASSES {
        chars.push(class[rng.random_range(0..class.len())]);
    }

    let union: Vec<u8> = CLASSES.concat();
    while chars.len() < length {
        chars.push(union[rng.random_range(0..union.len())]);
    }

    chars.shuffle(&mut rng);
    chars.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_class(password: &str, class: &[u8]) -> bool {
        password.bytes().any(|b| class.contains(&b))
    }

    #[test]
    fn test_length_and_class_coverage() {
        for _ in 0..200 {
            let password = generate(DEFAULT_LENGTH);
            assert_eq!(password.len(), DEFAULT_LENGTH);
            assert!(has_class(&password, LOWERCASE), "no lowercase: {password}");
            assert!(has_class(&password, UPPERCASE), "no uppercase: {password}");
            assert!(has_class(&password, DIGITS), "no digit: {password}");
            assert!(has_class(&password, SYMBOLS), "no symbol: {password}");
        }
    }

    #[test]
    fn test_all_characters_from_union() {
        let union: Vec<u8> = CLASSES.concat();
        for _ in 0..50 {
            let password = generate(20);
            assert!(password.bytes().all(|b| union.contains(&b)));
        }
    }

    #[test]
    fn test_short_lengths_clamped_to_minimum() {
        for requested in 0..MIN_LENGTH {
            assert_eq!(generate(requested).len(), MIN_LENGTH);
        }
        assert_eq!(generate(MIN_LENGTH).len(), MIN_LENGTH);
    }

    #[test]
    fn test_successive_passwords_differ() {
        let first = generate(DEFAULT_LENGTH);
        let second = generate(DEFAULT_LENGTH);
        assert_ne!(first, second);
    }
}
