//! One-time code generation.

use rand::Rng;
use stepgate_common::constants::CODE_ALPHABET;

/// One-time code generator.
///
/// Draws each character uniformly from the fixed digit alphabet using a
/// cryptographically secure source. Predictable codes are a direct
/// authentication bypass, so a non-CSPRNG source is never acceptable here.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeGenerator;

impl CodeGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate a code of exactly `length` characters.
    ///
    /// Panics if `length` is zero - that is a configuration programming
    /// error, not a runtime condition to recover from.
    pub fn generate(&self, length: usize) -> String {
        assert!(length > 0, "code length must be > 0");

        let mut rng = rand::rng();
        (0..length)
            .map(|_| {
                let idx = rng.random_range(0..CODE_ALPHABET.len());
                CODE_ALPHABET[idx] as char
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_exact_length() {
        let generator = CodeGenerator::new();
        for length in [1, 4, 6, 12] {
            let code = generator.generate(length);
            assert_eq!(code.len(), length);
        }
    }

    #[test]
    fn test_generate_digits_only() {
        let generator = CodeGenerator::new();
        let code = generator.generate(64);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    #[should_panic(expected = "code length must be > 0")]
    fn test_generate_zero_length_panics() {
        CodeGenerator::new().generate(0);
    }
}
