//! Token estimation
//!
//! Character-based estimation is enough for window accounting: the session
//! layer only needs a consistent measure, not an exact tokenizer.

/// Character-class-aware token estimator.
///
/// ASCII text runs roughly four characters per token; dense scripts (CJK,
/// emoji, anything multi-byte) run closer to two.
#[derive(Debug, Clone, Copy)]
pub struct TokenEstimator {
    ascii_chars_per_token: f32,
    dense_chars_per_token: f32,
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self {
            ascii_chars_per_token: 4.0,
            dense_chars_per_token: 2.0,
        }
    }
}

impl TokenEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimate the token count of `text`.
    ///
    /// Single pass, no allocation. Non-empty text always estimates to at
    /// least one token.
    #[inline]
    pub fn estimate(&self, text: &str) -> u32 {
        if text.is_empty() {
            return 0;
        }

        let mut ascii_count = 0u32;
        let mut dense_count = 0u32;
        for c in text.chars() {
            if c.is_ascii() {
                ascii_count += 1;
            } else {
                dense_count += 1;
            }
        }

        let tokens = ascii_count as f32 / self.ascii_chars_per_token
            + dense_count as f32 / self.dense_chars_per_token;

        (tokens.ceil() as u32).max(1)
    }
}

/// Estimate with the default ratios.
#[inline]
pub fn estimate_tokens(text: &str) -> u32 {
    TokenEstimator::default().estimate(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn test_short_text_is_at_least_one() {
        assert_eq!(estimate_tokens("a"), 1);
        assert!(estimate_tokens("ok") >= 1);
    }

    #[test]
    fn test_ascii_ratio() {
        // 40 ASCII chars / 4 per token = 10 tokens
        let text = "x".repeat(40);
        assert_eq!(estimate_tokens(&text), 10);
    }

    #[test]
    fn test_dense_text_estimates_higher() {
        let ascii = "a".repeat(20);
        let dense = "\u{4e00}".repeat(20);
        assert!(estimate_tokens(&dense) > estimate_tokens(&ascii));
    }

    #[test]
    fn test_monotonic_in_length() {
        let short = estimate_tokens("fold the hand");
        let long = estimate_tokens("fold the hand and wait for a better spot next orbit");
        assert!(long > short);
    }
}
