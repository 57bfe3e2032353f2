//! Canonical text layer for contamination detection.
//!
//! Every training sample and benchmark example goes through [`normalize`]
//! before it is hashed, shingled or compared. Two texts that differ only in
//! case, Unicode compatibility forms, whitespace or punctuation end up with
//! the same canonical form and therefore the same [`Digest256`].
//!
//! ## What we do
//!
//! - Lowercase, NFKC, lowercase again
//! - Keep alphanumerics, drop punctuation and symbols
//! - Collapse whitespace runs to a single space, trim the ends
//!
//! ## Pure function guarantee
//!
//! No I/O, no clock calls, no locale dependence. `normalize` is idempotent:
//! `normalize(normalize(x)) == normalize(x)` for every input.

mod hash;
mod pipeline;

pub use crate::hash::{digest_bytes, hash_text, Digest256};
pub use crate::pipeline::{normalize, CanonicalText};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_normalize() {
        let input = "  HAcllo\nWORLD!  This is   DECONTAM. ";
        assert_eq!(normalize(input), "hacllo world this is decontam");
    }

    #[test]
    fn punctuation_is_stripped_inside_words() {
        assert_eq!(
            normalize("Hello, world! It's 100% fun."),
            "hello world its 100 fun"
        );
        assert_eq!(normalize("snake_case and kebab-case"), "snakecase and kebabcase");
    }

    #[test]
    fn empty_and_symbol_only_inputs_yield_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t "), "");
        assert_eq!(normalize("?!... --- ***"), "");
        assert!(CanonicalText::new("!!!").is_empty());
    }

    #[test]
    fn stripped_punctuation_between_spaces_leaves_single_space() {
        assert_eq!(normalize("a , b"), "a b");
        assert_eq!(normalize("a - - b"), "a b");
    }

    #[test]
    fn unicode_equivalence_nfkc() {
        let composed = "Caf\u{00E9}";
        let decomposed = "Cafe\u{0301}";
        assert_eq!(normalize(composed), normalize(decomposed));
        assert_eq!(normalize(composed), "caf\u{00E9}");

        // Fullwidth and ligature compatibility forms fold to ASCII.
        assert_eq!(normalize("ＡＢＣ \u{FB01}le"), "abc file");
    }

    #[test]
    fn nfkc_uppercase_output_is_folded() {
        // U+210C BLACK-LETTER CAPITAL H decomposes to 'H'.
        assert_eq!(normalize("\u{210C}ello"), "hello");
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = [
            "  The  Water-Cycle,\tEXPLAINED! ",
            "Caf\u{00E9} ＡＢＣ \u{210C} \u{FB01}",
            "a , b ; c",
            "ΟΔΟΣ. AΣ_B",
            "İstanbul q\u{0303} x",
            "  \u{00A0}tab\tand\u{2003}em  ",
            "\u{1100}-\u{1161}",
            "\u{03B1}-\u{0345}",
            "",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn stripped_character_between_composable_pair() {
        // Hangul jamo split by a hyphen compose into the precomposed syllable.
        assert_eq!(normalize("\u{1100}-\u{1161}"), "\u{AC00}");
        assert_eq!(
            CanonicalText::new("\u{1100}-\u{1161}").digest(),
            CanonicalText::new("\u{AC00}").digest()
        );
        // Alpha and a combining ypogegrammeni compose to U+1FB3.
        assert_eq!(normalize("\u{03B1}-\u{0345}"), "\u{1FB3}");
    }

    #[test]
    fn insensitive_to_case_whitespace_and_punctuation() {
        let a = normalize("The Water Cycle: evaporation, condensation.");
        let b = normalize("the   WATER cycle evaporation condensation");
        assert_eq!(a, b);
    }

    #[test]
    fn canonical_text_words_and_digest() {
        let text = CanonicalText::new("  One, two;  THREE ");
        assert_eq!(text.as_str(), "one two three");
        assert_eq!(text.words().collect::<Vec<_>>(), vec!["one", "two", "three"]);
        assert_eq!(text.word_count(), 3);
        assert_eq!(text.digest(), digest_bytes(b"one two three"));
        assert_eq!(text.to_string(), "one two three");
    }

    #[test]
    fn digest_hex_roundtrip_and_serde() {
        let digest = CanonicalText::new("hello world").digest();
        let hex = digest.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(hex, hash_text("hello world"));

        let parsed: Digest256 = hex.parse().expect("valid hex");
        assert_eq!(parsed, digest);

        let json = serde_json::to_string(&digest).expect("serialize");
        assert_eq!(json, format!("\"{hex}\""));
        let back: Digest256 = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, digest);
    }

    #[test]
    fn digest_rejects_bad_hex() {
        assert!("zz".parse::<Digest256>().is_err());
        assert!("abcd".parse::<Digest256>().is_err());
    }

    #[test]
    fn known_sha256_vector() {
        // SHA-256("abc")
        assert_eq!(
            digest_bytes(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
