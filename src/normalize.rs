//! Input canonicalization for the embedding path.
//!
//! Raw student input is noisy: stray punctuation, tabs, repeated spaces,
//! emoji. [`normalize`] reduces it to a conservative character set before it
//! reaches the embedding collaborator, so that lexical noise does not leak
//! into the vector space.

/// Characters that survive normalization: word characters plus basic
/// sentence punctuation and parentheses.
fn is_allowed(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || matches!(c, '.' | ',' | '?' | '!' | '-' | '(' | ')')
}

/// Normalizes raw input text for embedding.
///
/// Disallowed characters are treated as separators along with whitespace:
/// every run of separators collapses to a single space, and leading and
/// trailing runs are dropped. The function is total and idempotent —
/// `normalize(normalize(s)) == normalize(s)` for every input.
///
/// # Examples
///
/// ```
/// use tutorweave::normalize::normalize;
///
/// assert_eq!(normalize("  what   is\tentropy? "), "what is entropy?");
/// assert_eq!(normalize("H2O + NaCl => brine"), "H2O NaCl brine");
/// assert_eq!(normalize(""), "");
/// ```
#[must_use]
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_separator = false;
    for c in input.chars() {
        if is_allowed(c) {
            if pending_separator && !out.is_empty() {
                out.push(' ');
            }
            pending_separator = false;
            out.push(c);
        } else {
            pending_separator = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(normalize("a   b\t\nc"), "a b c");
    }

    #[test]
    fn trims_leading_and_trailing() {
        assert_eq!(normalize("   spaced out   "), "spaced out");
    }

    #[test]
    fn strips_disallowed_characters() {
        assert_eq!(normalize("F = m*a; v = u + at"), "F m a v u at");
        assert_eq!(normalize("solve (x-2)(x+3) = 0?"), "solve (x-2)(x 3) 0?");
    }

    #[test]
    fn keeps_sentence_punctuation() {
        assert_eq!(
            normalize("Wait, really?! Yes - see fig. (2)."),
            "Wait, really?! Yes - see fig. (2)."
        );
    }

    #[test]
    fn idempotent_on_normalized_input() {
        for raw in [
            "  what   is\tentropy? ",
            "a$$b%%c",
            "already normalized text.",
            "",
            "???",
        ] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn empty_and_separator_only_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("@#$%"), "");
    }
}
