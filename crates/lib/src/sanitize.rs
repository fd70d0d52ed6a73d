//! Removal of double-escaped emoji artifacts (`\uD83D\uDE00` as literal text).

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

static ESCAPED_SURROGATE_PAIR: OnceLock<Regex> = OnceLock::new();

fn escaped_surrogate_pair() -> &'static Regex {
    ESCAPED_SURROGATE_PAIR.get_or_init(|| {
        Regex::new(r"(?i)\\uD83[0-9A-F]\\uD[0-9A-F]{3}").expect("static pattern")
    })
}

/// Strip every literal `\uD83X\uDXXX` sequence. Borrows when there is nothing to strip.
///
/// Matching is case-insensitive: `\ud83d\ude00` (lowercase hex, as most JSON encoders
/// write it) is stripped too.
///
/// Removal repeats until no match remains: cutting one pair out can join the text on
/// either side into a new pair, and the result must be stable under a second pass.
pub fn sanitize(text: &str) -> Cow<'_, str> {
    let re = escaped_surrogate_pair();
    if !re.is_match(text) {
        return Cow::Borrowed(text);
    }
    let mut out = re.replace_all(text, "").into_owned();
    while re.is_match(&out) {
        out = re.replace_all(&out, "").into_owned();
    }
    Cow::Owned(out)
}
