// src/text/mod.rs
//! Cell-text normalization: cleaning raw values for output and reducing
//! header labels to stable matching keys.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Grammatical small words (Albanian prepositions, conjunctions, articles)
/// kept lowercase by `smart_title_case` unless they open the string.
const SMALL_WORDS: &[&str] = &[
    "e", "dhe", "me", "nga", "ne", "në", "te", "të", "per", "për", "prej", "së", "se", "i",
];

static MULTI_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n+").unwrap());
static COMMA_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r",(\s*,)+").unwrap());
static WS_BEFORE_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+,").unwrap());
static COMMA_THEN_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s+").unwrap());
static SINGLE_QUOTE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"''+").unwrap());
static DOUBLE_QUOTE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r#""{2,}"#).unwrap());
static SINGLE_QUOTE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"'(\s)").unwrap());
static DOUBLE_QUOTE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r#""(\s)"#).unwrap());
static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9 ]+").unwrap());
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());
static DASH_THEN_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\s*,").unwrap());
static COMMA_THEN_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*-").unwrap());
static DASH_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());
static SPACED_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*-\s*").unwrap());
static SPACED_SLASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*/\s*").unwrap());

/// Ordered most-specific first; each is tried once, anchored at the start.
static DOC_REFERENCE_PREFIXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)^leja dokumenti[:\s-]+").unwrap(),
        Regex::new(r"(?i)^(leja|leje)\s+me\s+nr\.?\s*").unwrap(),
        Regex::new(r"(?i)^(leja|leje)\s+nr\.?\s*").unwrap(),
    ]
});

/// Clean a raw cell value into canonical display text.
///
/// Empty and whitespace-only input becomes `None`. Internal newlines collapse
/// to `", "`, repeated whitespace to a single space, duplicated straight
/// quotes to one, and dangling quote/comma characters are stripped from both
/// ends. Idempotent: `clean(clean(x)) == clean(x)`.
pub fn clean(raw: &str) -> Option<String> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = NEWLINES.replace_all(&text, ", ");
    let text = MULTI_WS.replace_all(&text, " ");
    let text = COMMA_RUN.replace_all(&text, ", ");
    let text = WS_BEFORE_COMMA.replace_all(&text, ",");
    let text = COMMA_THEN_WS.replace_all(&text, ", ");
    let text = SINGLE_QUOTE_RUN.replace_all(&text, "'");
    let text = DOUBLE_QUOTE_RUN.replace_all(&text, "\"");
    let text = SINGLE_QUOTE_WS.replace_all(&text, "$1");
    let text = DOUBLE_QUOTE_WS.replace_all(&text, "$1");
    let text = text.trim_matches(|c| matches!(c, ' ' | ',' | '"' | '\''));
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Reduce a raw header label to a lowercase ASCII matching key.
///
/// Unicode-decomposes and strips combining marks so accented label variants
/// across source years converge to one key. Matching only, never display.
pub fn normalize_header_label(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let stripped: String = lowered.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    let spaced = NON_ALNUM.replace_all(&stripped, " ");
    MULTI_WS.replace_all(spaced.trim(), " ").trim().to_string()
}

/// Lowercase the whole string, then capitalize the first letter of every word
/// except the small-word set. The very first word is always capitalized.
pub fn smart_title_case(text: &str) -> String {
    let lowered = text.to_lowercase();
    let titled = WORD.replace_all(&lowered, |caps: &Captures| {
        let word = &caps[0];
        if SMALL_WORDS.contains(&word) {
            word.to_string()
        } else {
            capitalize_first(word)
        }
    });
    capitalize_first(&titled)
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Unify en/em dashes to `dash_separator` (or drop dashes entirely when
/// `None`), normalize slash spacing, and optionally apply smart title-casing.
pub fn normalize_inline_separators(
    raw: &str,
    dash_separator: Option<&str>,
    title_case: bool,
) -> Option<String> {
    let text = clean(raw)?;
    let text = text.replace('–', "-").replace('—', "-");
    let text = DASH_THEN_COMMA.replace_all(&text, "-");
    let text = COMMA_THEN_DASH.replace_all(&text, "-");
    let text = match dash_separator {
        Some(sep) => SPACED_DASH.replace_all(&text, sep),
        None => DASH_RUN.replace_all(&text, " "),
    };
    let text = SPACED_SLASH.replace_all(&text, " / ");
    let text = MULTI_WS.replace_all(&text, " ");
    let text = text.trim_matches(|c| matches!(c, ' ' | ',' | '-' | '/'));
    if text.is_empty() {
        return None;
    }
    let out = if title_case {
        smart_title_case(text)
    } else {
        text.to_string()
    };
    Some(out)
}

/// Strip known human-entered boilerplate ("leja me nr.", "leja dokumenti:")
/// from the front of a permit document reference, then residual punctuation.
pub fn normalize_document_reference(raw: &str) -> Option<String> {
    let mut text = clean(raw)?;
    for prefix in DOC_REFERENCE_PREFIXES.iter() {
        text = prefix.replace(&text, "").into_owned();
    }
    let text = text.trim_start_matches([':', '-', ' ']);
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_blank_input_is_none() {
        assert_eq!(clean(""), None);
        assert_eq!(clean("   "), None);
        assert_eq!(clean("\n\t "), None);
        assert_eq!(clean("\"',"), None);
    }

    #[test]
    fn clean_collapses_newlines_and_whitespace() {
        assert_eq!(
            clean("Rruga B\nLagjja e Re").as_deref(),
            Some("Rruga B, Lagjja e Re")
        );
        assert_eq!(clean("a   b\t c").as_deref(), Some("a b c"));
        assert_eq!(clean("x ,y"), Some("x,y".to_string()));
    }

    #[test]
    fn clean_collapses_quotes_and_strips_ends() {
        assert_eq!(clean("''Dardania''").as_deref(), Some("Dardania"));
        assert_eq!(clean("\"\"ok\"\"").as_deref(), Some("ok"));
        assert_eq!(clean(", Kalabria ,").as_deref(), Some("Kalabria"));
    }

    #[test]
    fn clean_is_idempotent() {
        let inputs = [
            "  N.T.SH \"Ylli\"  ",
            "Rruga B\nLagjja e Re",
            "a ,, b",
            "''x''  y",
            "banesa,\n-afariste",
            "Sh.p.k. 'Alfa' , Prishtine",
        ];
        for raw in inputs {
            let once = clean(raw);
            let twice = once.as_deref().and_then(clean);
            assert_eq!(once, twice, "clean not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn header_label_is_case_and_diacritic_insensitive() {
        assert_eq!(
            normalize_header_label("Institucioni"),
            normalize_header_label("INSTITUCIONI")
        );
        assert_eq!(
            normalize_header_label("Data e lëshimit të lejes"),
            "data e leshimit te lejes"
        );
        assert_eq!(normalize_header_label("Lagjia\n(e re)"), "lagjia e re");
    }

    #[test]
    fn header_label_is_idempotent() {
        for raw in ["I akredituar deri më", "Siperfaqja (m²)", "KUOTA"] {
            let once = normalize_header_label(raw);
            assert_eq!(normalize_header_label(&once), once);
        }
    }

    #[test]
    fn title_case_keeps_small_words_lowercase() {
        assert_eq!(smart_title_case("shtepi banimi"), "Shtepi Banimi");
        assert_eq!(
            smart_title_case("objekt banimi dhe afarizmi"),
            "Objekt Banimi dhe Afarizmi"
        );
        // a small word opening the string is still capitalized
        assert_eq!(smart_title_case("e re"), "E Re");
    }

    #[test]
    fn separators_unify_dashes_and_title_case() {
        assert_eq!(
            normalize_inline_separators("banesa — afariste", Some(" - "), true).as_deref(),
            Some("Banesa - Afariste")
        );
        assert_eq!(
            normalize_inline_separators("P+3 / P+4", Some(" - "), false).as_deref(),
            Some("P+3 / P+4")
        );
        assert_eq!(
            normalize_inline_separators("banesa–afariste", None, false).as_deref(),
            Some("banesa afariste")
        );
        assert_eq!(normalize_inline_separators(" - ", Some(" - "), true), None);
    }

    #[test]
    fn document_reference_strips_boilerplate_prefixes() {
        assert_eq!(
            normalize_document_reference("Leja me nr. 07-351/123").as_deref(),
            Some("07-351/123")
        );
        assert_eq!(
            normalize_document_reference("leje nr 04/2018").as_deref(),
            Some("04/2018")
        );
        assert_eq!(
            normalize_document_reference("Leja dokumenti: 351-2020").as_deref(),
            Some("351-2020")
        );
        assert_eq!(normalize_document_reference("07-351/99").as_deref(), Some("07-351/99"));
        assert_eq!(normalize_document_reference("leja nr."), None);
    }
}
