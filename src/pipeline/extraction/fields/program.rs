//! Program title extraction and repair.
//!
//! Three tiers, loosest gated hardest:
//!   1. anchored — «по программе …» up to a volume/number anchor, matched on
//!      text stripped of OCR noise characters;
//!   2. standard — known program titles of this certificate family, matched
//!      on raw text;
//!   3. garbled — noise-tolerant character classes that recognize the same
//!      titles through OCR damage, accepted only above a length floor.
//!
//! Every candidate goes through `clean_program_name`, which strips quotes
//! and volume tails and applies an ordered repair table for recurring OCR
//! misreads. Cleaning is idempotent: a cleaned title passes through
//! unchanged.

use std::sync::LazyLock;

use regex::Regex;

use super::collapse_whitespace;

const MIN_ANCHORED_LEN: usize = 10;
const MIN_GARBLED_LEN: usize = 15;
const MIN_CYRILLIC_RATIO: f32 = 0.7;

/// Characters kept for anchored matching; everything else becomes a space.
static NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^\w\s\-().,:"«»]"#).unwrap());

/// Tier 1: explicit «по программе» anchors with optional opening/closing
/// quotes of either style, capture ending at a volume or number marker.
static ANCHORED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?is)по программе\s*["“«]?\s*(.*?)\s*["”»]?\s*в\s*объ[её]ме"#,
        r#"(?is)по программе\s*["“«]?\s*(.*?)\s*["”»]?\s*\d+\s*час"#,
        r#"(?is)по программе\s*["“«]?\s*(.*?)\s*["”»]?\s*№"#,
        r#"(?is)программе\s*["“«]?\s*(.*?)\s*["”»]?\s*в\s*объ[её]ме"#,
        r#"(?is)программе\s*["“«]?\s*(.*?)\s*["”»]?\s*\d+\s*час"#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Tier 2: well-formed renderings of the known procurement titles.
static STANDARD_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?is)(Государственн[ыые]+\s+и\s+муниципальн[ыые]+\s+закупки.*?(?:теория\s+и\s+практика|практика))",
        r"(?is)([Оо0]\s*контрактной\s+системе\s+в\s+сфере\s+закупок)",
        r"(?is)(44.*?ФЗ.*?закуп)",
        r"(?is)(контрактн[оая]+\s+систем[ае]\s+в\s+сфере\s+закупок)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Tier 3: the same titles through heavy OCR damage.
static GARBLED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)(Государствен[а-яшые]*\s+и\s+муниципальн[а-яшые]*\s+закупки[^"]*(?:теория|практика)?)"#,
        r"(?i)([Оо0]\s*контрактн[а-я]*\s+систем[а-я]*\s+в\s+сфере\s+закупок[а-я]*)",
        r"(?i)(Государств[а-яшые]*\s+[ия]*\s*муници[а-яшые]*\s+закуп[а-яки]*)",
        r#"(?i)(44[^"]*ФЗ[^"]*закуп[а-яки]*)"#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static QUOTES_AND_PARENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["“”«»()]"#).unwrap());

static LEADING_NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\W+").unwrap());

/// A run of overt garbage characters ends the title; drop it and the rest.
static GARBAGE_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\*#\{\}\[\]\$%@!\+=<>]+.*$").unwrap());

/// Volume suffixes («в объёме …», hour counts, prices) including the common
/// OCR misreads of «объёме», stripped with everything after them.
static VOLUME_TAILS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\s*[вВ]\s*объ[её]ме.*$",
        r"\s*[вВ]\s*обь[её]ме.*$",
        r"\s*объ[её]мс.*$",
        r"\s*объ[её]не.*$",
        r"\s*оь[её]ме.*$",
        r"\s*\d+\s*час.*$",
        r"\s*\d+\s*₽.*$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Ordered repair table for recurring misreads in the known titles.
/// Order matters: narrower damage patterns precede broader ones.
static REPAIRS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        ("0", "О"),
        ("Государствен[а-яшы]*", "Государственные"),
        ("Государств[а-яшы]*", "Государственные"),
        ("муниципальн[а-яшы]*", "муниципальные"),
        ("муници[а-яшы]*", "муниципальные"),
        ("контрактн[а-я]*", "контрактной"),
        ("коптрактн[а-я]*", "контрактной"),
        ("систем[а-я]*", "системе"),
        ("закупок[ъэ]", "закупок"),
        ("закуп[а-яки]*", "закупки"),
        (r#"44[^"]*ФЗ"#, "44-ФЗ"),
    ]
    .iter()
    .map(|(p, r)| (Regex::new(&format!("(?i){p}")).unwrap(), *r))
    .collect()
});

/// Extract the training program title, repaired and cleaned.
pub fn extract_program(text: &str) -> Option<String> {
    let denoised = collapse_whitespace(&NOISE.replace_all(text, " "));

    for pattern in ANCHORED_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(&denoised) {
            let candidate = clean_program_name(&caps[1]);
            if accepts_repaired(&candidate) {
                return Some(candidate);
            }
        }
    }

    for pattern in STANDARD_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            let candidate = clean_program_name(&caps[1]);
            if accepts_repaired(&candidate) {
                return Some(candidate);
            }
        }
    }

    for pattern in GARBLED_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            let candidate = clean_program_name(&caps[1]);
            if candidate.chars().count() > MIN_GARBLED_LEN {
                return Some(candidate);
            }
        }
    }

    None
}

/// Acceptance for tiers 1-2: long enough and mostly Cyrillic, so an anchor
/// that latched onto digits or Latin noise is discarded.
fn accepts_repaired(candidate: &str) -> bool {
    candidate.chars().count() > MIN_ANCHORED_LEN
        && cyrillic_ratio(candidate) > MIN_CYRILLIC_RATIO
}

fn cyrillic_ratio(text: &str) -> f32 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let cyrillic = text
        .chars()
        .filter(|c| matches!(c, 'а'..='я' | 'А'..='Я' | 'ё' | 'Ё'))
        .count();
    cyrillic as f32 / total as f32
}

/// Normalize a raw program-title candidate.
///
/// Strips quotes and parentheses, truncates at garbage runs and volume
/// tails, collapses runs of four or more identical characters to one, and
/// applies the misread repair table. Idempotent.
pub fn clean_program_name(candidate: &str) -> String {
    let mut name = QUOTES_AND_PARENS.replace_all(candidate, "").into_owned();
    name = collapse_whitespace(&name);
    name = LEADING_NON_WORD.replace(&name, "").into_owned();
    name = GARBAGE_TAIL.replace(&name, "").into_owned();
    name = collapse_repeated_runs(&name);
    for tail in VOLUME_TAILS.iter() {
        name = tail.replace(&name, "").into_owned();
    }
    for (pattern, replacement) in REPAIRS.iter() {
        name = pattern.replace_all(&name, *replacement).into_owned();
    }
    collapse_whitespace(&name)
}

/// Collapse runs of four or more identical characters to a single one
/// («Закупкииии» → «Закупки»).
fn collapse_repeated_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let mut run = 1usize;
        while chars.peek() == Some(&c) {
            chars.next();
            run += 1;
        }
        if run >= 4 {
            out.push(c);
        } else {
            for _ in 0..run {
                out.push(c);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchored_title_in_guillemets() {
        let text = "прошел обучение по программе «Государственные и муниципальные \
                    закупки: теория и практика» в объеме 144 часов";
        assert_eq!(
            extract_program(text).as_deref(),
            Some("Государственные и муниципальные закупки: теория и практика")
        );
    }

    #[test]
    fn anchored_title_without_quotes_before_hours() {
        let text = "по программе Государственные и муниципальные закупки 72 часа";
        assert_eq!(
            extract_program(text).as_deref(),
            Some("Государственные и муниципальные закупки")
        );
    }

    #[test]
    fn standard_title_without_anchor() {
        let text = "прошел обучение О контрактной системе в сфере закупок согласно плану";
        assert_eq!(
            extract_program(text).as_deref(),
            Some("О контрактной системе в сфере закупки")
        );
    }

    #[test]
    fn leading_zero_is_repaired_to_letter() {
        let text = "0 контрактной системе в сфере закупок";
        let program = extract_program(text).unwrap();
        assert!(program.starts_with("О "));
    }

    #[test]
    fn garbled_title_is_repaired() {
        let text = "обучение Государствеш и мунициш закупкн выдано";
        assert_eq!(
            extract_program(text).as_deref(),
            Some("Государственные и муниципальные закупки")
        );
    }

    #[test]
    fn short_anchored_match_is_rejected() {
        let text = "по программе абв 72 часа";
        assert!(extract_program(text).is_none());
    }

    #[test]
    fn mostly_latin_candidate_is_rejected() {
        let text = "по программе lorem ipsum dolor sit amet в объеме 40 часов";
        assert!(extract_program(text).is_none());
    }

    #[test]
    fn cleaning_strips_volume_tail_and_quotes() {
        assert_eq!(
            clean_program_name("«Профильная переподготовка» в объёме 108 часов"),
            "Профильная переподготовка"
        );
    }

    #[test]
    fn cleaning_truncates_at_garbage_run() {
        assert_eq!(
            clean_program_name("Профильная переподготовка *** мусор %%%"),
            "Профильная переподготовка"
        );
    }

    #[test]
    fn cleaning_collapses_repeated_characters() {
        assert_eq!(
            clean_program_name("Переподготовкаааааа"),
            "Переподготовка"
        );
    }

    #[test]
    fn cleaning_is_idempotent() {
        let messy = "«Государствеш и мунициш закупкн» в объёмс 144 часов ***хвост";
        let once = clean_program_name(messy);
        assert_eq!(clean_program_name(&once), once);
    }

    #[test]
    fn misread_volume_suffixes_are_stripped() {
        assert_eq!(
            clean_program_name("Контрактная система объёмс 40"),
            "контрактной системе"
        );
    }
}
