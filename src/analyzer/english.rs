//! Rule-based English analyzer (`provider = "builtin"`).
//!
//! A deterministic, fully local implementation of the [`TextAnalyzer`]
//! contract: a curated stop-word table, a guarded suffix lemmatizer with
//! an irregular-forms map, punctuation-aware sentence segmentation, and
//! pattern-driven entity recognition. It is intentionally approximate and
//! is not a general NLP toolkit. Within a fixed table version the output
//! for a given text never changes.
//!
//! Invariants the lemmatizer maintains:
//! - lemmas are fixed points: `lemmatize(lemmatize(w)) == lemmatize(w)`
//! - leading capitalization is preserved, so capitalization-driven entity
//!   recognition still works on normalized text
//! - punctuation and numbers are their own lemmas and never stop words,
//!   so sentence boundaries survive normalization

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use super::{Analysis, AnalysisError, TextAnalyzer, Token};
use crate::models::Entity;

/// Words (and contractions) filtered out of normalized text.
static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "about", "above", "after", "again", "all", "also", "always", "am", "an", "and",
        "any", "are", "as", "at", "be", "because", "been", "before", "being", "below", "between",
        "both", "but", "by", "can", "could", "did", "do", "does", "doing", "done", "down",
        "during", "each", "either", "few", "for", "from", "further", "had", "has", "have",
        "having", "he", "her", "here", "hers", "herself", "him", "himself", "his", "how", "i",
        "if", "in", "into", "is", "it", "its", "itself", "just", "may", "me", "might", "more",
        "most", "must", "my", "myself", "neither", "no", "nor", "not", "now", "of", "off", "on",
        "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own",
        "perhaps", "same", "shall", "she", "should", "so", "some", "such", "than", "that", "the",
        "their", "theirs", "them", "themselves", "then", "there", "these", "they", "this",
        "those", "through", "to", "too", "under", "until", "up", "upon", "very", "was", "we",
        "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
        "within", "without", "would", "you", "your", "yours", "yourself", "yourselves",
        // contractions
        "it's", "that's", "there's", "here's", "what's", "let's", "he's", "she's", "don't",
        "doesn't", "didn't", "isn't", "aren't", "wasn't", "weren't", "won't", "can't",
        "couldn't", "shouldn't", "wouldn't", "i'm", "i've", "i'll", "you're", "you've", "we're",
        "we've", "they're", "they've",
    ]
    .into_iter()
    .collect()
});

/// Irregular forms the suffix rules cannot reach. Every value must itself
/// be a fixed point of [`lemmatize`].
static LEMMA_EXCEPTIONS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("am", "be"), ("is", "be"), ("are", "be"), ("was", "be"), ("were", "be"),
        ("been", "be"), ("being", "be"),
        ("has", "have"), ("had", "have"), ("having", "have"),
        ("does", "do"), ("did", "do"), ("done", "do"), ("doing", "do"),
        ("goes", "go"), ("went", "go"), ("gone", "go"), ("going", "go"),
        ("made", "make"), ("making", "make"),
        ("said", "say"), ("saying", "say"),
        ("took", "take"), ("taken", "take"), ("taking", "take"),
        ("came", "come"), ("coming", "come"),
        ("gave", "give"), ("given", "give"), ("giving", "give"),
        ("got", "get"), ("gotten", "get"), ("getting", "get"),
        ("ran", "run"), ("saw", "see"), ("seen", "see"), ("knew", "know"), ("known", "know"),
        ("wrote", "write"), ("written", "write"), ("writing", "write"),
        ("found", "find"), ("held", "hold"), ("met", "meet"), ("paid", "pay"), ("sent", "send"),
        ("used", "use"), ("using", "use"),
        ("moved", "move"), ("moving", "move"),
        ("agreed", "agree"),
        ("died", "die"), ("lied", "lie"),
        ("announced", "announce"), ("announcing", "announce"),
        ("created", "create"), ("creating", "create"),
        ("provided", "provide"), ("providing", "provide"),
        ("received", "receive"), ("receiving", "receive"),
        ("included", "include"), ("including", "include"),
        ("increased", "increase"), ("increasing", "increase"),
        ("released", "release"), ("releasing", "release"),
        ("acquired", "acquire"), ("acquiring", "acquire"),
        ("children", "child"), ("men", "man"), ("women", "woman"),
        ("feet", "foot"), ("teeth", "tooth"), ("mice", "mouse"), ("geese", "goose"),
        ("better", "good"), ("best", "good"), ("worse", "bad"), ("worst", "bad"),
        ("news", "news"), ("series", "series"), ("species", "species"),
    ]
    .into_iter()
    .collect()
});

/// Word-level tokenization: alphabetic words (with internal apostrophes),
/// numbers (with digit separators), then any single non-space symbol.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z]+(?:'[A-Za-z]+)*|\d+(?:[.,]\d+)*|\S").unwrap()
});

const MONTHS: &str = "(?:January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)";

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"\b(?:{m}\.?\s+\d{{1,2}}(?:st|nd|rd|th)?(?:\s*,?\s*\d{{4}})?|\d{{1,2}}(?:st|nd|rd|th)?\s+{m}(?:\s*,?\s*\d{{4}})?|{m}\s*,?\s+\d{{4}}|\d{{4}}-\d{{2}}-\d{{2}}|\d{{1,2}}/\d{{1,2}}/\d{{2,4}}|(?:19|20)\d{{2}})\b",
        m = MONTHS
    );
    Regex::new(&pattern).unwrap()
});

static MONEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\s?\d+(?:[.,]\d+)*(?:\s?(?:thousand|million|billion|trillion))?").unwrap()
});

static ORG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:[A-Z][\w&]*\s+){1,4}(?:Inc\.?|Corp\.?|Corporation|Ltd\.?|LLC|PLC|Company|Group|Holdings|Bank|University|Institute|Foundation|Agency|Association|Technologies|Laboratories|Labs|Systems|Partners)\b",
    )
    .unwrap()
});

static PERSON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:Mr|Mrs|Ms|Dr|Prof|Professor)\s?\.?\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+){0,2}\b")
        .unwrap()
});

/// Words a period may follow without ending the sentence.
static ABBREVIATIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "etc", "vs", "fig", "al", "no",
        "inc", "ltd", "corp", "co", "e", "g", "i", "u", "s",
    ]
    .into_iter()
    .collect()
});

/// The builtin analyzer. Stateless; all tables are process-wide statics,
/// so construction is free and instances share everything.
#[derive(Debug, Default)]
pub struct EnglishAnalyzer;

impl EnglishAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextAnalyzer for EnglishAnalyzer {
    fn name(&self) -> &str {
        "builtin"
    }

    async fn analyze(&self, text: &str) -> Result<Analysis, AnalysisError> {
        if text.is_empty() {
            return Ok(Analysis::default());
        }
        Ok(Analysis {
            tokens: tokenize(text),
            sentences: split_sentences(text),
            entities: recognize_entities(text),
        })
    }
}

// ============ Tokenization + lemmas ============

fn tokenize(text: &str) -> Vec<Token> {
    TOKEN_RE
        .find_iter(text)
        .map(|m| {
            let t = m.as_str();
            Token {
                text: t.to_string(),
                lemma: lemma_of(t),
                is_stop: STOP_WORDS.contains(t.to_lowercase().as_str()),
            }
        })
        .collect()
}

/// Lemma of a token, preserving leading capitalization. All-caps tokens
/// (acronyms) and tokens containing anything but ASCII letters pass
/// through unchanged.
fn lemma_of(token: &str) -> String {
    if !token.chars().all(|c| c.is_ascii_alphabetic()) {
        let lower = token.to_lowercase();
        return match LEMMA_EXCEPTIONS.get(lower.as_str()) {
            Some(l) => recase(token, l),
            None => token.to_string(),
        };
    }
    if token.len() > 1 && token.chars().all(|c| c.is_ascii_uppercase()) {
        return token.to_string();
    }
    let lower = token.to_lowercase();
    recase(token, &lemmatize(&lower))
}

fn recase(original: &str, lemma: &str) -> String {
    if original.chars().next().is_some_and(|c| c.is_uppercase()) {
        let mut chars = lemma.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    } else {
        lemma.to_string()
    }
}

/// Suffix-rule lemmatization over a lowercase ASCII word. Rules are
/// applied repeatedly until the word stops changing, so every returned
/// lemma is a fixed point and normalization is idempotent.
fn lemmatize(word: &str) -> String {
    let mut current = word.to_string();
    loop {
        let next = lemmatize_step(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn lemmatize_step(word: &str) -> String {
    if let Some(lemma) = LEMMA_EXCEPTIONS.get(word) {
        return (*lemma).to_string();
    }
    if word.len() < 4 || word.contains('\'') {
        return word.to_string();
    }
    if word.ends_with("sses") {
        return word[..word.len() - 2].to_string();
    }
    if word.ends_with("ies") {
        return if word.len() > 4 {
            format!("{}y", &word[..word.len() - 3])
        } else {
            word[..word.len() - 1].to_string()
        };
    }
    if ["ches", "shes", "xes", "zes", "oes"]
        .iter()
        .any(|s| word.ends_with(s))
    {
        return word[..word.len() - 2].to_string();
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    if word.ends_with("ing") && word.len() >= 6 {
        let stem = &word[..word.len() - 3];
        if has_vowel(stem) {
            return undouble(stem);
        }
        return word.to_string();
    }
    if word.ends_with("ied") && word.len() > 4 {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if word.ends_with("ed") && word.len() >= 5 {
        let stem = &word[..word.len() - 2];
        if has_vowel(stem) && !stem.ends_with('e') {
            return undouble(stem);
        }
        return word.to_string();
    }
    if word.ends_with('s') {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

fn has_vowel(s: &str) -> bool {
    s.chars().any(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
}

/// Undo consonant doubling left by -ing/-ed stripping ("plann" → "plan").
/// Doubled l, s, and z are legitimate word endings and stay.
fn undouble(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    if chars.len() >= 2 {
        let last = chars[chars.len() - 1];
        if last == chars[chars.len() - 2]
            && last.is_ascii_alphabetic()
            && !matches!(last, 'l' | 's' | 'z')
        {
            return stem[..stem.len() - 1].to_string();
        }
    }
    stem.to_string()
}

// ============ Sentence segmentation ============

/// Split text into sentences, returned as verbatim trimmed slices in
/// document order. A sentence ends at `.`, `!`, or `?` followed by
/// whitespace or end of text; a period does not end a sentence when the
/// word before it is a known abbreviation. Trailing text without a
/// terminator forms a final sentence.
pub(crate) fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let (pos, c) = chars[i];
        if matches!(c, '.' | '!' | '?') {
            // Fold runs of terminators ("..." , "?!") into one boundary.
            let mut j = i;
            while j + 1 < chars.len() && matches!(chars[j + 1].1, '.' | '!' | '?') {
                j += 1;
            }
            let at_end = j + 1 >= chars.len();
            let followed_by_space = !at_end && chars[j + 1].1.is_whitespace();

            if (at_end || followed_by_space) && !(c == '.' && i == j && is_abbreviation(text, pos))
            {
                let end = chars[j].0 + chars[j].1.len_utf8();
                let sentence = text[start..end].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence.to_string());
                }
                start = end;
            }
            i = j + 1;
        } else {
            i += 1;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

/// True when the alphanumeric run immediately before `period_pos` is a
/// known abbreviation (ignoring one optional space, so normalized text
/// like "Dr ." is guarded too).
fn is_abbreviation(text: &str, period_pos: usize) -> bool {
    let before = &text[..period_pos];
    let before = before.strip_suffix(' ').unwrap_or(before);
    let word: String = before
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .chars()
        .rev()
        .collect();
    !word.is_empty() && ABBREVIATIONS.contains(word.to_lowercase().as_str())
}

// ============ Entity recognition ============

/// Recognize entity spans in document order. Every pattern match is
/// retained (no scoring, no dedup); overlapping matches resolve to the
/// leftmost-longest span.
pub(crate) fn recognize_entities(text: &str) -> Vec<Entity> {
    let mut spans: Vec<(usize, usize, &'static str)> = Vec::new();

    for m in PERSON_RE.find_iter(text) {
        spans.push((m.start(), m.end(), "PERSON"));
    }
    for m in ORG_RE.find_iter(text) {
        spans.push((m.start(), m.end(), "ORG"));
    }
    for m in DATE_RE.find_iter(text) {
        spans.push((m.start(), m.end(), "DATE"));
    }
    for m in MONEY_RE.find_iter(text) {
        spans.push((m.start(), m.end(), "MONEY"));
    }

    spans.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

    let mut entities = Vec::new();
    let mut last_end = 0usize;
    for (start, end, label) in spans {
        if start < last_end {
            continue;
        }
        entities.push(Entity {
            text: text[start..end].trim().to_string(),
            label: label.to_string(),
        });
        last_end = end;
    }
    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_carry_lemma_and_stop_flag() {
        let tokens = tokenize("The dogs were running.");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["The", "dogs", "were", "running", "."]);
        assert!(tokens[0].is_stop);
        assert!(tokens[2].is_stop);
        assert!(!tokens[1].is_stop);
        assert_eq!(tokens[1].lemma, "dog");
        assert_eq!(tokens[3].lemma, "run");
        assert_eq!(tokens[4].lemma, ".");
    }

    #[test]
    fn lemmatizer_handles_common_suffixes() {
        for (word, lemma) in [
            ("running", "run"),
            ("studies", "study"),
            ("studied", "study"),
            ("boxes", "box"),
            ("churches", "church"),
            ("classes", "class"),
            ("planned", "plan"),
            ("jumped", "jump"),
            ("walked", "walk"),
            ("ties", "tie"),
            ("dogs", "dog"),
            ("says", "say"),
            ("falling", "fall"),
            ("status", "status"),
            ("analysis", "analysis"),
            ("went", "go"),
            ("better", "good"),
        ] {
            assert_eq!(lemmatize(word), lemma, "lemma of {}", word);
        }
    }

    #[test]
    fn lemmatizer_is_idempotent() {
        let words = [
            "running", "studies", "boxes", "classes", "planned", "pressed", "announced",
            "making", "agreed", "children", "companies", "reports", "was", "needed",
            "speed", "need", "news", "series", "using", "acquired", "meetings",
        ];
        for w in words {
            let once = lemmatize(w);
            let twice = lemmatize(&once);
            assert_eq!(once, twice, "lemma of {} not a fixed point", w);
        }
    }

    #[test]
    fn exception_values_are_fixed_points() {
        for lemma in LEMMA_EXCEPTIONS.values() {
            let l: &str = lemma;
            assert_eq!(lemmatize(l), l, "exception value {}", l);
        }
    }

    #[test]
    fn capitalization_preserved_and_acronyms_untouched() {
        assert_eq!(lemma_of("Running"), "Run");
        assert_eq!(lemma_of("January"), "January");
        assert_eq!(lemma_of("NASA"), "NASA");
        assert_eq!(lemma_of("3.14"), "3.14");
    }

    #[test]
    fn sentences_are_verbatim_slices() {
        let text = "First things first. Then the rest follows! Does it? Yes.";
        let sents = split_sentences(text);
        assert_eq!(
            sents,
            vec![
                "First things first.",
                "Then the rest follows!",
                "Does it?",
                "Yes.",
            ]
        );
        for s in &sents {
            assert!(text.contains(s.as_str()));
        }
    }

    #[test]
    fn abbreviations_do_not_split_sentences() {
        let sents = split_sentences("Dr. Smith arrived late. Everyone waited.");
        assert_eq!(sents.len(), 2);
        assert_eq!(sents[0], "Dr. Smith arrived late.");
    }

    #[test]
    fn detached_abbreviation_period_guarded() {
        // Normalized text carries periods as separate tokens.
        let sents = split_sentences("Dr . Smith arrive late . everyone wait .");
        assert_eq!(sents.len(), 2);
    }

    #[test]
    fn trailing_text_without_terminator_is_a_sentence() {
        let sents = split_sentences("One full sentence. And a dangling tail");
        assert_eq!(sents, vec!["One full sentence.", "And a dangling tail"]);
    }

    #[test]
    fn empty_text_has_no_sentences() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn entities_in_document_order() {
        let text = "Acme Corporation hired Dr. Jane Smith on March 3, 2021 for $50,000.";
        let ents = recognize_entities(text);
        let labels: Vec<&str> = ents.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["ORG", "PERSON", "DATE", "MONEY"]);
        assert_eq!(ents[0].text, "Acme Corporation");
        assert_eq!(ents[2].text, "March 3, 2021");
    }

    #[test]
    fn duplicate_spans_are_preserved() {
        let ents = recognize_entities("Globex Inc. partnered with Globex Inc. again.");
        let orgs: Vec<&Entity> = ents.iter().filter(|e| e.label == "ORG").collect();
        assert_eq!(orgs.len(), 2);
    }

    #[test]
    fn no_entities_in_plain_prose() {
        assert!(recognize_entities("the quick brown fox jumps over a lazy dog").is_empty());
    }

    #[test]
    fn iso_and_slash_dates_recognized() {
        let ents = recognize_entities("Due 2024-01-12, shipped 3/4/2024.");
        assert_eq!(ents.len(), 2);
        assert!(ents.iter().all(|e| e.label == "DATE"));
    }

    #[tokio::test]
    async fn empty_input_yields_empty_analysis() {
        let analysis = EnglishAnalyzer::new().analyze("").await.unwrap();
        assert!(analysis.tokens.is_empty());
        assert!(analysis.sentences.is_empty());
        assert!(analysis.entities.is_empty());
    }
}
