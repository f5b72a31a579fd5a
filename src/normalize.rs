//! Text normalization, negation tagging and vocabulary filtering.
//!
//! Sentence terminals (`.`, `!`, `?`, with `…` read as `.`) survive tokenization as standalone
//! tokens and negation triggers survive stopword removal, so the negation
//! tagger can see both. The tagger consumes the triggers; terminals are
//! stripped after tagging by [`strip_terminals`].

use crate::lexicon::Lexicon;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Tokens that open a negation scope.
pub const NEGATION_TRIGGERS: &[&str] = &["not", "no", "never"];

/// Tokens that close a negation scope.
pub const SENTENCE_TERMINALS: &[&str] = &[".", "!", "?"];

// A run of terminals is one boundary. Word chunks are letters and digits with
// inner apostrophes; every other character separates chunks.
static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?…]+|[\p{L}\p{N}'’]+").expect("valid token regex"));

const APOSTROPHES: &[char] = &['\'', '’'];

/// A normalized word form with its negation flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Token {
    pub text: String,
    pub negated: bool,
}

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            negated: false,
        }
    }

    pub fn negated(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            negated: true,
        }
    }

    pub fn is_terminal(&self) -> bool {
        is_terminal(&self.text)
    }
}

pub fn is_terminal(token: &str) -> bool {
    SENTENCE_TERMINALS.contains(&token)
}

pub fn is_negation_trigger(token: &str) -> bool {
    NEGATION_TRIGGERS.contains(&token)
}

/// Splits text into word tokens and sentence terminals.
///
/// Punctuation never sticks to a word: quotes, dashes and brackets split
/// chunks, and apostrophes are dropped (`don't` becomes `dont`). A run such as
/// `?!` collapses into its first terminal, and an ellipsis `…` counts as `.`.
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(text)
        .filter_map(|m| {
            let chunk = m.as_str();
            match chunk.chars().next()? {
                '…' => return Some(".".to_string()),
                c @ ('.' | '!' | '?') => return Some(c.to_string()),
                _ => {}
            }
            let word: String = chunk.chars().filter(|c| !APOSTROPHES.contains(c)).collect();
            (!word.is_empty()).then_some(word)
        })
        .collect()
}

/// Turns raw review text into cleaned word forms.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    lexicon: &'a Lexicon,
}

impl<'a> Normalizer<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self { lexicon }
    }

    /// Tokenize, keep alphabetic tokens, lowercase, drop stopwords, lemmatize.
    /// Terminals and negation triggers are kept for the tagger.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        tokenize(text)
            .into_iter()
            .filter_map(|token| {
                if is_terminal(&token) {
                    return Some(token);
                }
                if !token.chars().all(char::is_alphabetic) {
                    return None;
                }
                let lower = token.to_lowercase();
                if is_negation_trigger(&lower) {
                    return Some(lower);
                }
                if self.lexicon.is_stopword(&lower) {
                    return None;
                }
                Some(self.lexicon.lemmatize(&lower))
            })
            .collect()
    }

    /// Normalizes every review, keeping empty results in place.
    pub fn normalize_all<S: AsRef<str>>(&self, reviews: &[S]) -> Vec<Vec<String>> {
        reviews.iter().map(|r| self.normalize(r.as_ref())).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NegationState {
    Clear,
    Negating,
}

/// Marks tokens inside a negation scope.
///
/// A trigger opens the scope and is dropped; a terminal closes it and is
/// emitted untagged. The scope never carries over into another review.
pub fn tag_negation<S: AsRef<str>>(tokens: &[S]) -> Vec<Token> {
    let mut state = NegationState::Clear;
    let mut out = Vec::with_capacity(tokens.len());

    for token in tokens {
        let token = token.as_ref();
        if is_negation_trigger(token) {
            state = NegationState::Negating;
            continue;
        }
        if is_terminal(token) {
            state = NegationState::Clear;
            out.push(Token::new(token));
            continue;
        }
        out.push(Token {
            text: token.to_string(),
            negated: state == NegationState::Negating,
        });
    }

    out
}

/// Drops sentence terminals once negation scopes are resolved.
pub fn strip_terminals(tokens: Vec<Token>) -> Vec<Token> {
    tokens.into_iter().filter(|t| !t.is_terminal()).collect()
}

/// Keeps the tokens whose form is in the sentiment vocabulary.
pub fn filter_vocabulary(tokens: Vec<Token>, lexicon: &Lexicon) -> Vec<Token> {
    tokens
        .into_iter()
        .filter(|t| lexicon.in_vocabulary(&t.text))
        .collect()
}

/// Full text chain for one review: normalize, tag, strip, filter.
pub fn prepare_review(text: &str, lexicon: &Lexicon) -> Vec<Token> {
    let cleaned = Normalizer::new(lexicon).normalize(text);
    let tagged = tag_negation(&cleaned);
    filter_vocabulary(strip_terminals(tagged), lexicon)
}
