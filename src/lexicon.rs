//! Lexicon resources: stopwords, sentiment vocabulary, polarity scores and a
//! rule-based lemmatizer.
//!
//! A [`Lexicon`] is built once at startup (built-in tables, optionally
//! overridden from files) and then shared read-only through an `Arc` by every
//! pipeline stage. Nothing in here mutates after construction.

use crate::error::LexiconError;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Normalization constant used to squash a raw valence into [-1, 1].
const VALENCE_ALPHA: f64 = 15.0;

/// English stopword list.
const STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

/// Single-word adjectives accepted by the vocabulary filter when no
/// vocabulary file is supplied.
const ADJECTIVES: &[&str] = &[
    "amazing", "annoying", "awesome", "awful", "bad", "beautiful", "best", "better", "big",
    "bright", "broken", "brilliant", "cheap", "clean", "clear", "comfortable", "compact",
    "convenient", "crisp", "decent", "defective", "delightful", "difficult", "disappointing",
    "durable", "easy", "effective", "efficient", "excellent", "expensive", "fake", "fantastic",
    "fast", "fine", "flimsy", "fragile", "free", "full", "functional", "good", "great", "happy",
    "hard", "heavy", "helpful", "high", "horrible", "impressive", "incredible", "inferior",
    "light", "long", "loose", "loud", "lovely", "low", "mediocre", "new", "nice", "noisy",
    "old", "outstanding", "overpriced", "pathetic", "perfect", "pleasant", "poor", "powerful",
    "quick", "quiet", "reliable", "responsive", "sad", "satisfied", "seamless", "sharp",
    "short", "simple", "slow", "small", "smooth", "solid", "sturdy", "stylish", "superb",
    "superior", "terrible", "tight", "unhappy", "unreliable", "unstable", "useful", "useless",
    "weak", "wonderful", "worse", "worst", "worthless", "wrong",
];

/// Built-in valence table, raw scores on a [-4, 4] scale.
const VALENCES: &[(&str, f64)] = &[
    ("amazing", 2.8), ("annoying", -1.7), ("awesome", 3.1), ("awful", -2.0), ("bad", -2.5),
    ("beautiful", 2.9), ("best", 3.2), ("better", 1.9), ("bright", 1.9), ("broken", -1.7),
    ("brilliant", 2.8), ("clean", 1.7), ("clear", 1.6), ("comfortable", 1.5),
    ("convenient", 1.5), ("decent", 1.6), ("defective", -1.9), ("delightful", 2.9),
    ("difficult", -1.5), ("disappointing", -2.2), ("disappointed", -1.9), ("durable", 1.2),
    ("easy", 1.9), ("effective", 2.1), ("efficient", 1.8), ("excellent", 2.7),
    ("expensive", -0.9), ("fake", -2.1), ("fantastic", 2.6), ("fine", 0.8), ("flimsy", -1.4),
    ("fragile", -1.0), ("free", 2.3), ("good", 1.9), ("great", 3.1), ("happy", 2.7),
    ("hate", -2.7), ("helpful", 1.8), ("horrible", -2.5), ("impressive", 2.3),
    ("incredible", 2.4), ("inferior", -1.7), ("love", 3.2), ("lovely", 2.8), ("mediocre", -1.0),
    ("nice", 1.8), ("noisy", -0.7), ("outstanding", 3.0), ("overpriced", -1.6),
    ("pathetic", -2.6), ("perfect", 2.7), ("pleasant", 2.3), ("poor", -2.1),
    ("powerful", 1.8), ("problem", -1.7), ("reliable", 1.9), ("sad", -2.1),
    ("satisfied", 1.8), ("seamless", 1.4), ("smooth", 1.3), ("solid", 1.4), ("sturdy", 1.1),
    ("stylish", 1.5), ("superb", 3.1), ("superior", 2.5), ("terrible", -2.1),
    ("unhappy", -1.8), ("unreliable", -1.8), ("unstable", -1.5), ("useful", 1.9),
    ("useless", -1.8), ("waste", -1.8), ("weak", -1.9), ("wonderful", 2.7), ("worse", -2.1),
    ("worst", -3.1), ("worthless", -1.9), ("wrong", -2.1),
];

/// Irregular inflections that suffix rules cannot reach.
const IRREGULAR_FORMS: &[(&str, &str)] = &[
    ("children", "child"),
    ("feet", "foot"),
    ("geese", "goose"),
    ("men", "man"),
    ("mice", "mouse"),
    ("teeth", "tooth"),
    ("women", "woman"),
    ("bought", "buy"),
    ("broke", "break"),
    ("made", "make"),
    ("worked", "work"),
];

/// Suffix substitutions tried in order (noun, then verb, then adjective).
const SUFFIX_RULES: &[(&str, &str)] = &[
    ("ses", "s"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("ies", "y"),
    ("s", ""),
    ("es", "e"),
    ("es", ""),
    ("ed", "e"),
    ("ed", ""),
    ("ing", "e"),
    ("ing", ""),
    ("er", ""),
    ("est", ""),
    ("er", "e"),
    ("est", "e"),
];

/// Immutable lexical resources used by normalization and scoring.
#[derive(Debug, Clone)]
pub struct Lexicon {
    stopwords: HashSet<String>,
    vocabulary: HashSet<String>,
    valences: HashMap<String, f64>,
    irregular: HashMap<String, String>,
}

impl Lexicon {
    /// Builds a lexicon from explicit tables.
    pub fn new<S, V, P>(stopwords: S, vocabulary: V, valences: P) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
        P: IntoIterator<Item = (String, f64)>,
    {
        Self {
            stopwords: stopwords.into_iter().map(Into::into).collect(),
            vocabulary: vocabulary.into_iter().map(Into::into).collect(),
            valences: valences.into_iter().collect(),
            irregular: IRREGULAR_FORMS
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }

    /// The compiled-in English tables.
    pub fn builtin() -> Self {
        Self::new(
            STOPWORDS.iter().copied(),
            ADJECTIVES.iter().copied(),
            VALENCES.iter().map(|(w, v)| (w.to_string(), *v)),
        )
    }

    /// Replaces the vocabulary with the words listed in `path`, one per line.
    pub fn with_vocabulary_file(mut self, path: &Path) -> Result<Self, LexiconError> {
        self.vocabulary = read_word_list(path)?;
        Ok(self)
    }

    /// Replaces the vocabulary with an explicit word list.
    pub fn with_vocabulary_words<I>(mut self, words: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.vocabulary = words.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the stopword set with the words listed in `path`.
    pub fn with_stopword_file(mut self, path: &Path) -> Result<Self, LexiconError> {
        self.stopwords = read_word_list(path)?;
        Ok(self)
    }

    /// Replaces the valence table with a VADER-format file
    /// (`token<TAB>mean[<TAB>...]`).
    pub fn with_valence_file(mut self, path: &Path) -> Result<Self, LexiconError> {
        let content = read_file(path)?;
        let mut valences = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split('\t');
            let token = fields.next().map(str::trim).unwrap_or_default();
            let valence = fields.next().and_then(|v| v.trim().parse::<f64>().ok());
            match valence {
                Some(v) if !token.is_empty() => {
                    valences.insert(token.to_lowercase(), v);
                }
                _ => {
                    return Err(LexiconError::Malformed {
                        path: path.display().to_string(),
                        line: idx + 1,
                    })
                }
            }
        }
        self.valences = valences;
        Ok(self)
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    pub fn in_vocabulary(&self, word: &str) -> bool {
        self.vocabulary.contains(word)
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Compound polarity of a single token in [-1, 1]. Unknown tokens are 0.
    pub fn compound(&self, token: &str) -> f64 {
        match self.valences.get(token) {
            Some(&v) => normalize_valence(v),
            None => 0.0,
        }
    }

    fn is_known(&self, word: &str) -> bool {
        self.vocabulary.contains(word) || self.valences.contains_key(word)
    }

    /// Reduces `word` to its base form.
    ///
    /// Candidates come from the irregular table and then the suffix rules; the
    /// first candidate that is a known word wins. A word with no known base
    /// form is returned unchanged.
    pub fn lemmatize(&self, word: &str) -> String {
        if self.is_known(word) {
            return word.to_string();
        }
        if let Some(base) = self.irregular.get(word).filter(|base| self.is_known(base)) {
            return base.clone();
        }
        for (suffix, replacement) in SUFFIX_RULES {
            if let Some(stem) = word.strip_suffix(suffix) {
                if stem.is_empty() {
                    continue;
                }
                let candidate = format!("{stem}{replacement}");
                if self.is_known(&candidate) {
                    return candidate;
                }
            }
        }
        word.to_string()
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Squashes a raw valence into [-1, 1] the way VADER's compound score does.
pub fn normalize_valence(valence: f64) -> f64 {
    let norm = valence / (valence * valence + VALENCE_ALPHA).sqrt();
    norm.clamp(-1.0, 1.0)
}

fn read_file(path: &Path) -> Result<String, LexiconError> {
    std::fs::read_to_string(path).map_err(|source| LexiconError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn read_word_list(path: &Path) -> Result<HashSet<String>, LexiconError> {
    Ok(read_file(path)?
        .lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|line| !line.is_empty())
        .collect())
}
