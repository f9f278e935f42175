//! Deterministic stand-ins for embedding models.
#![allow(dead_code)]

use semchunk::semantic::{Embedder, EmbeddingError, ModelProvider, SentenceModel, TokenCounter};
use std::sync::{Arc, Mutex};

/// Words that mark each topic dimension of [`StubKind::Topics`].
pub const TOPICS: &[&[&str]] = &[
    &["cat", "cats", "dog", "dogs", "pet", "pets", "kitten", "puppy"],
    &["stock", "stocks", "market", "markets", "price", "prices", "trade", "shares"],
    &["rain", "storm", "weather", "cloud", "clouds", "wind", "forecast", "snow"],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubKind {
    /// One dimension per topic, counting keyword hits.
    Topics,
    /// Same vector for every input.
    Uniform,
    /// Bag of words hashed into a fixed number of buckets.
    Hashing,
    /// Every call fails.
    Failing,
}

/// Stub embedder that also counts whitespace-separated words as tokens.
pub struct StubModel {
    name: String,
    kind: StubKind,
    calls: Mutex<Vec<Vec<String>>>,
}

impl StubModel {
    pub fn new(name: &str, kind: StubKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn topics() -> Arc<Self> {
        Arc::new(Self::new("stub/topics", StubKind::Topics))
    }

    pub fn uniform() -> Arc<Self> {
        Arc::new(Self::new("stub/uniform", StubKind::Uniform))
    }

    pub fn hashing() -> Arc<Self> {
        Arc::new(Self::new("stub/hashing", StubKind::Hashing))
    }

    /// Inputs of every embed call so far.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        match self.kind {
            StubKind::Topics => {
                let mut v = vec![0.0; TOPICS.len()];
                for word in words(text) {
                    for (dim, keywords) in TOPICS.iter().enumerate() {
                        if keywords.contains(&word.as_str()) {
                            v[dim] += 1.0;
                        }
                    }
                }
                v
            }
            StubKind::Uniform | StubKind::Failing => vec![0.5, 0.5, 0.5, 0.5],
            StubKind::Hashing => {
                let mut v = vec![0.0; 16];
                for word in words(text) {
                    v[(fnv1a(&word) % 16) as usize] += 1.0;
                }
                v
            }
        }
    }
}

impl Embedder for StubModel {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.lock().unwrap().push(texts.to_vec());
        if self.kind == StubKind::Failing {
            return Err(EmbeddingError::EmbeddingError("stub model failure".into()));
        }
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }
}

impl TokenCounter for StubModel {
    fn count_tokens(&self, text: &str) -> Result<usize, EmbeddingError> {
        Ok(text.split_whitespace().count())
    }
}

/// Provider serving the stub models by name. `None` selects `stub/topics`.
#[derive(Default)]
pub struct StubProvider;

impl ModelProvider for StubProvider {
    fn resolve(&self, model: Option<&str>) -> Result<SentenceModel, EmbeddingError> {
        let kind = match model.unwrap_or("stub/topics") {
            "stub/topics" => StubKind::Topics,
            "stub/uniform" => StubKind::Uniform,
            "stub/hashing" => StubKind::Hashing,
            "stub/failing" => StubKind::Failing,
            other => return Err(EmbeddingError::UnknownModel(other.to_string())),
        };
        let name = model.unwrap_or("stub/topics");
        Ok(SentenceModel::from_shared(Arc::new(StubModel::new(name, kind))))
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn fnv1a(word: &str) -> u64 {
    word.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// A sentence of exactly `n_words` words, starting with a capital and ending with a period.
pub fn sentence_of(n_words: usize, word: &str) -> String {
    let mut sentence = capitalize(word);
    for _ in 1..n_words.max(1) {
        sentence.push(' ');
        sentence.push_str(word);
    }
    sentence.push('.');
    sentence
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Collapse runs of whitespace to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
