//! Review text normalization.
//!
//! Turns raw review text into a space-joined sequence of lemmas, in a fixed
//! order of steps:
//!
//! 1. drop emoji (emoticons, pictographs, transport symbols, flags)
//! 2. lowercase
//! 3. drop URL-looking words (`http…`, `www…`)
//! 4. drop ASCII punctuation
//! 5. drop digits
//! 6. split into words, drop stopwords, lemmatize the rest
//!
//! Every step is total: empty input, whitespace-only input or input made only
//! of stopwords cleans to the empty string.
//!
//! ```rust
//! # fn main() -> sentilyze::error::Result<()> {
//! let cleaned = sentilyze::clean_text("Loved the 2 movies!!! 😍 https://example.com")?;
//! assert_eq!(cleaned, "love movie");
//! # Ok(())
//! # }
//! ```

mod lemmatizer;
mod stopwords;

use std::collections::HashSet;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use tokenizers::pre_tokenizers::whitespace::Whitespace;
use tokenizers::{OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer};

use crate::error::{PipelineError, Result};

pub use lemmatizer::Lemmatizer;

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"http\S+|www\S+").expect("valid URL regex"));
static DIGIT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid digit regex"));

static DEFAULT_NORMALIZER: Lazy<TextNormalizer> = Lazy::new(TextNormalizer::english);

fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F600..=0x1F64F | 0x1F300..=0x1F5FF | 0x1F680..=0x1F6FF | 0x1F1E0..=0x1F1FF
    )
}

/// Clean `text` with the default English normalizer.
///
/// See [`TextNormalizer::clean`].
pub fn clean_text(text: &str) -> Result<String> {
    DEFAULT_NORMALIZER.clean(text)
}

/// One word produced by the tokenizer step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedToken {
    /// Word as it appears after steps 1-5.
    pub text: String,
    /// Canonical dictionary form.
    pub lemma: String,
    /// Whether the word is a stopword.
    pub is_stop: bool,
}

/// Text normalizer with a stopword list and a lemmatizer.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    stopwords: HashSet<String>,
    lemmatizer: Lemmatizer,
}

impl TextNormalizer {
    /// English stopwords and the built-in English lemma table.
    pub fn english() -> Self {
        Self {
            stopwords: stopwords::ENGLISH_STOPWORDS
                .iter()
                .map(|w| w.to_string())
                .collect(),
            lemmatizer: Lemmatizer::english(),
        }
    }

    /// Start configuring a normalizer.
    pub fn builder() -> TextNormalizerBuilder {
        TextNormalizerBuilder::default()
    }

    /// Whether `word` (compared lowercase) is a stopword.
    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(&word.to_lowercase())
    }

    /// Steps 1-5: emoji, case, URLs, punctuation and digits.
    pub fn strip(&self, text: &str) -> String {
        let text: String = text.chars().filter(|&c| !is_emoji(c)).collect();
        let text = text.to_lowercase();
        let text = URL_PATTERN.replace_all(&text, "");
        let text: String = text.chars().filter(|c| !c.is_ascii_punctuation()).collect();
        DIGIT_PATTERN.replace_all(&text, "").into_owned()
    }

    /// Run steps 1-6 and return every word with its lemma and stopword flag,
    /// in original order.
    pub fn analyze(&self, text: &str) -> Result<Vec<AnalyzedToken>> {
        let stripped = self.strip(text);

        let mut pretokenized = PreTokenizedString::from(stripped.as_str());
        Whitespace::default()
            .pre_tokenize(&mut pretokenized)
            .map_err(|e| {
                PipelineError::Tokenization(format!(
                    "Word splitting failed on '{}': {}",
                    stripped.chars().take(50).collect::<String>(),
                    e
                ))
            })?;

        Ok(pretokenized
            .get_splits(OffsetReferential::Original, OffsetType::Byte)
            .into_iter()
            .map(|(word, _, _)| AnalyzedToken {
                text: word.to_string(),
                lemma: self.lemmatizer.lemmatize(word),
                is_stop: self.stopwords.contains(word),
            })
            .collect())
    }

    /// Space-joined lemmas of every non-stopword. Possibly empty.
    pub fn clean(&self, text: &str) -> Result<String> {
        let lemmas: Vec<String> = self
            .analyze(text)?
            .into_iter()
            .filter(|token| !token.is_stop)
            .map(|token| token.lemma)
            .collect();
        Ok(lemmas.join(" "))
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::english()
    }
}

/// Builder for [`TextNormalizer`].
///
/// ```rust
/// use sentilyze::normalizer::TextNormalizer;
///
/// # fn main() -> sentilyze::error::Result<()> {
/// let normalizer = TextNormalizer::builder()
///     .stopwords(["product"])
///     .lemmas([("awsome", "awesome")])
///     .build()?;
///
/// assert_eq!(normalizer.clean("This product is awsome")?, "awesome");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TextNormalizerBuilder {
    extra_stopwords: Vec<String>,
    extra_lemmas: Vec<(String, String)>,
    lemma_tables: Vec<PathBuf>,
}

impl TextNormalizerBuilder {
    /// Add stopwords on top of the English list.
    pub fn stopwords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_stopwords
            .extend(words.into_iter().map(|w| w.into().to_lowercase()));
        self
    }

    /// Add `(form, lemma)` lookup entries. They override the built-in table.
    pub fn lemmas<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.extra_lemmas
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Merge a JSON lookup table `{ "form": "lemma" }` at build time.
    pub fn lemma_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.lemma_tables.push(path.into());
        self
    }

    /// Build the normalizer, reading any lemma tables.
    pub fn build(self) -> Result<TextNormalizer> {
        let mut normalizer = TextNormalizer::english();
        normalizer.stopwords.extend(self.extra_stopwords);
        for path in &self.lemma_tables {
            normalizer.lemmatizer.merge_table_file(path)?;
        }
        normalizer.lemmatizer.extend(self.extra_lemmas);
        Ok(normalizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(text: &str) -> String {
        clean_text(text).unwrap()
    }

    #[test]
    fn empty_and_blank_input_clean_to_empty() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("   \t\n "), "");
    }

    #[test]
    fn removes_emoji_ranges() {
        assert_eq!(clean("great 😍🚀🇺🇸🌟"), "great");
    }

    #[test]
    fn keeps_symbols_outside_emoji_ranges() {
        // U+2764 HEAVY BLACK HEART is not in the stripped ranges.
        let stripped = TextNormalizer::english().strip("nice \u{2764}");
        assert_eq!(stripped, "nice \u{2764}");
    }

    #[test]
    fn removes_urls_anywhere() {
        assert_eq!(clean("awful https://shop.example/x?y=1 service"), "awful service");
        assert_eq!(clean("see www.example.com"), "");
        assert_eq!(clean("goodhttp://x"), "good");
    }

    #[test]
    fn removes_punctuation_and_digits() {
        let stripped = TextNormalizer::english().strip("Wow!!! 10/10, (would) buy-again #1");
        assert_eq!(stripped, "wow  would buyagain ");
    }

    #[test]
    fn drops_stopwords_and_lemmatizes() {
        assert_eq!(
            clean("The movies were amazing and I loved the actors"),
            "movie amazing love actor"
        );
        assert_eq!(clean("Charged twice for 3 cookies"), "charge twice cookie");
    }

    #[test]
    fn only_noise_cleans_to_empty() {
        assert_eq!(clean("😀 http://a.b 123 ?!... www.x.y 42"), "");
        assert_eq!(clean("it is what it is"), "");
    }

    #[test]
    fn analyze_reports_stopwords_in_order() {
        let tokens = TextNormalizer::english().analyze("The phones broke").unwrap();
        let triples: Vec<(&str, &str, bool)> = tokens
            .iter()
            .map(|t| (t.text.as_str(), t.lemma.as_str(), t.is_stop))
            .collect();
        assert_eq!(
            triples,
            vec![
                ("the", "the", true),
                ("phones", "phone", false),
                ("broke", "break", false)
            ]
        );
    }

    #[test]
    fn clean_is_stable_on_its_own_output() {
        for text in [
            "Terrible customer service, waited 3 hours!!!",
            "Absolutely loved it 😍 www.shop.com",
            "Products arrived broken; refund requested.",
        ] {
            let once = clean(text);
            assert_eq!(clean(&once), once, "input: {text}");
        }
    }

    #[test]
    fn builder_adds_stopwords() {
        let normalizer = TextNormalizer::builder()
            .stopwords(["Movie"])
            .build()
            .unwrap();
        assert!(normalizer.is_stopword("movie"));
        assert_eq!(normalizer.clean("Great movie").unwrap(), "great");
    }

    #[test]
    fn builder_reads_lemma_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lemmas.json");
        std::fs::write(&path, r#"{"luv": "love"}"#).unwrap();

        let normalizer = TextNormalizer::builder().lemma_table(&path).build().unwrap();
        assert_eq!(normalizer.clean("luv").unwrap(), "love");
    }

    #[test]
    fn missing_lemma_table_fails_build() {
        let result = TextNormalizer::builder()
            .lemma_table("/nonexistent/lemmas.json")
            .build();
        assert!(matches!(result, Err(PipelineError::ModelLoad(_))));
    }
}
