use std::collections::HashMap;
use std::path::Path;

use crate::error::{PipelineError, Result};

/// Irregular forms and auxiliaries that suffix rules get wrong.
const IRREGULAR_FORMS: &[(&str, &str)] = &[
    // be / have / do
    ("am", "be"),
    ("is", "be"),
    ("are", "be"),
    ("was", "be"),
    ("were", "be"),
    ("been", "be"),
    ("being", "be"),
    ("has", "have"),
    ("had", "have"),
    ("having", "have"),
    ("does", "do"),
    ("did", "do"),
    ("done", "do"),
    ("doing", "do"),
    // irregular verbs
    ("ate", "eat"),
    ("eaten", "eat"),
    ("bought", "buy"),
    ("brought", "bring"),
    ("came", "come"),
    ("coming", "come"),
    ("felt", "feel"),
    ("found", "find"),
    ("gave", "give"),
    ("given", "give"),
    ("giving", "give"),
    ("went", "go"),
    ("gone", "go"),
    ("goes", "go"),
    ("got", "get"),
    ("gotten", "get"),
    ("knew", "know"),
    ("known", "know"),
    ("left", "leave"),
    ("lost", "lose"),
    ("made", "make"),
    ("making", "make"),
    ("meant", "mean"),
    ("paid", "pay"),
    ("said", "say"),
    ("saw", "see"),
    ("seen", "see"),
    ("sent", "send"),
    ("sold", "sell"),
    ("spent", "spend"),
    ("taken", "take"),
    ("took", "take"),
    ("taking", "take"),
    ("taught", "teach"),
    ("thought", "think"),
    ("told", "tell"),
    ("understood", "understand"),
    ("wore", "wear"),
    ("worn", "wear"),
    ("won", "win"),
    ("wrote", "write"),
    ("written", "write"),
    ("broke", "break"),
    ("broken", "break"),
    ("chose", "choose"),
    ("chosen", "choose"),
    ("ran", "run"),
    ("began", "begin"),
    ("begun", "begin"),
    ("kept", "keep"),
    ("slept", "sleep"),
    ("stood", "stand"),
    ("held", "hold"),
    ("fell", "fall"),
    ("fallen", "fall"),
    ("flew", "fly"),
    ("grew", "grow"),
    ("grown", "grow"),
    ("hid", "hide"),
    ("hidden", "hide"),
    ("drove", "drive"),
    ("driven", "drive"),
    ("used", "use"),
    ("dying", "die"),
    ("lying", "lie"),
    ("tying", "tie"),
    // silent-e stems the rules below cannot tell apart
    ("adored", "adore"),
    ("adoring", "adore"),
    ("created", "create"),
    ("creating", "create"),
    ("completed", "complete"),
    ("deleted", "delete"),
    ("excited", "excite"),
    ("invited", "invite"),
    ("united", "unite"),
    ("focused", "focus"),
    ("focusing", "focus"),
    ("biased", "bias"),
    // -ie nouns
    ("movies", "movie"),
    ("cookies", "cookie"),
    ("rookies", "rookie"),
    ("zombies", "zombie"),
    ("hoodies", "hoodie"),
    ("selfies", "selfie"),
    ("smoothies", "smoothie"),
    ("brownies", "brownie"),
    ("calories", "calorie"),
    ("goodies", "goodie"),
    ("freebies", "freebie"),
    ("genies", "genie"),
    ("buses", "bus"),
    // irregular plurals
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("people", "person"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("lives", "life"),
    ("knives", "knife"),
    ("wives", "wife"),
    ("leaves", "leaf"),
    ("shelves", "shelf"),
    ("halves", "half"),
    // comparatives
    ("better", "well"),
    ("best", "good"),
    ("worse", "bad"),
    ("worst", "bad"),
];

/// Words with a suffix that is not an inflection.
const KEEP_AS_IS: &[&str] = &[
    "always", "bus", "business", "ceiling", "class", "during", "evening", "everything", "glass",
    "king", "less", "lens", "morning", "news", "nothing", "series", "species", "something",
    "anything", "spring", "string", "thing", "wedding", "wing", "yes", "red", "bed", "need",
    "speed", "feed", "seed", "hundred", "indeed", "bring", "sing", "ring", "swing", "sting",
    // -ing adjectives
    "amazing", "annoying", "boring", "charming", "confusing", "disappointing", "exciting",
    "frustrating", "interesting", "outstanding", "refreshing", "relaxing", "satisfying",
    "stunning", "surprising", "underwhelming", "overwhelming", "loving", "caring",
];

fn is_vowel(c: u8) -> bool {
    matches!(c, b'a' | b'e' | b'i' | b'o' | b'u')
}

fn has_vowel(stem: &str) -> bool {
    stem.bytes().any(|c| is_vowel(c) || c == b'y')
}

/// Whether a stem left by `-ed`/`-ing` lost a final `e` (`charg`, `produc`,
/// `lov`, `hop`).
fn needs_silent_e(stem: &str) -> bool {
    let bytes = stem.as_bytes();
    let consonant = |c: u8| !is_vowel(c) && c != b'y';
    let long = bytes.len() >= 5;

    // Endings no English base word has.
    let lost_e = match *bytes {
        [.., b'v' | b'c'] => true,
        [.., a, b'z' | b's'] => a != b'z' && a != b's',
        [.., b'r' | b'd' | b'l', b'g'] => true,
        [.., b'h' | b'r', b'a', b'n', b'g'] | [.., b'e', b'n', b'g'] => long,
        [.., b'a', b'g'] => long,
        [.., x, b'l'] => consonant(x) && !matches!(x, b'l' | b'r' | b'w'),
        [.., b'u', b'r'] => true,
        [.., a, b'i', b'r'] => a != b'a',
        [.., x, b'a' | b'u', b't'] => long && !matches!(x, b'a' | b'e' | b'o'),
        [.., x, b'i', b'd'] => bytes.len() >= 4 && consonant(x),
        [.., x, b'o' | b'u', b'd'] => long && consonant(x),
        [.., x, b'i', b'n' | b'b'] => long && consonant(x),
        [.., x, b'a', b'r'] => long && consonant(x),
        [.., w, x, b'o', b'r'] => long && consonant(w) && consonant(x),
        _ => false,
    };
    if lost_e {
        return true;
    }

    // Single syllable ending consonant-vowel-consonant.
    let vowel_groups = bytes
        .windows(2)
        .filter(|w| !is_vowel(w[0]) && is_vowel(w[1]))
        .count()
        + usize::from(bytes.first().is_some_and(|&c| is_vowel(c)));
    if vowel_groups != 1 {
        return false;
    }
    match bytes {
        [.., a, b, c] => {
            !is_vowel(*a) && is_vowel(*b) && !is_vowel(*c) && !matches!(c, b'w' | b'x' | b'y')
        }
        [b, c] => is_vowel(*b) && !is_vowel(*c),
        _ => false,
    }
}

fn undouble(stem: &str) -> Option<&str> {
    let bytes = stem.as_bytes();
    match bytes {
        [.., a, b] if a == b && !is_vowel(*a) && !matches!(a, b'l' | b's' | b'z') => {
            Some(&stem[..stem.len() - 1])
        }
        _ => None,
    }
}

fn verb_stem(stem: &str) -> String {
    if let Some(short) = undouble(stem) {
        short.to_string()
    } else if needs_silent_e(stem) {
        format!("{stem}e")
    } else {
        stem.to_string()
    }
}

/// Lookup lemmatizer for English.
///
/// Table entries win; words not in the table go through conservative suffix
/// rules for regular plurals and verb inflections. Non-ASCII words are left
/// untouched.
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    table: HashMap<String, String>,
}

impl Lemmatizer {
    /// Lemmatizer with the built-in English table.
    pub fn english() -> Self {
        let mut table: HashMap<String, String> = IRREGULAR_FORMS
            .iter()
            .map(|(form, lemma)| (form.to_string(), lemma.to_string()))
            .collect();
        for word in KEEP_AS_IS {
            table.insert(word.to_string(), word.to_string());
        }
        Self { table }
    }

    /// Add or override lookup entries.
    pub fn extend<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.table.extend(
            entries
                .into_iter()
                .map(|(form, lemma)| (form.into().to_lowercase(), lemma.into())),
        );
    }

    /// Merge a lookup table stored as a JSON object `{ "form": "lemma" }`.
    pub fn merge_table_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::ModelLoad(format!(
                "Failed to read lemma table '{}': {}",
                path.display(),
                e
            ))
        })?;
        let entries: HashMap<String, String> = serde_json::from_str(&content).map_err(|e| {
            PipelineError::ModelLoad(format!(
                "Invalid lemma table '{}': {}",
                path.display(),
                e
            ))
        })?;
        self.extend(entries);
        Ok(())
    }

    /// Canonical form of a lowercase word.
    pub fn lemmatize(&self, word: &str) -> String {
        if let Some(lemma) = self.table.get(word) {
            return lemma.clone();
        }
        if !word.is_ascii() || word.len() <= 3 {
            return word.to_string();
        }

        if let Some(stem) = word.strip_suffix("ies") {
            // `ties`, `pies`; longer `-ie` nouns are in the table.
            return if stem.len() == 1 {
                format!("{stem}ie")
            } else {
                format!("{stem}y")
            };
        }
        for suffix in ["sses", "ches", "shes", "xes", "zes"] {
            if word.ends_with(suffix) {
                return word[..word.len() - 2].to_string();
            }
        }
        if word.ends_with('s') && !["ss", "us", "is"].iter().any(|s| word.ends_with(s)) {
            return word[..word.len() - 1].to_string();
        }

        if let Some(stem) = word.strip_suffix("ing") {
            if stem.len() >= 2 && has_vowel(stem) {
                return verb_stem(stem);
            }
            return word.to_string();
        }
        if let Some(stem) = word.strip_suffix("ied") {
            return if stem.len() == 1 {
                format!("{stem}ie")
            } else {
                format!("{stem}y")
            };
        }
        if let Some(stem) = word.strip_suffix("ed") {
            if stem.ends_with('e') {
                // agreed, freed
                return format!("{stem}e");
            }
            if stem.len() >= 2 && has_vowel(stem) {
                return verb_stem(stem);
            }
        }

        word.to_string()
    }
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::english()
    }
}
