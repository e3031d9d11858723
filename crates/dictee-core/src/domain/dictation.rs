//! Dictation texts and the content bank that supplies them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ContentError;

/// Grammar category of a rule annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Accord,
    Conjugaison,
    Homophones,
    Vocabulaire,
    #[serde(other)]
    Other,
}

impl RuleCategory {
    /// Label used in the spoken key-points sentence.
    #[must_use]
    pub const fn spoken_label(self) -> &'static str {
        match self {
            Self::Accord => "les accords",
            Self::Conjugaison => "la conjugaison",
            Self::Homophones => "les homophones",
            Self::Vocabulaire => "le vocabulaire",
            Self::Other => "divers points de langue",
        }
    }
}

/// A grammar point to check during correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarRule {
    /// The word or group the rule is about.
    pub word: String,
    pub category: RuleCategory,
    pub explanation: String,
}

/// One dictation text with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictation {
    pub id: u32,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub work: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub theme: Option<String>,
    /// 1 = easy, 2 = medium, 3 = hard.
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    /// Full source text, read aloud as-is.
    pub text: String,
    #[serde(default)]
    pub rules: Vec<GrammarRule>,
}

const fn default_difficulty() -> u8 {
    2
}

impl Dictation {
    fn validate(&self) -> Result<(), ContentError> {
        let invalid = |reason: &str| ContentError::InvalidDictation {
            id: self.id,
            reason: reason.to_string(),
        };
        if self.text.trim().is_empty() {
            return Err(invalid("empty text"));
        }
        if self.title.trim().is_empty() {
            return Err(invalid("empty title"));
        }
        if !(1..=3).contains(&self.difficulty) {
            return Err(invalid("difficulty must be between 1 and 3"));
        }
        Ok(())
    }
}

/// The static list of dictation texts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentBank {
    dictations: Vec<Dictation>,
}

impl ContentBank {
    /// Parse and validate a bank from its JSON form
    /// (`{ "dictations": [ ... ] }`).
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let bank: Self = serde_json::from_str(json)?;
        let mut seen = HashSet::new();
        for dictation in &bank.dictations {
            dictation.validate()?;
            if !seen.insert(dictation.id) {
                return Err(ContentError::DuplicateId(dictation.id));
            }
        }
        debug!(count = bank.dictations.len(), "Loaded content bank");
        Ok(bank)
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Dictation> {
        self.dictations.iter().find(|d| d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dictation> {
        self.dictations.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.dictations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dictations.is_empty()
    }
}
