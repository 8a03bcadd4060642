//! Language variants and the voice-prefix table that selects them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A language/accent variant. Each variant is served by its own engine
/// instance, keyed by its single-character code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "char", try_from = "char")]
pub enum Language {
    AmericanEnglish,
    BritishEnglish,
    Spanish,
    French,
    Hindi,
    Italian,
    Japanese,
    BrazilianPortuguese,
    MandarinChinese,
}

impl Language {
    /// Used when a voice prefix is empty or unknown.
    pub const BASELINE: Language = Language::AmericanEnglish;

    pub const ALL: [Language; 9] = [
        Language::AmericanEnglish,
        Language::BritishEnglish,
        Language::Spanish,
        Language::French,
        Language::Hindi,
        Language::Italian,
        Language::Japanese,
        Language::BrazilianPortuguese,
        Language::MandarinChinese,
    ];

    /// Single-character language code.
    pub fn code(self) -> char {
        match self {
            Language::AmericanEnglish => 'a',
            Language::BritishEnglish => 'b',
            Language::Spanish => 'e',
            Language::French => 'f',
            Language::Hindi => 'h',
            Language::Italian => 'i',
            Language::Japanese => 'j',
            Language::BrazilianPortuguese => 'p',
            Language::MandarinChinese => 'z',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.code() == code)
    }

    /// Derive the language from a voice id such as `pf_dora`.
    ///
    /// Voice ids start with their language code. An empty id or an unknown
    /// prefix falls back to [`Language::BASELINE`].
    pub fn for_voice(voice: &str) -> Self {
        voice
            .chars()
            .next()
            .and_then(Self::from_code)
            .unwrap_or(Self::BASELINE)
    }

    /// espeak-ng voice used to phonemize this language.
    pub fn espeak_code(self) -> &'static str {
        match self {
            Language::AmericanEnglish => "en-us",
            Language::BritishEnglish => "en-gb",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::Hindi => "hi",
            Language::Italian => "it",
            Language::Japanese => "ja",
            Language::BrazilianPortuguese => "pt-br",
            Language::MandarinChinese => "cmn",
        }
    }

    /// Whether words can be phonemized independently and timed one by one.
    ///
    /// Only English is aligned per word; other languages lose cross-word
    /// phonology (liaison, tone sandhi, unsegmented scripts) when split.
    pub fn is_word_aligned(self) -> bool {
        matches!(self, Language::AmericanEnglish | Language::BritishEnglish)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<Language> for char {
    fn from(lang: Language) -> char {
        lang.code()
    }
}

impl TryFrom<char> for Language {
    type Error = String;

    fn try_from(code: char) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown language code '{code}'"))
    }
}
