//! Static catalog of the voices the service offers.

use serde::Serialize;

use crate::language::Language;

/// A selectable voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Voice {
    pub id: &'static str,
    pub label: &'static str,
    pub lang: Language,
}

/// Response body listing the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct VoiceList {
    pub voices: &'static [Voice],
}

const fn voice(id: &'static str, label: &'static str, lang: Language) -> Voice {
    Voice { id, label, lang }
}

static VOICES: [Voice; 14] = [
    voice("af_heart", "Heart (US, Female)", Language::AmericanEnglish),
    voice("af_bella", "Bella (US, Female)", Language::AmericanEnglish),
    voice("af_nicole", "Nicole (US, Female)", Language::AmericanEnglish),
    voice("af_sarah", "Sarah (US, Female)", Language::AmericanEnglish),
    voice("af_sky", "Sky (US, Female)", Language::AmericanEnglish),
    voice("am_adam", "Adam (US, Male)", Language::AmericanEnglish),
    voice("am_michael", "Michael (US, Male)", Language::AmericanEnglish),
    voice("bf_emma", "Emma (UK, Female)", Language::BritishEnglish),
    voice("bf_isabella", "Isabella (UK, Female)", Language::BritishEnglish),
    voice("bm_george", "George (UK, Male)", Language::BritishEnglish),
    voice("bm_lewis", "Lewis (UK, Male)", Language::BritishEnglish),
    voice("pf_dora", "Dora (BR, Female)", Language::BrazilianPortuguese),
    voice("pm_alex", "Alex (BR, Male)", Language::BrazilianPortuguese),
    voice("pm_santa", "Santa (BR, Male)", Language::BrazilianPortuguese),
];

/// All catalog voices, in display order.
pub fn voices() -> &'static [Voice] {
    &VOICES
}

pub fn voice_list() -> VoiceList {
    VoiceList { voices: &VOICES }
}

pub fn find(id: &str) -> Option<&'static Voice> {
    VOICES.iter().find(|v| v.id == id)
}
