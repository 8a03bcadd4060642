//! Per-language engine cache.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::language::Language;
use crate::SynthesisEngine;

type Factory<E> =
    Box<dyn Fn(Language) -> Result<E, <E as SynthesisEngine>::Error> + Send + Sync>;

/// Lazily builds and caches one engine per [`Language`].
///
/// Engine construction is expensive and blocking. Each language owns a
/// once-cell, so concurrent first requests for the same language build a single
/// engine while the others wait, and requests for different languages never
/// wait on each other. A failed construction leaves the slot empty; the next
/// request for that language tries again.
pub struct EngineRegistry<E: SynthesisEngine> {
    factory: Factory<E>,
    slots: Mutex<HashMap<Language, Arc<OnceCell<Arc<E>>>>>,
}

impl<E: SynthesisEngine> EngineRegistry<E> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(Language) -> Result<E, E::Error> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Get the engine for `lang`, constructing it on first use.
    pub fn get(&self, lang: Language) -> Result<Arc<E>, E::Error> {
        let slot = Arc::clone(self.slots.lock().entry(lang).or_default());

        slot.get_or_try_init(|| {
            log::info!("Loading engine for lang_code='{lang}'");
            let engine = (self.factory)(lang)?;
            log::info!("Engine for lang_code='{lang}' ready");
            Ok(Arc::new(engine))
        })
        .map(Arc::clone)
    }

    /// Construct the engines for `langs` ahead of the first request.
    pub fn preload(&self, langs: &[Language]) -> Result<(), E::Error> {
        for &lang in langs {
            self.get(lang)?;
        }
        Ok(())
    }

    pub fn is_loaded(&self, lang: Language) -> bool {
        self.slots
            .lock()
            .get(&lang)
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Languages with a constructed engine, sorted by code.
    pub fn loaded(&self) -> Vec<Language> {
        let mut langs: Vec<Language> = self
            .slots
            .lock()
            .iter()
            .filter(|(_, slot)| slot.get().is_some())
            .map(|(&lang, _)| lang)
            .collect();
        langs.sort_unstable_by_key(|lang| lang.code());
        langs
    }

    /// Drop every cached engine. Requests still holding an engine keep it
    /// alive until they finish.
    pub fn clear(&self) {
        let dropped = std::mem::take(&mut *self.slots.lock());
        if !dropped.is_empty() {
            log::info!("Releasing {} cached engine slot(s)", dropped.len());
        }
    }
}

impl<E: SynthesisEngine> Drop for EngineRegistry<E> {
    fn drop(&mut self) {
        self.clear();
    }
}
