//! Language -> plugin lookup. One process-wide registry, built once and
//! shared behind `once_cell::sync::Lazy` the way the teacher wires up
//! its analyzer registry.

use crate::plugin::{plugin_for, LanguagePlugin};
use scalpel_core::Language;
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub struct PluginRegistry {
    plugins: HashMap<Language, Box<dyn LanguagePlugin>>,
}

impl PluginRegistry {
    fn build() -> Self {
        let languages = [
            Language::Python,
            Language::TypeScript,
            Language::JavaScript,
            Language::Java,
            Language::Go,
            Language::Cpp,
        ];
        let plugins = languages
            .into_iter()
            .map(|lang| (lang, plugin_for(lang)))
            .collect();
        Self { plugins }
    }

    pub fn get(&self, language: Language) -> &dyn LanguagePlugin {
        self.plugins
            .get(&language)
            .expect("registry is pre-populated for every Language variant")
            .as_ref()
    }
}

static REGISTRY: Lazy<PluginRegistry> = Lazy::new(PluginRegistry::build);

pub fn registry() -> &'static PluginRegistry {
    &REGISTRY
}
