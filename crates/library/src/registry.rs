use crate::native::NATIVE_KEYWORDS;
use autokw_core::AutomationEngine;
use std::cell::OnceCell;
use std::collections::HashSet;
use tracing::debug;

/// Native keyword the host calls to fetch the catalog; never published itself.
pub const CATALOG_ACCESSOR: &str = "get_keyword_names";

/// Engine operation withheld from the catalog (clashes with the host's own
/// sleep keyword).
pub const WITHHELD_ENGINE_OPERATION: &str = "sleep";

/// Names with this prefix are private to their provider.
const PRIVATE_PREFIX: char = '_';

/// Cached keyword names of both providers.
///
/// Both lists are computed on first use and kept for the registry's
/// lifetime; an engine's operation set does not change after connection.
#[derive(Debug, Default)]
pub struct KeywordRegistry {
    native: OnceCell<Vec<String>>,
    external: OnceCell<ExternalCatalog>,
}

#[derive(Debug)]
struct ExternalCatalog {
    names: Vec<String>,
    index: HashSet<String>,
}

impl KeywordRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Public native keyword names, sorted.
    pub fn native_keywords(&self) -> &[String] {
        self.native.get_or_init(|| {
            let mut names: Vec<String> = NATIVE_KEYWORDS
                .iter()
                .map(|kw| kw.name)
                .filter(|name| is_public(name) && *name != CATALOG_ACCESSOR)
                .map(str::to_string)
                .collect();
            names.sort();
            debug!(count = names.len(), "Native keywords registered");
            names
        })
    }

    /// Public engine operation names, sorted, without the withheld sleep.
    pub fn external_keywords<E: AutomationEngine + ?Sized>(&self, engine: &E) -> &[String] {
        &self.external_catalog(engine).names
    }

    /// Whether `name` is an operation the engine publishes.
    pub fn is_external<E: AutomationEngine + ?Sized>(&self, name: &str, engine: &E) -> bool {
        self.external_catalog(engine).index.contains(name)
    }

    /// The full catalog: native names, then engine names not shadowed by a
    /// native keyword.
    pub fn keyword_names<E: AutomationEngine + ?Sized>(&self, engine: &E) -> Vec<String> {
        let native = self.native_keywords();
        let shadowed: HashSet<&str> = native.iter().map(String::as_str).collect();
        native
            .iter()
            .chain(
                self.external_keywords(engine)
                    .iter()
                    .filter(|name| !shadowed.contains(name.as_str())),
            )
            .cloned()
            .collect()
    }

    fn external_catalog<E: AutomationEngine + ?Sized>(&self, engine: &E) -> &ExternalCatalog {
        self.external.get_or_init(|| {
            let mut names: Vec<String> = engine
                .operations()
                .into_iter()
                .filter(|name| {
                    is_public(name) && !name.eq_ignore_ascii_case(WITHHELD_ENGINE_OPERATION)
                })
                .collect();
            names.sort();
            names.dedup();
            debug!(count = names.len(), "Engine operations registered");
            let index = names.iter().cloned().collect();
            ExternalCatalog { names, index }
        })
    }
}

fn is_public(name: &str) -> bool {
    !name.is_empty() && !name.starts_with(PRIVATE_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use autokw_core::{EngineError, Value};
    use std::cell::Cell;

    /// Engine with a fixed operation list that counts enumerations.
    struct ListedEngine {
        ops: Vec<&'static str>,
        enumerations: Cell<usize>,
    }

    impl ListedEngine {
        fn new(ops: Vec<&'static str>) -> Self {
            Self {
                ops,
                enumerations: Cell::new(0),
            }
        }
    }

    impl AutomationEngine for ListedEngine {
        fn operations(&self) -> Vec<String> {
            self.enumerations.set(self.enumerations.get() + 1);
            self.ops.iter().map(|s| s.to_string()).collect()
        }

        fn invoke(
            &mut self,
            _name: &str,
            _args: &[Value],
            _kwargs: &[(String, Value)],
        ) -> Result<Value, EngineError> {
            Ok(Value::Null)
        }

        fn error(&self) -> i64 {
            0
        }

        fn version(&self) -> String {
            "listed".to_string()
        }
    }

    #[test]
    fn test_native_excludes_catalog_accessor() {
        let registry = KeywordRegistry::new();
        let native = registry.native_keywords();
        assert!(!native.iter().any(|n| n == CATALOG_ACCESSOR));
        assert!(native.iter().any(|n| n == "WinWait"));
        assert!(native.iter().all(|n| !n.starts_with('_')));
    }

    #[test]
    fn test_external_filters_private_and_sleep() {
        let engine = ListedEngine::new(vec!["Send", "_Internal", "Sleep", "sleep", "ControlClick"]);
        let registry = KeywordRegistry::new();
        assert_eq!(registry.external_keywords(&engine), ["ControlClick", "Send"]);
    }

    #[test]
    fn test_native_wins_name_collision() {
        let engine = ListedEngine::new(vec!["Run", "Send"]);
        let registry = KeywordRegistry::new();
        let names = registry.keyword_names(&engine);

        assert_eq!(names.iter().filter(|n| *n == "Run").count(), 1);
        let native_run = registry.native_keywords().iter().position(|n| n == "Run");
        assert_eq!(names.iter().position(|n| n == "Run"), native_run);
        assert_eq!(names.last().map(String::as_str), Some("Send"));
    }

    #[test]
    fn test_catalog_has_no_duplicates() {
        let engine = ListedEngine::new(vec!["Send", "Send", "WinWait", "MouseMove"]);
        let registry = KeywordRegistry::new();
        let names = registry.keyword_names(&engine);
        let unique: HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_catalog_is_cached() {
        let engine = ListedEngine::new(vec!["Send"]);
        let registry = KeywordRegistry::new();
        let first = registry.keyword_names(&engine);
        let second = registry.keyword_names(&engine);
        assert_eq!(first, second);
        assert!(registry.is_external("Send", &engine));
        assert_eq!(engine.enumerations.get(), 1);
    }
}
