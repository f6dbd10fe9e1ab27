//! Registry loading: recoverable skips, fatal empty loads, ordering,
//! load-once memoization, reload (including reload racing the first load).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use test_fixtures::{broken_rules_dir, rules_dir, FixedRule, OfflineRepository};
use toets_cache::InvalidationCause;
use toets_core::config::RegistryConfig;
use toets_core::errors::{ConfigError, RegistryError, ToetsErrorCode};
use toets_core::models::RuleDefinition;
use toets_rules::{
    BuiltinDeps, DirectorySource, InlineSource, RuleCatalog, RuleRegistry, RuleSource,
    SourceRecord, StaticSource,
};

fn builtin_with_repository() -> RuleCatalog {
    RuleCatalog::builtin(BuiltinDeps {
        repository: Some(Arc::new(OfflineRepository)),
        ..BuiltinDeps::default()
    })
}

/// Counts how often the registry reads it.
struct CountingSource<S> {
    inner: S,
    reads: Arc<AtomicUsize>,
}

impl<S: RuleSource> RuleSource for CountingSource<S> {
    fn name(&self) -> String {
        self.inner.name()
    }

    fn read(&self) -> Result<Vec<SourceRecord>, ConfigError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read()
    }
}

#[test]
fn loads_fixture_directory_in_category_order() {
    let registry = RuleRegistry::new(
        Box::new(DirectorySource::new(rules_dir())),
        builtin_with_repository(),
        &RegistryConfig::default(),
    );
    let ids: Vec<String> = registry
        .list_enabled()
        .unwrap()
        .iter()
        .map(|r| r.id().to_string())
        .collect();
    assert_eq!(ids, vec!["CON-01", "ESS-01", "SAM-01", "STR-01", "STR-02"]);
}

#[test]
fn malformed_records_are_skipped_not_fatal() {
    let registry = RuleRegistry::new(
        Box::new(DirectorySource::new(broken_rules_dir())),
        builtin_with_repository(),
        &RegistryConfig::default(),
    );
    let set = registry.rule_set().unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(set.skipped(), 5);
    // The first CON-01 wins over the later duplicate id.
    assert_eq!(registry.get("CON-01").unwrap().definition().category, "CON");
}

#[test]
fn duplicate_definition_is_skipped_without_a_repository() {
    let registry = RuleRegistry::new(
        Box::new(DirectorySource::new(rules_dir())),
        RuleCatalog::builtin(BuiltinDeps::default()),
        &RegistryConfig::default(),
    );
    assert!(matches!(
        registry.get("SAM-01"),
        Err(RegistryError::NotFound { .. })
    ));
    assert_eq!(registry.list_enabled().unwrap().len(), 4);
}

#[test]
fn zero_loaded_rules_is_a_config_error() {
    let source = InlineSource::new()
        .with_record("a.toml", "id = ")
        .with_record("b.toml", "id = \"X\"\ncategory = \"STR\"\nkind = \"nope\"");
    let registry = RuleRegistry::new(
        Box::new(source),
        RuleCatalog::builtin(BuiltinDeps::default()),
        &RegistryConfig::default(),
    );
    let err = registry.list_enabled().unwrap_err();
    assert_eq!(
        err,
        ConfigError::NoRulesLoaded {
            source_name: "inline".to_string(),
            skipped: 2
        }
    );
    assert_eq!(err.error_code(), "NO_RULES_LOADED");

    let err = registry.get("X").unwrap_err();
    assert!(matches!(err, RegistryError::Config(_)));
}

#[test]
fn missing_directory_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let registry = RuleRegistry::new(
        Box::new(DirectorySource::new(dir.path().join("absent"))),
        RuleCatalog::builtin(BuiltinDeps::default()),
        &RegistryConfig::default(),
    );
    assert!(matches!(
        registry.list_enabled(),
        Err(ConfigError::SourceUnreadable { .. })
    ));
}

#[test]
fn failed_load_is_retried_once_files_appear() {
    let dir = tempfile::tempdir().unwrap();
    let registry = RuleRegistry::new(
        Box::new(DirectorySource::new(dir.path())),
        RuleCatalog::builtin(BuiltinDeps::default()),
        &RegistryConfig::default(),
    );
    assert!(registry.list_enabled().is_err());

    std::fs::write(
        dir.path().join("len.toml"),
        "id = \"LEN\"\ncategory = \"STR\"\nkind = \"length_bounds\"\n[parameters]\nmax_words = 10\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    assert_eq!(registry.list_enabled().unwrap().len(), 1);
}

#[test]
fn concurrent_first_calls_load_once() {
    let reads = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(RuleRegistry::new(
        Box::new(CountingSource {
            inner: DirectorySource::new(rules_dir()),
            reads: Arc::clone(&reads),
        }),
        builtin_with_repository(),
        &RegistryConfig::default(),
    ));

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.list_enabled().unwrap()
            })
        })
        .collect();
    let lists: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(reads.load(Ordering::SeqCst), 1);
    assert!(lists.iter().all(|l| Arc::ptr_eq(l, &lists[0])));
}

#[test]
fn reload_reads_again_and_notifies_listeners() {
    let reads = Arc::new(AtomicUsize::new(0));
    let registry = RuleRegistry::new(
        Box::new(CountingSource {
            inner: DirectorySource::new(rules_dir()),
            reads: Arc::clone(&reads),
        }),
        builtin_with_repository(),
        &RegistryConfig::default(),
    );
    let causes = Arc::new(std::sync::Mutex::new(Vec::new()));
    let seen = Arc::clone(&causes);
    registry.on_reload(move |cause| seen.lock().unwrap().push(cause));

    registry.list_enabled().unwrap();
    registry.list_enabled().unwrap();
    assert_eq!(reads.load(Ordering::SeqCst), 1);

    assert!(registry.reload());
    assert!(!registry.reload());
    registry.list_enabled().unwrap();
    assert_eq!(reads.load(Ordering::SeqCst), 2);
    assert_eq!(*causes.lock().unwrap(), vec![InvalidationCause::Explicit]);
}

/// Holds its first read open until the test lets it finish.
struct GatedSource {
    inner: DirectorySource,
    reads: Arc<AtomicUsize>,
    started: Arc<Barrier>,
    release: Arc<Barrier>,
}

impl RuleSource for GatedSource {
    fn name(&self) -> String {
        self.inner.name()
    }

    fn read(&self) -> Result<Vec<SourceRecord>, ConfigError> {
        if self.reads.fetch_add(1, Ordering::SeqCst) == 0 {
            self.started.wait();
            self.release.wait();
        }
        self.inner.read()
    }
}

#[test]
fn reload_during_first_load_is_not_lost() {
    let reads = Arc::new(AtomicUsize::new(0));
    let started = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));
    let registry = Arc::new(RuleRegistry::new(
        Box::new(GatedSource {
            inner: DirectorySource::new(rules_dir()),
            reads: Arc::clone(&reads),
            started: Arc::clone(&started),
            release: Arc::clone(&release),
        }),
        builtin_with_repository(),
        &RegistryConfig::default(),
    ));

    let first = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || registry.rule_set().unwrap())
    };
    started.wait();
    assert!(!registry.reload());
    release.wait();

    let stale = first.join().unwrap();
    let fresh = registry.rule_set().unwrap();
    assert!(!Arc::ptr_eq(&stale, &fresh));
    assert_eq!(reads.load(Ordering::SeqCst), 2);
}

#[test]
fn overrides_disable_and_reweight() {
    let config = RegistryConfig {
        disabled_rules: vec!["STR-02".to_string()],
        rule_weights: [("CON-01".to_string(), 3.0)].into_iter().collect(),
        ..RegistryConfig::default()
    };
    let registry = RuleRegistry::new(
        Box::new(DirectorySource::new(rules_dir())),
        builtin_with_repository(),
        &config,
    );

    let enabled = registry.list_enabled().unwrap();
    assert!(enabled.iter().all(|r| r.id() != "STR-02"));
    assert!(!registry.get("STR-02").unwrap().definition().enabled);
    assert_eq!(registry.get("CON-01").unwrap().definition().weight, 3.0);
}

#[test]
fn custom_kinds_and_static_sources() {
    let mut catalog = RuleCatalog::empty();
    catalog.register("always_pass", |_def| Ok(Box::new(FixedRule::passing())));

    let registry = RuleRegistry::new(
        Box::new(StaticSource::new(vec![
            RuleDefinition::new("B", "X", "always_pass"),
            RuleDefinition::new("A", "X", "always_pass"),
            RuleDefinition::new("NEG", "X", "always_pass").with_weight(-1.0),
        ])),
        catalog,
        &RegistryConfig::default(),
    );
    let set = registry.rule_set().unwrap();
    let enabled = set.enabled();
    let ids: Vec<&str> = enabled.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec!["A", "B"]);
    assert_eq!(set.skipped(), 1);
}
