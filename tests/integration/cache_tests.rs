use super::common::Fixture;
use file_entry_cache::cache::{AnalyzedFiles, CacheConfig, FileEntryCache};
use file_entry_cache::store::PersistentStore;
use std::path::PathBuf;

#[test]
fn test_first_run_reports_every_file() {
    let fx = Fixture::new();
    let mut cache = fx.cache("testCache");

    assert_eq!(cache.get_updated_files(&fx.files), fx.keys());
}

#[test]
fn test_nothing_changed_after_reconcile() {
    let fx = Fixture::new();
    let mut cache = fx.cache("testCache");

    assert_eq!(cache.get_updated_files(&fx.files), fx.keys());
    cache.reconcile().unwrap();

    assert!(cache.get_updated_files(&fx.files).is_empty());
}

#[test]
fn test_unchanged_across_instances() {
    let fx = Fixture::new();
    let mut cache = fx.cache("testCache");
    cache.normalize_entries(&fx.files);
    cache.reconcile().unwrap();

    let mut reloaded = fx.cache("testCache");
    for file in &fx.files {
        assert!(!reloaded.has_file_changed(file));
    }
}

#[test]
fn test_only_modified_file_reported_by_new_instance() {
    let fx = Fixture::new();
    let mut cache = fx.cache("testCache");
    cache.get_updated_files(&fx.files);
    cache.reconcile().unwrap();

    fx.modify(1);

    let mut cache = fx.cache("testCache");
    assert_eq!(cache.get_updated_files(&fx.files), vec![fx.key(1)]);
}

#[test]
fn test_remove_entry_forces_redetection() {
    let fx = Fixture::new();
    let mut cache = fx.cache("testCache");
    assert_eq!(cache.get_updated_files(&fx.files), fx.keys());

    cache.remove_entry(&fx.files[0]).unwrap();
    cache.reconcile().unwrap();

    fx.modify(1);

    let mut cache = fx.cache("testCache");
    assert_eq!(
        cache.get_updated_files(&fx.files),
        vec![fx.key(0), fx.key(1)]
    );
}

#[test]
fn test_remove_entry_is_durable_without_lookups() {
    let fx = Fixture::new();
    let mut cache = fx.cache("testCache");
    cache.normalize_entries(&fx.files);
    cache.reconcile().unwrap();

    let mut cache = fx.cache("testCache");
    cache.remove_entry(&fx.files[0]).unwrap();
    cache.reconcile().unwrap();

    let mut cache = fx.cache("testCache");
    assert!(cache.has_file_changed(&fx.files[0]));
    assert!(!cache.has_file_changed(&fx.files[1]));
}

#[test]
fn test_remove_entry_writes_store_immediately() {
    let fx = Fixture::new();
    let mut cache = fx.cache("testCache");
    cache.normalize_entries(&fx.files);
    cache.reconcile().unwrap();

    let mut cache = fx.cache("testCache");
    cache.remove_entry(&fx.files[2]).unwrap();
    drop(cache);

    let reloaded = fx.cache("testCache");
    assert_eq!(reloaded.store().keys().len(), 3);
    assert!(reloaded.store().get(&fx.key(2)).is_none());
}

#[test]
fn test_remove_unknown_entry_writes_nothing() {
    let fx = Fixture::new();
    let mut cache = fx.cache("testCache");
    cache.remove_entry(&fx.files[0]).unwrap();
    assert!(!cache.store().path().exists());
}

#[test]
fn test_absent_input_is_empty() {
    let fx = Fixture::new();
    let mut cache = fx.cache("testCache2");

    let absent: Option<Vec<PathBuf>> = None;
    assert!(cache.get_updated_files(absent.clone().into_iter().flatten()).is_empty());
    assert!(cache.normalize_entries(absent.into_iter().flatten()).is_empty());
    assert!(cache.normalize_entries(Vec::<PathBuf>::new()).is_empty());

    cache.reconcile().unwrap();
    assert!(!fx.cache_dir().join("testCache2").exists());
}

#[test]
fn test_reconcile_without_lookups() {
    let fx = Fixture::new();
    let mut cache = fx.cache("testCache2");
    assert!(cache.reconcile().is_ok());
    assert!(!cache.store().path().exists());
}

#[test]
fn test_normalize_entries_first_run() {
    let fx = Fixture::new();
    let mut cache = fx.cache("testCache");

    let entries = cache.normalize_entries(&fx.files);
    assert_eq!(entries.len(), 4);
    for (entry, key) in entries.iter().zip(fx.keys()) {
        assert_eq!(entry.key, key);
        assert!(entry.changed);
        assert!(!entry.not_found);
    }
}

#[test]
fn test_normalize_entries_finds_modified_file() {
    let fx = Fixture::new();
    let mut cache = fx.cache("testCache");
    cache.normalize_entries(&fx.files);
    cache.reconcile().unwrap();

    fx.modify(2);

    let entries = cache.normalize_entries(&fx.files);
    assert_eq!(entries.len(), 4);
    let changed: Vec<_> = entries.iter().filter(|e| e.changed).collect();
    assert_eq!(changed.len(), 1);
    assert!(changed[0].key.ends_with("f3.txt"));
}

#[test]
fn test_unvisited_entries_are_kept() {
    let fx = Fixture::new();
    let mut cache = fx.cache("testCache");
    cache.normalize_entries(&fx.files);
    cache.reconcile().unwrap();
    assert!(cache.store().get(&fx.key(1)).is_some());

    let mut cache = fx.cache("testCache");
    assert_eq!(cache.store().keys().len(), 4);

    assert!(!cache.has_file_changed(&fx.files[3]));
    cache.reconcile().unwrap();

    assert!(cache.store().get(&fx.key(1)).is_some());
    assert_eq!(cache.store().keys().len(), 4);

    let reloaded = fx.cache("testCache");
    assert_eq!(reloaded.store().keys().len(), 4);
}

#[test]
fn test_descriptor_for_deleted_file() {
    let fx = Fixture::new();
    let mut cache = FileEntryCache::create_from_file(fx.cache_dir().join(".eslintcache"), fx.config())
        .unwrap();

    cache.get_file_descriptor(&fx.files[0]);
    cache.reconcile().unwrap();
    fx.delete(0);

    let descriptor = cache.get_file_descriptor(&fx.files[0]);
    assert!(descriptor.not_found);
    assert!(descriptor.changed);
    assert_eq!(descriptor.key, fx.key(0));
    // Last known metadata is reported.
    assert_eq!(descriptor.meta.size, 14);
}

#[test]
fn test_descriptor_for_never_seen_missing_file() {
    let fx = Fixture::new();
    let mut cache = fx.cache("testCache1");

    let descriptor = cache.get_file_descriptor("foo");
    assert!(descriptor.not_found);
    assert!(descriptor.changed);
    assert_eq!(descriptor.meta.size, 0);
    assert_eq!(descriptor.meta.mtime, 0);
    assert!(descriptor.key.ends_with("foo"));
}

#[test]
fn test_analyze_files_partition() {
    let fx = Fixture::new();
    let mut cache = FileEntryCache::create_from_file(fx.cache_dir().join(".eslintcache"), fx.config())
        .unwrap();

    assert_eq!(
        cache.analyze_files(&fx.files),
        AnalyzedFiles {
            changed_files: fx.keys(),
            not_found_files: vec![],
            not_changed_files: vec![],
        }
    );
    cache.reconcile().unwrap();

    std::fs::write(&fx.files[0], "everybody can change").unwrap();
    fx.delete(1);

    assert_eq!(
        cache.analyze_files(&fx.files),
        AnalyzedFiles {
            changed_files: vec![fx.key(0)],
            not_found_files: vec![fx.key(1)],
            not_changed_files: vec![fx.key(2), fx.key(3)],
        }
    );
}

#[test]
fn test_create_from_file_writes_on_reconcile_and_destroy_removes() {
    let fx = Fixture::new();
    let cache_file = fx.cache_dir().join(".eslintcache");
    let mut cache = FileEntryCache::create_from_file(&cache_file, fx.config()).unwrap();

    assert_eq!(cache.get_updated_files(&fx.files), fx.keys());
    assert!(!cache_file.exists());

    cache.reconcile().unwrap();
    assert!(cache_file.exists());

    cache.destroy().unwrap();
    assert!(!cache_file.exists());
    assert!(cache.store().keys().is_empty());
    assert!(cache.session().is_empty());
}

#[test]
fn test_delete_cache_file_keeps_memory() {
    let fx = Fixture::new();
    let mut cache = fx.cache("testCache");
    cache.normalize_entries(&fx.files);
    cache.reconcile().unwrap();

    cache.delete_cache_file().unwrap();
    assert!(!cache.store().path().exists());
    assert_eq!(cache.store().keys().len(), 4);
    assert_eq!(cache.session().len(), 4);
    assert!(cache.get_updated_files(&fx.files).is_empty());

    // A fresh instance starts over.
    let mut fresh = fx.cache("testCache");
    assert_eq!(fresh.get_updated_files(&fx.files), fx.keys());
}

#[test]
fn test_prune_missing_on_load() {
    let fx = Fixture::new();
    let mut cache = fx.cache("testCache");
    cache.normalize_entries(&fx.files);
    cache.reconcile().unwrap();

    fx.delete(2);

    let kept = fx.cache("testCache");
    assert_eq!(kept.store().keys().len(), 4);

    let pruned = FileEntryCache::create(
        "testCache",
        fx.cache_dir(),
        fx.config().with_prune_missing(true),
    )
    .unwrap();
    assert_eq!(pruned.store().keys().len(), 3);
    assert!(pruned.store().get(&fx.key(2)).is_none());
}

#[test]
fn test_default_config_roots_at_cwd() {
    let fx = Fixture::new();
    let cache = FileEntryCache::create("testCache", fx.cache_dir(), CacheConfig::default()).unwrap();
    assert_eq!(cache.relative_path(), std::env::current_dir().unwrap());
}
