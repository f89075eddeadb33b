use super::common::Fixture;
use file_entry_cache::cache::{CacheConfig, FileEntryCache};
use file_entry_cache::store::PersistentStore;
use std::path::Path;

const RELATIVE: [&str; 4] = [
    "fixtures/f1.txt",
    "fixtures/f2.txt",
    "fixtures/f3.txt",
    "fixtures/f4.txt",
];

#[test]
fn test_relative_and_absolute_share_a_key() {
    let fx = Fixture::new();
    let mut cache = fx.cache("testCache");

    assert_eq!(cache.get_updated_files(RELATIVE), fx.keys());
    cache.reconcile().unwrap();

    assert!(cache.get_updated_files(&fx.files).is_empty());
    assert!(cache.get_updated_files(["./fixtures/../fixtures/f2.txt"]).is_empty());
}

#[test]
fn test_relative_lookup_detects_modification() {
    let fx = Fixture::new();
    let mut cache = fx.cache("testCache");
    cache.normalize_entries(RELATIVE);
    cache.reconcile().unwrap();

    fx.modify(3);

    let mut cache = fx.cache("testCache");
    assert_eq!(cache.get_updated_files(RELATIVE), vec![fx.key(3)]);
}

#[test]
fn test_remove_entry_with_relative_path() {
    let fx = Fixture::new();
    let mut cache = fx.cache("testCache");
    cache.normalize_entries(&fx.files);
    cache.reconcile().unwrap();

    cache.remove_entry(RELATIVE[0]).unwrap();
    assert!(cache.store().get(&fx.key(0)).is_none());

    let mut cache = fx.cache("testCache");
    assert_eq!(cache.get_updated_files(&fx.files), vec![fx.key(0)]);
}

#[test]
fn test_relative_path_accessor() {
    let fx = Fixture::new();

    let cache = FileEntryCache::create("testCache", fx.cache_dir(), CacheConfig::default()).unwrap();
    assert_eq!(cache.relative_path(), std::env::current_dir().unwrap());

    let cache = FileEntryCache::create(
        "testCache",
        fx.cache_dir(),
        CacheConfig::default().with_root("foo/path/bar"),
    )
    .unwrap();
    assert_eq!(cache.relative_path(), Path::new("foo/path/bar"));
}

#[test]
fn test_relative_root_resolves_against_working_directory() {
    let fx = Fixture::new();
    let mut cache = FileEntryCache::create(
        "testCache",
        fx.cache_dir(),
        CacheConfig::default().with_root("foo/path/bar"),
    )
    .unwrap();

    let descriptor = cache.get_file_descriptor(RELATIVE[0]);
    assert!(descriptor.not_found);
    assert!(descriptor.changed);

    let expected = std::env::current_dir()
        .unwrap()
        .join("foo/path/bar")
        .join(RELATIVE[0]);
    assert_eq!(Path::new(&descriptor.key), expected);
}
