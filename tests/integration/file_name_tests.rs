use super::common::Fixture;
use file_entry_cache::cache::FileEntryCache;
use file_entry_cache::store::PersistentStore;
use std::fs;
use std::path::{Path, PathBuf};

fn create(fx: &Fixture, name: impl Into<PathBuf>) -> PathBuf {
    let path = fx.root().join(name.into());
    fs::write(&path, "named content").unwrap();
    path
}

fn assert_stable(fx: &Fixture, path: &Path) {
    let mut cache = fx.cache("names");
    let descriptor = cache.get_file_descriptor(path);
    assert!(!descriptor.not_found);
    assert!(descriptor.changed);
    assert_eq!(descriptor.meta.size, 13);
    cache.reconcile().unwrap();

    let key = cache.key_for(path);
    assert!(cache.store().get(&key).is_some());

    let mut cache = fx.cache("names");
    let descriptor = cache.get_file_descriptor(path);
    assert!(!descriptor.not_found);
    assert!(!descriptor.changed);
    cache.reconcile().unwrap();
    assert!(fx.cache("names").store().get(&key).is_some());

    let pruned = FileEntryCache::create(
        "names",
        fx.cache_dir(),
        fx.config().with_prune_missing(true),
    )
    .unwrap();
    assert!(pruned.store().get(&key).is_some());
}

#[test]
fn test_decomposed_file_name() {
    let fx = Fixture::new();
    let path = create(&fx, "cafe\u{0301}.txt");

    let cache = fx.cache("names");
    assert!(cache.key_for(&path).ends_with("caf\u{e9}.txt"));

    assert_stable(&fx, &path);
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_file_name() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fx = Fixture::new();
    let path = create(&fx, OsStr::from_bytes(b"bad\xff.txt"));

    let cache = fx.cache("names");
    assert!(cache.key_for(&path).contains('\u{FFFD}'));

    assert_stable(&fx, &path);
}
