use futures::FutureExt as _;

use super::*;

fn ready(frames: &[&str]) -> BoxFuture<'static, FlipbookResult<ResolvedSequence>> {
    let seq = ResolvedSequence::new(frames.iter().map(|s| (*s).to_owned()).collect());
    futures::future::ready(Ok(seq)).boxed()
}

#[test]
fn second_lookup_shares_the_first_entry() {
    let cache = ManifestCache::new(4);
    let (id_a, _) = cache.get_or_insert_with("https://m/a.json", || ready(&["/a"]));
    let mut built = false;
    let (id_b, shared) = cache.get_or_insert_with("https://m/a.json", || {
        built = true;
        ready(&["/other"])
    });
    assert!(!built);
    assert_eq!(id_a, id_b);
    let seq = futures::executor::block_on(shared).unwrap();
    assert_eq!(seq.frames(), &["/a".to_owned()]);
}

#[test]
fn full_cache_evicts_oldest_insertion() {
    let cache = ManifestCache::new(50);
    for i in 0..50 {
        let _ = cache.get_or_insert_with(&format!("https://m/{i}.json"), || ready(&["/a"]));
    }
    assert_eq!(cache.len(), 50);

    // A hit must not refresh the oldest entry.
    let _ = cache.get_or_insert_with("https://m/0.json", || ready(&["/a"]));

    let _ = cache.get_or_insert_with("https://m/50.json", || ready(&["/a"]));
    assert_eq!(cache.len(), 50);
    assert!(!cache.contains("https://m/0.json"));
    assert!(cache.contains("https://m/1.json"));
    assert!(cache.contains("https://m/50.json"));
    assert_eq!(cache.urls().first().map(String::as_str), Some("https://m/1.json"));
}

#[test]
fn remove_entry_only_removes_matching_generation() {
    let cache = ManifestCache::new(2);
    let (id, _) = cache.get_or_insert_with("https://m/a.json", || ready(&["/a"]));
    assert!(!cache.remove_entry("https://m/a.json", id + 1));
    assert!(cache.contains("https://m/a.json"));
    assert!(cache.remove_entry("https://m/a.json", id));
    assert!(cache.is_empty());
    assert!(cache.urls().is_empty());
    assert!(!cache.remove_entry("https://m/a.json", id));
}

#[test]
fn clones_share_storage_and_clear_empties() {
    let cache = ManifestCache::default();
    assert_eq!(cache.capacity(), 50);
    let handle = cache.clone();
    let _ = handle.get_or_insert_with("https://m/a.json", || ready(&["/a"]));
    assert_eq!(cache.len(), 1);
    cache.clear();
    assert!(handle.is_empty());
}
