//! Order-queue helpers shared by the L1 entry store's eviction policies.
//!
//! Adapted from the teacher's `global_cache` utilities (`move_key_to_end`,
//! `find_min_frequency_key`, `remove_key_from_global_cache`), rewritten
//! against this crate's concrete `Entry` instead of a generic `CacheEntry<R>`,
//! and extended with the FIFO/timestamp and random-sample helpers the
//! teacher's four-policy switch needs that its snapshot didn't carry.

use crate::entry::Entry;
use std::collections::{HashMap, VecDeque};

/// Moves a key to the end of the order queue (marks it most recently used).
/// A no-op if the key isn't present.
///
/// ```
/// use std::collections::VecDeque;
/// use tlcache_core::utils::move_key_to_end;
///
/// let mut order = VecDeque::from(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
/// move_key_to_end(&mut order, "b");
/// assert_eq!(order.back().unwrap(), "b");
/// ```
pub fn move_key_to_end(order: &mut VecDeque<String>, key: &str) {
    if let Some(pos) = order.iter().position(|k| k == key) {
        order.remove(pos);
        order.push_back(key.to_string());
    }
}

/// Finds the key with the minimum `usage_count` among the keys in `order`
/// (LFU victim rule, spec §4.3), breaking ties by minimum `last_used` then
/// lexicographically on the key, per spec §4.3's tie-break column.
pub fn find_min_frequency_key(map: &HashMap<String, Entry>, order: &VecDeque<String>) -> Option<String> {
    let mut best: Option<(&String, u64, u64)> = None; // (key, usage_count, last_used)
    for key in order {
        if let Some(entry) = map.get(key) {
            let candidate = (key, entry.metadata.usage_count, entry.metadata.last_used);
            best = Some(match best {
                None => candidate,
                Some(cur) => pick_lfu_winner(cur, candidate),
            });
        }
    }
    best.map(|(k, _, _)| k.clone())
}

fn pick_lfu_winner<'a>(
    a: (&'a String, u64, u64),
    b: (&'a String, u64, u64),
) -> (&'a String, u64, u64) {
    match a.1.cmp(&b.1) {
        std::cmp::Ordering::Less => a,
        std::cmp::Ordering::Greater => b,
        std::cmp::Ordering::Equal => match a.2.cmp(&b.2) {
            std::cmp::Ordering::Less => a,
            std::cmp::Ordering::Greater => b,
            std::cmp::Ordering::Equal => {
                if a.0 <= b.0 {
                    a
                } else {
                    b
                }
            }
        },
    }
}

/// Finds the key with the minimum `timestamp` among the keys in `order`
/// (FIFO victim rule, spec §4.3), breaking ties lexicographically on the key.
pub fn find_min_timestamp_key(map: &HashMap<String, Entry>, order: &VecDeque<String>) -> Option<String> {
    let mut best: Option<(&String, u64)> = None;
    for key in order {
        if let Some(entry) = map.get(key) {
            best = Some(match best {
                None => (key, entry.timestamp),
                Some((bk, bt)) => match entry.timestamp.cmp(&bt) {
                    std::cmp::Ordering::Less => (key, entry.timestamp),
                    std::cmp::Ordering::Equal if key < bk => (key, entry.timestamp),
                    _ => (bk, bt),
                },
            });
        }
    }
    best.map(|(k, _)| k.clone())
}

/// Finds the key with the minimum `last_used` among the keys in `order`
/// (LRU victim rule, spec §4.3), breaking ties by minimum `timestamp` then
/// lexicographically on the key.
pub fn find_min_last_used_key(map: &HashMap<String, Entry>, order: &VecDeque<String>) -> Option<String> {
    let mut best: Option<(&String, u64, u64)> = None; // (key, last_used, timestamp)
    for key in order {
        if let Some(entry) = map.get(key) {
            let candidate = (key, entry.metadata.last_used, entry.timestamp);
            best = Some(match best {
                None => candidate,
                Some(cur) => pick_lru_winner(cur, candidate),
            });
        }
    }
    best.map(|(k, _, _)| k.clone())
}

fn pick_lru_winner<'a>(
    a: (&'a String, u64, u64),
    b: (&'a String, u64, u64),
) -> (&'a String, u64, u64) {
    match a.1.cmp(&b.1) {
        std::cmp::Ordering::Less => a,
        std::cmp::Ordering::Greater => b,
        std::cmp::Ordering::Equal => match a.2.cmp(&b.2) {
            std::cmp::Ordering::Less => a,
            std::cmp::Ordering::Greater => b,
            std::cmp::Ordering::Equal => {
                if a.0 <= b.0 {
                    a
                } else {
                    b
                }
            }
        },
    }
}

/// Samples one key uniformly at random from `order` without replacement
/// (Random victim rule, spec §4.3), using `fastrand` as the teacher's
/// `Cargo.toml` already depends on it for this purpose.
pub fn sample_random_key(order: &VecDeque<String>) -> Option<String> {
    if order.is_empty() {
        return None;
    }
    let idx = fastrand::usize(..order.len());
    order.get(idx).cloned()
}

/// Removes a key from both the entry map and the order queue, returning
/// `true` if it was present in either.
pub fn remove_key(map: &mut HashMap<String, Entry>, order: &mut VecDeque<String>, key: &str) -> bool {
    let removed_from_map = map.remove(key).is_some();
    let removed_from_order = if let Some(pos) = order.iter().position(|k| k == key) {
        order.remove(pos);
        true
    } else {
        false
    };
    removed_from_map || removed_from_order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with(key: &str, usage_count: u64, last_used: u64, timestamp: u64) -> Entry {
        let mut e = Entry::new(key, "t", "en", "fr", "x", 0.5, 0);
        e.metadata.usage_count = usage_count;
        e.metadata.last_used = last_used;
        e.timestamp = timestamp;
        e
    }

    #[test]
    fn move_key_to_end_reorders() {
        let mut order = VecDeque::from(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        move_key_to_end(&mut order, "a");
        assert_eq!(order, VecDeque::from(vec!["b".to_string(), "c".to_string(), "a".to_string()]));
    }

    #[test]
    fn move_key_to_end_missing_key_is_noop() {
        let mut order = VecDeque::from(vec!["a".to_string()]);
        move_key_to_end(&mut order, "z");
        assert_eq!(order, VecDeque::from(vec!["a".to_string()]));
    }

    #[test]
    fn find_min_frequency_key_picks_lowest_usage_count() {
        let mut map = HashMap::new();
        map.insert("a".into(), entry_with("a", 5, 100, 1));
        map.insert("b".into(), entry_with("b", 2, 100, 1));
        map.insert("c".into(), entry_with("c", 8, 100, 1));
        let order = VecDeque::from(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        assert_eq!(find_min_frequency_key(&map, &order), Some("b".to_string()));
    }

    #[test]
    fn find_min_frequency_key_tie_breaks_by_last_used_then_key() {
        let mut map = HashMap::new();
        map.insert("b".into(), entry_with("b", 1, 50, 1));
        map.insert("a".into(), entry_with("a", 1, 50, 1));
        let order = VecDeque::from(vec!["b".to_string(), "a".to_string()]);
        assert_eq!(find_min_frequency_key(&map, &order), Some("a".to_string()));
    }

    #[test]
    fn find_min_timestamp_key_picks_oldest() {
        let mut map = HashMap::new();
        map.insert("a".into(), entry_with("a", 1, 1, 300));
        map.insert("b".into(), entry_with("b", 1, 1, 100));
        let order = VecDeque::from(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(find_min_timestamp_key(&map, &order), Some("b".to_string()));
    }

    #[test]
    fn find_min_last_used_key_picks_least_recently_used() {
        let mut map = HashMap::new();
        map.insert("a".into(), entry_with("a", 1, 500, 1));
        map.insert("b".into(), entry_with("b", 1, 100, 1));
        let order = VecDeque::from(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(find_min_last_used_key(&map, &order), Some("b".to_string()));
    }

    #[test]
    fn sample_random_key_returns_member_of_order() {
        let order = VecDeque::from(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        let picked = sample_random_key(&order).unwrap();
        assert!(order.contains(&picked));
    }

    #[test]
    fn sample_random_key_empty_returns_none() {
        let order: VecDeque<String> = VecDeque::new();
        assert_eq!(sample_random_key(&order), None);
    }

    #[test]
    fn remove_key_clears_both_structures() {
        let mut map = HashMap::new();
        map.insert("a".into(), entry_with("a", 1, 1, 1));
        let mut order = VecDeque::from(vec!["a".to_string()]);
        assert!(remove_key(&mut map, &mut order, "a"));
        assert!(map.is_empty());
        assert!(order.is_empty());
        assert!(!remove_key(&mut map, &mut order, "a"));
    }
}
