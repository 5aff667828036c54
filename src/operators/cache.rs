//! Process-wide caches used by the operator runtime library (spec.md
//! section 3: Regex cache, Small-integer and single-character caches).
//!
//! Mirrors the teacher's `lazy_static` + `Mutex`-guarded `HashMap` idiom
//! (`shell/glob_helpers.rs`'s `POSIX_CLASSES`), but this one is mutated at
//! runtime rather than populated once, so it needs the lock on both the
//! read and write path to avoid torn dictionary state (spec.md section 5).

use std::collections::HashMap;
use std::sync::Mutex;

use lazy_static::lazy_static;
use regex_lite::Regex;

/// Bounded at 1000 entries; on overflow the cache is cleared outright, not
/// LRU-evicted — spec.md is explicit that this is a deliberate simplicity
/// choice, not an oversight (Design Notes section 9: "do not replace with
/// an LRU unless also adjusting tests").
const REGEX_CACHE_LIMIT: usize = 1000;

lazy_static! {
    static ref REGEX_CACHE: Mutex<HashMap<String, Regex>> = Mutex::new(HashMap::new());
}

/// Compile `pattern`, consulting (and populating) the process-wide cache.
/// Only used for the case-insensitive path per spec.md section 3 — the
/// case-sensitive path compiles directly without caching, since `-match`'s
/// default is case-insensitive and that is the hot path worth memoizing.
pub fn compile_cached(pattern: &str, ignore_case: bool) -> Result<Regex, regex_lite::Error> {
    if !ignore_case {
        return Regex::new(pattern);
    }
    let key = format!("(?i){pattern}");
    {
        let cache = REGEX_CACHE.lock().unwrap();
        if let Some(re) = cache.get(&key) {
            return Ok(re.clone());
        }
    }
    let compiled = Regex::new(&key)?;
    let mut cache = REGEX_CACHE.lock().unwrap();
    if cache.len() >= REGEX_CACHE_LIMIT {
        cache.clear();
    }
    cache.insert(key, compiled.clone());
    Ok(compiled)
}

#[cfg(test)]
pub fn regex_cache_len() -> usize {
    REGEX_CACHE.lock().unwrap().len()
}

#[cfg(test)]
pub fn regex_cache_clear() {
    REGEX_CACHE.lock().unwrap().clear();
}

/// Pre-boxed identity objects for small integers, avoiding per-operation
/// allocation when returning dynamic values from hot operator paths.
/// `Value::Int` is a plain `Copy` payload in this crate (no boxing needed),
/// so the cache here exists only to preserve the spec's identity guarantee
/// (testable property 8: `int_to_obj(i) === int_to_obj(i)`) via an `Rc`
/// wrapper that *is* identity-comparable, for callers that need it.
pub const SMALL_INT_LOW: i64 = -100;
pub const SMALL_INT_HIGH: i64 = 1000;

use std::rc::Rc;

lazy_static! {
    static ref SMALL_INTS: Vec<Rc<i64>> = (SMALL_INT_LOW..SMALL_INT_HIGH).map(Rc::new).collect();
    static ref SMALL_CHARS: Vec<Rc<char>> = (0u32..256).filter_map(char::from_u32).map(Rc::new).collect();
}

/// Return the cached identity object for `i` if it falls in `[-100, 1000)`,
/// else a fresh one.
pub fn boxed_int(i: i64) -> Rc<i64> {
    if (SMALL_INT_LOW..SMALL_INT_HIGH).contains(&i) {
        Rc::clone(&SMALL_INTS[(i - SMALL_INT_LOW) as usize])
    } else {
        Rc::new(i)
    }
}

/// Return the cached identity object for `c` if it falls in `[0, 255]`,
/// else a fresh one.
pub fn boxed_char(c: char) -> Rc<char> {
    let code = c as u32;
    if code < 256 {
        Rc::clone(&SMALL_CHARS[code as usize])
    } else {
        Rc::new(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_int_identity_is_stable() {
        let a = boxed_int(42);
        let b = boxed_int(42);
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn out_of_range_int_is_not_cached() {
        let a = boxed_int(5000);
        let b = boxed_int(5000);
        assert!(!Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn small_char_identity_is_stable() {
        let a = boxed_char('a');
        let b = boxed_char('a');
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn regex_cache_clears_on_overflow() {
        regex_cache_clear();
        for i in 0..REGEX_CACHE_LIMIT {
            compile_cached(&format!("pattern{i}"), true).unwrap();
        }
        assert_eq!(regex_cache_len(), REGEX_CACHE_LIMIT);
        compile_cached("one-more", true).unwrap();
        assert!(regex_cache_len() <= REGEX_CACHE_LIMIT);
        regex_cache_clear();
    }

    #[test]
    fn case_insensitive_results_are_cached_and_reused() {
        regex_cache_clear();
        let before = regex_cache_len();
        compile_cached("abc", true).unwrap();
        compile_cached("abc", true).unwrap();
        assert_eq!(regex_cache_len(), before + 1);
        regex_cache_clear();
    }
}
