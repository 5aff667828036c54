//! Dynamic call-site allocation (spec.md section 4.6, Design Notes section 9).
//!
//! The source's dynamic binders resolve member/index/operator dispatch at
//! first invocation and cache the result ("inline caching"). Design Notes
//! section 9 re-architects this for a statically-typed value representation
//! as "a small per-object-kind v-table... Inline caches: keep a per-site
//! monomorphic slot `(last-kind, last-handler)` refreshed on miss" — that
//! monomorphic slot is `MonomorphicCache` below.
//!
//! Binary arithmetic call sites are additionally *shared process-wide*:
//! "Site identity is keyed by `(operator, ignore-case, scalar-compare?)` so
//! identical sites are shared" (spec.md section 4.6). Member/invoke/index
//! call sites are not shared this way — each AST node gets its own
//! `CallSite`, parametrized by the name/static-flag/class-scope spec.md
//! names for that node kind.

use std::collections::HashMap;
use std::sync::Mutex;

use lazy_static::lazy_static;

use crate::ast::token::TokenKind;
use crate::context::Binder;

pub type CallSiteId = usize;

/// The key a dynamic-binary-operation call site is identified by: the
/// operator, whether it runs case-insensitively, and whether it is a
/// scalar comparison (vs. one that maps across an enumerable left operand).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BinarySiteKey {
    pub operator: TokenKind,
    pub ignore_case: bool,
    pub scalar_compare: bool,
}

lazy_static! {
    static ref BINARY_SITES: Mutex<BinarySiteRegistry> = Mutex::new(BinarySiteRegistry::default());
}

#[derive(Default)]
struct BinarySiteRegistry {
    by_key: HashMap<BinarySiteKey, CallSiteId>,
    keys: Vec<BinarySiteKey>,
}

/// Intern a binary-operation call site, returning the same `CallSiteId` for
/// every call with an identical key — this is what makes identical sites
/// shared process-wide rather than allocated fresh per AST node.
pub fn intern_binary_site(key: BinarySiteKey) -> CallSiteId {
    let mut registry = BINARY_SITES.lock().unwrap();
    if let Some(&id) = registry.by_key.get(&key) {
        return id;
    }
    let id = registry.keys.len();
    registry.keys.push(key);
    registry.by_key.insert(key, id);
    id
}

pub fn binary_site_key(id: CallSiteId) -> Option<BinarySiteKey> {
    BINARY_SITES.lock().unwrap().keys.get(id).copied()
}

#[cfg(test)]
pub fn binary_site_count() -> usize {
    BINARY_SITES.lock().unwrap().keys.len()
}

/// The per-site monomorphic inline cache: "keep a per-site monomorphic slot
/// `(last-kind, last-handler)` refreshed on miss" (Design Notes section 9).
/// `last-kind` is the operand-shape tag (`Value::kind_name()`); `H` is
/// whatever handler the owning call site resolves for that shape (a
/// `MethodDescriptor`, a `PropertyDescriptor`, a closure — left generic so
/// this one cache shape serves every dynamic call-site kind in section 4.6).
#[derive(Debug, Clone)]
pub struct MonomorphicCache<H> {
    last_kind: Option<&'static str>,
    handler: Option<H>,
}

impl<H> Default for MonomorphicCache<H> {
    fn default() -> Self {
        Self { last_kind: None, handler: None }
    }
}

impl<H: Clone> MonomorphicCache<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache hit only when the operand shape matches the last one seen;
    /// any other shape is a miss that must re-resolve and then `store`.
    pub fn get(&self, kind: &'static str) -> Option<H> {
        if self.last_kind == Some(kind) {
            self.handler.clone()
        } else {
            None
        }
    }

    pub fn store(&mut self, kind: &'static str, handler: H) {
        self.last_kind = Some(kind);
        self.handler = Some(handler);
    }

    pub fn is_monomorphic_for(&self, kind: &'static str) -> bool {
        self.last_kind == Some(kind)
    }
}

/// One member/invoke/index dynamic call site (spec.md section 4.6: get-member,
/// invoke-member, get-index, set-member, set-index). Parametrized the way
/// each lowering rule names: a member/method name, whether the call targets
/// the static (type-level) table, and the enclosing class scope for a
/// private-member lookup when compiling inside a type definition's own
/// members.
#[derive(Debug, Clone)]
pub struct CallSite<H> {
    pub name: String,
    pub is_static: bool,
    pub class_scope: Option<String>,
    cache: MonomorphicCache<H>,
}

impl<H: Clone> CallSite<H> {
    pub fn new(name: impl Into<String>, is_static: bool, class_scope: Option<String>) -> Self {
        Self { name: name.into(), is_static, class_scope, cache: MonomorphicCache::new() }
    }

    pub fn cached_handler(&self, kind: &'static str) -> Option<H> {
        self.cache.get(kind)
    }

    pub fn refresh(&mut self, kind: &'static str, handler: H) {
        self.cache.store(kind, handler);
    }
}

impl<H> Binder for CallSite<H> {
    fn site_key(&self) -> String {
        format!("{}{}{}", if self.is_static { "static:" } else { "" }, self.class_scope.as_deref().unwrap_or(""), self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_binary_sites_share_an_id() {
        let base = binary_site_count();
        let a = intern_binary_site(BinarySiteKey { operator: TokenKind::Plus, ignore_case: false, scalar_compare: false });
        let b = intern_binary_site(BinarySiteKey { operator: TokenKind::Plus, ignore_case: false, scalar_compare: false });
        assert_eq!(a, b);
        assert_eq!(binary_site_count(), base + 1);
    }

    #[test]
    fn distinct_keys_get_distinct_ids() {
        let a = intern_binary_site(BinarySiteKey { operator: TokenKind::Minus, ignore_case: false, scalar_compare: false });
        let b = intern_binary_site(BinarySiteKey { operator: TokenKind::Minus, ignore_case: true, scalar_compare: false });
        assert_ne!(a, b);
    }

    #[test]
    fn monomorphic_cache_misses_on_a_new_shape() {
        let mut cache: MonomorphicCache<i32> = MonomorphicCache::new();
        cache.store("Int", 1);
        assert_eq!(cache.get("Int"), Some(1));
        assert_eq!(cache.get("String"), None);
    }

    #[test]
    fn call_site_key_distinguishes_static_and_scope() {
        let instance: CallSite<i32> = CallSite::new("Foo", false, None);
        let static_site: CallSite<i32> = CallSite::new("Foo", true, None);
        let scoped: CallSite<i32> = CallSite::new("Foo", false, Some("Widget".into()));
        assert_ne!(instance.site_key(), static_site.site_key());
        assert_ne!(instance.site_key(), scoped.site_key());
    }
}
