//! Thread-safe free-list pools for the scratch objects used while building and rendering.
//!
//! Objects checked out of a [`Pool`] may have been used by any earlier caller. The pool resets
//! them on checkout (through [`Recycle::reset`]), so callers always start from an empty value.
//! Returning an object to its pool does not clear it.
//!
//! Render passes and fast-builder renders allocate their scratch data in [`bumpalo::Bump`]
//! arenas. Arenas are pooled too: resetting an arena keeps its largest chunk, so a warm arena
//! serves a whole render pass without touching the global allocator.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, OnceLock, PoisonError};

use bumpalo::Bump;
use serde::{Deserialize, Serialize};

/// Limits and sizes for every pool in the crate.
///
/// Install a custom configuration with [`configure`] before the first render; otherwise
/// [`PoolConfig::default`] is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of idle objects each pool retains. Objects returned beyond this are dropped.
    pub max_idle: usize,
    /// Initial capacity, in bytes, of the arena backing a render pass.
    pub arena_capacity: usize,
    /// Estimated output sizes up to this many bytes use the small fast-builder tier.
    pub small_tier: usize,
    /// Estimated output sizes up to this many bytes use the medium fast-builder tier.
    pub medium_tier: usize,
    /// Initial capacity, in bytes, of arenas in the large fast-builder tier.
    pub large_tier: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            max_idle: 64,
            arena_capacity: 4096,
            small_tier: 256,
            medium_tier: 4096,
            large_tier: 32768,
        }
    }
}

static CONFIG: OnceLock<PoolConfig> = OnceLock::new();

/// Install the pool configuration.
///
/// This can only happen once, and only before any pool has been used. If a configuration is
/// already in place, the rejected one is handed back.
pub fn configure(config: PoolConfig) -> Result<(), PoolConfig> {
    CONFIG.set(config)
}

/// The active pool configuration.
pub fn config() -> &'static PoolConfig {
    CONFIG.get_or_init(PoolConfig::default)
}

/// Types that can be reused after a [`Pool`] hands them out again.
pub trait Recycle {
    /// Return the value to its empty state.
    fn reset(&mut self);
}

impl<T> Recycle for Vec<T> {
    fn reset(&mut self) {
        self.clear();
    }
}

impl Recycle for String {
    fn reset(&mut self) {
        self.clear();
    }
}

impl Recycle for Bump {
    fn reset(&mut self) {
        Bump::reset(self);
    }
}

/// A free list of reusable objects.
pub struct Pool<T> {
    name: &'static str,
    fresh: fn() -> T,
    idle: Mutex<Vec<T>>,
}

impl<T: Recycle> Pool<T> {
    /// Create an empty pool. `fresh` builds a new object when the pool has none idle.
    pub const fn new(name: &'static str, fresh: fn() -> T) -> Self {
        Pool {
            name,
            fresh,
            idle: Mutex::new(Vec::new()),
        }
    }

    /// Take an object out of the pool, reset and ready for use.
    pub fn get(&self) -> T {
        let reused = self.lock().pop();
        match reused {
            Some(mut item) => {
                item.reset();
                item
            }
            None => {
                tracing::trace!(pool = self.name, "pool miss");
                (self.fresh)()
            }
        }
    }

    /// Hand an object back. It is not cleared until its next checkout.
    pub fn put(&self, item: T) {
        let mut idle = self.lock();
        if idle.len() < config().max_idle {
            idle.push(item);
        } else {
            tracing::trace!(pool = self.name, "pool full, dropping object");
        }
    }

    /// Check an object out behind a guard that returns it when dropped.
    pub fn checkout(&self) -> Pooled<'_, T> {
        Pooled {
            pool: self,
            item: Some(self.get()),
        }
    }

    /// The number of idle objects currently held.
    pub fn idle(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<T>> {
        // a panic while holding the lock cannot leave the free list in a torn state
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An object checked out of a [`Pool`]; it goes back to the pool on drop.
pub struct Pooled<'p, T: Recycle> {
    pool: &'p Pool<T>,
    item: Option<T>,
}

impl<T: Recycle> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.item.as_ref().expect("pooled object is present until drop")
    }
}

impl<T: Recycle> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_mut().expect("pooled object is present until drop")
    }
}

impl<T: Recycle> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.put(item);
        }
    }
}

/// Size classes for fast-builder output buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeTier {
    /// Short fragments such as a single attributed tag.
    Small,
    /// Typical components.
    Medium,
    /// Whole pages.
    Large,
}

impl SizeTier {
    /// Pick the tier for an estimated output size in bytes.
    pub fn for_estimate(estimate: usize) -> Self {
        let config = config();
        if estimate <= config.small_tier {
            SizeTier::Small
        } else if estimate <= config.medium_tier {
            SizeTier::Medium
        } else {
            SizeTier::Large
        }
    }

    /// The initial capacity of arenas in this tier.
    pub fn capacity(self) -> usize {
        let config = config();
        match self {
            SizeTier::Small => config.small_tier,
            SizeTier::Medium => config.medium_tier,
            SizeTier::Large => config.large_tier,
        }
    }

    fn pool(self) -> &'static Pool<Bump> {
        match self {
            SizeTier::Small => &SMALL_ARENAS,
            SizeTier::Medium => &MEDIUM_ARENAS,
            SizeTier::Large => &LARGE_ARENAS,
        }
    }

    /// Check out an arena from this tier's pool.
    pub fn arena(self) -> Pooled<'static, Bump> {
        self.pool().checkout()
    }
}

static RENDER_ARENAS: Pool<Bump> = Pool::new("arena.render", || {
    Bump::with_capacity(config().arena_capacity)
});
static SMALL_ARENAS: Pool<Bump> = Pool::new("arena.small", || {
    Bump::with_capacity(SizeTier::Small.capacity())
});
static MEDIUM_ARENAS: Pool<Bump> = Pool::new("arena.medium", || {
    Bump::with_capacity(SizeTier::Medium.capacity())
});
static LARGE_ARENAS: Pool<Bump> = Pool::new("arena.large", || {
    Bump::with_capacity(SizeTier::Large.capacity())
});

/// Check out the arena that backs one render pass.
pub fn render_arena() -> Pooled<'static, Bump> {
    RENDER_ARENAS.checkout()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_resets_stale_state() {
        static POOL: Pool<Vec<u32>> = Pool::new("test.vec", Vec::new);
        let mut v = POOL.get();
        v.extend([1, 2, 3]);
        POOL.put(v);
        assert_eq!(POOL.idle(), 1);

        let v = POOL.get();
        assert!(v.is_empty());
        assert!(v.capacity() >= 3);
        assert_eq!(POOL.idle(), 0);
    }

    #[test]
    fn guard_returns_object_on_drop() {
        static POOL: Pool<String> = Pool::new("test.string", String::new);
        {
            let mut s = POOL.checkout();
            s.push_str("stale");
        }
        assert_eq!(POOL.idle(), 1);
        assert_eq!(POOL.checkout().as_str(), "");
    }

    #[test]
    fn tiers_follow_configured_thresholds() {
        let config = config();
        assert_eq!(SizeTier::for_estimate(0), SizeTier::Small);
        assert_eq!(SizeTier::for_estimate(config.small_tier), SizeTier::Small);
        assert_eq!(SizeTier::for_estimate(config.small_tier + 1), SizeTier::Medium);
        assert_eq!(SizeTier::for_estimate(config.medium_tier + 1), SizeTier::Large);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: PoolConfig = serde_json::from_str(r#"{"max_idle": 8}"#).unwrap();
        assert_eq!(
            config,
            PoolConfig {
                max_idle: 8,
                ..PoolConfig::default()
            }
        );
    }
}
