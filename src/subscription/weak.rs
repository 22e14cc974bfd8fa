//! Non-owning subscriber handles.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

/// Identities handed to references built from an already-empty `Weak`.
/// Odd values never collide with allocation addresses, which are aligned.
static DETACHED_IDS: AtomicUsize = AtomicUsize::new(1);

/// A weak handle to a subscriber.
///
/// The reference never keeps its referent alive. Identity is the address of
/// the original allocation: the inner `Weak` pins that allocation for as long
/// as this reference exists, so two references to different subscribers
/// never compare equal, even after both subscribers are gone.
pub struct WeakReference<T: ?Sized> {
    inner: Weak<T>,
    identity: usize,
}

impl<T: ?Sized> WeakReference<T> {
    /// Create a weak reference to a live object.
    pub fn new(referent: &Arc<T>) -> Self {
        Self::from_weak(Arc::downgrade(referent))
    }

    /// Wrap an existing weak handle.
    ///
    /// A handle whose referent is already gone gets a fresh synthetic
    /// identity; `Weak::new()` handles all share one dangling address and
    /// would otherwise collapse into a single entry.
    pub fn from_weak(inner: Weak<T>) -> Self {
        let identity = if inner.strong_count() > 0 {
            inner.as_ptr() as *const () as usize
        } else {
            DETACHED_IDS.fetch_add(2, Ordering::Relaxed)
        };
        Self { inner, identity }
    }

    /// Upgrade to a strong handle if the referent is still alive.
    pub fn resolve(&self) -> Option<Arc<T>> {
        self.inner.upgrade()
    }

    /// Whether the referent is still alive.
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Whether this reference points at `other`.
    pub fn refers_to(&self, other: &Arc<T>) -> bool {
        self.identity == Arc::as_ptr(other) as *const () as usize
    }
}

impl<T: ?Sized> Clone for WeakReference<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            identity: self.identity,
        }
    }
}

impl<T: ?Sized> PartialEq for WeakReference<T> {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl<T: ?Sized> Eq for WeakReference<T> {}

impl<T: ?Sized> Hash for WeakReference<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for WeakReference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakReference")
            .field("identity", &format_args!("{:#x}", self.identity))
            .field("alive", &self.is_alive())
            .finish()
    }
}
