/*
 * A type-agnostic cache for values whose contents must be adjusted for a
 * given pixel density. Entries are keyed on the identity of the original
 * instance plus the target DPI, so repeated lookups at the same density
 * return the same adapted copy.
 *
 * The cache lives on the UI thread with everything else in this crate, so
 * interior mutability is a `RefCell`; `copy_for_dpi` implementations must
 * not call back into the cache while a lookup is in progress.
 */

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// The capability required of any type stored in a `DpiCache`.
pub trait DpiCopy: Any {
    /// Creates a copy of `self` whose contents are appropriate for `dpi`.
    /// Must not call back into the cache that requested the copy.
    fn copy_for_dpi(&self, dpi: i32) -> Rc<Self>
    where
        Self: Sized;

    /// The pixel density this value was built for, when known. Used as an
    /// optimization hint: a matching density skips copying entirely.
    fn dpi(&self) -> Option<i32> {
        None
    }
}

/// Maps (original instance identity, target DPI) to a density-adapted copy.
///
/// The cache is not reference-counted; the owner of an original instance is
/// responsible for calling `invalidate` when that instance is disposed, so
/// that a later allocation reusing the same address cannot alias stale
/// entries.
#[derive(Default)]
pub struct DpiCache {
    // <original identity> -> dpi -> <copy at that dpi>
    entries: RefCell<HashMap<usize, HashMap<i32, Rc<dyn Any>>>>,
}

impl DpiCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an instance equivalent to `inst` that is appropriate for
    /// `dpi`. If `inst` already reports the requested density it is returned
    /// unchanged; otherwise a cached copy is returned, created on first use
    /// via `DpiCopy::copy_for_dpi`.
    pub fn instance_for_dpi<T: DpiCopy>(&self, inst: &Rc<T>, dpi: i32) -> Rc<T> {
        if inst.dpi() == Some(dpi) {
            // The DPI is already what we want; nothing needs to be done.
            return Rc::clone(inst);
        }

        let key = Rc::as_ptr(inst) as usize;
        let mut entries = self.entries.borrow_mut();
        let sub = entries.entry(key).or_default();

        if let Some(cached) = sub.get(&dpi)
            && let Ok(hit) = Rc::clone(cached).downcast::<T>()
        {
            return hit;
        }

        let copy = inst.copy_for_dpi(dpi);
        sub.insert(dpi, Rc::clone(&copy) as Rc<dyn Any>);
        copy
    }

    /// Removes any cached variants of `inst`, if present.
    pub fn invalidate<T: DpiCopy>(&self, inst: &Rc<T>) {
        self.entries
            .borrow_mut()
            .remove(&(Rc::as_ptr(inst) as usize));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug)]
    struct Metrics {
        dpi: i32,
        scale: i32,
        copies: Rc<Cell<usize>>,
    }

    impl DpiCopy for Metrics {
        fn copy_for_dpi(&self, dpi: i32) -> Rc<Self> {
            self.copies.set(self.copies.get() + 1);
            Rc::new(Metrics {
                dpi,
                scale: self.scale * dpi / self.dpi,
                copies: Rc::clone(&self.copies),
            })
        }

        fn dpi(&self) -> Option<i32> {
            Some(self.dpi)
        }
    }

    fn metrics(dpi: i32) -> (Rc<Metrics>, Rc<Cell<usize>>) {
        let copies = Rc::new(Cell::new(0));
        (
            Rc::new(Metrics {
                dpi,
                scale: 100,
                copies: Rc::clone(&copies),
            }),
            copies,
        )
    }

    #[test]
    fn matching_dpi_returns_original_without_copying() {
        let cache = DpiCache::new();
        let (m, copies) = metrics(96);
        let got = cache.instance_for_dpi(&m, 96);
        assert!(Rc::ptr_eq(&got, &m));
        assert_eq!(copies.get(), 0);
    }

    #[test]
    fn second_lookup_at_same_dpi_hits_the_cache() {
        let cache = DpiCache::new();
        let (m, copies) = metrics(96);

        let first = cache.instance_for_dpi(&m, 144);
        let second = cache.instance_for_dpi(&m, 144);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(copies.get(), 1);
        assert_eq!(first.scale, 150);
    }

    #[test]
    fn distinct_dpis_produce_distinct_copies() {
        let cache = DpiCache::new();
        let (m, copies) = metrics(96);

        let a = cache.instance_for_dpi(&m, 120);
        let b = cache.instance_for_dpi(&m, 144);
        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(copies.get(), 2);
    }

    #[test]
    fn invalidate_forces_a_fresh_copy() {
        let cache = DpiCache::new();
        let (m, copies) = metrics(96);

        let first = cache.instance_for_dpi(&m, 144);
        cache.invalidate(&m);
        let second = cache.instance_for_dpi(&m, 144);
        assert!(!Rc::ptr_eq(&first, &second));
        assert_eq!(copies.get(), 2);
    }
}
