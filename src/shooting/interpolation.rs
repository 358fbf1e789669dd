//! Sorted key/value table with clamped linear interpolation

use crate::error::InterpolationError;

/// Keys that can report where a query falls between two bracketing keys
pub trait InterpolationKey: Copy + PartialOrd {
    /// Fraction in [0, 1] of `query` between `lo` and `hi`
    fn fraction(lo: Self, hi: Self, query: Self) -> f64;

    /// Keys that cannot be ordered (NaN) are refused on insert
    fn is_orderable(&self) -> bool;
}

/// Values that can be blended linearly
pub trait Interpolate: Clone {
    fn interpolate(&self, other: &Self, t: f64) -> Self;
}

impl InterpolationKey for f64 {
    fn fraction(lo: f64, hi: f64, query: f64) -> f64 {
        let span = hi - lo;
        if span <= 0.0 {
            return 0.0;
        }
        ((query - lo) / span).clamp(0.0, 1.0)
    }

    fn is_orderable(&self) -> bool {
        !self.is_nan()
    }
}

impl Interpolate for f64 {
    fn interpolate(&self, other: &f64, t: f64) -> f64 {
        self + (other - self) * t
    }
}

/// Ordered map from scalar key to value.
///
/// Entries live in a vector kept sorted by key; tables are tens of entries
/// so insertion is a binary search plus shift and lookups never allocate.
/// Inserting an existing key replaces its value.
#[derive(Debug, Clone, Default)]
pub struct InterpolationTable<K, V> {
    entries: Vec<(K, V)>,
}

impl<K: InterpolationKey, V: Interpolate> InterpolationTable<K, V> {
    pub fn new() -> Self {
        InterpolationTable {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(K, V)] {
        &self.entries
    }

    /// Insert or replace. Returns false if the key cannot be ordered.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        if !key.is_orderable() {
            return false;
        }
        let idx = self.entries.partition_point(|(k, _)| *k < key);
        match self.entries.get_mut(idx) {
            Some(entry) if entry.0 == key => entry.1 = value,
            _ => self.entries.insert(idx, (key, value)),
        }
        true
    }

    /// Value of the entry whose key is closest to `key`
    pub fn nearest(&self, key: K) -> Result<V, InterpolationError> {
        let (lo, hi) = self.bracket(key)?;
        let (k_lo, v_lo) = &self.entries[lo];
        let (_, v_hi) = &self.entries[hi];
        if K::fraction(*k_lo, self.entries[hi].0, key) <= 0.5 {
            Ok(v_lo.clone())
        } else {
            Ok(v_hi.clone())
        }
    }

    /// Linear interpolation between the bracketing entries, clamped to the
    /// first and last values outside the key range.
    pub fn lookup(&self, key: K) -> Result<V, InterpolationError> {
        let (lo, hi) = self.bracket(key)?;
        let (k_lo, v_lo) = &self.entries[lo];
        let (k_hi, v_hi) = &self.entries[hi];
        if lo == hi {
            return Ok(v_lo.clone());
        }
        let t = K::fraction(*k_lo, *k_hi, key);
        Ok(v_lo.interpolate(v_hi, t))
    }

    /// Indices of the entries surrounding `key`; equal when clamped or exact
    fn bracket(&self, key: K) -> Result<(usize, usize), InterpolationError> {
        let last = match self.entries.len() {
            0 => return Err(InterpolationError::EmptyTable),
            n => n - 1,
        };
        if !key.is_orderable() || key <= self.entries[0].0 {
            return Ok((0, 0));
        }
        if key >= self.entries[last].0 {
            return Ok((last, last));
        }
        let hi = self.entries.partition_point(|(k, _)| *k < key);
        if self.entries[hi].0 == key {
            return Ok((hi, hi));
        }
        Ok((hi - 1, hi))
    }
}

impl<K: InterpolationKey, V: Interpolate> FromIterator<(K, V)> for InterpolationTable<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = InterpolationTable::new();
        for (k, v) in iter {
            table.insert(k, v);
        }
        table
    }
}
