//! Static reference tables and the lookups the resolver runs over them.
//!
//! Tables are `'static` slices sorted ascending by key. They are only read,
//! so they can be shared across threads without synchronization.

use crate::constants::{DENSITY_TABLE, KP_TABLE, KpRow, SEF_TABLE};

/// A (reference key, value) pair, from a static table or the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePoint {
    pub key: f64,
    pub value: f64,
}

impl ReferencePoint {
    pub fn new(key: f64, value: f64) -> Self {
        Self { key, value }
    }
}

/// Read-only key → value mapping, ascending by key.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceTable {
    entries: &'static [(f64, f64)],
}

impl ReferenceTable {
    pub const fn new(entries: &'static [(f64, f64)]) -> Self {
        Self { entries }
    }

    pub const fn sef() -> Self {
        Self::new(SEF_TABLE)
    }

    pub const fn density() -> Self {
        Self::new(DENSITY_TABLE)
    }

    /// Value stored under exactly `key`.
    pub fn exact(&self, key: f64) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|&(_, v)| v)
    }

    /// Entry whose key is closest to `key`. Ties go to the lower key.
    pub fn nearest(&self, key: f64) -> Option<ReferencePoint> {
        nearest_by(self.entries, key, |&(k, _)| k).map(|&(k, v)| ReferencePoint::new(k, v))
    }

    /// Linear interpolation between the bracketing entries.
    ///
    /// Outside the table range the boundary value is returned unchanged.
    pub fn interpolate_clamped(&self, key: f64) -> Option<f64> {
        let (first, last) = (self.entries.first()?, self.entries.last()?);
        if key <= first.0 {
            return Some(first.1);
        }
        if key >= last.0 {
            return Some(last.1);
        }

        let upper = self.entries.iter().position(|&(k, _)| k >= key)?;
        let (lk, lv) = self.entries[upper - 1];
        let (uk, uv) = self.entries[upper];
        Some(lerp(
            ReferencePoint::new(lk, lv),
            ReferencePoint::new(uk, uv),
            key,
        ))
    }
}

/// Straight-line interpolation at `x` between two points with distinct keys.
pub fn lerp(lower: ReferencePoint, upper: ReferencePoint, x: f64) -> f64 {
    let factor = (x - lower.key) / (upper.key - lower.key);
    lower.value + factor * (upper.value - lower.value)
}

/// First item (in slice order) minimizing |key(item) - target|.
///
/// Only a strictly smaller distance replaces the current pick, so on ties the
/// earlier item wins. A NaN target therefore resolves to the first item.
pub fn nearest_by<T, F>(items: &[T], target: f64, key: F) -> Option<&T>
where
    F: Fn(&T) -> f64,
{
    let mut iter = items.iter();
    let mut best = iter.next()?;
    let mut best_diff = (target - key(best)).abs();
    for item in iter {
        let diff = (target - key(item)).abs();
        if diff < best_diff {
            best = item;
            best_diff = diff;
        }
    }
    Some(best)
}

/// The two-level Kp table: projection rows, each keyed by nominal diameter.
#[derive(Clone, Copy)]
pub struct KpTable {
    rows: &'static [KpRow],
}

impl KpTable {
    pub const fn new(rows: &'static [KpRow]) -> Self {
        Self { rows }
    }

    pub const fn standard() -> Self {
        Self::new(KP_TABLE)
    }

    /// Row for the projection closest to `projection`.
    pub fn nearest_row(&self, projection: f64) -> Option<&'static KpRow> {
        nearest_by(self.rows, projection, |row| row.projection)
    }

    /// Kp at the nearest projection row, then the nearest diameter in it.
    pub fn lookup(&self, projection: f64, diameter: f64) -> Option<f64> {
        let row = self.nearest_row(projection)?;
        ReferenceTable::new(row.by_diameter)
            .nearest(diameter)
            .map(|p| p.value)
    }
}
