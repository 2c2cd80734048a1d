//! The seam between the resolver and the authoritative store.

use crate::error::LookupError;
use crate::query::ConstantKind;
use crate::table::ReferencePoint;

pub type LookupResult<T> = std::result::Result<T, LookupError>;

/// Read access to calibrated reference values.
///
/// `Ok(None)` means the store answered and has no matching row; `Err` means
/// it could not answer. The resolver treats both as "fall through".
pub trait ConstantStore {
    /// Value at exactly `reference` (and `reference_b` for two-key kinds).
    fn exact(
        &self,
        kind: ConstantKind,
        reference: f64,
        reference_b: Option<f64>,
    ) -> LookupResult<Option<f64>>;

    /// Row with the greatest reference key at or below `reference`.
    fn floor(&self, kind: ConstantKind, reference: f64) -> LookupResult<Option<ReferencePoint>>;

    /// Row with the least reference key at or above `reference`.
    fn ceiling(&self, kind: ConstantKind, reference: f64) -> LookupResult<Option<ReferencePoint>>;
}

impl<T: ConstantStore + ?Sized> ConstantStore for &T {
    fn exact(
        &self,
        kind: ConstantKind,
        reference: f64,
        reference_b: Option<f64>,
    ) -> LookupResult<Option<f64>> {
        (**self).exact(kind, reference, reference_b)
    }

    fn floor(&self, kind: ConstantKind, reference: f64) -> LookupResult<Option<ReferencePoint>> {
        (**self).floor(kind, reference)
    }

    fn ceiling(
        &self,
        kind: ConstantKind,
        reference: f64,
    ) -> LookupResult<Option<ReferencePoint>> {
        (**self).ceiling(kind, reference)
    }
}

/// A store with no rows. Resolution runs on static tiers only.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyStore;

impl ConstantStore for EmptyStore {
    fn exact(&self, _: ConstantKind, _: f64, _: Option<f64>) -> LookupResult<Option<f64>> {
        Ok(None)
    }

    fn floor(&self, _: ConstantKind, _: f64) -> LookupResult<Option<ReferencePoint>> {
        Ok(None)
    }

    fn ceiling(&self, _: ConstantKind, _: f64) -> LookupResult<Option<ReferencePoint>> {
        Ok(None)
    }
}

/// A store that fails every lookup with the given reason.
///
/// Stands in for the real store when it cannot be reached in time.
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn fail<T>(&self) -> LookupResult<T> {
        Err(LookupError::new(self.reason.clone()))
    }
}

impl ConstantStore for UnavailableStore {
    fn exact(&self, _: ConstantKind, _: f64, _: Option<f64>) -> LookupResult<Option<f64>> {
        self.fail()
    }

    fn floor(&self, _: ConstantKind, _: f64) -> LookupResult<Option<ReferencePoint>> {
        self.fail()
    }

    fn ceiling(&self, _: ConstantKind, _: f64) -> LookupResult<Option<ReferencePoint>> {
        self.fail()
    }
}
