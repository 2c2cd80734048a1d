//! Tiered resolution of Sef, Kp and density.
//!
//! Each constant walks its own chain: authoritative store first, then the
//! static reference tables, then a computed or default value. A tier that
//! has nothing (or whose store lookup fails) yields `None` and the next one
//! runs, so resolution always produces a value.

use std::f64::consts::PI;

use crate::constants::{
    DENSITY_KG_M3_DIVISOR, DENSITY_KG_M3_THRESHOLD, DIAMETER_MM_TO_RADIUS_M,
    KP_NEUTRAL, KP_RULE_MIN_DIAMETER, WATER_DENSITY_25C_KG_M3,
};
use crate::query::{ConstantKind, ConstantQuery, ConstantRequest, Selection};
use crate::result::{ConstantResult, ConstantSet, DensityFormat, Source};
use crate::store::{ConstantStore, LookupResult};
use crate::table::{KpTable, ReferencePoint, ReferenceTable, lerp};

/// Resolution outcome for a [`ConstantRequest`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    One(ConstantKind, ConstantResult),
    All(ConstantSet),
}

/// Resolves physical constants against an injected store.
pub struct Resolver<S> {
    store: S,
    sef: ReferenceTable,
    kp: KpTable,
    density: ReferenceTable,
}

impl<S: ConstantStore> Resolver<S> {
    /// Resolver over `store` with the standard reference tables.
    pub fn new(store: S) -> Self {
        Self::with_tables(
            store,
            ReferenceTable::sef(),
            KpTable::standard(),
            ReferenceTable::density(),
        )
    }

    pub fn with_tables(
        store: S,
        sef: ReferenceTable,
        kp: KpTable,
        density: ReferenceTable,
    ) -> Self {
        Self {
            store,
            sef,
            kp,
            density,
        }
    }

    pub fn resolve(&self, query: &ConstantQuery) -> ConstantResult {
        match query.kind {
            ConstantKind::Sef => self.resolve_effective_area(query.diameter_or_default()),
            ConstantKind::Kp => self.resolve_projection_correction(
                query.projection_or_default(),
                query.diameter_or_default(),
            ),
            ConstantKind::Densidade => self.resolve_density(query.temperature_or_default()),
        }
    }

    pub fn resolve_request(&self, request: &ConstantRequest) -> Resolution {
        match request.selection {
            Selection::One(kind) => Resolution::One(kind, self.resolve(&request.query(kind))),
            Selection::All => Resolution::All(self.resolve_all(
                request.diameter,
                request.projection,
                request.temperature,
            )),
        }
    }

    pub fn resolve_all(&self, diameter: f64, projection: f64, temperature: f64) -> ConstantSet {
        ConstantSet {
            sef: self.resolve_effective_area(diameter),
            kp: self.resolve_projection_correction(projection, diameter),
            densidade: self.resolve_density(temperature),
        }
    }

    /// Effective area (m²) for a nominal diameter (mm).
    pub fn resolve_effective_area(&self, diameter: f64) -> ConstantResult {
        let kind = ConstantKind::Sef;

        if let Some(value) = consult(kind, self.store.exact(kind, diameter, None)) {
            return traced(kind, ConstantResult::new(value, Source::Database));
        }

        if let Some(value) = self.sef.exact(diameter) {
            return traced(kind, ConstantResult::new(value, Source::StandardTable));
        }

        traced(kind, ConstantResult::new(circular_area(diameter), Source::Computed))
    }

    /// Kp for a TAP projection and nominal diameter.
    pub fn resolve_projection_correction(&self, projection: f64, diameter: f64) -> ConstantResult {
        let kind = ConstantKind::Kp;

        if diameter >= KP_RULE_MIN_DIAMETER {
            return traced(kind, ConstantResult::new(KP_NEUTRAL, Source::Rule));
        }

        if let Some(value) = consult(kind, self.store.exact(kind, projection, Some(diameter))) {
            return traced(kind, ConstantResult::new(value, Source::Database));
        }

        match self.kp.lookup(projection, diameter) {
            Some(value) => traced(kind, ConstantResult::new(value, Source::StandardTable)),
            None => {
                tracing::warn!("Kp table has no row near projection {projection}; using default");
                traced(kind, ConstantResult::new(KP_NEUTRAL, Source::Default))
            }
        }
    }

    /// Density for a temperature (°C), as a fraction of 1000 kg/m³.
    pub fn resolve_density(&self, temperature: f64) -> ConstantResult {
        let kind = ConstantKind::Densidade;

        if let Some(raw) = consult(kind, self.store.exact(kind, temperature, None)) {
            return traced(kind, normalized_density(raw, Source::Database));
        }

        if let Some(result) = consult(kind, self.density_from_store_bounds(temperature)) {
            return traced(kind, result);
        }

        if let Some(kg_m3) = self.density.exact(temperature) {
            return traced(
                kind,
                ConstantResult::density(
                    kg_m3 / DENSITY_KG_M3_DIVISOR,
                    Source::StandardTable,
                    DensityFormat::NormalizedFromKgPerM3,
                ),
            );
        }

        let kg_m3 = self
            .density
            .interpolate_clamped(temperature)
            .unwrap_or(WATER_DENSITY_25C_KG_M3);
        traced(
            kind,
            ConstantResult::density(
                kg_m3 / DENSITY_KG_M3_DIVISOR,
                Source::StandardTableInterpolated,
                DensityFormat::NormalizedFromKgPerM3,
            ),
        )
    }

    /// Interpolate between the store's neighbours of `temperature`, or fall
    /// back to the one below it.
    fn density_from_store_bounds(&self, temperature: f64) -> LookupResult<Option<ConstantResult>> {
        let kind = ConstantKind::Densidade;
        let lower = self.store.floor(kind, temperature)?;
        let upper = self.store.ceiling(kind, temperature)?;

        Ok(match (lower, upper) {
            (Some(lo), Some(hi)) if lo.key != hi.key => Some(normalized_density(
                lerp(lo, hi, temperature),
                Source::DatabaseInterpolated,
            )),
            (Some(ReferencePoint { value, .. }), _) => {
                Some(normalized_density(value, Source::DatabaseApproximated))
            }
            (None, _) => None,
        })
    }
}

/// Turn a store lookup into a tier answer. Failures are logged, not raised.
fn consult<T>(kind: ConstantKind, result: LookupResult<Option<T>>) -> Option<T> {
    match result {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!("{}: {e}; falling back", kind.name());
            None
        }
    }
}

/// π × (DN/2000)², saturated to `f64::MAX` when the square overflows. A NaN
/// diameter has no area.
fn circular_area(diameter: f64) -> f64 {
    let radius = diameter / DIAMETER_MM_TO_RADIUS_M;
    let area = PI * radius * radius;
    if area.is_finite() {
        return area;
    }
    tracing::warn!("Sef for DN {diameter} is out of range; saturating");
    if area.is_nan() { 0.0 } else { f64::MAX }
}

fn normalized_density(raw: f64, source: Source) -> ConstantResult {
    if raw > DENSITY_KG_M3_THRESHOLD {
        ConstantResult::density(
            raw / DENSITY_KG_M3_DIVISOR,
            source,
            DensityFormat::NormalizedFromKgPerM3,
        )
    } else {
        ConstantResult::density(raw, source, DensityFormat::Dimensionless)
    }
}

fn traced(kind: ConstantKind, result: ConstantResult) -> ConstantResult {
    tracing::debug!(
        "{} resolved to {} from {}",
        kind.name(),
        result.value,
        result.source
    );
    result
}
