//! Integration tests for tiered resolution against scripted stores:
//! store hits, table fallbacks, interpolation, and store failures.

use std::cell::Cell;
use std::f64::consts::PI;

use approx::assert_abs_diff_eq;
use proptest::prelude::*;
use simp_core::{
    ConstantKind, ConstantResult, ConstantStore, DensityFormat, EmptyStore, LookupError,
    LookupResult, ReferencePoint, Resolver, SEF_TABLE, Source, UnavailableStore,
};

#[derive(Default)]
struct MapStore {
    rows: Vec<(ConstantKind, f64, Option<f64>, f64)>,
    calls: Cell<usize>,
}

impl MapStore {
    fn with(mut self, kind: ConstantKind, reference: f64, reference_b: Option<f64>, value: f64) -> Self {
        self.rows.push((kind, reference, reference_b, value));
        self
    }

    fn points(&self, kind: ConstantKind) -> impl Iterator<Item = ReferencePoint> + '_ {
        self.rows
            .iter()
            .filter(move |r| r.0 == kind)
            .map(|r| ReferencePoint::new(r.1, r.3))
    }
}

impl ConstantStore for MapStore {
    fn exact(&self, kind: ConstantKind, reference: f64, reference_b: Option<f64>) -> LookupResult<Option<f64>> {
        self.calls.set(self.calls.get() + 1);
        Ok(self
            .rows
            .iter()
            .find(|r| r.0 == kind && r.1 == reference && (reference_b.is_none() || r.2 == reference_b))
            .map(|r| r.3))
    }

    fn floor(&self, kind: ConstantKind, reference: f64) -> LookupResult<Option<ReferencePoint>> {
        self.calls.set(self.calls.get() + 1);
        Ok(self
            .points(kind)
            .filter(|p| p.key <= reference)
            .max_by(|a, b| a.key.total_cmp(&b.key)))
    }

    fn ceiling(&self, kind: ConstantKind, reference: f64) -> LookupResult<Option<ReferencePoint>> {
        self.calls.set(self.calls.get() + 1);
        Ok(self
            .points(kind)
            .filter(|p| p.key >= reference)
            .min_by(|a, b| a.key.total_cmp(&b.key)))
    }
}

/// Fails every lookup for one kind, delegates the rest.
struct FailingFor {
    kind: ConstantKind,
    inner: MapStore,
}

impl FailingFor {
    fn check(&self, kind: ConstantKind) -> LookupResult<()> {
        if kind == self.kind {
            Err(LookupError::new("connection reset"))
        } else {
            Ok(())
        }
    }
}

impl ConstantStore for FailingFor {
    fn exact(&self, kind: ConstantKind, reference: f64, reference_b: Option<f64>) -> LookupResult<Option<f64>> {
        self.check(kind)?;
        self.inner.exact(kind, reference, reference_b)
    }

    fn floor(&self, kind: ConstantKind, reference: f64) -> LookupResult<Option<ReferencePoint>> {
        self.check(kind)?;
        self.inner.floor(kind, reference)
    }

    fn ceiling(&self, kind: ConstantKind, reference: f64) -> LookupResult<Option<ReferencePoint>> {
        self.check(kind)?;
        self.inner.ceiling(kind, reference)
    }
}

// --- Sef ---

#[test]
fn sef_standard_diameters_come_from_table() {
    let resolver = Resolver::new(EmptyStore);
    for &(dn, area) in SEF_TABLE {
        let r = resolver.resolve_effective_area(dn);
        assert_eq!(r, ConstantResult::new(area, Source::StandardTable), "DN {dn}");
    }
}

#[test]
fn sef_non_standard_diameter_is_computed() {
    let resolver = Resolver::new(EmptyStore);
    for dn in [0.0, 63.0, 125.0, 1500.0] {
        let r = resolver.resolve_effective_area(dn);
        assert_eq!(r.source, Source::Computed);
        assert_abs_diff_eq!(r.value, PI * (dn / 2000.0).powi(2), epsilon = 1e-15);
    }
}

#[test]
fn sef_store_overrides_table() {
    let store = MapStore::default().with(ConstantKind::Sef, 100.0, None, 0.0079);
    let resolver = Resolver::new(&store);
    assert_eq!(
        resolver.resolve_effective_area(100.0),
        ConstantResult::new(0.0079, Source::Database)
    );
}

#[test]
fn sef_ignores_rows_of_other_kinds() {
    let store = MapStore::default().with(ConstantKind::Densidade, 100.0, None, 5.0);
    let resolver = Resolver::new(&store);
    assert_eq!(resolver.resolve_effective_area(100.0).source, Source::StandardTable);
}

// --- Kp ---

#[test]
fn kp_rule_applies_before_store() {
    let store = MapStore::default().with(ConstantKind::Kp, 25.0, Some(301.0), 0.5);
    let resolver = Resolver::new(&store);
    for projection in [0.0, 25.0, 50.0, -3.0] {
        assert_eq!(
            resolver.resolve_projection_correction(projection, 301.0),
            ConstantResult::new(1.0, Source::Rule)
        );
    }
    assert_eq!(store.calls.get(), 0, "rule must short-circuit the store");
}

#[test]
fn kp_rule_holds_even_when_store_is_down() {
    let resolver = Resolver::new(UnavailableStore::new("offline"));
    assert_eq!(resolver.resolve_projection_correction(30.0, 800.0).source, Source::Rule);
}

#[test]
fn kp_table_value_for_projection_25_dn_50() {
    let resolver = Resolver::new(EmptyStore);
    assert_eq!(
        resolver.resolve_projection_correction(25.0, 50.0),
        ConstantResult::new(0.98, Source::StandardTable)
    );
}

#[test]
fn kp_store_match_needs_both_keys() {
    let store = MapStore::default().with(ConstantKind::Kp, 30.0, Some(100.0), 0.991);
    let resolver = Resolver::new(&store);
    assert_eq!(
        resolver.resolve_projection_correction(30.0, 100.0),
        ConstantResult::new(0.991, Source::Database)
    );
    // same projection, different DN: falls to the table
    assert_eq!(
        resolver.resolve_projection_correction(30.0, 150.0),
        ConstantResult::new(0.995, Source::StandardTable)
    );
}

#[test]
fn kp_table_uses_nearest_with_lower_tie_break() {
    let resolver = Resolver::new(EmptyStore);
    // 42.5 is halfway between 40 and 45; 62.5 halfway between 50 and 75
    let r = resolver.resolve_projection_correction(42.5, 62.5);
    assert_eq!(r, ConstantResult::new(0.95, Source::StandardTable));
    // 300.9 still below the rule threshold; nearest DN is 300
    let r = resolver.resolve_projection_correction(48.0, 300.9);
    assert_eq!(r, ConstantResult::new(1.0, Source::StandardTable));
}

// --- Densidade ---

#[test]
fn density_exact_table_key() {
    let resolver = Resolver::new(EmptyStore);
    let r = resolver.resolve_density(25.0);
    assert_eq!(r.source, Source::StandardTable);
    assert_eq!(r.format, Some(DensityFormat::NormalizedFromKgPerM3));
    assert_abs_diff_eq!(r.value, 0.99705, epsilon = 1e-12);
}

#[test]
fn density_interpolates_between_table_keys() {
    let resolver = Resolver::new(EmptyStore);
    let r = resolver.resolve_density(22.0);
    assert_eq!(r.source, Source::StandardTableInterpolated);
    assert_eq!(r.format, Some(DensityFormat::NormalizedFromKgPerM3));
    assert_abs_diff_eq!(r.value, (998.20 + 0.4 * (997.05 - 998.20)) / 1000.0, epsilon = 1e-12);
}

#[test]
fn density_outside_table_clamps_to_boundary() {
    let resolver = Resolver::new(EmptyStore);
    let cold = resolver.resolve_density(-4.0);
    assert_eq!(cold.source, Source::StandardTableInterpolated);
    assert_abs_diff_eq!(cold.value, 0.99984, epsilon = 1e-12);

    let hot = resolver.resolve_density(70.0);
    assert_abs_diff_eq!(hot.value, 0.98803, epsilon = 1e-12);
}

#[test]
fn density_store_exact_in_kg_m3_is_normalized() {
    let store = MapStore::default().with(ConstantKind::Densidade, 20.0, None, 998.21);
    let resolver = Resolver::new(&store);
    let r = resolver.resolve_density(20.0);
    assert_eq!(r.source, Source::Database);
    assert_eq!(r.format, Some(DensityFormat::NormalizedFromKgPerM3));
    assert_abs_diff_eq!(r.value, 0.99821, epsilon = 1e-12);
}

#[test]
fn density_store_exact_dimensionless_passes_through() {
    let store = MapStore::default().with(ConstantKind::Densidade, 20.0, None, 0.9982);
    let resolver = Resolver::new(&store);
    let r = resolver.resolve_density(20.0);
    assert_eq!(r, ConstantResult::density(0.9982, Source::Database, DensityFormat::Dimensionless));
}

#[test]
fn density_store_interpolated() {
    let store = MapStore::default()
        .with(ConstantKind::Densidade, 20.0, None, 998.0)
        .with(ConstantKind::Densidade, 30.0, None, 996.0);
    let resolver = Resolver::new(&store);
    let r = resolver.resolve_density(22.5);
    assert_eq!(r.source, Source::DatabaseInterpolated);
    assert_eq!(r.format, Some(DensityFormat::NormalizedFromKgPerM3));
    assert_abs_diff_eq!(r.value, 0.9975, epsilon = 1e-12);
}

#[test]
fn density_store_only_lower_bound_is_approximated() {
    let store = MapStore::default().with(ConstantKind::Densidade, 20.0, None, 0.998);
    let resolver = Resolver::new(&store);
    let r = resolver.resolve_density(35.0);
    assert_eq!(
        r,
        ConstantResult::density(0.998, Source::DatabaseApproximated, DensityFormat::Dimensionless)
    );
}

#[test]
fn density_store_only_upper_bound_falls_to_table() {
    let store = MapStore::default().with(ConstantKind::Densidade, 40.0, None, 992.0);
    let resolver = Resolver::new(&store);
    let r = resolver.resolve_density(25.0);
    assert_eq!(r.source, Source::StandardTable);
}

#[test]
fn density_store_failure_falls_to_table() {
    let resolver = Resolver::new(UnavailableStore::new("timeout"));
    let r = resolver.resolve_density(25.0);
    assert_eq!(r.source, Source::StandardTable);
    assert_abs_diff_eq!(r.value, 0.99705, epsilon = 1e-12);
}

// --- aggregate ---

#[test]
fn resolve_all_isolates_store_failures() {
    let inner = MapStore::default()
        .with(ConstantKind::Sef, 100.0, None, 0.0080)
        .with(ConstantKind::Kp, 25.0, Some(100.0), 0.97)
        .with(ConstantKind::Densidade, 25.0, None, 997.0);
    let store = FailingFor {
        kind: ConstantKind::Kp,
        inner,
    };
    let resolver = Resolver::new(&store);

    let set = resolver.resolve_all(100.0, 25.0, 25.0);
    assert_eq!(set.sef, ConstantResult::new(0.0080, Source::Database));
    assert_eq!(set.kp, ConstantResult::new(0.995, Source::StandardTable));
    assert_eq!(set.densidade.source, Source::Database);
    assert_abs_diff_eq!(set.densidade.value, 0.997, epsilon = 1e-12);
}

#[test]
fn resolve_all_with_unreachable_store_uses_static_tiers() {
    let resolver = Resolver::new(UnavailableStore::new("refused"));
    let set = resolver.resolve_all(75.0, 35.0, 10.0);
    assert_eq!(set.sef, ConstantResult::new(0.004418, Source::StandardTable));
    assert_eq!(set.kp, ConstantResult::new(0.97, Source::StandardTable));
    assert_eq!(set.densidade.source, Source::StandardTable);
}

#[test]
fn repeated_resolution_is_identical() {
    let store = MapStore::default()
        .with(ConstantKind::Densidade, 10.0, None, 999.7)
        .with(ConstantKind::Densidade, 20.0, None, 998.2);
    let resolver = Resolver::new(&store);
    assert_eq!(resolver.resolve_all(90.0, 33.0, 14.2), resolver.resolve_all(90.0, 33.0, 14.2));
}

proptest! {
    #[test]
    fn kp_within_bounds(projection in -100.0f64..200.0, diameter in 0.0f64..2000.0) {
        let r = Resolver::new(EmptyStore).resolve_projection_correction(projection, diameter);
        prop_assert!((0.0..=1.1).contains(&r.value));
    }

    #[test]
    fn sef_and_density_finite_non_negative(
        diameter in prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL | prop::num::f64::ZERO,
        temperature in prop::num::f64::NORMAL | prop::num::f64::ZERO,
    ) {
        let resolver = Resolver::new(EmptyStore);
        let sef = resolver.resolve_effective_area(diameter);
        let dens = resolver.resolve_density(temperature);
        prop_assert!(sef.value.is_finite() && sef.value >= 0.0);
        prop_assert!(dens.value.is_finite() && dens.value > 0.0);
        prop_assert_eq!(dens.format, Some(DensityFormat::NormalizedFromKgPerM3));
    }

    #[test]
    fn resolution_is_deterministic(diameter in 0.0f64..1500.0, projection in 0.0f64..80.0, temperature in -10.0f64..60.0) {
        let resolver = Resolver::new(EmptyStore);
        prop_assert_eq!(
            resolver.resolve_all(diameter, projection, temperature),
            resolver.resolve_all(diameter, projection, temperature)
        );
    }
}
