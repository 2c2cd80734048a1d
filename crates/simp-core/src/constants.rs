/// Nominal diameters at or above this skip the Kp lookup (Kp = 1).
pub const KP_RULE_MIN_DIAMETER: f64 = 301.0;

/// Kp returned by the DN rule and when no table row exists.
pub const KP_NEUTRAL: f64 = 1.0;

/// Raw densities above this are taken to be in kg/m³.
pub const DENSITY_KG_M3_THRESHOLD: f64 = 10.0;

/// Divisor that turns a kg/m³ density into a fraction of 1000 kg/m³.
pub const DENSITY_KG_M3_DIVISOR: f64 = 1000.0;

/// Millimetre diameter → radius in metres: r = DN / 2000.
pub const DIAMETER_MM_TO_RADIUS_M: f64 = 2000.0;

/// Temperature assumed when the caller gives none (°C).
pub const DEFAULT_TEMPERATURE_C: f64 = 25.0;

/// Water at 25 °C, used if the density table is empty.
pub const WATER_DENSITY_25C_KG_M3: f64 = 997.05;

/// Effective area (m²) by nominal diameter (mm).
///
/// Theoretical π × (DN/2000)²; calibrated values in the store take priority.
pub const SEF_TABLE: &[(f64, f64)] = &[
    (50.0, 0.001963),
    (75.0, 0.004418),
    (100.0, 0.007854),
    (150.0, 0.017671),
    (200.0, 0.031416),
    (250.0, 0.049087),
    (300.0, 0.070686),
    (350.0, 0.096211),
    (400.0, 0.125664),
    (450.0, 0.159043),
    (500.0, 0.196350),
    (600.0, 0.282743),
    (700.0, 0.384845),
    (800.0, 0.502655),
    (900.0, 0.636173),
    (1000.0, 0.785398),
    (1100.0, 0.950332),
    (1200.0, 1.130973),
];

/// One TAP projection row of the Kp table: DN (mm) → Kp.
pub struct KpRow {
    pub projection: f64,
    pub by_diameter: &'static [(f64, f64)],
}

/// Kp by TAP projection, then by nominal diameter. Ascending on both axes.
pub const KP_TABLE: &[KpRow] = &[
    KpRow {
        projection: 25.0,
        by_diameter: &[
            (50.0, 0.98),
            (75.0, 0.99),
            (100.0, 0.995),
            (150.0, 0.998),
            (200.0, 0.999),
            (250.0, 1.0),
            (300.0, 1.0),
        ],
    },
    KpRow {
        projection: 30.0,
        by_diameter: &[
            (50.0, 0.97),
            (75.0, 0.98),
            (100.0, 0.99),
            (150.0, 0.995),
            (200.0, 0.998),
            (250.0, 0.999),
            (300.0, 1.0),
        ],
    },
    KpRow {
        projection: 35.0,
        by_diameter: &[
            (50.0, 0.96),
            (75.0, 0.97),
            (100.0, 0.98),
            (150.0, 0.99),
            (200.0, 0.995),
            (250.0, 0.998),
            (300.0, 1.0),
        ],
    },
    KpRow {
        projection: 40.0,
        by_diameter: &[
            (50.0, 0.95),
            (75.0, 0.96),
            (100.0, 0.97),
            (150.0, 0.98),
            (200.0, 0.99),
            (250.0, 0.995),
            (300.0, 1.0),
        ],
    },
    KpRow {
        projection: 45.0,
        by_diameter: &[
            (50.0, 0.94),
            (75.0, 0.95),
            (100.0, 0.96),
            (150.0, 0.97),
            (200.0, 0.98),
            (250.0, 0.99),
            (300.0, 1.0),
        ],
    },
    KpRow {
        projection: 50.0,
        by_diameter: &[
            (50.0, 0.93),
            (75.0, 0.94),
            (100.0, 0.95),
            (150.0, 0.96),
            (200.0, 0.97),
            (250.0, 0.98),
            (300.0, 1.0),
        ],
    },
];

/// Water density (kg/m³) by temperature (°C), 0–50 in 5° steps.
pub const DENSITY_TABLE: &[(f64, f64)] = &[
    (0.0, 999.84),
    (5.0, 999.96),
    (10.0, 999.70),
    (15.0, 999.10),
    (20.0, 998.20),
    (25.0, 997.05),
    (30.0, 995.65),
    (35.0, 994.03),
    (40.0, 992.22),
    (45.0, 990.21),
    (50.0, 988.03),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn ascending(entries: &[(f64, f64)]) -> bool {
        entries.windows(2).all(|w| w[0].0 < w[1].0)
    }

    #[test]
    fn test_tables_sorted_ascending() {
        assert!(ascending(SEF_TABLE));
        assert!(ascending(DENSITY_TABLE));
        assert!(KP_TABLE.windows(2).all(|w| w[0].projection < w[1].projection));
        for row in KP_TABLE {
            assert!(ascending(row.by_diameter), "row {} unsorted", row.projection);
        }
    }

    #[test]
    fn test_sef_table_is_geometric_area() {
        for &(dn, area) in SEF_TABLE {
            let r = dn / DIAMETER_MM_TO_RADIUS_M;
            let computed = std::f64::consts::PI * r * r;
            assert!(
                (computed - area).abs() < 1e-6,
                "DN {dn}: table {area} vs computed {computed}"
            );
        }
    }

    #[test]
    fn test_kp_values_in_range() {
        for row in KP_TABLE {
            for &(_, kp) in row.by_diameter {
                assert!((0.0..=1.1).contains(&kp));
            }
        }
    }
}
