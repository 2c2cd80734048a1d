use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TEMPERATURE_C;
use crate::error::ResolveError;

/// The physical constants the resolver knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstantKind {
    /// Effective area, m².
    Sef,
    /// TAP projection correction, dimensionless.
    Kp,
    /// Water density, fraction of 1000 kg/m³.
    Densidade,
}

impl ConstantKind {
    pub const ALL: [ConstantKind; 3] = [ConstantKind::Sef, ConstantKind::Kp, ConstantKind::Densidade];

    /// Name as stored in `constante_fisica.ds_nome`.
    pub fn name(self) -> &'static str {
        match self {
            ConstantKind::Sef => "Sef",
            ConstantKind::Kp => "Kp",
            ConstantKind::Densidade => "Densidade",
        }
    }

    /// Request parameter spelling (`tipo=`).
    pub fn as_param(self) -> &'static str {
        match self {
            ConstantKind::Sef => "sef",
            ConstantKind::Kp => "kp",
            ConstantKind::Densidade => "densidade",
        }
    }

    /// Whether rows of this kind are keyed by two reference values.
    pub fn has_secondary_key(self) -> bool {
        matches!(self, ConstantKind::Kp)
    }
}

impl fmt::Display for ConstantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

impl FromStr for ConstantKind {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sef" => Ok(ConstantKind::Sef),
            "kp" => Ok(ConstantKind::Kp),
            "densidade" => Ok(ConstantKind::Densidade),
            _ => Err(ResolveError::InvalidKind(s.to_string())),
        }
    }
}

/// What the caller asked for: one constant, or all three (`todos`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    One(ConstantKind),
    All,
}

impl FromStr for Selection {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("todos") {
            return Ok(Selection::All);
        }
        s.parse().map(Selection::One)
    }
}

/// Input to a single resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantQuery {
    pub kind: ConstantKind,
    pub diameter: Option<f64>,
    pub projection: Option<f64>,
    pub temperature: Option<f64>,
}

impl ConstantQuery {
    pub fn new(kind: ConstantKind) -> Self {
        Self {
            kind,
            diameter: None,
            projection: None,
            temperature: None,
        }
    }

    pub fn with_diameter(mut self, diameter: f64) -> Self {
        self.diameter = Some(diameter);
        self
    }

    pub fn with_projection(mut self, projection: f64) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn diameter_or_default(&self) -> f64 {
        self.diameter.unwrap_or(0.0)
    }

    pub fn projection_or_default(&self) -> f64 {
        self.projection.unwrap_or(0.0)
    }

    pub fn temperature_or_default(&self) -> f64 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE_C)
    }
}

/// A fully parsed outer request (`tipo`, `diametro_nominal`, `projecao_tap`,
/// `temperatura`), with defaults applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantRequest {
    pub selection: Selection,
    pub diameter: f64,
    pub projection: f64,
    pub temperature: f64,
}

impl ConstantRequest {
    pub fn parse(
        tipo: Option<&str>,
        diametro_nominal: Option<&str>,
        projecao_tap: Option<&str>,
        temperatura: Option<&str>,
    ) -> Result<Self, ResolveError> {
        let selection = tipo.unwrap_or_default().parse()?;
        Ok(Self {
            selection,
            diameter: parse_measure("diametro_nominal", diametro_nominal, 0.0),
            projection: parse_measure("projecao_tap", projecao_tap, 0.0),
            temperature: parse_measure("temperatura", temperatura, DEFAULT_TEMPERATURE_C),
        })
    }

    pub fn query(&self, kind: ConstantKind) -> ConstantQuery {
        ConstantQuery::new(kind)
            .with_diameter(self.diameter)
            .with_projection(self.projection)
            .with_temperature(self.temperature)
    }
}

/// Parse a numeric request field.
///
/// Absent, blank, unparsable and non-finite values all resolve to `default`;
/// a malformed number never fails the request. A decimal comma is accepted.
pub fn parse_measure(field: &str, raw: Option<&str>, default: f64) -> f64 {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return default;
    };
    match raw.replace(',', ".").parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            tracing::warn!("{field}: ignoring malformed value '{raw}', using {default}");
            default
        }
    }
}
