use std::fmt;

use serde::{Deserialize, Serialize};

/// Which resolution tier produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "banco")]
    Database,
    #[serde(rename = "banco_interpolado")]
    DatabaseInterpolated,
    #[serde(rename = "banco_aproximado")]
    DatabaseApproximated,
    #[serde(rename = "tabela_padrao")]
    StandardTable,
    #[serde(rename = "tabela_padrao_interpolada")]
    StandardTableInterpolated,
    #[serde(rename = "calculado")]
    Computed,
    #[serde(rename = "regra_dn_301")]
    Rule,
    #[serde(rename = "padrao")]
    Default,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Database => "banco",
            Source::DatabaseInterpolated => "banco_interpolado",
            Source::DatabaseApproximated => "banco_aproximado",
            Source::StandardTable => "tabela_padrao",
            Source::StandardTableInterpolated => "tabela_padrao_interpolada",
            Source::Computed => "calculado",
            Source::Rule => "regra_dn_301",
            Source::Default => "padrao",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a density was divided by 1000 on the way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DensityFormat {
    #[default]
    #[serde(rename = "adimensional")]
    Dimensionless,
    #[serde(rename = "normalizado_de_kgm3")]
    NormalizedFromKgPerM3,
}

impl DensityFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            DensityFormat::Dimensionless => "adimensional",
            DensityFormat::NormalizedFromKgPerM3 => "normalizado_de_kgm3",
        }
    }
}

impl fmt::Display for DensityFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved constant and its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConstantResult {
    pub value: f64,
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<DensityFormat>,
}

impl ConstantResult {
    pub fn new(value: f64, source: Source) -> Self {
        Self {
            value,
            source,
            format: None,
        }
    }

    pub fn density(value: f64, source: Source, format: DensityFormat) -> Self {
        Self {
            value,
            source,
            format: Some(format),
        }
    }
}

/// The three constants resolved together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConstantSet {
    pub sef: ConstantResult,
    pub kp: ConstantResult,
    pub densidade: ConstantResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_wire_names_match_serde() {
        for source in [
            Source::Database,
            Source::DatabaseInterpolated,
            Source::DatabaseApproximated,
            Source::StandardTable,
            Source::StandardTableInterpolated,
            Source::Computed,
            Source::Rule,
            Source::Default,
        ] {
            let json = serde_json::to_string(&source).unwrap();
            assert_eq!(json, format!("\"{}\"", source.as_str()));
        }
    }

    #[test]
    fn test_result_omits_absent_format() {
        let r = ConstantResult::new(1.0, Source::Rule);
        let json = serde_json::to_value(r).unwrap();
        assert!(json.get("format").is_none());
        assert_eq!(json["source"], "regra_dn_301");
    }
}
