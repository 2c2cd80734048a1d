//! JSON response shapes shared by the HTTP endpoint and `resolve --json`.

use serde::Serialize;
use simp_core::{ConstantResult, DensityFormat, Resolution, Source};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    One {
        success: bool,
        valor: f64,
        fonte: Source,
        #[serde(skip_serializing_if = "Option::is_none")]
        formato: Option<DensityFormat>,
    },
    All {
        success: bool,
        sef: f64,
        sef_fonte: Source,
        kp: f64,
        kp_fonte: Source,
        densidade: f64,
        densidade_fonte: Source,
        densidade_formato: DensityFormat,
    },
    Error {
        success: bool,
        error: String,
    },
}

impl Envelope {
    pub fn error(err: &impl std::fmt::Display) -> Self {
        Envelope::Error {
            success: false,
            error: err.to_string(),
        }
    }

    fn one(result: ConstantResult) -> Self {
        Envelope::One {
            success: true,
            valor: result.value,
            fonte: result.source,
            formato: result.format,
        }
    }
}

impl From<Resolution> for Envelope {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::One(_, result) => Envelope::one(result),
            Resolution::All(set) => Envelope::All {
                success: true,
                sef: set.sef.value,
                sef_fonte: set.sef.source,
                kp: set.kp.value,
                kp_fonte: set.kp.source,
                densidade: set.densidade.value,
                densidade_fonte: set.densidade.source,
                densidade_formato: set.densidade.format.unwrap_or_default(),
            },
        }
    }
}
