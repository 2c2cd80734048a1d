//! Physical-constant resolution for pitometric (KPC) calculations.
//!
//! Resolves effective area (Sef), TAP projection correction (Kp) and water
//! density from an injected authoritative store, degrading to static
//! reference tables, interpolation and closed-form values. Resolution never
//! fails for lack of data; every result carries the tier that produced it.
//!
//! Zero I/O: the store is a trait, persistence lives in `simp-store`.

pub mod constants;
pub mod error;
pub mod query;
pub mod resolver;
pub mod result;
pub mod store;
pub mod table;

pub use constants::{
    DEFAULT_TEMPERATURE_C, DENSITY_TABLE, KP_RULE_MIN_DIAMETER, KP_TABLE, KpRow, SEF_TABLE,
};
pub use error::{LookupError, ResolveError};
pub use query::{ConstantKind, ConstantQuery, ConstantRequest, Selection, parse_measure};
pub use resolver::{Resolution, Resolver};
pub use result::{ConstantResult, ConstantSet, DensityFormat, Source};
pub use store::{ConstantStore, EmptyStore, LookupResult, UnavailableStore};
pub use table::{KpTable, ReferencePoint, ReferenceTable, lerp, nearest_by};
