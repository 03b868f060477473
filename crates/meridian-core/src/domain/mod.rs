//! Domain model (countries, raw records, the subdivision index, errors, load state).

pub mod country;
pub mod errors;
pub mod index;
pub mod records;
pub mod report;
pub mod state;

pub use country::{Country, CountryCode, Subdivision};
pub use errors::{ReadError, SelectorError};
pub use index::{IndexBuild, SubdivisionIndex, build_index, find_country_by_code};
pub use records::{
    RawCountryRecord, RawSubdivisionEntry, RawSubdivisionGroup, RawSubdivisionSubset, RecordShape,
};
pub use report::LoadReport;
pub use state::{LoadStage, LoadState};
