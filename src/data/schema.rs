//! Column names and category labels of the EV population dataset.
//!
//! Every column the pipeline touches goes through these constants, so a
//! mistyped column name is a compile error instead of a runtime schema error.

pub const VIN: &str = "VIN (1-10)";
pub const POSTAL_CODE: &str = "Postal Code";
pub const BASE_MSRP: &str = "Base MSRP";
pub const LEGISLATIVE_DISTRICT: &str = "Legislative District";
pub const DOL_VEHICLE_ID: &str = "DOL Vehicle ID";
pub const CENSUS_TRACT: &str = "2020 Census Tract";

pub const STATE: &str = "State";
pub const COUNTY: &str = "County";
pub const MAKE: &str = "Make";
pub const MODEL: &str = "Model";
pub const MODEL_YEAR: &str = "Model Year";
pub const EV_TYPE: &str = "Electric Vehicle Type";
pub const CAFV: &str = "Clean Alternative Fuel Vehicle (CAFV) Eligibility";

/// Derived composite key: `Make + " " + Model`.
pub const MAKE_AND_MODEL: &str = "Make & Model";

/// Identifier-style columns with no analytical value, removed right after load.
pub const DROP_COLUMNS: [&str; 6] = [
    VIN,
    POSTAL_CODE,
    BASE_MSRP,
    LEGISLATIVE_DISTRICT,
    DOL_VEHICLE_ID,
    CENSUS_TRACT,
];

// Vehicle type labels exactly as they appear in the dataset.
pub const BEV: &str = "Battery Electric Vehicle (BEV)";
pub const PHEV: &str = "Plug-in Hybrid Electric Vehicle (PHEV)";
