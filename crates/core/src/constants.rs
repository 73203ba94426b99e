//! Shared constants for the vitals core.

/// Default dataset location, relative to the working directory.
pub const DEFAULT_DATA_FILE: &str = "patients_data.jsonl";

/// Field of each record that holds the ordered vital-point array.
pub const VITALS_FIELD: &str = "Vitals";

/// Field of each vital point that is overwritten with the response instant.
pub const TIME_FIELD: &str = "time";
