/// Upstream dataset endpoint
pub const DEFAULT_API_URL: &str = "https://api.openbrewerydb.org/v1/breweries";
pub const DEFAULT_PER_PAGE: u32 = 200;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

pub const DEFAULT_DB_PATH: &str = "data/brewery.db";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

// Table names the dashboard reads
pub const RAW_TABLE: &str = "breweries";
pub const QUALITY_TABLE: &str = "data_quality_checks";
pub const CLEAN_TABLE: &str = "clean_breweries";

// Record field names in the upstream payload
pub const ID_FIELD: &str = "id";
pub const CATEGORY_FIELD: &str = "brewery_type";
pub const LATITUDE_FIELD: &str = "latitude";
pub const LONGITUDE_FIELD: &str = "longitude";
pub const STATE_FIELD: &str = "state";

// Quality table columns
pub const CHECK_NAME_COLUMN: &str = "check_name";
pub const PASSED_COLUMN: &str = "passed";
pub const DESCRIPTION_COLUMN: &str = "description";
pub const CHECK_TIMESTAMP_COLUMN: &str = "check_timestamp";

pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;

/// Brewery types accepted by the category rule
pub const ACCEPTED_BREWERY_TYPES: [&str; 10] = [
    "micro",
    "nano",
    "regional",
    "brewpub",
    "large",
    "planning",
    "bar",
    "contract",
    "proprietor",
    "closed",
];

/// Get the default accepted brewery types as owned strings
pub fn default_accepted_categories() -> Vec<String> {
    ACCEPTED_BREWERY_TYPES.iter().map(|s| s.to_string()).collect()
}
