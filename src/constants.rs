/// Defaults for the seismic and return-shock threshold rules.
pub mod events {
    /// Minimum magnitude for a seismic record to qualify as a shock.
    pub const DEFAULT_MIN_MAGNITUDE: f64 = 4.5;
    /// Lower depth bound in kilometers (inclusive).
    pub const DEFAULT_MIN_DEPTH_KM: f64 = 0.0;
    /// Upper depth bound in kilometers (inclusive).
    pub const DEFAULT_MAX_DEPTH_KM: f64 = 40.0;
    /// Absolute log-return above which a price move counts as a shock (~2%).
    pub const DEFAULT_RETURN_THRESHOLD: f64 = 0.02;
    /// Event label emitted by the seismic rule.
    pub const EVENT_TYPE_EARTHQUAKE: &str = "earthquake";
    /// Event label emitted by the return-shock rule.
    pub const EVENT_TYPE_FX_SHOCK: &str = "fx_shock";
}

/// Defaults for the event-window panel and the group-difference test.
pub mod analysis {
    /// Calendar days in the trailing window before an event.
    pub const DEFAULT_PRE_DAYS: u32 = 30;
    /// Calendar days in the leading window from the event onward.
    pub const DEFAULT_POST_DAYS: u32 = 30;
    /// Significance level for rejecting equal mean deltas across groups.
    pub const DEFAULT_ALPHA: f64 = 0.05;
}

/// Source identifiers used in errors and log lines.
pub mod sources {
    /// Keyword search-interest observations.
    pub const TRENDS_SOURCE_ID: &str = "trends";
    /// Province to region assignment listing.
    pub const ASSIGNMENTS_SOURCE_ID: &str = "assignments";
    /// Seismic catalog.
    pub const EARTHQUAKE_SOURCE_ID: &str = "earthquakes";
    /// Currency price series.
    pub const PRICE_SOURCE_ID: &str = "prices";
}

/// Column names expected in flat-file inputs and emitted in outputs.
pub mod columns {
    /// Observation date column in the trends export.
    pub const TRENDS_DATE: &str = "date";
    /// Province code column in the wide trends export.
    pub const TRENDS_PROVINCE_CODE: &str = "province_code";
    /// Region column in the wide trends export and all outputs.
    pub const TRENDS_REGION: &str = "region7";
    /// Long-form entity id column.
    pub const LONG_ENTITY_ID: &str = "entity_id";
    /// Long-form entity group column.
    pub const LONG_ENTITY_GROUP: &str = "entity_group";
    /// Long-form keyword column.
    pub const LONG_KEYWORD: &str = "keyword";
    /// Long-form raw score column.
    pub const LONG_RAW_SCORE: &str = "raw_score";
    /// Province code column in the assignment listing.
    pub const ASSIGNMENT_CODE: &str = "code";
    /// Timestamp column shared by the seismic catalog and the price series.
    pub const SOURCE_DATE: &str = "Date";
    /// Magnitude column in the seismic catalog.
    pub const QUAKE_MAGNITUDE: &str = "Magnitude";
    /// Depth column (km) in the seismic catalog.
    pub const QUAKE_DEPTH: &str = "Depth";
    /// Close price column in the price series.
    pub const PRICE_CLOSE: &str = "Price";
}

/// Keyword columns tracked by the default trends export.
pub const DEFAULT_KEYWORDS: [&str; 5] = [
    "anksiyete",
    "uykusuzluk",
    "stres",
    "panik atak",
    "mide yanması",
];

/// Output filenames written by the analysis runner.
pub mod outputs {
    /// Regional stress index table.
    pub const INDEX_FILENAME: &str = "region_stress_index_weekly.csv";
    /// Unioned event list.
    pub const EVENTS_FILENAME: &str = "event_dates.csv";
    /// Event x region panel.
    pub const PANEL_FILENAME: &str = "event_region_stress_panel.csv";
}
