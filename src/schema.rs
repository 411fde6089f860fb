/// Column-name constants for the source reports and the tidy output.
/// Single source of truth for every reshape step.

// ── GATS trade report columns ───────────────────────────────────────────────
pub mod trade {
    pub const PRODUCT_CODE: &str = "Product Code";
    pub const PRODUCT: &str = "Product";
    pub const YEAR: &str = "Year";
    pub const MONTH: &str = "Month";

    /// Fragments identifying the monthly quantity columns (matched case-insensitively).
    pub const QUANTITY_MARKERS: [&str; 2] = ["qty", "quantity"];

    /// Banner lines preceding the header row.
    pub const BANNER_LINES: usize = 4;

    pub const MONTHS: usize = 12;

    /// Metric tons to pounds.
    pub const POUNDS_PER_METRIC_TON: f64 = 2204.623;
}

// ── QuickStats columns ──────────────────────────────────────────────────────
pub mod statistics {
    pub const YEAR: &str = "Year";
    pub const PERIOD: &str = "Period";
    pub const DATA_ITEM: &str = "Data Item";
    pub const VALUE: &str = "Value";

    /// Period value for annual totals.
    pub const YEAR_MARKER: &str = "YEAR";

    pub const BEGINNING_STOCK: &str = "Beginning Stock";
}

// ── Tidy output columns ─────────────────────────────────────────────────────
pub mod tidy {
    pub const DATE: &str = "Date";
}
