/// Column name constants shared by the transformer and the sinks

pub const CUSTOMER_ID: &str = "customer_id";
pub const PRODUCT_ID: &str = "product_id";
pub const TRANSACTION_DATE: &str = "transaction_date";
pub const TRANSACTION_AMOUNT: &str = "transaction_amount";
pub const TRANSACTION_TYPE: &str = "transaction_type";
pub const SPEND_CATEGORY: &str = "spend_category";
pub const PRODUCT_CATEGORY: &str = "product_category";

// Derived columns appended by the transformer
pub const TRANSACTION_CATEGORY: &str = "transaction_category";
pub const TOTAL_PER_CUSTOMER: &str = "total_per_customer";

/// Columns a non-empty raw batch must carry
pub const REQUIRED_COLUMNS: [&str; 3] = [TRANSACTION_AMOUNT, TRANSACTION_DATE, CUSTOMER_ID];

/// Placeholder written into null cells of textual columns
pub const TEXT_PLACEHOLDER: &str = "Unknown";

/// Rendering of `transaction_date` in canonical records
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Lower bounds (inclusive) of the `medium` and `high` amount buckets
pub const MEDIUM_AMOUNT_THRESHOLD: f64 = 50.0;
pub const HIGH_AMOUNT_THRESHOLD: f64 = 200.0;

/// Default extraction window sent to the transactions API
pub const DEFAULT_START_DATE: &str = "2023-01-01";
pub const DEFAULT_END_DATE: &str = "2023-01-31";

pub const DEFAULT_TABLE: &str = "transactions";
pub const DEFAULT_SINK_PATH: &str = "data/transactions.db";
pub const API_KEY_HEADER: &str = "x-api-key";

// Task identifiers of the pipeline graph
pub const FETCH_TASK: &str = "fetch_data";
pub const TRANSFORM_TASK: &str = "transform_data";
pub const LOAD_TASK: &str = "load_data";
