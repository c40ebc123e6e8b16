//! Canonical field keys and event names for structured logging
//!
//! Store operations and the CLI both log through these names so that log
//! consumers can filter on a fixed vocabulary.

// Envelope
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";

// Option addressing
pub const FIELD_OPTION_KEY: &str = "option_key";
pub const FIELD_TENANT_ID: &str = "tenant_id";
pub const FIELD_SCOPE: &str = "scope";
pub const FIELD_ENTRY_COUNT: &str = "entry_count";
pub const FIELD_ROWS_DELETED: &str = "rows_deleted";

// Errors
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

// Scope labels
pub const SCOPE_GLOBAL: &str = "global";
pub const SCOPE_TENANT: &str = "tenant";
