//! Boundary logging macros
//!
//! Extra fields follow the `tracing` field syntax and are appended to the
//! canonical envelope. Envelope field names come from
//! `optstore_core_types::schema`; callers name extra fields the same way,
//! e.g. `{ FIELD_OPTION_KEY } = key`.

/// Log the start of an operation
///
/// ```
/// # use optstore_core::log_op_start;
/// log_op_start!("option_get");
/// log_op_start!("option_get", option_key = "site.name");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            { $crate::optstore_core_types::schema::FIELD_COMPONENT } = module_path!(),
            { $crate::optstore_core_types::schema::FIELD_OP } = $op,
            { $crate::optstore_core_types::schema::FIELD_EVENT } = $crate::optstore_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            { $crate::optstore_core_types::schema::FIELD_COMPONENT } = module_path!(),
            { $crate::optstore_core_types::schema::FIELD_OP } = $op,
            { $crate::optstore_core_types::schema::FIELD_EVENT } = $crate::optstore_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use optstore_core::log_op_end;
/// log_op_end!("option_get", duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            { $crate::optstore_core_types::schema::FIELD_COMPONENT } = module_path!(),
            { $crate::optstore_core_types::schema::FIELD_OP } = $op,
            { $crate::optstore_core_types::schema::FIELD_EVENT } = $crate::optstore_core_types::schema::EVENT_END,
            { $crate::optstore_core_types::schema::FIELD_DURATION_MS } = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            { $crate::optstore_core_types::schema::FIELD_COMPONENT } = module_path!(),
            { $crate::optstore_core_types::schema::FIELD_OP } = $op,
            { $crate::optstore_core_types::schema::FIELD_EVENT } = $crate::optstore_core_types::schema::EVENT_END,
            { $crate::optstore_core_types::schema::FIELD_DURATION_MS } = $duration,
            $($field)*
        );
    };
}

/// Log a failed operation
///
/// `$err` is anything convertible into [`ExError`](crate::errors::ExError);
/// its kind and stable code are recorded.
///
/// ```
/// # use optstore_core::log_op_error;
/// # use optstore_core::errors::OptionStoreError;
/// let err = OptionStoreError::UnsupportedIdentity { user_id: "u1".to_string() };
/// log_op_error!("option_set", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            { $crate::optstore_core_types::schema::FIELD_COMPONENT } = module_path!(),
            { $crate::optstore_core_types::schema::FIELD_OP } = $op,
            { $crate::optstore_core_types::schema::FIELD_EVENT } = $crate::optstore_core_types::schema::EVENT_END_ERROR,
            { $crate::optstore_core_types::schema::FIELD_DURATION_MS } = $duration,
            { $crate::optstore_core_types::schema::FIELD_ERR_KIND } = tracing::field::debug(ex_err.kind()),
            { $crate::optstore_core_types::schema::FIELD_ERR_CODE } = ex_err.code(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            { $crate::optstore_core_types::schema::FIELD_COMPONENT } = module_path!(),
            { $crate::optstore_core_types::schema::FIELD_OP } = $op,
            { $crate::optstore_core_types::schema::FIELD_EVENT } = $crate::optstore_core_types::schema::EVENT_END_ERROR,
            { $crate::optstore_core_types::schema::FIELD_DURATION_MS } = $duration,
            { $crate::optstore_core_types::schema::FIELD_ERR_KIND } = tracing::field::debug(ex_err.kind()),
            { $crate::optstore_core_types::schema::FIELD_ERR_CODE } = ex_err.code(),
            $($field)*
        );
    }};
}
