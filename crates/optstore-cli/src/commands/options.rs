//! Option commands
//!
//! Usage:
//!   optstore get <KEY> [--default JSON]
//!   optstore set <KEY> <VALUE> [--raw]
//!   optstore set-many <KEY=VALUE>... [--raw]
//!   optstore exists <KEY>
//!   optstore remove <KEY>

use clap::Args;
use optstore_core::OptionValue;

use super::{open_store, ScopeArgs};
use crate::config::Settings;
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct KeyArgs {
    /// Option key
    pub key: String,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Option key
    pub key: String,

    /// JSON value printed when the option is missing
    #[arg(long)]
    pub default: Option<String>,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Option key
    pub key: String,

    /// Value; parsed as JSON, stored as a string when it is not JSON
    pub value: String,

    /// Always store the value as a string
    #[arg(long)]
    pub raw: bool,
}

#[derive(Debug, Args)]
pub struct SetManyArgs {
    /// Entries as KEY=VALUE
    #[arg(required = true)]
    pub entries: Vec<String>,

    /// Always store values as strings
    #[arg(long)]
    pub raw: bool,
}

pub fn get(settings: &Settings, scope: &ScopeArgs, args: GetArgs) -> Result<(), CliError> {
    let default = args
        .default
        .as_deref()
        .map(|text| {
            serde_json::from_str(text).map_err(|e| CliError::InvalidArgument {
                field: "default",
                reason: e.to_string(),
            })
        })
        .transpose()?;

    let store = open_store(settings, scope)?;
    let value = store.get(&args.key, default, scope.explicit_tenant())?;
    println!("{}", render_value(value.as_ref()));
    Ok(())
}

pub fn set(settings: &Settings, scope: &ScopeArgs, args: SetArgs) -> Result<(), CliError> {
    let value = parse_value(&args.value, args.raw);
    let mut store = open_store(settings, scope)?;
    store.set(&args.key, value, scope.explicit_tenant())?;
    Ok(())
}

pub fn set_many(settings: &Settings, scope: &ScopeArgs, args: SetManyArgs) -> Result<(), CliError> {
    let entries = args
        .entries
        .iter()
        .map(|entry| parse_entry(entry, args.raw))
        .collect::<Result<Vec<_>, _>>()?;

    let mut store = open_store(settings, scope)?;
    let count = entries.len();
    store.set_many(entries, scope.explicit_tenant())?;
    println!("{} options written", count);
    Ok(())
}

pub fn exists(settings: &Settings, scope: &ScopeArgs, args: KeyArgs) -> Result<(), CliError> {
    let store = open_store(settings, scope)?;
    println!("{}", store.exists(&args.key, scope.explicit_tenant())?);
    Ok(())
}

pub fn remove(settings: &Settings, scope: &ScopeArgs, args: KeyArgs) -> Result<(), CliError> {
    let mut store = open_store(settings, scope)?;
    if store.remove(&args.key, scope.explicit_tenant())? {
        println!("removed");
    } else {
        println!("not found");
    }
    Ok(())
}

/// JSON when it parses, otherwise the text itself as a string
fn parse_value(text: &str, raw: bool) -> OptionValue {
    if raw {
        return OptionValue::String(text.to_string());
    }
    serde_json::from_str(text).unwrap_or_else(|_| OptionValue::String(text.to_string()))
}

fn parse_entry(entry: &str, raw: bool) -> Result<(String, OptionValue), CliError> {
    let (key, value) = entry.split_once('=').ok_or_else(|| CliError::InvalidArgument {
        field: "entry",
        reason: format!("'{}' is not KEY=VALUE", entry),
    })?;
    Ok((key.to_string(), parse_value(value, raw)))
}

/// Strings print bare, everything else as compact JSON
fn render_value(value: Option<&OptionValue>) -> String {
    match value {
        None => "null".to_string(),
        Some(OptionValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42", false), json!(42));
        assert_eq!(parse_value("{\"a\":[1,2]}", false), json!({"a": [1, 2]}));
        assert_eq!(parse_value("dark", false), json!("dark"));
        assert_eq!(parse_value("42", true), json!("42"));
    }

    #[test]
    fn test_parse_entry_splits_on_first_equals() {
        let (key, value) = parse_entry("query=a=b", false).unwrap();
        assert_eq!(key, "query");
        assert_eq!(value, json!("a=b"));

        let (key, value) = parse_entry("empty=", false).unwrap();
        assert_eq!(key, "empty");
        assert_eq!(value, json!(""));
    }

    #[test]
    fn test_parse_entry_without_equals_is_rejected() {
        let err = parse_entry("novalue", false).unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument { field: "entry", .. }));
    }

    #[test]
    fn test_render_value() {
        assert_eq!(render_value(None), "null");
        assert_eq!(render_value(Some(&json!("dark"))), "dark");
        assert_eq!(render_value(Some(&json!({"a": 1}))), "{\"a\":1}");
        assert_eq!(render_value(Some(&json!(true))), "true");
    }
}
