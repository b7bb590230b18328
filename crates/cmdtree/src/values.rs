//! Conversion of clap matches into an [`ArgMap`].
//!
//! clap stores typed values behind `Any`, so the concrete type of each
//! argument is recovered by trying the value parsers commands commonly use.
//! Anything else falls back to the raw string.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, ArgMatches};
use serde_json::Value;

use crate::command::ArgMap;
use crate::parser::is_generated;

/// Collects every declared argument of `cmd` into a map.
///
/// Arguments that were not given and have no default map to `null`. Flags
/// with append semantics and arguments taking several values map to arrays.
pub fn collect(cmd: &clap::Command, matches: &ArgMatches) -> ArgMap {
    let mut values = ArgMap::new();
    for arg in cmd.get_arguments().filter(|arg| !is_generated(arg)) {
        let id = arg.get_id().as_str();
        let many = matches!(arg.get_action(), ArgAction::Append)
            || arg
                .get_num_args()
                .map(|range| range.max_values() > 1)
                .unwrap_or(false);
        values.insert(id.to_string(), extract(matches, id, many));
    }
    values
}

macro_rules! try_typed {
    ($matches:expr, $id:expr, $many:expr, $($ty:ty),+ $(,)?) => {
        $(
            match $matches.try_get_many::<$ty>($id) {
                Ok(None) => return Value::Null,
                Ok(Some(found)) => {
                    let items: Vec<Value> = found.map(to_value).collect();
                    return shape(items, $many);
                }
                Err(_) => {}
            }
        )+
    };
}

fn extract(matches: &ArgMatches, id: &str, many: bool) -> Value {
    try_typed!(
        matches, id, many, String, bool, i64, u64, i32, u32, usize, u16, u8, f64, PathBuf,
        OsString,
    );

    match matches.try_get_raw(id) {
        Ok(Some(raw)) => {
            let items = raw
                .map(|value| Value::String(value.to_string_lossy().into_owned()))
                .collect();
            shape(items, many)
        }
        _ => Value::Null,
    }
}

fn shape(mut items: Vec<Value>, many: bool) -> Value {
    if many {
        Value::Array(items)
    } else if items.is_empty() {
        Value::Null
    } else {
        items.swap_remove(0)
    }
}

trait ToJson {
    fn to_json(&self) -> Value;
}

fn to_value<T: ToJson>(value: &T) -> Value {
    value.to_json()
}

macro_rules! to_json_via_from {
    ($($ty:ty),+) => {
        $(
            impl ToJson for $ty {
                fn to_json(&self) -> Value {
                    Value::from(self.clone())
                }
            }
        )+
    };
}

to_json_via_from!(String, bool, i64, u64, i32, u32, usize, u16, u8, f64);

impl ToJson for PathBuf {
    fn to_json(&self) -> Value {
        Value::String(self.to_string_lossy().into_owned())
    }
}

impl ToJson for OsString {
    fn to_json(&self) -> Value {
        Value::String(self.to_string_lossy().into_owned())
    }
}
