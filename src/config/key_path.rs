//! Dotted-key access into the raw TOML table (`defaults.to`, `network.retries`).

use toml::{Table, Value};

fn segments(key: &str) -> Vec<&str> {
    key.split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn get_value<'a>(table: &'a Table, key: &str) -> Option<&'a Value> {
    let segments = segments(key);
    let (last, parents) = segments.split_last()?;

    let mut current = table;
    for segment in parents {
        current = current.get(*segment)?.as_table()?;
    }
    current.get(*last)
}

/// Sets `key`, creating (or replacing non-table values with) intermediate tables.
pub fn set_value(table: &mut Table, key: &str, value: Value) {
    let segments = segments(key);
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = table;
    for segment in parents {
        let entry = current
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        if !entry.is_table() {
            *entry = Value::Table(Table::new());
        }
        let Value::Table(child) = entry else {
            return;
        };
        current = child;
    }
    current.insert((*last).to_string(), value);
}

/// Removes `key`, pruning tables left empty. Returns whether anything was removed.
pub fn unset_value(table: &mut Table, key: &str) -> bool {
    let segments = segments(key);
    if segments.is_empty() {
        return false;
    }
    unset_in(table, &segments)
}

fn unset_in(table: &mut Table, segments: &[&str]) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return false;
    };
    if rest.is_empty() {
        return table.remove(*first).is_some();
    }

    let Some(Value::Table(child)) = table.get_mut(*first) else {
        return false;
    };
    let removed = unset_in(child, rest);
    if child.is_empty() {
        table.remove(*first);
    }
    removed
}

/// Interprets a CLI value: booleans, integers, floats (only with a `.`), else a string.
pub fn parse_scalar(raw: &str) -> Value {
    let trimmed = raw.trim();
    match trimmed.to_lowercase().as_str() {
        "true" => return Value::Boolean(true),
        "false" => return Value::Boolean(false),
        _ => {}
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::Integer(int);
    }
    if trimmed.contains('.')
        && let Ok(float) = trimmed.parse::<f64>()
    {
        return Value::Float(float);
    }
    Value::String(trimmed.to_string())
}

/// Renders a value for `config get`: scalars bare, tables as TOML.
pub fn to_printable(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Table(t) => toml::to_string(t)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        other => other.to_string(),
    }
}
