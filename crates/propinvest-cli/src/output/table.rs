use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
///
/// Scalar fields and nested objects go into one Field/Value table; each
/// list of rows (schedule years, snapshots, solver iterations) gets a table
/// of its own.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result(result);
                print_envelope_notes(map);
            } else {
                print_result(value);
            }
        }
        Value::Array(arr) => print_row_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value) {
    let Value::Object(map) = result else {
        println!("{}", format_value(result));
        return;
    };

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut row_tables: Vec<(&str, &Vec<Value>)> = Vec::new();
    push_fields(&mut builder, "", map, &mut row_tables);
    println!("{}", Table::from(builder));

    if let Some(grid) = sensitivity_grid(map) {
        println!("\nfair_prices:");
        println!("{}", grid);
    }

    for (name, rows) in row_tables {
        println!("\n{}:", name);
        print_row_table(rows);
    }
}

fn push_fields<'a>(
    builder: &mut Builder,
    prefix: &str,
    map: &'a Map<String, Value>,
    row_tables: &mut Vec<(&'a str, &'a Vec<Value>)>,
) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match val {
            Value::Object(inner) => push_fields(builder, &name, inner, row_tables),
            Value::Array(items) if items.first().is_some_and(Value::is_object) => {
                row_tables.push((key.as_str(), items));
            }
            Value::Array(items) if items.first().is_some_and(Value::is_array) => {}
            _ => builder.push_record([name, format_value(val)]),
        }
    }
}

/// Render `fair_prices` with row and column values as headers.
fn sensitivity_grid(map: &Map<String, Value>) -> Option<Table> {
    let grid = map.get("fair_prices")?.as_array()?;
    let rows = map.get("row_values")?.as_array()?;
    let columns = map.get("column_values")?.as_array()?;

    let mut builder = Builder::default();
    let mut header = vec![String::new()];
    header.extend(columns.iter().map(format_value));
    builder.push_record(header);

    for (row_value, cells) in rows.iter().zip(grid) {
        let mut record = vec![format_value(row_value)];
        if let Value::Array(cells) = cells {
            record.extend(cells.iter().map(|c| match c {
                Value::Null => "-".to_string(),
                other => format_value(other),
            }));
        }
        builder.push_record(record);
    }
    Some(Table::from(builder))
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_row_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
