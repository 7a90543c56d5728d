use serde_json::Value;

/// Key answer of each command, most specific first.
const PRIORITY_KEYS: [&str; 9] = [
    "fair_price",
    "net_rental_yield_pct",
    "final_net_return_pct",
    "monthly_payment",
    "tax",
    "total",
    "solved_cells",
    "version",
    "effective_rate_pct",
];

/// Print just the key answer value from the output, falling back to the
/// first field of the result.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
