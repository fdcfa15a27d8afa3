use serde_json::Value;

/// Result fields that answer each command, in lookup order.
const ANSWER_KEYS: [&str; 6] = [
    "payment",
    "value",
    "converted_rate",
    "periodic_rate",
    "rate",
    "periods",
];

/// Print just the answer of a command, e.g. the level payment of an
/// amortization or the converted rate.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        let answer = ANSWER_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .find(|val| !val.is_null());
        if let Some(val) = answer {
            println!("{}", format_minimal(val));
            return;
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
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
