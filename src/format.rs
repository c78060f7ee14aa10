//! Text rendering of records.
//!
//! Records have no fixed schema, so columns are taken from the first record
//! and extended with any new keys found in later ones.

use crate::models::Record;
use serde_json::Value as JsonValue;
use unicode_width::UnicodeWidthStr;

pub fn format_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(arr) => serde_json::to_string(arr).unwrap_or_default(),
        JsonValue::Object(obj) => serde_json::to_string(obj).unwrap_or_default(),
    }
}

/// Union of the records' keys, in first-seen order.
pub fn collect_columns(records: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

pub fn format_as_table(records: &[Record]) -> String {
    let columns = collect_columns(records);
    if columns.is_empty() {
        return "Empty set\n".to_string();
    }

    let mut widths: Vec<usize> = columns.iter().map(|c| c.width()).collect();
    for record in records {
        for (i, col) in columns.iter().enumerate() {
            if let Some(value) = record.get(col) {
                widths[i] = widths[i].max(format_value(value).width());
            }
        }
    }

    let mut output = String::new();
    let separator: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+\n";

    output.push_str(&separator);
    let header: String = columns
        .iter()
        .zip(&widths)
        .map(|(col, w)| format!("| {} ", pad_center(col, *w)))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);
    output.push_str(&separator);

    for record in records {
        let row_str: String = columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| {
                let value = record.get(col).unwrap_or(&JsonValue::Null);
                let formatted = format_value(value);
                if matches!(value, JsonValue::Number(_)) {
                    format!("| {} ", pad_left(&formatted, *w))
                } else {
                    format!("| {} ", pad_right(&formatted, *w))
                }
            })
            .collect::<String>()
            + "|\n";
        output.push_str(&row_str);
    }

    output.push_str(&separator);

    let row_text = if records.len() == 1 { "row" } else { "rows" };
    output.push_str(&format!("{} {} in set\n", records.len(), row_text));

    output
}

pub fn format_as_json(records: &[Record]) -> String {
    let mut out = serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string());
    out.push('\n');
    out
}

// `format!` width specifiers count chars, not display columns, so pad by hand.

fn pad_right(s: &str, width: usize) -> String {
    format!("{}{}", s, " ".repeat(width.saturating_sub(s.width())))
}

fn pad_left(s: &str, width: usize) -> String {
    format!("{}{}", " ".repeat(width.saturating_sub(s.width())), s)
}

fn pad_center(s: &str, width: usize) -> String {
    let total = width.saturating_sub(s.width());
    let left = total / 2;
    format!("{}{}{}", " ".repeat(left), s, " ".repeat(total - left))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: JsonValue) -> Record {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&JsonValue::Null), "NULL");
        assert_eq!(format_value(&json!(true)), "true");
        assert_eq!(format_value(&json!(42)), "42");
        assert_eq!(format_value(&json!("x")), "x");
        assert_eq!(format_value(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn test_empty_set() {
        assert_eq!(format_as_table(&[]), "Empty set\n");
        assert_eq!(format_as_json(&[]), "[]\n");
    }

    #[test]
    fn test_collect_columns_first_seen_order() {
        let records = vec![
            record(json!({"id": 1, "name": "Alpha"})),
            record(json!({"id": 2, "extra": true, "name": "Beta"})),
        ];
        assert_eq!(collect_columns(&records), vec!["id", "name", "extra"]);
    }

    #[test]
    fn test_format_as_table() {
        let records = vec![
            record(json!({"id": 1, "name": "Alpha"})),
            record(json!({"id": 10, "name": null})),
        ];
        let table = format_as_table(&records);
        let expected = "\
+----+-------+
| id | name  |
+----+-------+
|  1 | Alpha |
| 10 | NULL  |
+----+-------+
2 rows in set
";
        assert_eq!(table, expected);
    }

    #[test]
    fn test_format_as_table_wide_chars() {
        let records = vec![record(json!({"name": "日本"}))];
        let table = format_as_table(&records);
        // "日本" is 4 columns wide, so the border is 6 dashes
        assert!(table.starts_with("+------+\n"));
        assert!(table.contains("| 日本 |"));
        assert!(table.ends_with("1 row in set\n"));
    }
}
