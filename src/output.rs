//! InfluxDB line protocol rendering of measurements

use std::fmt::Write;

use crate::metric::{FieldValue, Measurement};

/// Renders `measurement` as one line, without the trailing newline.
/// Empty tags are omitted. Returns `None` when there are no fields, since
/// a line without fields is not valid line protocol.
pub fn to_line_protocol(measurement: &Measurement) -> Option<String> {
    if measurement.fields.is_empty() {
        return None;
    }

    let mut line = String::with_capacity(256);
    escape_into(&mut line, measurement.name, &[',', ' ']);

    for (key, value) in measurement.tags.iter().filter(|(_, v)| !v.is_empty()) {
        line.push(',');
        escape_into(&mut line, key, &[',', '=', ' ']);
        line.push('=');
        escape_into(&mut line, value, &[',', '=', ' ']);
    }

    let mut first = true;
    for (key, value) in &measurement.fields {
        line.push(if first { ' ' } else { ',' });
        first = false;

        escape_into(&mut line, key, &[',', '=', ' ']);
        line.push('=');
        match value {
            FieldValue::Int(n) => {
                let _ = write!(line, "{n}i");
            },
            FieldValue::Bool(b) => line.push_str(if *b { "true" } else { "false" }),
            FieldValue::Str(s) => quote_into(&mut line, s),
            FieldValue::Time(t) => quote_into(&mut line, &t.to_rfc3339()),
        }
    }

    // out-of-range timestamps fall back to server-assigned time
    if let Some(nanos) = measurement.timestamp.timestamp_nanos_opt() {
        let _ = write!(line, " {nanos}");
    }

    Some(line)
}

fn escape_into(out: &mut String, s: &str, special: &[char]) {
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0c' => out.push_str("\\f"),
            c if special.contains(&c) => {
                out.push('\\');
                out.push(c);
            },
            c => out.push(c),
        }
    }
}

fn quote_into(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;

    fn ts() -> DateTime<Utc> {
        Utc.timestamp_opt(1_672_531_200, 0).unwrap()
    }

    #[test]
    fn test_basic_line() {
        let m = Measurement::new("commits", ts())
            .field("stats_total", 12i64)
            .field("message", "fix \"quoted\" path C:\\tmp")
            .tag("author_name", "Jane Doe")
            .tag("id", "abc123");

        assert_eq!(
            to_line_protocol(&m).unwrap(),
            "commits,author_name=Jane\\ Doe,id=abc123 \
             message=\"fix \\\"quoted\\\" path C:\\\\tmp\",stats_total=12i 1672531200000000000"
        );
    }

    #[test]
    fn test_empty_tags_are_omitted() {
        let m = Measurement::new("merge_requests", ts())
            .field("wip", true)
            .tag("assignee", "")
            .tag("project", "core");

        assert_eq!(
            to_line_protocol(&m).unwrap(),
            "merge_requests,project=core wip=true 1672531200000000000"
        );
    }

    #[test]
    fn test_tag_escaping() {
        let m = Measurement::new("merge_requests", ts())
            .field("upvotes", 0i64)
            .tag("merge_request_type", "FEATURE-ABC")
            .tag("state", "a,b=c");

        let line = to_line_protocol(&m).unwrap();
        assert!(line.contains(",state=a\\,b\\=c "));
    }

    #[test]
    fn test_control_characters_in_tags() {
        let m = Measurement::new("merge_requests", ts())
            .field("upvotes", 0i64)
            .tag("title", "fix\r\ttabs\x0cand\nlines");

        let line = to_line_protocol(&m).unwrap();
        assert!(line.contains(",title=fix\\r\\ttabs\\fand\\nlines "), "{line}");
        assert!(!line.contains(['\r', '\t', '\x0c', '\n']));
    }

    #[test]
    fn test_time_field_is_quoted() {
        let m = Measurement::new("merge_requests", ts()).field("updated_at", ts());
        let line = to_line_protocol(&m).unwrap();
        assert!(line.contains("updated_at=\"2023-01-01T00:00:00+00:00\""));
    }

    #[test]
    fn test_no_fields() {
        let m = Measurement::new("commits", ts()).tag("id", "abc");
        assert_eq!(to_line_protocol(&m), None);
    }
}
