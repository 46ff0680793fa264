use serde_json::Value;

#[cfg(test)]
mod tests;

/// One step of an attribute path
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Object key (also tried as array index when numeric)
    Key(String),
    /// Bracketed index, e.g. `[3]`
    Index(usize),
}

/// Parse an attribute path into segments.
///
/// `a.b[3].c` and `a.b.3.c` resolve the same way. Empty segments are
/// skipped. Returns `None` when a bracket is unterminated or holds a
/// non-numeric index.
///
/// # Examples
///
/// ```
/// use flexcells::value::{parse_path, Segment};
///
/// let segments = parse_path("items[0].name").unwrap();
/// assert_eq!(
///     segments,
///     vec![
///         Segment::Key("items".to_string()),
///         Segment::Index(0),
///         Segment::Key("name".to_string()),
///     ]
/// );
/// assert!(parse_path("items[0").is_none());
/// ```
pub fn parse_path(path: &str) -> Option<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        match c {
            '.' => flush_key(&mut current, &mut segments),
            '[' => {
                flush_key(&mut current, &mut segments);
                let mut index = String::new();
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(d) => index.push(d),
                        None => return None,
                    }
                }
                let index = index.trim().trim_matches(|q| q == '"' || q == '\'');
                match index.parse::<usize>() {
                    Ok(i) => segments.push(Segment::Index(i)),
                    Err(_) if !index.is_empty() => segments.push(Segment::Key(index.to_string())),
                    Err(_) => return None,
                }
            }
            ']' => return None,
            _ => current.push(c),
        }
    }
    flush_key(&mut current, &mut segments);

    Some(segments)
}

fn flush_key(current: &mut String, segments: &mut Vec<Segment>) {
    let key = current.trim();
    if !key.is_empty() {
        segments.push(Segment::Key(key.to_string()));
    }
    current.clear();
}

/// Walk `root` along `path`.
///
/// Objects are indexed by key, arrays by numeric segment. A missing
/// intermediate node, or an unparsable path, resolves to `None`.
pub fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let segments = parse_path(path)?;
    let mut node = root;
    for segment in &segments {
        node = step(node, segment)?;
    }
    Some(node)
}

fn step<'a>(node: &'a Value, segment: &Segment) -> Option<&'a Value> {
    match (node, segment) {
        (Value::Object(map), Segment::Key(key)) => map.get(key),
        (Value::Object(map), Segment::Index(i)) => map.get(&i.to_string()),
        (Value::Array(items), Segment::Index(i)) => items.get(*i),
        (Value::Array(items), Segment::Key(key)) => {
            let i = key.parse::<usize>().ok()?;
            items.get(i)
        }
        _ => None,
    }
}

/// Permissive numeric coercion used by rule comparisons.
///
/// Parses the longest numeric prefix of a string (so `"21.5 °C"` is 21.5)
/// and accepts a decimal comma. Booleans map to 1/0. Anything that does not
/// produce a finite number yields `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => parse_leading_number(s),
        _ => None,
    }
}

/// Parse the numeric prefix of `s`, treating `,` as a decimal point.
pub fn parse_leading_number(s: &str) -> Option<f64> {
    let normalized = s.trim().replace(',', ".");
    let bytes = normalized.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    // Exponent only counts when followed by at least one digit
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    normalized[..end].parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Whole-value numeric test used by the formatter.
///
/// Unlike [`coerce_number`], trailing text disqualifies a string, and no
/// decimal comma is accepted.
pub fn strict_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

/// String form of a value for display and string comparison.
///
/// Strings are returned verbatim, structured values are JSON-encoded.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
