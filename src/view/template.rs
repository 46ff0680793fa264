use super::html::cell_content;
use super::CellView;
use tracing::debug;

const TAG_OPEN: &str = "<fcc";
const TAG_CLOSE: &str = "/>";

/// A parsed `<fcc row=".." col=".." style=".."/>` placeholder
#[derive(Debug, Clone, PartialEq)]
pub struct FccTag {
    /// 1-based
    pub row: usize,
    /// 1-based
    pub col: usize,
    pub style: String,
}

/// Parse one placeholder tag. `None` when the tag is malformed, misses
/// row/col, or addresses row or column 0.
pub fn parse_fcc_tag(tag: &str) -> Option<FccTag> {
    let head = tag.get(..TAG_OPEN.len())?;
    if !head.eq_ignore_ascii_case(TAG_OPEN) {
        return None;
    }
    let body = tag[TAG_OPEN.len()..].strip_suffix(TAG_CLOSE)?;

    let mut row = None;
    let mut col = None;
    let mut style = String::new();
    for (name, value) in parse_attributes(body)? {
        match name.to_ascii_lowercase().as_str() {
            "row" => row = Some(value.trim().parse::<usize>().ok()?),
            "col" => col = Some(value.trim().parse::<usize>().ok()?),
            "style" => style = value,
            _ => {}
        }
    }

    let (row, col) = (row?, col?);
    if row == 0 || col == 0 {
        return None;
    }
    Some(FccTag { row, col, style })
}

fn parse_attributes(body: &str) -> Option<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    let mut rest = body.trim_start();
    while !rest.is_empty() {
        let name_end = rest.find(|c: char| c == '=' || c.is_whitespace())?;
        let name = &rest[..name_end];
        if name.is_empty() {
            return None;
        }
        rest = rest[name_end..].trim_start().strip_prefix('=')?.trim_start();

        let (value, remainder) = match rest.chars().next()? {
            quote @ ('"' | '\'') => {
                let close = rest[1..].find(quote)?;
                (&rest[1..1 + close], &rest[close + 2..])
            }
            _ => {
                let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                (&rest[..end], &rest[end..])
            }
        };
        attrs.push((name.to_string(), value.to_string()));
        rest = remainder.trim_start();
    }
    Some(attrs)
}

/// Substitute every `<fcc .../>` placeholder in `template` with the cell
/// markup returned by `lookup(row, col)` (0-based). Invalid placeholders
/// are emitted as written.
pub fn render_template<F>(template: &str, lookup: F) -> String
where
    F: Fn(usize, usize) -> CellView,
{
    let lower = template.to_ascii_lowercase();
    let mut out = String::with_capacity(template.len());
    let mut pos = 0;

    while let Some(rel) = lower[pos..].find(TAG_OPEN) {
        let start = pos + rel;
        let after = start + TAG_OPEN.len();

        // "<fccx" and friends are ordinary markup
        let boundary = template[after..]
            .chars()
            .next()
            .is_some_and(|c| c.is_whitespace() || c == '/');
        if !boundary {
            out.push_str(&template[pos..after]);
            pos = after;
            continue;
        }

        let Some(close) = template[after..].find(TAG_CLOSE) else {
            break;
        };
        let end = after + close + TAG_CLOSE.len();
        let tag = &template[start..end];

        out.push_str(&template[pos..start]);
        match parse_fcc_tag(tag) {
            Some(fcc) => out.push_str(&cell_content(&lookup(fcc.row - 1, fcc.col - 1), &fcc.style)),
            None => {
                debug!(tag = %tag, "Leaving invalid fcc tag as-is");
                out.push_str(tag);
            }
        }
        pos = end;
    }

    out.push_str(&template[pos..]);
    out
}
