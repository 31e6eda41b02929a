use std::collections::HashMap;

/// Interpolate `{label}` placeholders from a label set.
///
/// Unknown labels resolve to the empty string; an unterminated brace is kept
/// literally.
pub fn interpolate(template: &str, labels: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        match rest[open + 1..].find('}') {
            Some(close) => {
                let key = &rest[open + 1..open + 1 + close];
                if let Some(value) = labels.get(key) {
                    out.push_str(value);
                }
                rest = &rest[open + close + 2..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
