/// Returns the index of the `}` that closes the `{` at `open`, or `None` when the text
/// ends before the depth returns to zero.
///
/// A brace preceded by a backslash is an escaped literal and does not change the
/// depth, so `M{\"u}ller` and `{{CNN}s}` scan as single values.
pub fn find_matching_close(bytes: &[u8], open: usize) -> Option<usize> {
    if bytes.get(open) != Some(&b'{') {
        return None;
    }
    let mut depth: i32 = 0;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Splits on `sep` at brace depth 0, outside top-level `"..."` strings.
///
/// `sep` must be ASCII so that the byte offsets stay on char boundaries.
pub fn split_at_depth_zero(content: &str, sep: u8) -> Vec<&str> {
    debug_assert!(sep.is_ascii());
    let mut segments = Vec::new();
    let bytes = content.as_bytes();
    let mut depth: i32 = 0;
    let mut in_quotes = false;
    let mut last_split = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' => depth = (depth - 1).max(0),
            b'"' if depth == 0 => in_quotes = !in_quotes,
            b if b == sep && depth == 0 && !in_quotes => {
                segments.push(&content[last_split..i]);
                last_split = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    segments.push(&content[last_split..]);
    segments
}

/// Whether every unescaped brace in `text` is matched.
pub fn is_balanced(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut depth: i32 = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
        i += 1;
    }
    depth == 0
}
