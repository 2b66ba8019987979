//! Minimal CSV reading and writing primitives.
//!
//! Both directions follow the same quoting convention: fields containing a
//! comma, a double quote, or a newline are wrapped in double quotes, and
//! embedded double quotes are doubled (`"` becomes `""`). The parser
//! unescapes doubled quotes so that generator output parses back to the
//! original values (see the round-trip test below).

/// Split raw file content into non-blank lines.
///
/// Handles both `\n` and `\r\n` terminators. Blank lines (whitespace only)
/// are dropped; callers number rows by position in the returned list.
pub fn split_lines(content: &str) -> Vec<&str> {
    content
        .lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// Parse one CSV line into fields.
///
/// Walks the line character by character tracking an "inside quotes" flag:
/// a `,` inside quotes is literal, a lone `"` toggles the flag, and a
/// doubled `""` inside quotes is an escaped literal quote. Fields are
/// trimmed of surrounding whitespace after extraction.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(field.trim().to_string());
                field.clear();
            }
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

/// Escape a single field for CSV emission.
///
/// Returns the field unchanged unless it needs quoting.
pub fn escape_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render one CSV line (no trailing newline) from a slice of field values.
pub fn render_line<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
