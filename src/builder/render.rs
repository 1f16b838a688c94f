//! Rendering text as SAS `put` statements.
//!
//! Content that has to survive inside a generated program (embedded programs,
//! whole compiled services) is written out line by line from a data step.
//! Long lines are split into fixed-width chunks joined with `@;` so they land
//! on one output line.

/// Widest chunk written by a single `put` statement.
pub const MAX_LINE_WIDTH: usize = 220;

/// Split `text` into pieces of at most `width` characters.
///
/// Always returns at least one (possibly empty) chunk.
pub fn chunk(text: &str, width: usize) -> Vec<String> {
    if text.chars().count() <= width {
        return vec![text.to_string()];
    }
    text.chars()
        .collect::<Vec<char>>()
        .chunks(width.max(1))
        .map(|c| c.iter().collect())
        .collect()
}

/// Double every single quote so the text fits inside a `'...'` literal.
pub fn escape_quotes(text: &str) -> String {
    text.replace('\'', "''")
}

/// Render one source line as `put` statements.
pub fn put_line(line: &str) -> String {
    if line.is_empty() {
        return " put;\n".to_string();
    }
    let chunks = chunk(line, MAX_LINE_WIDTH);
    let last = chunks.len() - 1;
    let mut out = String::new();
    for (i, piece) in chunks.iter().enumerate() {
        out.push_str(" put '");
        out.push_str(&escape_quotes(piece));
        out.push('\'');
        out.push_str(if i == last { ";\n" } else { "@;\n" });
    }
    out
}

/// Render every line of `content` as `put` statements.
pub fn put_lines(content: &str) -> String {
    let normalized = content.replace("\r\n", "\n");
    normalized.lines().map(put_line).collect()
}
