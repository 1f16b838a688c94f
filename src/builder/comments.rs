//! Line-oriented block comment removal for the deployment tree document.
//!
//! Multi-line `/* ... */` blocks are dropped. A line that opens and closes a
//! comment on the same line is kept as written, as is any code before an
//! opening or after a closing marker. Lines are trimmed and blank lines are
//! dropped.

const OPEN: &str = "/*";
const CLOSE: &str = "*/";

/// Strip multi-line block comments from `text`.
pub fn strip_comments(text: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut in_block = false;

    for raw in text.lines() {
        let mut line = raw.trim();

        if in_block {
            match line.find(CLOSE) {
                Some(end) => {
                    in_block = false;
                    line = line[end + CLOSE.len()..].trim();
                }
                None => continue,
            }
        }

        kept.push(before_open(line, &mut in_block));
    }

    kept.into_iter()
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Code ahead of a block that `line` opens but does not close.
fn before_open<'a>(line: &'a str, in_block: &mut bool) -> &'a str {
    match line.find(OPEN) {
        Some(start) if !line[start + OPEN.len()..].contains(CLOSE) => {
            *in_block = true;
            line[..start].trim()
        }
        _ => line,
    }
}
