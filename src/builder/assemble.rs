//! Unit assembly.
//!
//! A compiled unit is laid out in a fixed order:
//!
//! ```text
//! * Service Variables start;   (services only)
//! * Dependencies start;
//! * Programs start;
//! * ServiceInit start;         (only when an init program applies)
//! * Service start;
//! * ServiceTerm start;         (only when a term program applies)
//! ```
//!
//! Every section closes with a matching `end;` marker. Assembly is a pure
//! function of its inputs.

use std::path::PathBuf;

use crate::builder::embed::EmbedPlan;
use crate::builder::render::{chunk, MAX_LINE_WIDTH};
use crate::core::target::UnitSettings;
use crate::core::unit::{Unit, UnitKind};

/// A resolved macro file and its raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroSource {
    pub path: PathBuf,
    pub content: String,
}

impl MacroSource {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        MacroSource {
            path: path.into(),
            content: content.into(),
        }
    }
}

const VAR_CONTINUATION: &str = "%trim(\n)";

/// Render one variable as a `%let` statement.
///
/// Long values are split at the chunk width; `%trim(` and `)` around each
/// line break rejoin the pieces without whitespace.
pub fn render_var(name: &str, value: &str) -> String {
    let value = if value.chars().count() > MAX_LINE_WIDTH {
        chunk(value, MAX_LINE_WIDTH).join(VAR_CONTINUATION)
    } else {
        value.to_string()
    };
    format!("%let {}={};\n", name, value)
}

/// Assemble the compiled text of `unit`.
pub fn assemble(
    unit: &Unit,
    macros: &[MacroSource],
    plan: &EmbedPlan,
    settings: &UnitSettings,
    init: Option<&str>,
    term: Option<&str>,
) -> String {
    let label = unit.kind.label();
    let mut out = String::new();

    if unit.kind == UnitKind::Service {
        let vars: String = settings
            .vars
            .iter()
            .map(|(name, value)| render_var(name, value))
            .collect();
        section(&mut out, &format!("{} Variables", label), &vars);
    }

    let dependencies: String = macros
        .iter()
        .map(|m| with_newline(&m.content))
        .collect();
    section(&mut out, "Dependencies", &dependencies);

    section(&mut out, "Programs", &plan.render());

    if let Some(init) = init {
        section(&mut out, &format!("{}Init", label), init);
    }

    section(&mut out, label, &unit.body);

    if let Some(term) = term {
        section(&mut out, &format!("{}Term", label), term);
    }

    out
}

fn section(out: &mut String, name: &str, content: &str) {
    out.push_str(&format!("* {} start;\n", name));
    out.push_str(&with_newline(content));
    out.push_str(&format!("* {} end;\n", name));
}

fn with_newline(text: &str) -> String {
    if text.is_empty() || text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{}\n", text)
    }
}
