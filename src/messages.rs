//! Message catalogue for instructor-facing text
//!
//! Every flag message, file-risk issue and timeline description is produced
//! from a keyed template plus named arguments, so wording lives in one table.
//!
//! Templates use `{name}` or `{name:.Nf}` placeholders. A float without a
//! format specifier renders with at least one decimal (`2.0`, `3.3`).

use crate::types::Severity;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors produced while rendering a template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Unknown message key: {0}")]
    UnknownKey(String),

    #[error("Template `{key}` requires argument `{argument}`")]
    MissingArgument { key: String, argument: String },

    #[error("Template `{key}` has unsupported placeholder `{placeholder}`")]
    BadPlaceholder { key: String, placeholder: String },
}

/// A single named template argument
#[derive(Debug, Clone, PartialEq)]
pub enum MessageArg {
    Number(f64),
    Integer(i64),
    Text(String),
}

impl From<f64> for MessageArg {
    fn from(v: f64) -> Self {
        MessageArg::Number(v)
    }
}

impl From<i64> for MessageArg {
    fn from(v: i64) -> Self {
        MessageArg::Integer(v)
    }
}

impl From<u32> for MessageArg {
    fn from(v: u32) -> Self {
        MessageArg::Integer(i64::from(v))
    }
}

impl From<u64> for MessageArg {
    fn from(v: u64) -> Self {
        MessageArg::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<&str> for MessageArg {
    fn from(v: &str) -> Self {
        MessageArg::Text(v.to_string())
    }
}

impl From<String> for MessageArg {
    fn from(v: String) -> Self {
        MessageArg::Text(v)
    }
}

impl MessageArg {
    fn format(&self, style: Option<&str>) -> Option<String> {
        match (self, style) {
            (MessageArg::Number(v), None) => Some(format_float(*v)),
            (MessageArg::Integer(v), None) => Some(v.to_string()),
            (MessageArg::Text(s), None) => Some(s.clone()),
            (MessageArg::Number(v), Some(style)) => fixed_precision(style).map(|p| format!("{:.*}", p, v)),
            (MessageArg::Integer(v), Some(style)) => {
                fixed_precision(style).map(|p| format!("{:.*}", p, *v as f64))
            }
            (MessageArg::Text(_), Some(_)) => None,
        }
    }
}

impl fmt::Display for MessageArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageArg::Number(v) => write!(f, "{}", format_float(*v)),
            MessageArg::Integer(v) => write!(f, "{v}"),
            MessageArg::Text(s) => write!(f, "{s:?}"),
        }
    }
}

fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

/// Parse `.Nf` into a precision
fn fixed_precision(style: &str) -> Option<usize> {
    style.strip_prefix('.')?.strip_suffix('f')?.parse().ok()
}

/// Named arguments for a template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageArgs {
    values: BTreeMap<String, MessageArg>,
}

impl MessageArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<MessageArg>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&MessageArg> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `name=value` pairs, used by fallback rendering
    fn describe(&self) -> String {
        self.values
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Example argument value stored alongside a template
#[derive(Debug, Clone, Copy)]
pub enum ExampleValue {
    Number(f64),
    Integer(i64),
    Text(&'static str),
}

/// A catalogue entry
#[derive(Debug, Clone, Copy)]
pub struct MessageTemplate {
    pub key: &'static str,
    pub template: &'static str,
    pub severity: Severity,
    pub category: &'static str,
    pub example: &'static [(&'static str, ExampleValue)],
}

impl MessageTemplate {
    /// Arguments that render this template cleanly
    pub fn example_args(&self) -> MessageArgs {
        self.example
            .iter()
            .fold(MessageArgs::new(), |args, (name, value)| match value {
                ExampleValue::Number(v) => args.with(name, *v),
                ExampleValue::Integer(v) => args.with(name, *v),
                ExampleValue::Text(v) => args.with(name, *v),
            })
    }

    /// Substitute arguments into the template text
    pub fn render(&self, args: &MessageArgs) -> Result<String, RenderError> {
        let mut out = String::with_capacity(self.template.len() + 16);
        let mut rest = self.template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| RenderError::BadPlaceholder {
                key: self.key.to_string(),
                placeholder: after.to_string(),
            })?;
            let placeholder = &after[..close];
            let (name, style) = match placeholder.split_once(':') {
                Some((name, style)) => (name, Some(style)),
                None => (placeholder, None),
            };

            let value = args.get(name).ok_or_else(|| RenderError::MissingArgument {
                key: self.key.to_string(),
                argument: name.to_string(),
            })?;
            let text = value.format(style).ok_or_else(|| RenderError::BadPlaceholder {
                key: self.key.to_string(),
                placeholder: placeholder.to_string(),
            })?;
            out.push_str(&text);
            rest = &after[close + 1..];
        }
        out.push_str(rest);

        Ok(out)
    }
}

/// Built-in message catalogue
pub const MESSAGES: &[MessageTemplate] = &[
    MessageTemplate {
        key: "paste_percentage",
        template: "{paste_percentage:.0f}% of code pasted in blocks rather than typed gradually",
        severity: Severity::High,
        category: "Code Origin",
        example: &[("paste_percentage", ExampleValue::Number(82.0))],
    },
    MessageTemplate {
        key: "completed_quickly",
        template: "Entire submission completed in {active_time:.1f} minutes",
        severity: Severity::High,
        category: "Time Analysis",
        example: &[("active_time", ExampleValue::Number(3.5))],
    },
    MessageTemplate {
        key: "high_typing_speed",
        template: "{average_cpm:.0f} chars/min typing speed (human: 40-80 chars/min)",
        severity: Severity::High,
        category: "Typing Speed",
        example: &[("average_cpm", ExampleValue::Number(420.0))],
    },
    MessageTemplate {
        key: "file_risks",
        template: "{file}: {issues}",
        severity: Severity::High,
        category: "File Analysis",
        example: &[
            ("file", ExampleValue::Text("main.py")),
            ("issues", ExampleValue::Text("sudden creation; large pastes")),
        ],
    },
    MessageTemplate {
        key: "chunks_appeared",
        template: "Code appeared in chunks (score: {incremental_score}/10)",
        severity: Severity::Medium,
        category: "Development Pattern",
        example: &[("incremental_score", ExampleValue::Number(2.0))],
    },
    MessageTemplate {
        key: "robotic_typing",
        template: "Robotic typing patterns (variance: {typing_variance}/10)",
        severity: Severity::Medium,
        category: "Typing Behavior",
        example: &[("typing_variance", ExampleValue::Number(1.5))],
    },
    MessageTemplate {
        key: "few_corrections",
        template: "Almost no corrections (score: {error_correction_ratio}/10)",
        severity: Severity::Medium,
        category: "Error Correction",
        example: &[("error_correction_ratio", ExampleValue::Number(1.2))],
    },
    MessageTemplate {
        key: "few_sessions",
        template: "Very few work sessions (score: {session_consistency}/10)",
        severity: Severity::Medium,
        category: "Work Sessions",
        example: &[("session_consistency", ExampleValue::Number(1.0))],
    },
    MessageTemplate {
        key: "no_suspicious",
        template: "No suspicious patterns detected - work appears authentic",
        severity: Severity::None,
        category: "Assessment",
        example: &[],
    },
    MessageTemplate {
        key: "large_pastes_count_ratio",
        template: "{count} large pastes ({ratio:.0f}%)",
        severity: Severity::High,
        category: "File Analysis",
        example: &[
            ("count", ExampleValue::Integer(3)),
            ("ratio", ExampleValue::Number(52.0)),
        ],
    },
    MessageTemplate {
        key: "large_pastes_count",
        template: "{count} large pastes",
        severity: Severity::Medium,
        category: "File Analysis",
        example: &[("count", ExampleValue::Integer(2))],
    },
    MessageTemplate {
        key: "very_few_edits",
        template: "very few edits ({edit_ratio:.1f}%)",
        severity: Severity::Medium,
        category: "File Analysis",
        example: &[("edit_ratio", ExampleValue::Number(2.3))],
    },
    MessageTemplate {
        key: "entire_file_quick",
        template: "entire file in {duration:.1f} minutes",
        severity: Severity::High,
        category: "File Analysis",
        example: &[("duration", ExampleValue::Number(1.2))],
    },
    MessageTemplate {
        key: "timeline_window",
        template: "At {elapsed:.0f} minutes: {chars_added} chars added, {deletions} deletions in {files}",
        severity: Severity::None,
        category: "Timeline",
        example: &[
            ("elapsed", ExampleValue::Number(20.0)),
            ("chars_added", ExampleValue::Integer(340)),
            ("deletions", ExampleValue::Integer(12)),
            ("files", ExampleValue::Text("main.py, util.py")),
        ],
    },
    MessageTemplate {
        key: "timeline_window_pastes",
        template: "At {elapsed:.0f} minutes: {paste_count} large paste(s) ({paste_chars} chars), {chars_added} chars added, {deletions} deletions in {files}",
        severity: Severity::None,
        category: "Timeline",
        example: &[
            ("elapsed", ExampleValue::Number(30.0)),
            ("paste_count", ExampleValue::Integer(2)),
            ("paste_chars", ExampleValue::Integer(900)),
            ("chars_added", ExampleValue::Integer(1020)),
            ("deletions", ExampleValue::Integer(1)),
            ("files", ExampleValue::Text("main.py")),
        ],
    },
];

/// Look up a catalogue entry
pub fn template(key: &str) -> Option<&'static MessageTemplate> {
    MESSAGES.iter().find(|t| t.key == key)
}

/// Maps a template key plus arguments to display text
pub trait MessageRenderer {
    fn render(&self, key: &str, args: &MessageArgs) -> Result<String, RenderError>;

    /// Render, degrading to a string that embeds the key and available values
    fn render_or_fallback(&self, key: &str, args: &MessageArgs) -> String {
        match self.render(key, args) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(key, error = %err, "message rendering degraded");
                fallback(key, args, &err)
            }
        }
    }
}

/// Renderer backed by the built-in [`MESSAGES`] table
#[derive(Debug, Clone, Copy, Default)]
pub struct Catalogue;

impl MessageRenderer for Catalogue {
    fn render(&self, key: &str, args: &MessageArgs) -> Result<String, RenderError> {
        template(key)
            .ok_or_else(|| RenderError::UnknownKey(key.to_string()))?
            .render(args)
    }
}

fn fallback(key: &str, args: &MessageArgs, err: &RenderError) -> String {
    let head = match (err, template(key)) {
        (RenderError::UnknownKey(_), _) | (_, None) => format!("Unknown flag: {key}"),
        (_, Some(t)) => t.template.to_string(),
    };
    if args.is_empty() {
        head
    } else {
        format!("{head} ({})", args.describe())
    }
}
