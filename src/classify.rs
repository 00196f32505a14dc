use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// In-band control value: instead of display text, the server asks the
/// client to offer a "save conversation" action.
pub const SAVE_SENTINEL: &str = "save_conversation";

// -- Categories and messages ------------------------------------------------

/// Semantic tag of a rendered line; drives styling only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Event,
    Narrator,
    Detective,
    Error,
    Plain,
}

impl Category {
    /// Map a structured record's `type` tag onto a category.
    ///
    /// Role tags with a suffix (`detective1_question`, `narrator_answer`)
    /// fold into their role; anything unrecognised renders as plain text.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "event" => Category::Event,
            "error" => Category::Error,
            t if t.starts_with("narrator") => Category::Narrator,
            t if t.starts_with("detective") => Category::Detective,
            _ => Category::Plain,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Event => "event",
            Category::Narrator => "narrator",
            Category::Detective => "detective",
            Category::Error => "error",
            Category::Plain => "plain",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line ready for display. Serializes to the same `{type, content}`
/// shape the structured stream uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedMessage {
    #[serde(rename = "type")]
    pub category: Category,
    #[serde(rename = "content")]
    pub text: String,
}

impl RenderedMessage {
    pub fn new(category: Category, text: impl Into<String>) -> Self {
        RenderedMessage { category, text: text.into() }
    }
}

/// Outcome of classifying a single line.
#[derive(Debug)]
pub enum Classified {
    Message(RenderedMessage),
    SaveTrigger,
    Ignored,
    /// Structured record that could not be used; logged, never shown.
    Dropped(RecordError),
}

// -- Prefix policy ----------------------------------------------------------

/// Literal prefixes for the plain-text policy. Loaded from the `[prefixes]`
/// table of the config file; every field falls back to the game's defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PrefixRules {
    pub narrator: String,
    pub detective: String,
    pub error: String,
    pub events: Vec<String>,
    pub sentinel: String,
}

impl Default for PrefixRules {
    fn default() -> Self {
        PrefixRules {
            narrator: "Narrador:".to_string(),
            detective: "Detective:".to_string(),
            error: "Error".to_string(),
            events: [
                "Generando",
                "==",
                "Dificultad:",
                "---",
                "Misterio:",
                "¡Se ha alcanzado",
                "El Detective tiene",
                "RESULTADO:",
                "HISTORIA ORIGINAL:",
                "Situación misteriosa:",
                "Solución oculta:",
                "SOLUCIÓN DEL DETECTIVE:",
                "No se proporcionó",
                "VEREDICTO DEL NARRADOR:",
                "Veredicto:",
                "Análisis:",
                "El juego ha terminado",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            sentinel: SAVE_SENTINEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PrefixPolicy {
    rules: PrefixRules,
}

impl PrefixPolicy {
    pub fn new(rules: PrefixRules) -> Self {
        PrefixPolicy { rules }
    }

    pub fn classify(&self, line: &str) -> Classified {
        if line.trim().is_empty() {
            return Classified::Ignored;
        }
        if line == self.rules.sentinel {
            return Classified::SaveTrigger;
        }

        // Speaker prefixes win over the event list so a speaker line is
        // never swallowed by a broader event prefix.
        if let Some(rest) = line.strip_prefix(self.rules.narrator.as_str()) {
            return Classified::Message(RenderedMessage::new(Category::Narrator, strip_space(rest)));
        }
        if let Some(rest) = line.strip_prefix(self.rules.detective.as_str()) {
            return Classified::Message(RenderedMessage::new(Category::Detective, strip_space(rest)));
        }

        let category = if self.rules.events.iter().any(|p| line.starts_with(p.as_str())) {
            Category::Event
        } else if line.starts_with(self.rules.error.as_str()) {
            Category::Error
        } else {
            Category::Plain
        };
        Classified::Message(RenderedMessage::new(category, line))
    }
}

fn strip_space(rest: &str) -> &str {
    rest.strip_prefix(' ').unwrap_or(rest)
}

// -- Structured policy ------------------------------------------------------

/// Wire shape of one structured line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LineRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

impl LineRecord {
    /// Parse one line, separating "not JSON at all" from "JSON, wrong shape".
    pub fn parse(line: &str) -> Result<Self, RecordError> {
        let value: serde_json::Value = serde_json::from_str(line).map_err(RecordError::Malformed)?;
        serde_json::from_value(value).map_err(RecordError::InvalidShape)
    }
}

#[derive(Debug, Clone)]
pub struct StructuredPolicy {
    sentinel: String,
}

impl Default for StructuredPolicy {
    fn default() -> Self {
        StructuredPolicy { sentinel: SAVE_SENTINEL.to_string() }
    }
}

impl StructuredPolicy {
    pub fn new(sentinel: impl Into<String>) -> Self {
        StructuredPolicy { sentinel: sentinel.into() }
    }

    pub fn classify(&self, line: &str) -> Classified {
        if line.trim().is_empty() {
            return Classified::Ignored;
        }
        match LineRecord::parse(line) {
            Ok(record) if record.content == self.sentinel => Classified::SaveTrigger,
            Ok(record) => Classified::Message(RenderedMessage::new(
                Category::from_tag(&record.kind),
                record.content,
            )),
            Err(e) => Classified::Dropped(e),
        }
    }
}

// -- Policy selection -------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Plain-text lines classified by literal prefixes
    Prefix,
    /// One `{"type", "content"}` JSON record per line
    Structured,
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyKind::Prefix => write!(f, "prefix"),
            PolicyKind::Structured => write!(f, "structured"),
        }
    }
}

/// The classification policy in force for one deployment. The two variants
/// are alternatives and are never combined on the same stream.
#[derive(Debug, Clone)]
pub enum Policy {
    Prefix(PrefixPolicy),
    Structured(StructuredPolicy),
}

impl Policy {
    pub fn from_kind(kind: PolicyKind, rules: PrefixRules) -> Self {
        match kind {
            PolicyKind::Prefix => Policy::Prefix(PrefixPolicy::new(rules)),
            PolicyKind::Structured => Policy::Structured(StructuredPolicy::new(rules.sentinel)),
        }
    }

    pub fn classify(&self, line: &str) -> Classified {
        match self {
            Policy::Prefix(p) => p.classify(line),
            Policy::Structured(p) => p.classify(line),
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            Policy::Prefix(_) => PolicyKind::Prefix,
            Policy::Structured(_) => PolicyKind::Structured,
        }
    }
}
