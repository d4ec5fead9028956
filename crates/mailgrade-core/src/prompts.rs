//! Named prompt templates with `system` and `user` variants.
//!
//! Templates use `{name}` placeholders; `{{` and `}}` produce literal braces.
//! Templates are compiled when the catalog is built, so syntax errors surface
//! at load time and rendering only has to resolve arguments.

use crate::config::ConfigError;
use crate::errors::EvalError;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

const BUILTIN_PROMPTS: &str = include_str!("../assets/prompts.yaml");

/// Catalog entries every workflow needs.
pub const REQUIRED_PROMPTS: [&str; 5] = [
    "lengthen",
    "shorten",
    "change_tone",
    "faithfulness_judge",
    "completeness_judge",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PromptVariant {
    System,
    User,
}

impl PromptVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(Self::System),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

impl fmt::Display for PromptVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Template {
    segments: Vec<Segment>,
}

impl Template {
    fn compile(src: &str) -> Result<Self, String> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = src.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => name.push(ch),
                            None => return Err(format!("unclosed placeholder '{{{}'", name)),
                        }
                    }
                    if !is_identifier(&name) {
                        return Err(format!("invalid placeholder name '{}'", name));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name));
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err("single '}' encountered; use '}}' for a literal brace".into()),
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Read-only prompt catalog, loaded once and shared by every operation.
#[derive(Debug, Clone, Default)]
pub struct PromptCatalog {
    templates: BTreeMap<(String, PromptVariant), Template>,
}

impl PromptCatalog {
    /// The catalog shipped with the crate.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_yaml_str(BUILTIN_PROMPTS)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw).map_err(|e| e.with_path(path))
    }

    /// Parses a YAML mapping of `name -> {system: .., user: ..}`.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let parsed: BTreeMap<String, BTreeMap<String, String>> =
            serde_yaml::from_str(raw).map_err(|source| ConfigError::Yaml { path: None, source })?;

        let mut entries = Vec::new();
        for (name, variants) in parsed {
            for (variant, template) in variants {
                let variant = PromptVariant::parse(&variant).ok_or_else(|| {
                    ConfigError::InvalidPrompt {
                        name: name.clone(),
                        variant: variant.clone(),
                        detail: "variant must be 'system' or 'user'".into(),
                    }
                })?;
                entries.push((name.clone(), variant, template));
            }
        }
        Self::from_templates(entries)
    }

    pub fn from_templates<I, N, T>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (N, PromptVariant, T)>,
        N: Into<String>,
        T: AsRef<str>,
    {
        let mut templates = BTreeMap::new();
        for (name, variant, source) in entries {
            let name = name.into();
            let template =
                Template::compile(source.as_ref()).map_err(|detail| ConfigError::InvalidPrompt {
                    name: name.clone(),
                    variant: variant.to_string(),
                    detail,
                })?;
            templates.insert((name, variant), template);
        }
        Ok(Self { templates })
    }

    pub fn contains(&self, name: &str, variant: PromptVariant) -> bool {
        self.templates.contains_key(&(name.to_string(), variant))
    }

    /// Placeholder names referenced by a template, deduplicated and sorted.
    pub fn placeholders(&self, name: &str, variant: PromptVariant) -> Option<BTreeSet<&str>> {
        self.templates
            .get(&(name.to_string(), variant))
            .map(|t| t.placeholders().collect())
    }

    /// `(name, variant)` pairs from [`REQUIRED_PROMPTS`] that this catalog lacks.
    pub fn missing_required(&self) -> Vec<(&'static str, PromptVariant)> {
        REQUIRED_PROMPTS
            .iter()
            .flat_map(|name| [(*name, PromptVariant::System), (*name, PromptVariant::User)])
            .filter(|(name, variant)| !self.contains(name, *variant))
            .collect()
    }

    /// Renders a template. Arguments the template does not reference are ignored.
    pub fn render(
        &self,
        name: &str,
        variant: PromptVariant,
        args: &[(&str, &str)],
    ) -> Result<String, EvalError> {
        let template = self
            .templates
            .get(&(name.to_string(), variant))
            .ok_or_else(|| EvalError::TemplateNotFound {
                name: name.to_string(),
                variant: variant.to_string(),
            })?;

        let mut out = String::new();
        for segment in &template.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(key) => {
                    let value = args
                        .iter()
                        .find(|(k, _)| *k == key.as_str())
                        .map(|(_, v)| *v)
                        .ok_or_else(|| EvalError::TemplateArgument {
                            name: name.to_string(),
                            variant: variant.to_string(),
                            placeholder: key.clone(),
                        })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}
