use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

/// Workspace-wide result alias.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Error taxonomy of the reconciliation engine. Parse and validation errors
/// are raised before any catalog mutation; binding, quality-gate and storage
/// errors abort the surrounding unit of work.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("parse: {0}")]
    Parse(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("binding: {0}")]
    Binding(String),
    #[error("quality gate: {blocked} translation(s) in `{locale}` are empty or not approved")]
    QualityGate { locale: String, blocked: usize },
    #[error("storage: {0}")]
    Storage(String),
}

impl EngineError {
    /// Machine-readable error class for structured output.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Parse(_) => "parse",
            EngineError::Validation(_) => "validation",
            EngineError::Binding(_) => "binding",
            EngineError::QualityGate { .. } => "quality_gate",
            EngineError::Storage(_) => "storage",
        }
    }
}

/// Project quality policy. `strict` blocks target-locale export while any
/// translation is empty or not yet approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityMode {
    #[default]
    Open,
    Strict,
}

impl QualityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityMode::Open => "open",
            QualityMode::Strict => "strict",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(QualityMode::Open),
            "strict" => Some(QualityMode::Strict),
            _ => None,
        }
    }
}

/// Locale configuration of one project. The engine never reads this from
/// ambient state; every call receives it explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectContext {
    pub project_id: i64,
    pub source_locale: String,
    pub target_locales: Vec<String>,
    pub quality_mode: QualityMode,
}

impl ProjectContext {
    pub fn is_target(&self, locale: &str) -> bool {
        self.target_locales.iter().any(|l| l == locale)
    }

    /// Source locale followed by targets, the order used by bulk export.
    pub fn all_locales(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(1 + self.target_locales.len());
        out.push(self.source_locale.clone());
        out.extend(self.target_locales.iter().cloned());
        out
    }
}

/// Identity and pre-resolved permission decision of the caller.
/// Authorization itself lives outside the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operator {
    pub name: String,
    pub can_edit: bool,
}

impl Operator {
    pub fn new(name: impl Into<String>) -> Self {
        Operator {
            name: name.into(),
            can_edit: true,
        }
    }
}

static LOCALE_RE: OnceLock<Regex> = OnceLock::new();

/// Accepts `xx`/`xxx` language codes with an optional `-YY` region,
/// e.g. `en`, `en-US`, `zh-CN`.
pub fn is_valid_locale(code: &str) -> bool {
    LOCALE_RE
        .get_or_init(|| Regex::new(r"^[a-z]{2,3}(-[A-Z]{2})?$").unwrap())
        .is_match(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_codes() {
        assert!(is_valid_locale("en"));
        assert!(is_valid_locale("en-US"));
        assert!(is_valid_locale("zh-CN"));
        assert!(is_valid_locale("yue"));
        assert!(!is_valid_locale(""));
        assert!(!is_valid_locale("EN"));
        assert!(!is_valid_locale("en_US"));
        assert!(!is_valid_locale("en-usa"));
        assert!(!is_valid_locale("e"));
    }

    #[test]
    fn project_context_targets() {
        let p = ProjectContext {
            project_id: 1,
            source_locale: "zh-CN".into(),
            target_locales: vec!["en-US".into(), "ja-JP".into()],
            quality_mode: QualityMode::Open,
        };
        assert!(p.is_target("en-US"));
        assert!(!p.is_target("zh-CN"));
        assert_eq!(p.all_locales(), vec!["zh-CN", "en-US", "ja-JP"]);
    }
}
