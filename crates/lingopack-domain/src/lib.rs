use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// Review status of one translation. Ordered by recency of work, not quality;
/// `approved` is reachable only through an explicit review action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TranslationStatus {
    Pending,
    NeedsUpdate,
    NeedsReview,
    Ready,
    Approved,
}

impl TranslationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranslationStatus::Pending => "pending",
            TranslationStatus::NeedsUpdate => "needs_update",
            TranslationStatus::NeedsReview => "needs_review",
            TranslationStatus::Ready => "ready",
            TranslationStatus::Approved => "approved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TranslationStatus::Pending),
            "needs_update" => Some(TranslationStatus::NeedsUpdate),
            "needs_review" => Some(TranslationStatus::NeedsReview),
            "ready" => Some(TranslationStatus::Ready),
            "approved" => Some(TranslationStatus::Approved),
            _ => None,
        }
    }
}

/// Structural shape of a language pack document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PackShape {
    Flat,
    Tree,
}

impl PackShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackShape::Flat => "flat",
            PackShape::Tree => "tree",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "flat" => Some(PackShape::Flat),
            "tree" => Some(PackShape::Tree),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Source,
    Target,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Source => "source",
            ImportKind::Target => "target",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "source" => Some(ImportKind::Source),
            "target" => Some(ImportKind::Target),
            _ => None,
        }
    }
}

/// One updated key with its previous and new text. `before` is `None` when
/// no translation row existed yet.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UpdatedKey {
    pub key: String,
    pub before: Option<String>,
    pub after: String,
}

/// Flat per-import summary. Source imports fill `added`/`updated`/`missing`/
/// `marked_needs_update`; target imports fill `updated`/`ignored`/
/// `skipped_empty`. Counts are always exact even when detail lists are capped
/// for audit display.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ImportSummary {
    pub added: usize,
    pub updated: usize,
    pub missing: usize,
    pub ignored: usize,
    pub skipped_empty: usize,
    pub marked_needs_update: usize,
    pub added_keys: Vec<String>,
    pub updated_keys: Vec<UpdatedKey>,
    pub ignored_keys: Vec<String>,
    pub skipped_empty_keys: Vec<String>,
    pub marked_needs_update_keys: Vec<String>,
}

/// Result of binding affected entries into the page/module context tree.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BindReport {
    pub page_id: i64,
    pub module_id: i64,
    pub attached: usize,
    pub already_placed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ImportReport {
    pub schema_version: u32,
    pub kind: ImportKind,
    pub locale: String,
    pub shape: PackShape,
    pub summary: ImportSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<BindReport>,
}

/// Rendered language pack for one locale.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExportFile {
    pub schema_version: u32,
    pub file_name: String,
    pub content_type: String,
    pub content: String,
}

/// Immutable audit row for one import. Written once per import that touched
/// at least one incoming key, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PackageUpload {
    pub id: i64,
    pub project_id: i64,
    pub kind: ImportKind,
    pub locale: String,
    pub shape: PackShape,
    pub operator: String,
    pub summary: ImportSummary,
    /// Unix seconds.
    pub created_at: i64,
}

/// Structured error body for the `{ok:false, error}` envelope.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}
