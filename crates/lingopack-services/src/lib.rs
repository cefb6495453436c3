//! High-level orchestration layer over parser and store crates.
//! Intentionally thin: exposes stable functions used by the CLI (and any
//! future HTTP surface) without leaking backend details.

pub use lingopack_core::{EngineError, Operator, ProjectContext, QualityMode, Result};

mod bind;
mod export;
mod import;
mod review;
mod util;

pub use bind::{BindMode, BindSpec, ModuleTarget, PageTarget};
pub use export::{
    export_bundle, export_locale, pack_file_name, ExportBundle, FillMode, JSON_CONTENT_TYPE,
    ZIP_CONTENT_TYPE,
};
pub use import::{import_pack, ImportRequest, AUDIT_DETAIL_CAP};
pub use review::set_review_status;
pub use util::error_body;
