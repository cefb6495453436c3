use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LingopackConfig {
    pub db_path: Option<String>,
    pub list_limit: Option<usize>,
    pub import: Option<ImportCfg>,
    pub export: Option<ExportCfg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportCfg {
    pub operator: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportCfg {
    /// Default fill mode: "empty" | "fallback" | "filled"
    pub mode: Option<String>,
    pub out_dir: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{0}")]
    Other(String),
}

/// Search order: CWD/lingopack.toml, $HOME/.config/lingopack/lingopack.toml.
/// Earlier files win field-by-field.
pub fn load_config() -> Result<LingopackConfig, ConfigError> {
    let mut merged = LingopackConfig::default();
    if let Ok(p) = std::env::current_dir() {
        let path = p.join("lingopack.toml");
        if let Ok(s) = std::fs::read_to_string(&path) {
            if let Ok(cfg) = toml::from_str::<LingopackConfig>(&s) {
                merged = merge(merged, cfg);
            }
        }
    }
    if let Some(base) = dirs::config_dir() {
        let path = base.join("lingopack").join("lingopack.toml");
        if let Ok(s) = std::fs::read_to_string(&path) {
            if let Ok(cfg) = toml::from_str::<LingopackConfig>(&s) {
                merged = merge(merged, cfg);
            }
        }
    }
    Ok(merged)
}

fn merge(mut a: LingopackConfig, b: LingopackConfig) -> LingopackConfig {
    if a.db_path.is_none() {
        a.db_path = b.db_path;
    }
    if a.list_limit.is_none() {
        a.list_limit = b.list_limit;
    }
    a.import = merge_opt(a.import, b.import, merge_import);
    a.export = merge_opt(a.export, b.export, merge_export);
    a
}

fn merge_opt<T: Default>(a: Option<T>, b: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (None, Some(b)) => Some(b),
        (Some(a), None) => Some(a),
        (None, None) => None,
    }
}

fn merge_import(mut a: ImportCfg, b: ImportCfg) -> ImportCfg {
    if a.operator.is_none() {
        a.operator = b.operator;
    }
    a
}

fn merge_export(mut a: ExportCfg, b: ExportCfg) -> ExportCfg {
    if a.mode.is_none() {
        a.mode = b.mode;
    }
    if a.out_dir.is_none() {
        a.out_dir = b.out_dir;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_first_file() {
        let a = LingopackConfig {
            db_path: Some("./a.db".into()),
            ..Default::default()
        };
        let b = LingopackConfig {
            db_path: Some("./b.db".into()),
            list_limit: Some(50),
            export: Some(ExportCfg {
                mode: Some("fallback".into()),
                out_dir: None,
            }),
            ..Default::default()
        };
        let m = merge(a, b);
        assert_eq!(m.db_path.as_deref(), Some("./a.db"));
        assert_eq!(m.list_limit, Some(50));
        assert_eq!(m.export.unwrap().mode.as_deref(), Some("fallback"));
    }
}
