use color_eyre::eyre::Result;
use lingopack_store::CatalogStore;
use std::path::PathBuf;

use crate::ui;

const DEFAULT_LIMIT: usize = 20;

pub fn run(
    db: Option<PathBuf>,
    project_id: i64,
    limit: Option<usize>,
    format: &str,
    use_color: bool,
) -> Result<()> {
    let store = super::open_store(db)?;
    let limit = limit.unwrap_or_else(|| {
        let cfg = lingopack_config::load_config().unwrap_or_default();
        cfg.list_limit.unwrap_or(DEFAULT_LIMIT)
    });

    let result = store.with_tx(|tx| tx.list_uploads(project_id, limit));
    if let Some(uploads) = ui::finish(format, result)? {
        if format == "json" {
            return Ok(());
        }
        if uploads.is_empty() {
            println!("no uploads for project {project_id}");
            return Ok(());
        }
        for u in uploads {
            let line = format!(
                "#{} {} {} ({}) by {}: added {}, updated {}, ignored {}, at {}",
                u.id,
                u.kind.as_str(),
                u.locale,
                u.shape.as_str(),
                u.operator,
                u.summary.added,
                u.summary.updated,
                u.summary.ignored,
                format_timestamp(u.created_at)
            );
            if use_color {
                use owo_colors::OwoColorize;
                println!("{} {}", "•".cyan(), line);
            } else {
                println!("• {line}");
            }
        }
    }
    Ok(())
}

fn format_timestamp(epoch_secs: i64) -> String {
    chrono::DateTime::from_timestamp(epoch_secs, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| epoch_secs.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_render_as_rfc3339() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00+00:00");
        assert_eq!(format_timestamp(1_700_000_000), "2023-11-14T22:13:20+00:00");
    }

    #[test]
    fn out_of_range_timestamps_fall_back_to_the_raw_value() {
        assert_eq!(format_timestamp(i64::MAX), i64::MAX.to_string());
    }
}
