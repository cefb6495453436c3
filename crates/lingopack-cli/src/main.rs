use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_appender::rolling;
use tracing_subscriber::Layer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod ui;

#[derive(Parser)]
#[command(name = "lingopack", version, about = "Translation catalog manager for JSON language packs")]
struct Cli {
    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Catalog database file (default: lingopack.toml db_path, then ./lingopack.db)
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or update a project's locale configuration
    InitProject {
        #[arg(long)]
        project: i64,
        /// Source locale, e.g. zh-CN
        #[arg(long)]
        source: String,
        /// Comma-separated target locales, e.g. en-US,ja-JP
        #[arg(long)]
        targets: String,
        /// Block target export until every translation is approved
        #[arg(long, default_value_t = false)]
        strict: bool,
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Import a language-pack file and reconcile it into the catalog
    Import {
        #[arg(long)]
        project: i64,
        #[arg(long)]
        locale: String,
        #[arg(long)]
        file: PathBuf,
        /// Attach imported keys to an existing page
        #[arg(long, conflicts_with = "page_route")]
        page_id: Option<i64>,
        /// Attach imported keys to a page, creating it by route if needed
        #[arg(long, conflicts_with = "page_id")]
        page_route: Option<String>,
        #[arg(long, requires = "page_route")]
        page_title: Option<String>,
        #[arg(long, requires = "page_route")]
        page_description: Option<String>,
        #[arg(long, conflicts_with = "module_name")]
        module_id: Option<i64>,
        #[arg(long, conflicts_with = "module_id")]
        module_name: Option<String>,
        /// all | added_only
        #[arg(long, default_value = "all")]
        bind_mode: String,
        #[arg(long)]
        operator: Option<String>,
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Render one locale back into a language-pack file
    Export {
        #[arg(long)]
        project: i64,
        #[arg(long)]
        locale: String,
        /// empty | fallback | filled
        #[arg(long)]
        fill: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Export every configured locale into one zip archive
    ExportBundle {
        #[arg(long)]
        project: i64,
        #[arg(long)]
        fill: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Set the review status of one translation
    Review {
        #[arg(long)]
        project: i64,
        #[arg(long)]
        key: String,
        #[arg(long)]
        locale: String,
        /// needs_review | ready | approved
        #[arg(long)]
        status: String,
        #[arg(long)]
        operator: Option<String>,
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show recent package uploads for a project
    History {
        #[arg(long)]
        project: i64,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Dump JSON Schemas for the structured output types
    Schema {
        #[arg(long, default_value = "")]
        out_dir: PathBuf,
    },
}

trait Runnable {
    fn run(self, db: Option<PathBuf>, use_color: bool) -> Result<()>;
}

impl Runnable for Commands {
    fn run(self, db: Option<PathBuf>, use_color: bool) -> Result<()> {
        let cmd_name = format!("{:?}", self);
        info!("▶ Starting command: {}", cmd_name);

        let result = match self {
            Commands::InitProject {
                project,
                source,
                targets,
                strict,
                format,
            } => {
                debug!(
                    "InitProject args: project={} source={} targets={} strict={}",
                    project, source, targets, strict
                );
                commands::init_project::run(db, project, &source, &targets, strict, &format)
            }

            Commands::Import {
                project,
                locale,
                file,
                page_id,
                page_route,
                page_title,
                page_description,
                module_id,
                module_name,
                bind_mode,
                operator,
                format,
            } => {
                debug!(
                    "Import args: project={} locale={} file={:?} page_id={:?} page_route={:?} bind_mode={}",
                    project, locale, file, page_id, page_route, bind_mode
                );
                commands::import::run(
                    db,
                    project,
                    &locale,
                    &file,
                    page_id,
                    page_route.as_deref(),
                    page_title.as_deref(),
                    page_description.as_deref(),
                    module_id,
                    module_name.as_deref(),
                    &bind_mode,
                    operator.as_deref(),
                    &format,
                    use_color,
                )
            }

            Commands::Export {
                project,
                locale,
                fill,
                out,
                format,
            } => {
                debug!(
                    "Export args: project={} locale={} fill={:?} out={:?}",
                    project, locale, fill, out
                );
                commands::export::run_locale(db, project, &locale, fill.as_deref(), out, &format)
            }

            Commands::ExportBundle {
                project,
                fill,
                out,
                format,
            } => {
                debug!("ExportBundle args: project={} fill={:?} out={:?}", project, fill, out);
                commands::export::run_bundle(db, project, fill.as_deref(), out, &format)
            }

            Commands::Review {
                project,
                key,
                locale,
                status,
                operator,
                format,
            } => {
                debug!(
                    "Review args: project={} key={} locale={} status={}",
                    project, key, locale, status
                );
                commands::review::run(db, project, &key, &locale, &status, operator.as_deref(), &format)
            }

            Commands::History {
                project,
                limit,
                format,
            } => {
                debug!("History args: project={} limit={:?}", project, limit);
                commands::history::run(db, project, limit, &format, use_color)
            }

            Commands::Schema { out_dir } => commands::schema::run(out_dir),
        };

        match &result {
            Ok(_) => info!("✔ Finished command: {}", cmd_name),
            Err(e) => error!("✖ Command {} failed: {:?}", cmd_name, e),
        }

        result
    }
}

fn init_tracing() {
    let file_appender = rolling::daily("logs", "lingopack.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")));

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();

    let use_color = !cli.no_color
        && std::io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none();

    cli.cmd.run(cli.db, use_color)
}
