//! # caisse
//!
//! Command-line front end of the report engine.
//!
//! ```bash
//! # Print the template preset for a report kind
//! caisse preset recettes > recettes.json
//!
//! # Export a dataset with a template
//! caisse export --template recettes.json --data janvier.json --title "Recettes janvier" --format pdf
//!
//! # Write the on-screen preview (first 20 rows by default)
//! caisse preview --template recettes.json --data janvier.json --title "Recettes janvier"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use caisse_core::config::CaisseConfig;
use caisse_core::logging;
use caisse_core::notifications::{AppNotification, NotificationStore};
use caisse_core::{CaisseError, classify_error};
use caisse_docs::dataset::{Row, parse_rows};
use caisse_docs::preview::render_preview_document;
use caisse_docs::{ExportFormat, ReportRequest, ReportType, Template, export, save_artifact};

/// Report exports for the cash register
#[derive(Parser, Debug)]
#[command(name = "caisse")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.caisse/config.json)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a dataset with a template and save the file
    Export {
        /// Template JSON file
        #[arg(long, value_name = "FILE")]
        template: PathBuf,

        /// Dataset JSON file (array of row objects)
        #[arg(long, value_name = "FILE")]
        data: PathBuf,

        /// Report title
        #[arg(long)]
        title: String,

        /// Optional subtitle
        #[arg(long)]
        subtitle: Option<String>,

        /// pdf, xlsx, doc, docx, csv or html
        #[arg(long, default_value = "pdf")]
        format: ExportFormat,

        /// Output directory (defaults to the configured one)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Logo source overriding the configured one (path, URL or data URL)
        #[arg(long)]
        logo: Option<String>,
    },

    /// Print a preset template as JSON
    Preset {
        /// recettes, depenses, feuille_caisse, rubriques or custom
        report_type: Option<String>,
    },

    /// Write the preview page for a template and dataset
    Preview {
        /// Template JSON file
        #[arg(long, value_name = "FILE")]
        template: PathBuf,

        /// Dataset JSON file (array of row objects)
        #[arg(long, value_name = "FILE")]
        data: PathBuf,

        /// Report title
        #[arg(long)]
        title: String,

        /// Optional subtitle
        #[arg(long)]
        subtitle: Option<String>,

        /// Rows to show (defaults to the configured preview size)
        #[arg(long)]
        rows: Option<usize>,

        /// Output HTML file (stdout when omitted)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration illisible, valeurs par défaut utilisées : {e:#}");
            CaisseConfig::default()
        }
    };

    let log_settings = logging::LogSettings::from_config(&config);
    let _log_guard = match log_settings.and_then(|settings| logging::init_logging(&settings)) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Journalisation indisponible : {e:#}");
            None
        }
    };
    info!("Starting caisse v{}", env!("CARGO_PKG_VERSION"));

    let mut notifications = NotificationStore::new();
    let ok = match cli.command {
        Commands::Export {
            template,
            data,
            title,
            subtitle,
            format,
            out,
            logo,
        } => {
            let job = ExportJob {
                template: &template,
                data: &data,
                title,
                subtitle,
                format,
                out,
                logo,
            };
            match job.run(&config) {
                Ok(path) => {
                    notifications.push(AppNotification::export_saved(&path));
                    true
                }
                Err(e) => {
                    error!("Export failed: {e}");
                    notifications.push(AppNotification::export_failed(&e.user_message()));
                    false
                }
            }
        }
        Commands::Preset { report_type } => match print_preset(report_type.as_deref(), &config) {
            Ok(()) => true,
            Err(e) => {
                let classified = classify_error(&e);
                error!("Preset failed: {}", classified.message);
                eprintln!("{}", classified.user_message);
                false
            }
        },
        Commands::Preview {
            template,
            data,
            title,
            subtitle,
            rows,
            out,
        } => match write_preview(&template, &data, title, subtitle, rows, out.as_deref(), &config) {
            Ok(()) => true,
            Err(e) => {
                let classified = classify_error(&e);
                error!("Preview failed: {e:#}");
                eprintln!("{}", classified.user_message);
                false
            }
        },
    };

    if let Some(notification) = notifications.latest() {
        if ok {
            println!("{notification}");
        } else {
            eprintln!("{notification}");
        }
    }
    if !ok {
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<CaisseConfig> {
    match path {
        Some(path) => CaisseConfig::load_from_path(path),
        None => CaisseConfig::load(),
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// One export attempt: load inputs, render, save.
struct ExportJob<'a> {
    template: &'a Path,
    data: &'a Path,
    title: String,
    subtitle: Option<String>,
    format: ExportFormat,
    out: Option<PathBuf>,
    logo: Option<String>,
}

impl ExportJob<'_> {
    fn run(self, config: &CaisseConfig) -> Result<PathBuf, CaisseError> {
        let template = load_template(self.template).map_err(|e| CaisseError::Template(format!("{e:#}")))?;
        let rows = load_rows(self.data).map_err(|e| CaisseError::Data(format!("{e:#}")))?;

        let mut request = ReportRequest::new(template, rows, self.title);
        if let Some(subtitle) = self.subtitle {
            request = request.with_subtitle(subtitle);
        }
        if let Some(logo) = self.logo.or_else(|| config.logo_path.clone()) {
            request = request.with_logo(logo);
        }

        let artifact = export(&request, self.format, &config.format_locale(), &config.image_loader())?;
        let dir = match self.out {
            Some(dir) => dir,
            None => config
                .resolved_output_dir()
                .map_err(|e| CaisseError::Config(format!("{e:#}")))?,
        };
        let path = save_artifact(&dir, &artifact)?;
        info!(format = %self.format, "Report written to {}", path.display());
        Ok(path)
    }
}

fn load_template(path: &Path) -> anyhow::Result<Template> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read template: {}", path.display()))?;
    let mut template: Template = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse template JSON: {}", path.display()))?;
    template.normalize();
    Ok(template)
}

fn load_rows(path: &Path) -> anyhow::Result<Vec<Row>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
    parse_rows(&content).with_context(|| format!("Invalid dataset: {}", path.display()))
}

// ---------------------------------------------------------------------------
// Preset / preview
// ---------------------------------------------------------------------------

fn print_preset(name: Option<&str>, config: &CaisseConfig) -> anyhow::Result<()> {
    let template = match name {
        Some(name) => {
            let report_type = ReportType::from_name(name)
                .with_context(|| format!("Unknown report type: {name}"))?;
            Template::from_preset(report_type)
        }
        None => {
            let mut template = Template::from_preset(config.default_report_type);
            template.orientation = config.default_orientation;
            template
        }
    };
    println!("{}", serde_json::to_string_pretty(&template)?);
    Ok(())
}

fn write_preview(
    template: &Path,
    data: &Path,
    title: String,
    subtitle: Option<String>,
    rows: Option<usize>,
    out: Option<&Path>,
    config: &CaisseConfig,
) -> anyhow::Result<()> {
    let mut request = ReportRequest::new(load_template(template)?, load_rows(data)?, title);
    if let Some(subtitle) = subtitle {
        request = request.with_subtitle(subtitle);
    }
    if let Some(logo) = &config.logo_path {
        request = request.with_logo(logo.clone());
    }

    let limit = rows.unwrap_or(config.preview_rows);
    let html = render_preview_document(&request, &config.format_locale(), Some(limit));
    match out {
        Some(path) => {
            std::fs::write(path, html)
                .with_context(|| format!("Failed to write preview: {}", path.display()))?;
            info!("Preview written to {}", path.display());
        }
        None => {
            if request.rows.len() > limit {
                warn!("Preview truncated to {limit} of {} rows", request.rows.len());
            }
            println!("{html}");
        }
    }
    Ok(())
}
