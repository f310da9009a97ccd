//! TypstPad CLI - manage editor fonts, saved formulas and share links.
//!
//! Works on the same data directory as the editor core: the settings file
//! (installed fonts, formula library) and the uploaded font database.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;
use typstpad_core::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "typstpad")]
#[command(about = "Manage TypstPad fonts, formulas and share links")]
struct Args {
    /// Data directory (defaults to the platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bundled and uploaded fonts
    #[command(subcommand)]
    Fonts(FontsCommand),

    /// Saved formula library
    #[command(subcommand)]
    Formulas(FormulasCommand),

    /// Share links
    #[command(subcommand)]
    Share(ShareCommand),
}

#[derive(Subcommand, Debug)]
enum FontsCommand {
    /// List bundled fonts with their install state, then uploaded fonts
    List,
    /// Print installed bundled font ids
    Installed,
    /// Install bundled fonts
    Install {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Uninstall bundled fonts
    Uninstall {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Upload font files
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Remove an uploaded font
    Remove { id: String },
    /// Show the font sources a compiler would load
    Sources,
}

#[derive(Subcommand, Debug)]
enum FormulasCommand {
    /// List saved formulas, newest first
    List,
    /// Save a formula
    Add {
        /// Name (derived from the content when omitted)
        #[arg(short, long, default_value = "")]
        name: String,
        content: String,
    },
    /// Delete a saved formula
    Delete { id: String },
    /// Delete every saved formula
    Clear,
}

#[derive(Subcommand, Debug)]
enum ShareCommand {
    /// Encode a formula as a share parameter, or a full link with --base
    Encode {
        code: String,
        /// Page URL to append the query to
        #[arg(long)]
        base: Option<String>,
    },
    /// Decode a formula from a share link or query string
    Decode { link: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so command output stays clean
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => dirs::data_dir()
            .map(|dir| dir.join(AppConfig::DATA_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(".").join(AppConfig::DATA_DIR_NAME)),
    };
    debug!("Data directory: {}", data_dir.display());

    let mut out = std::io::stdout().lock();
    let format = commands::OutputFormat::from_json_flag(args.json);

    match args.command {
        Command::Share(command) => match command {
            ShareCommand::Encode { code, base } => {
                commands::share_encode(&mut out, &code, base.as_deref())
            }
            ShareCommand::Decode { link } => commands::share_decode(&mut out, &link),
        },
        Command::Fonts(command) => {
            let ctx = commands::Context::open(&data_dir)?;
            match command {
                FontsCommand::List => commands::fonts_list(&ctx, &mut out, format).await,
                FontsCommand::Installed => commands::fonts_installed(&ctx, &mut out, format).await,
                FontsCommand::Install { ids } => {
                    commands::fonts_install(&ctx, &mut out, &ids).await
                }
                FontsCommand::Uninstall { ids } => {
                    commands::fonts_uninstall(&ctx, &mut out, &ids).await
                }
                FontsCommand::Upload { paths } => {
                    commands::fonts_upload(&ctx, &mut out, &paths, format).await
                }
                FontsCommand::Remove { id } => commands::fonts_remove(&ctx, &mut out, &id).await,
                FontsCommand::Sources => commands::fonts_sources(&ctx, &mut out, format).await,
            }
        }
        Command::Formulas(command) => {
            let ctx = commands::Context::open(&data_dir)?;
            match command {
                FormulasCommand::List => commands::formulas_list(&ctx, &mut out, format),
                FormulasCommand::Add { name, content } => {
                    commands::formulas_add(&ctx, &mut out, &name, &content, format)
                }
                FormulasCommand::Delete { id } => commands::formulas_delete(&ctx, &mut out, &id),
                FormulasCommand::Clear => commands::formulas_clear(&ctx, &mut out),
            }
        }
    }
}
