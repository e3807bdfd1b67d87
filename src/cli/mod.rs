use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use crate::anidb::{SessionStore, UdpCatalog};
use crate::config::{Config, Credentials, DEFAULT_FILE_TYPES, FAST_COMMAND_DELAY_MS};
use crate::domain::{FieldSet, FileState, MylistUpdate};
use crate::error::{AnicatError, Result};
use crate::services::scan::{self, ExtensionFilter};

mod fields;
mod hash;
mod logout;
mod mylist;
mod output;

pub use output::Output;

#[derive(Parser)]
#[command(name = "anicat")]
#[command(about = "ED2K hasher and AniDB MyList cataloging CLI")]
#[command(version)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "LIST",
        help = "Comma-delimited extensions included when searching directories"
    )]
    pub file_types: Option<String>,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Write results to this file instead of stdout"
    )]
    pub out_file: Option<PathBuf>,

    #[arg(
        short = 'u',
        long,
        global = true,
        env = "ANIDB_USERNAME",
        help = "User name for the catalog service"
    )]
    pub username: Option<String>,

    #[arg(
        short = 'p',
        long,
        global = true,
        env = "ANIDB_PASSWORD",
        hide_env_values = true,
        help = "Password for the catalog service"
    )]
    pub password: Option<String>,

    #[arg(
        short = 'l',
        long,
        global = true,
        value_name = "PATH",
        help = "TOML file with username/password keys"
    )]
    pub login: Option<PathBuf>,

    #[arg(long, global = true, help = "Wait for Enter before exiting")]
    pub wait_input: bool,

    #[arg(
        long,
        global = true,
        help = "Pause 2s instead of 4s between catalog commands"
    )]
    pub fast_command_delay: bool,

    #[arg(long, global = true, help = "Enable debug logging")]
    pub logging: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Hash files and print their ed2k links")]
    Hash {
        #[arg(required = true, value_name = "PATH", help = "Files and/or directories to process")]
        paths: Vec<PathBuf>,
    },

    #[command(
        name = "mylistadd",
        about = "Register files in MyList, updating entries that already exist"
    )]
    MylistAdd {
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        update: MylistOpts,
    },

    #[command(name = "mylistdel", about = "Remove files from MyList")]
    MylistDel {
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,
    },

    #[command(
        name = "mylistaddwithfields",
        about = "Register files and print the requested fields for each"
    )]
    MylistAddWithFields {
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        update: MylistOpts,

        #[command(flatten)]
        fields: FieldOpts,
    },

    #[command(name = "getfields", about = "Print the requested catalog fields for each file")]
    GetFields {
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        fields: FieldOpts,
    },

    #[command(name = "listfields", about = "List every field that can be requested")]
    ListFields,

    #[command(about = "End the cached catalog session")]
    Logout,
}

#[derive(Args)]
pub struct MylistOpts {
    #[arg(long, value_enum, default_value = "hdd", help = "File state to record")]
    pub state: FileState,

    #[arg(long, conflicts_with = "unwatched", help = "Mark the file as watched")]
    pub watched: bool,

    #[arg(long, help = "Mark the file as unwatched")]
    pub unwatched: bool,

    #[arg(long, value_name = "WHEN", help = "Watch date, epoch seconds or YYYY-MM-DD")]
    pub watchdate: Option<String>,

    #[arg(long, help = "File source (any string)")]
    pub source: Option<String>,

    #[arg(long, help = "File storage (any string)")]
    pub storage: Option<String>,

    #[arg(long, help = "Other remarks (any string)")]
    pub other: Option<String>,
}

impl MylistOpts {
    fn into_update(self) -> Result<MylistUpdate> {
        let viewed = match (self.watched, self.unwatched) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        let viewdate = self.watchdate.as_deref().map(parse_watchdate).transpose()?;
        Ok(MylistUpdate {
            state: self.state,
            viewed,
            viewdate,
            source: self.source,
            storage: self.storage,
            other: self.other,
        })
    }
}

fn parse_watchdate(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(epoch) = raw.parse::<i64>() {
        return DateTime::from_timestamp(epoch, 0)
            .ok_or_else(|| AnicatError::InvalidWatchDate(raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AnicatError::InvalidWatchDate(raw.to_string()))
}

#[derive(Args)]
pub struct FieldOpts {
    #[arg(
        long,
        required = true,
        value_name = "LIST",
        help = "Comma-delimited catalog fields to request"
    )]
    pub fields: String,
}

pub fn init_tracing(verbose: bool) {
    let default = if verbose { "anicat=debug" } else { "anicat=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn wait_for_enter() {
    eprint!("press Enter to exit...");
    let _ = std::io::stderr().flush();
    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);
}

pub fn run(cli: Cli) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(dispatch(cli))
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli {
        file_types,
        out_file,
        username,
        password,
        login,
        fast_command_delay,
        command,
        ..
    } = cli;

    let config = Config::load()?;
    let mut out = Output::create(out_file.as_deref())?;
    let filter = ExtensionFilter::parse(
        file_types
            .as_deref()
            .or(config.scan.file_types.as_deref())
            .unwrap_or(DEFAULT_FILE_TYPES),
    );

    let mut client_config = config.client.clone();
    if fast_command_delay {
        client_config.command_delay_ms = client_config.command_delay_ms.min(FAST_COMMAND_DELAY_MS);
    }
    let credentials =
        |config: &Config| Credentials::resolve(username.clone(), password.clone(), login.as_deref(), config);

    match command {
        Commands::Hash { paths } => {
            let Some(files) = resolve_files(&paths, &filter) else {
                return Ok(());
            };
            hash::run(&files, &mut out)?;
        }
        Commands::MylistAdd { paths, update } => {
            let Some(files) = resolve_files(&paths, &filter) else {
                return Ok(());
            };
            let update = update.into_update()?;
            let catalog = UdpCatalog::new(
                client_config,
                Some(credentials(&config)?),
                SessionStore::open_default()?,
            );
            mylist::add(&catalog, &files, &update, &mut out).await?;
        }
        Commands::MylistDel { paths } => {
            let Some(files) = resolve_files(&paths, &filter) else {
                return Ok(());
            };
            let catalog = UdpCatalog::new(
                client_config,
                Some(credentials(&config)?),
                SessionStore::open_default()?,
            );
            mylist::del(&catalog, &files, &mut out).await?;
        }
        Commands::MylistAddWithFields {
            paths,
            update,
            fields: field_opts,
        } => {
            let Some(files) = resolve_files(&paths, &filter) else {
                return Ok(());
            };
            let update = update.into_update()?;
            let field_set = FieldSet::parse(&field_opts.fields)?;
            let catalog = UdpCatalog::new(
                client_config,
                Some(credentials(&config)?),
                SessionStore::open_default()?,
            );
            mylist::add_with_fields(&catalog, &files, &update, &field_set, &mut out).await?;
        }
        Commands::GetFields {
            paths,
            fields: field_opts,
        } => {
            let Some(files) = resolve_files(&paths, &filter) else {
                return Ok(());
            };
            let field_set = FieldSet::parse(&field_opts.fields)?;
            let catalog = UdpCatalog::new(
                client_config,
                Some(credentials(&config)?),
                SessionStore::open_default()?,
            );
            fields::get(&catalog, &files, &field_set, &mut out).await?;
        }
        Commands::ListFields => fields::list(&mut out)?,
        Commands::Logout => {
            // Credentials are optional here; only a cached session is ended.
            let catalog = UdpCatalog::new(
                client_config,
                credentials(&config).ok(),
                SessionStore::open_default()?,
            );
            logout::run(&catalog, &mut out).await?;
        }
    }

    out.flush()?;
    Ok(())
}

fn resolve_files(paths: &[PathBuf], filter: &ExtensionFilter) -> Option<Vec<PathBuf>> {
    let report = scan::collect(paths, filter);
    for warning in &report.warnings {
        warn(warning);
    }
    if report.files.is_empty() {
        warn("no matching files to process");
        return None;
    }
    Some(report.files)
}

pub(crate) fn warn(message: &str) {
    eprintln!("{} {message}", style("warning:").yellow().bold());
}

pub(crate) fn fail(path: &Path, err: &AnicatError) {
    eprintln!("{} {}: {err}", style("error:").red().bold(), path.display());
}
