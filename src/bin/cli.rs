//! flatkv CLI
//!
//! Command-line interface for inspecting and editing snapshot files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use flatkv::file::LocalFile;
use flatkv::stream::{self, RecordWriter};
use flatkv::{Config, FileFormat, FlatError, Store};
use tracing_subscriber::{fmt, EnvFilter};

/// flatkv CLI
#[derive(Parser, Debug)]
#[command(name = "flatkv-cli")]
#[command(about = "CLI for flatkv snapshot files")]
#[command(version)]
struct Args {
    /// Layout of the snapshot files
    #[arg(short, long, value_enum, default_value_t = FormatArg::Legacy, global = true)]
    format: FormatArg,

    /// Write records in map order instead of sorted by key
    #[arg(long, global = true)]
    unordered: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// Snapshot file
        file: PathBuf,

        /// The key to get
        key: String,
    },

    /// Set a key-value pair (omit the value to store an absent value)
    Put {
        /// Snapshot file, created if missing
        file: PathBuf,

        /// The key to set
        key: String,

        /// The value to set
        value: Option<String>,
    },

    /// Delete a key
    Del {
        /// Snapshot file
        file: PathBuf,

        /// The key to delete
        key: String,
    },

    /// Print every key and value
    List {
        /// Snapshot file
        file: PathBuf,
    },

    /// Print the number of entries
    Count {
        /// Snapshot file
        file: PathBuf,
    },

    /// Rewrite a snapshot in another layout, record by record
    Convert {
        /// Source file, read with --format
        src: PathBuf,

        /// Destination file
        dst: PathBuf,

        /// Layout of the destination file
        #[arg(long, value_enum)]
        to: FormatArg,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Legacy,
    Versioned,
}

impl From<FormatArg> for FileFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Legacy => FileFormat::Legacy,
            FormatArg::Versioned => FileFormat::Versioned,
        }
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,flatkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> flatkv::Result<()> {
    let config = Config::builder()
        .format(args.format.into())
        .ordered_save(!args.unordered)
        .build();

    match args.command {
        Commands::Get { file, key } => {
            let store = open_store(&file, config, false)?;
            match store.get(key.as_bytes()) {
                None => println!("(not found)"),
                Some(None) => println!("(absent)"),
                Some(Some(value)) => println!("{}", String::from_utf8_lossy(&value)),
            }
        }
        Commands::Put { file, key, value } => {
            let store = open_store(&file, config, true)?;
            store.add(key.into_bytes(), value.map(String::into_bytes));
            store.save_as(&file)?;
        }
        Commands::Del { file, key } => {
            let store = open_store(&file, config, false)?;
            let removed = store.delete(key.as_bytes());
            store.save_as(&file)?;
            println!("{}", if removed { 1 } else { 0 });
        }
        Commands::List { file } => {
            let store = open_store(&file, config, false)?;
            store.iterate(|key, value| {
                let key = String::from_utf8_lossy(key);
                match value {
                    Some(value) => println!("{}\t{}", key, String::from_utf8_lossy(value)),
                    None => println!("{}\t(absent)", key),
                }
                true
            });
        }
        Commands::Count { file } => {
            let store = open_store(&file, config, false)?;
            println!("{}", store.count());
        }
        Commands::Convert { src, dst, to } => {
            let dst_config = Config::builder().format(to.into()).build();
            let reader = stream::read_all(LocalFile::open(&src)?, &config)?;
            let mut writer = RecordWriter::new(LocalFile::create(&dst)?, &dst_config)?;
            for pair in reader {
                let (key, value) = pair?;
                writer.push(&key, value.as_deref())?;
            }
            let summary = writer.finish()?;
            tracing::info!(
                "Converted {} records ({} bytes) into {}",
                summary.records,
                summary.bytes,
                dst.display()
            );
        }
    }

    Ok(())
}

/// Load `file` into a new store; a missing file gives an empty store when allowed
fn open_store(file: &Path, config: Config, allow_missing: bool) -> flatkv::Result<Store> {
    let store = Store::with_config(config)?;
    match store.load(file) {
        Ok(()) => Ok(store),
        Err(FlatError::Io(e)) if allow_missing && e.kind() == ErrorKind::NotFound => {
            tracing::info!("{} does not exist, starting empty", file.display());
            Ok(store)
        }
        Err(e) => Err(e),
    }
}
