use clap::{Parser, Subcommand, ValueEnum};
use iosbackup_core::{Category, MediaKind, Mode};
use std::path::PathBuf;

pub const DEFAULT_SHOW_LIMIT: usize = 20;

#[derive(Parser, Debug)]
#[command(
    name = "iosbackup",
    version,
    about = "Browse and export unencrypted iOS device backups"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        env = "IOSBACKUP_ROOT",
        help = "Folder holding one sub-folder per device backup"
    )]
    pub root: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = "IOSBACKUP_MODE",
        help = "Feature mode: lite (camera roll only) or pro"
    )]
    pub mode: Option<Mode>,
    #[arg(
        long,
        global = true,
        env = "IOSBACKUP_LOG_LEVEL",
        help = "trace, debug, info, warn or error"
    )]
    pub log_level: Option<String>,
    #[arg(
        long,
        global = true,
        env = "IOSBACKUP_LOG_DIR",
        help = "Write rolling log files here instead of stderr"
    )]
    pub log_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

/// `<backup>` arguments take a folder path or a folder name under `--root`.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List backups under the backup root, newest first.
    List,
    /// Show device information for one backup.
    Info { backup: String },
    /// Show file and per-category counts.
    Stats { backup: String },
    /// List manifest entries of one domain.
    Files {
        backup: String,
        #[arg(long)]
        domain: String,
        #[arg(long, help = "SQL LIKE pattern on the relative path")]
        pattern: Option<String>,
    },
    /// Print the blob location of a logical file.
    Resolve {
        backup: String,
        domain: String,
        path: String,
    },
    /// List categories available in the current mode.
    Categories,
    /// Print the records of one category.
    Show {
        backup: String,
        category: Category,
        #[arg(long, default_value_t = DEFAULT_SHOW_LIMIT)]
        limit: usize,
    },
    /// Export one category to a folder.
    Export {
        backup: String,
        category: Category,
        #[arg(long, help = "Destination folder [default: <export dir>/<category>]")]
        out: Option<PathBuf>,
        #[arg(long, value_enum, help = "Camera roll only: limit to photos or videos")]
        kind: Option<KindArg>,
        #[arg(long, default_value_t = false, help = "Contacts only: write one .vcf file")]
        single_file: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum KindArg {
    Photos,
    Videos,
}

impl From<KindArg> for MediaKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Photos => MediaKind::Photo,
            KindArg::Videos => MediaKind::Video,
        }
    }
}
