use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use sqlkit_db::OpenFlag;

/// sqlkit - run SQL against a `SQLite` database
#[derive(Parser, Debug)]
#[command(name = "sqlkit")]
#[command(author, version, about = "Run SQL against a SQLite database and print JSON")]
pub struct Cli {
    /// Database path, `:memory:`, or `file:` URI
    #[arg(long, short, env = "SQLKIT_DATABASE", default_value = ":memory:")]
    pub database: String,

    /// Open-mode flag; repeat to combine
    #[arg(
        long = "flag",
        value_enum,
        default_values_t = [FlagArg::ReadWrite, FlagArg::Create]
    )]
    pub flags: Vec<FlagArg>,

    /// Milliseconds to wait on a locked database before failing
    #[arg(long, env = "SQLKIT_BUSY_TIMEOUT_MS")]
    pub busy_timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute one statement (anything after the first statement is ignored)
    Exec {
        /// SQL text
        sql: String,

        /// Positional parameter as JSON; repeat once per placeholder
        #[arg(long = "param", conflicts_with = "batch")]
        params: Vec<String>,

        /// JSON array of parameter arrays; the statement runs once per entry
        /// and the last result is printed
        #[arg(long)]
        batch: Option<String>,
    },

    /// Execute every statement in a script
    Script {
        /// Script file, or `-` for stdin
        file: PathBuf,
    },

    /// Report whether the database is read-only
    Readonly,
}

/// CLI-friendly open flag enum
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FlagArg {
    /// Open for reading only
    ReadOnly,
    /// Open for reading and writing
    ReadWrite,
    /// Create the file if missing
    Create,
    /// In-memory database
    Memory,
    /// Multi-thread threading mode
    NoMutex,
    /// Serialized threading mode
    FullMutex,
    /// Shared cache
    SharedCache,
    /// Private cache
    PrivateCache,
    /// Refuse symbolic links
    NoFollow,
}

impl From<FlagArg> for OpenFlag {
    fn from(arg: FlagArg) -> Self {
        match arg {
            FlagArg::ReadOnly => Self::ReadOnly,
            FlagArg::ReadWrite => Self::ReadWrite,
            FlagArg::Create => Self::Create,
            FlagArg::Memory => Self::Memory,
            FlagArg::NoMutex => Self::NoMutex,
            FlagArg::FullMutex => Self::FullMutex,
            FlagArg::SharedCache => Self::SharedCache,
            FlagArg::PrivateCache => Self::PrivateCache,
            FlagArg::NoFollow => Self::NoFollow,
        }
    }
}
