use clap::{Args, Parser, Subcommand};
use docrepo_core::SortKey;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "docrepo",
    about = "Generic document repository over SQLite",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// SQLite database file
    #[arg(long, global = true, env = "DOCREPO_DB", default_value = "docrepo.sqlite3")]
    pub db: PathBuf,

    /// Collection the command operates on
    #[arg(short, long, global = true, default_value = "documents")]
    pub collection: String,

    /// trace|debug|info|warn|error; defaults to debug in debug builds, info otherwise
    #[arg(long, global = true, env = "DOCREPO_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, global = true, env = "DOCREPO_LOG_DIR")]
    pub log_dir: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Insert a document given as a JSON object
    Create(CreateArgs),
    /// Print one document by id
    Get(GetArgs),
    /// List documents matching a filter
    Find(FindArgs),
    /// Merge-patch a document by id
    Update(UpdateArgs),
    /// Delete a document by id
    Remove(RemoveArgs),
    /// Count documents matching a filter
    Count(CountArgs),
    /// Check that every id refers to an existing document
    Validate(ValidateArgs),
    /// Declare a unique key over one or more fields
    UniqueIndex(UniqueIndexArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    pub json: String,
    /// Keep `createdAt`/`updatedAt` from the input instead of stamping now
    #[arg(long)]
    pub keep_timestamps: bool,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    pub id: String,
    #[arg(long, value_delimiter = ',')]
    pub fields: Option<Vec<String>>,
}

#[derive(Args, Debug)]
pub struct FindArgs {
    /// JSON filter, e.g. '{"age": {"$gte": 18}}'
    #[arg(long)]
    pub filter: Option<String>,
    /// `field[:asc|desc]`, repeatable
    #[arg(long)]
    pub sort: Vec<SortKey>,
    #[arg(long, default_value_t = 0)]
    pub skip: u32,
    #[arg(long)]
    pub limit: Option<u32>,
    #[arg(long, value_delimiter = ',')]
    pub fields: Option<Vec<String>>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub id: String,
    pub json: String,
    #[arg(long, value_delimiter = ',')]
    pub fields: Option<Vec<String>>,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    pub id: String,
}

#[derive(Args, Debug)]
pub struct CountArgs {
    #[arg(long)]
    pub filter: Option<String>,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Args, Debug)]
pub struct UniqueIndexArgs {
    #[arg(required = true)]
    pub fields: Vec<String>,
}
