use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "corrnet",
    version,
    about = "Correlation network construction over sensor stream CSVs",
    long_about = "Build an N x N correlation network over co-temporal sensor streams.\n\
                  Input rows are `timestamp,latitude,longitude,value`; streams are keyed\n\
                  by grid cell and an edge is recorded where |corr| reaches the threshold."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Construct the correlation network for a sample file
    Construct(ConstructArgs),
    /// Construct in memory, then apply one incremental update step
    Update(UpdateArgs),
}

/// Correlation proxy / construction method
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Method {
    /// Direct Pearson correlation over the raw streams
    Exact,
    /// Basic-window sketches with the exact cross-term
    Sketch,
    /// Basic-window sketches with the DFT distance cross-term
    Dft,
}

#[derive(Args)]
pub struct ConstructArgs {
    /// Input sample CSV
    #[arg(long)]
    pub file: String,

    /// Correlation threshold in [0, 1]
    #[arg(long, default_value_t = 0.7)]
    pub tau: f64,

    /// Basic window size in samples
    #[arg(long, default_value_t = 24)]
    pub granularity: usize,

    #[arg(long, value_enum, default_value = "sketch")]
    pub method: Method,

    /// Run the exact method over parallel workers
    #[arg(long)]
    pub parallel: bool,

    /// Keep sketches in memory instead of a relational store
    #[arg(long)]
    pub in_memory: bool,

    /// PostgreSQL connection string for the sketch store
    #[arg(long, env = "CORRNET_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Rows per batched insert; 0 disables batching
    #[arg(long, default_value_t = 100)]
    pub write_block: usize,

    /// Ids per range scan during the query phase
    #[arg(long, default_value_t = 100)]
    pub read_block: usize,

    /// DFT truncation ratio in (0, 1]
    #[arg(long, default_value_t = 0.5)]
    pub ratio: f64,

    /// First basic window of the query range
    #[arg(long)]
    pub query_start: Option<usize>,

    /// One past the last basic window of the query range
    #[arg(long)]
    pub query_end: Option<usize>,

    /// Stop ingesting at this timestamp
    #[arg(long)]
    pub before: Option<i64>,

    /// Ingest only the first N locations
    #[arg(long)]
    pub locations: Option<usize>,

    /// Emit the construction report as JSON
    #[arg(long)]
    pub json: bool,

    /// Write the report to a file instead of stdout
    #[arg(long)]
    pub output: Option<String>,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Input sample CSV; the last complete basic window is treated as the
    /// appended window
    #[arg(long)]
    pub file: String,

    /// Correlation threshold in [0, 1]
    #[arg(long, default_value_t = 0.7)]
    pub tau: f64,

    /// Basic window size in samples
    #[arg(long, default_value_t = 24)]
    pub granularity: usize,

    /// Use the DFT cross-term and its O(1) incremental update
    #[arg(long)]
    pub dft: bool,

    /// DFT truncation ratio in (0, 1]
    #[arg(long, default_value_t = 0.5)]
    pub ratio: f64,

    /// Stop ingesting at this timestamp
    #[arg(long)]
    pub before: Option<i64>,

    /// Ingest only the first N locations
    #[arg(long)]
    pub locations: Option<usize>,

    /// Emit the update report as JSON
    #[arg(long)]
    pub json: bool,

    /// Write the report to a file instead of stdout
    #[arg(long)]
    pub output: Option<String>,
}
