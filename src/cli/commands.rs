use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dg", about = concat!("daygrid v", env!("CARGO_PKG_VERSION"), " - one task grid per day"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory holding daygrid.toml and the database (default: current directory)
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default daygrid.toml and create the database
    Init(InitArgs),
    /// List days that have saved rows
    Days,
    /// Show a day's grid
    Show(DayArgs),
    /// Set one cell
    Set(SetArgs),
    /// Insert an empty row below ROW
    Insert(RowArgs),
    /// Delete a row (a day always keeps one row)
    Delete(RowArgs),
    /// Mark a row done
    Done(DoneArgs),
    /// Tag or untag a row as repeating
    Repeat(RepeatArgs),
    /// Remove every row of a day
    Clear(DayArgs),
    /// Carry unfinished rows into the next day, replacing its content
    Rollover(DayArgs),
    /// Show hour totals for a day
    Stats(DayArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing daygrid.toml
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct DayArgs {
    /// Day as YYYY-MM-DD, or today / yesterday / tomorrow
    pub day: String,
}

#[derive(Args)]
pub struct RowArgs {
    /// Day as YYYY-MM-DD, or today / yesterday / tomorrow
    pub day: String,
    /// Row index (0-based)
    pub row: usize,
}

#[derive(Args)]
pub struct SetArgs {
    /// Day as YYYY-MM-DD, or today / yesterday / tomorrow
    pub day: String,
    /// Row index (0-based)
    pub row: usize,
    /// Column name (sphere, name, product, planned, actual, done, creative,
    /// mental, physical, replenishment) or index 0-9
    pub column: String,
    /// New cell content (empty string clears the cell)
    pub content: String,
}

#[derive(Args)]
pub struct DoneArgs {
    /// Day as YYYY-MM-DD, or today / yesterday / tomorrow
    pub day: String,
    /// Row index (0-based)
    pub row: usize,
    /// Clear the done flag instead
    #[arg(long)]
    pub undo: bool,
}

#[derive(Args)]
pub struct RepeatArgs {
    /// Day as YYYY-MM-DD, or today / yesterday / tomorrow
    pub day: String,
    /// Row index (0-based)
    pub row: usize,
    /// Remove the repeat tag instead
    #[arg(long)]
    pub off: bool,
}
