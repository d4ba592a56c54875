mod init;
pub use init::cmd_init;

use std::path::{Path, PathBuf};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::store::CellStore;
use crate::model::cell::Column;
use crate::model::day::Day;
use crate::model::grid::InvariantViolation;
use crate::session::GridSession;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;
    let data_dir = resolve_data_dir(cli.data_dir.as_deref())?;

    match cli.command {
        Commands::Init(args) => cmd_init(&data_dir, args),
        Commands::Days => cmd_days(&data_dir, json),
        Commands::Show(args) => cmd_show(&data_dir, args, json),
        Commands::Stats(args) => cmd_stats(&data_dir, args, json),
        Commands::Set(args) => cmd_set(&data_dir, args),
        Commands::Insert(args) => cmd_insert(&data_dir, args),
        Commands::Delete(args) => cmd_delete(&data_dir, args),
        Commands::Done(args) => cmd_done(&data_dir, args),
        Commands::Repeat(args) => cmd_repeat(&data_dir, args),
        Commands::Clear(args) => cmd_clear(&data_dir, args),
        Commands::Rollover(args) => cmd_rollover(&data_dir, args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The -C directory, or the current directory
pub fn resolve_data_dir(dir: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match dir {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => Ok(std::env::current_dir()?),
    }
}

fn open_store(data_dir: &Path) -> Result<GridSession, Box<dyn std::error::Error>> {
    let config = config_io::read_config(data_dir)?;
    let store = CellStore::open(&config_io::db_path(data_dir, &config))?;
    Ok(GridSession::new(store, config))
}

/// Open a session with `day` loaded
fn open_day(data_dir: &Path, day: &str) -> Result<(GridSession, Day), Box<dyn std::error::Error>> {
    let day = Day::resolve(day)?;
    let mut session = open_store(data_dir)?;
    session.open(day.clone())?;
    Ok((session, day))
}

fn print_day(session: &GridSession) {
    let Some(day) = session.day() else {
        return;
    };
    println!("{}", format_day_header(day));
    let tokens = &session.config().rollover.done_tokens;
    for (i, row) in session.rows().iter().enumerate() {
        println!(
            "{}",
            format_row_line(i, row, row.is_done(tokens), session.is_repeating(i))
        );
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_days(data_dir: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_store(data_dir)?;
    let days = session.store().days()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&days)?);
    } else {
        for day in days {
            println!("{}", day);
        }
    }
    Ok(())
}

fn cmd_show(data_dir: &Path, args: DayArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (mut session, day) = open_day(data_dir, &args.day)?;
    if json {
        let tokens = &session.config().rollover.done_tokens;
        let rows = session
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| row_to_json(i, row, row.is_done(tokens), session.is_repeating(i)))
            .collect();
        let out = DayJson { day, rows };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_day(&session);
    }
    session.discard()?;
    Ok(())
}

fn cmd_stats(data_dir: &Path, args: DayArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (mut session, day) = open_day(data_dir, &args.day)?;
    let summary = session.summary();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats_to_json(&day, &summary))?
        );
    } else {
        for line in format_summary(&day, &summary) {
            println!("{}", line);
        }
    }
    session.discard()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_set(data_dir: &Path, args: SetArgs) -> Result<(), Box<dyn std::error::Error>> {
    let column = Column::parse_column(&args.column)
        .ok_or_else(|| InvariantViolation::UnknownColumn(args.column.clone()))?;
    let (mut session, _) = open_day(data_dir, &args.day)?;
    session.edit(args.row, column.index(), args.content)?;
    session.close()?;
    Ok(())
}

fn cmd_insert(data_dir: &Path, args: RowArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (mut session, _) = open_day(data_dir, &args.day)?;
    let new_row = session.insert_row(args.row)?;
    session.close()?;
    println!("{}", new_row);
    Ok(())
}

fn cmd_delete(data_dir: &Path, args: RowArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (mut session, _) = open_day(data_dir, &args.day)?;
    session.delete_row(args.row)?;
    session.close()?;
    Ok(())
}

fn cmd_done(data_dir: &Path, args: DoneArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (mut session, _) = open_day(data_dir, &args.day)?;
    let flag = if args.undo { "" } else { "1" };
    session.edit(args.row, Column::Done.index(), flag)?;
    session.close()?;
    Ok(())
}

fn cmd_repeat(data_dir: &Path, args: RepeatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (mut session, _) = open_day(data_dir, &args.day)?;
    session.set_repeating(args.row, !args.off)?;
    session.close()?;
    Ok(())
}

fn cmd_clear(data_dir: &Path, args: DayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (mut session, _) = open_day(data_dir, &args.day)?;
    session.clear()?;
    session.close()?;
    Ok(())
}

fn cmd_rollover(data_dir: &Path, args: DayArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (mut session, _) = open_day(data_dir, &args.day)?;
    let report = session.rollover()?;
    session.close()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", format_rollover(&report));
    }
    Ok(())
}
