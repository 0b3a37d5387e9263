//! `gradebook` - CLI for the gradebook library
//!
//! This binary runs one-shot record commands or, with no subcommand, the
//! interactive menu.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;

use gradebook::cli::{
    AddCommand, Cli, Command, ConfigCommand, DeleteCommand, SearchCommand, Shell, ShowCommand,
    SortCommand, UpdateCommand,
};
use gradebook::report;
use gradebook::{init_logging, Config, Gradebook, Result};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            if e.is_user_error() {
                ExitCode::from(1)
            } else {
                ExitCode::from(2)
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Command::Shell) {
        Command::Config(cmd) => handle_config(cli.config, cli.data_file, cmd),
        command => {
            let config = load_config(cli.config, cli.data_file)?;
            let mut book = Gradebook::from_config(&config);
            handle_command(&mut book, &config, command)
        }
    }
}

fn load_config(path: Option<PathBuf>, data_file: Option<PathBuf>) -> Result<Config> {
    let mut config = Config::load_from(path)?;
    if let Some(data_file) = data_file {
        config.storage.data_file = Some(data_file);
        config.validate()?;
    }
    Ok(config)
}

fn handle_command(book: &mut Gradebook, config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Add(cmd) => handle_add(book, &cmd),
        Command::List(cmd) => {
            if cmd.json {
                print_json(book.records())?;
            } else if book.store().is_empty() {
                println!("No records to display.");
            } else {
                print!("{}", report::render_table(book.records()));
            }
            Ok(())
        }
        Command::Show(cmd) => handle_show(book, &cmd),
        Command::Search(cmd) => handle_search(book, &cmd),
        Command::Update(cmd) => handle_update(book, &cmd),
        Command::Delete(cmd) => handle_delete(book, &cmd),
        Command::Sort(cmd) => handle_sort(book, &cmd),
        Command::Stats(cmd) => {
            let stats = book.statistics()?;
            if cmd.json {
                print_json(&stats)?;
            } else {
                print!("{}", report::render_statistics(&stats));
            }
            Ok(())
        }
        Command::Export(cmd) => {
            let path = cmd.output.unwrap_or_else(|| config.report_file());
            book.export_report(&path)?;
            println!("Report written to {}.", path.display());
            Ok(())
        }
        Command::Shell => {
            let stdin = io::stdin();
            let interactive = stdin.is_terminal();
            Shell::new(book, config.report_file(), stdin.lock(), io::stdout().lock())
                .interactive(interactive)
                .run()
        }
        // Handled before the data file is opened
        Command::Config(_) => Ok(()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_add(book: &mut Gradebook, cmd: &AddCommand) -> Result<()> {
    let record = book.add(&cmd.name, cmd.scores.clone())?;
    println!(
        "Added: ID {} | {} | Avg: {:.2} | Grade: {}",
        record.id(),
        record.name(),
        record.average(),
        record.grade()
    );
    Ok(())
}

fn handle_show(book: &Gradebook, cmd: &ShowCommand) -> Result<()> {
    let record = book.find_by_id(cmd.id)?;
    if cmd.json {
        print_json(record)
    } else {
        print!("{}", report::render_detail(record));
        Ok(())
    }
}

fn handle_search(book: &Gradebook, cmd: &SearchCommand) -> Result<()> {
    let hits = book.find_by_name(&cmd.query);
    if cmd.json {
        return print_json(&hits);
    }
    if hits.is_empty() {
        println!("No matches for \"{}\".", cmd.query);
    } else {
        print!("{}", report::render_table(hits));
    }
    Ok(())
}

fn handle_update(book: &mut Gradebook, cmd: &UpdateCommand) -> Result<()> {
    let record = book.update(cmd.id, cmd.name.as_deref(), cmd.scores.clone())?;
    println!(
        "Updated: ID {} | {} | Avg: {:.2} | Grade: {}",
        record.id(),
        record.name(),
        record.average(),
        record.grade()
    );
    Ok(())
}

fn handle_delete(book: &mut Gradebook, cmd: &DeleteCommand) -> Result<()> {
    let name = book.find_by_id(cmd.id)?.name().to_string();

    if !cmd.yes && !confirm(&format!("Delete ID {} ({name})? (y/n): ", cmd.id))? {
        println!("Delete cancelled.");
        return Ok(());
    }

    book.delete(cmd.id)?;
    println!("Deleted ID {}.", cmd.id);
    Ok(())
}

fn handle_sort(book: &mut Gradebook, cmd: &SortCommand) -> Result<()> {
    book.sort_by(cmd.key.into(), cmd.direction())?;
    print!("{}", report::render_table(book.records()));
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut answer = Vec::new();
    io::stdin().lock().read_until(b'\n', &mut answer)?;
    let answer = String::from_utf8_lossy(&answer);
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "Yes" | "YES"))
}

fn handle_config(
    config_path: Option<PathBuf>,
    data_file: Option<PathBuf>,
    cmd: ConfigCommand,
) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = load_config(config_path, data_file)?;
            if json {
                print_json(&config)?;
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Data file:          {}", config.data_file().display());
                println!("  Report file:        {}", config.report_file().display());
                println!();
                println!("[Limits]");
                println!("  Max records:        {}", config.limits.max_records);
                println!("  Max name length:    {}", config.limits.max_name_length);
                println!("  Max subjects:       {}", config.limits.max_subjects);
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path))?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}
