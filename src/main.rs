mod cli;
mod conflicts;
mod distance;
mod error;
mod expenses;
mod fmt;
mod ledger;
mod merge;
mod models;
mod settings;
mod store;
mod title;

use clap::Parser;

use cli::{
    AgenciesCommands, Cli, Commands, ConcertsCommands, ConfigCommands, ExpensesCommands,
    ReportCommands, SyncCommands,
};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Sync { command } => match command {
            SyncCommands::Calendar { file } => cli::sync::calendar(&file),
            SyncCommands::Expenses { file } => cli::sync::expenses(&file),
            SyncCommands::Distances { file } => cli::sync::distances(&file),
        },
        Commands::Concerts { command } => match command {
            ConcertsCommands::List { year } => cli::concerts::list(year),
            ConcertsCommands::Set { id, field, value } => cli::concerts::set(&id, &field, &value),
            ConcertsCommands::Add {
                date,
                time,
                artist,
                event,
                location,
                substitute,
                fee,
            } => cli::concerts::add(
                &date,
                time.as_deref(),
                &artist,
                &event,
                &location,
                &substitute,
                fee.as_deref(),
            ),
            ConcertsCommands::Delete { id } => cli::concerts::delete(&id),
        },
        Commands::Agencies { command } => match command {
            AgenciesCommands::List => cli::agencies::list(),
            AgenciesCommands::Add { name, tax_id } => cli::agencies::add(&name, &tax_id),
            AgenciesCommands::AddArtist {
                agency,
                artist,
                base_fee,
            } => cli::agencies::add_artist(&agency, &artist, &base_fee),
            AgenciesCommands::SetFee {
                agency,
                artist,
                fee,
                refresh_future,
            } => cli::agencies::set_fee(&agency, &artist, &fee, refresh_future),
        },
        Commands::Expenses { command } => match command {
            ExpensesCommands::List { year } => cli::expenses::list(year),
            ExpensesCommands::SetCategory { key, category } => {
                cli::expenses::set_category(&key, &category)
            }
            ExpensesCommands::Categories => cli::expenses::categories(),
        },
        Commands::Report { command } => match command {
            ReportCommands::Ledger { year } => cli::report::ledger(year),
            ReportCommands::Conflicts { year } => cli::report::conflicts(year),
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => cli::config::show(),
            ConfigCommands::Set { key, value } => cli::config::set(&key, value),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
