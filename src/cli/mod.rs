pub mod agencies;
pub mod concerts;
pub mod config;
pub mod expenses;
pub mod init;
pub mod report;
pub mod sync;

use clap::{Parser, Subcommand};

pub(crate) fn current_year() -> i32 {
    chrono::Datelike::year(&chrono::Local::now().date_naive())
}

#[derive(Parser)]
#[command(
    name = "palco",
    about = "Concert and fiscal bookkeeping CLI for a one-musician company."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up Palco: choose a data directory and create the stores.
    Init {
        /// Path for Palco data (default: ~/Documents/palco)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Fold an exported payload into the local stores.
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
    /// Browse and correct concerts.
    Concerts {
        #[command(subcommand)]
        command: ConcertsCommands,
    },
    /// Manage booking agencies and their artists.
    Agencies {
        #[command(subcommand)]
        command: AgenciesCommands,
    },
    /// Browse and recategorize expenses.
    Expenses {
        #[command(subcommand)]
        command: ExpensesCommands,
    },
    /// Generate reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Show or change fiscal parameters.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Merge a calendar export (JSON with an `events` array) into the
    /// synced-events store. User overrides are never touched.
    Calendar {
        /// Path to the exported JSON file
        file: String,
    },
    /// Replace the expense rows from a spreadsheet export (JSON with a
    /// `rows` array keyed by the sheet's headers).
    Expenses {
        /// Path to the exported JSON file
        file: String,
    },
    /// Load one-way distances (JSON object: location → km); stored as
    /// round trips.
    Distances {
        /// Path to the JSON file
        file: String,
    },
}

#[derive(Subcommand)]
pub enum ConcertsCommands {
    /// List concerts with overrides and distances applied.
    List {
        /// Restrict to a year (default: all)
        #[arg(long)]
        year: Option<i32>,
    },
    /// Override one field of a concert. An empty value clears the override.
    Set {
        /// Concert id (shown in `palco concerts list`)
        id: String,
        /// Field: artist, event, location, substitute or fee
        field: String,
        /// New value ('' to clear)
        value: String,
    },
    /// Add a concert that exists in no calendar.
    Add {
        /// Date: YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Start time: HH:MM (omit for an all-day event)
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        artist: String,
        #[arg(long, default_value = "")]
        event: String,
        #[arg(long, default_value = "")]
        location: String,
        /// Substitute musician, if the concert is passed on
        #[arg(long, default_value = "")]
        substitute: String,
        /// Fee in euro (falls back to the artist's agency base fee)
        #[arg(long)]
        fee: Option<String>,
    },
    /// Delete a concert. Synced concerts are tombstoned so they stay gone
    /// across re-syncs.
    Delete {
        /// Concert id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum AgenciesCommands {
    /// List agencies and their artists.
    List,
    /// Add a booking agency.
    Add {
        /// Agency name
        name: String,
        /// Tax number (NIF)
        #[arg(long = "tax-id", default_value = "")]
        tax_id: String,
    },
    /// Attach an artist to an agency.
    AddArtist {
        /// Agency name
        agency: String,
        /// Artist name, as it appears in calendar titles
        artist: String,
        /// Default fee per concert
        #[arg(long = "base-fee", default_value = "")]
        base_fee: String,
    },
    /// Change an artist's base fee.
    SetFee {
        /// Agency name
        agency: String,
        /// Artist name
        artist: String,
        /// New base fee
        fee: String,
        /// Also drop fee overrides on this artist's future concerts so the
        /// new base fee takes effect there.
        #[arg(long = "refresh-future")]
        refresh_future: bool,
    },
}

#[derive(Subcommand)]
pub enum ExpensesCommands {
    /// List expenses with categories and deductibility applied.
    List {
        /// Restrict to a year (default: all)
        #[arg(long)]
        year: Option<i32>,
    },
    /// Override the category of one expense.
    SetCategory {
        /// Composite key: date|supplier|invoice (shown in `palco expenses list`)
        key: String,
        /// Category label (see `palco expenses categories`)
        category: String,
    },
    /// Show the category table with SNC accounts and VAT deductibility.
    Categories,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Monthly ledger with the annual tax position.
    Ledger {
        /// Year (default: current)
        #[arg(long)]
        year: Option<i32>,
    },
    /// Double-booked days.
    Conflicts {
        /// Year (default: current)
        #[arg(long)]
        year: Option<i32>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the fiscal parameters in effect.
    Show,
    /// Set a fiscal parameter (rates in percent).
    Set {
        /// Key: vat_income_rate, irc_reduced_rate, irc_reduced_threshold,
        /// irc_normal_rate, surcharge_rate or mileage_rate
        key: String,
        /// New value
        value: f64,
    },
}
