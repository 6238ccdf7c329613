use std::collections::BTreeMap;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::current_year;
use crate::conflicts::{count_overlaps, overlap_days};
use crate::error::Result;
use crate::fmt::money;
use crate::ledger::{aggregate, mileage_from_concerts, LedgerEntry};
use crate::models::{CanonicalConcert, EnrichedExpense};
use crate::store::DataDir;

struct LoadedYear {
    concerts: Vec<CanonicalConcert>,
    entries: Vec<LedgerEntry>,
}

fn load(data: &DataDir) -> Result<(Vec<CanonicalConcert>, Vec<EnrichedExpense>, Vec<String>)> {
    let events = data.events()?;
    let overrides = data.concert_overrides()?;
    let agencies = data.agencies()?;
    let distances = crate::distance::load_migrated(data)?;
    let (concerts, mut warnings) =
        crate::merge::merged_concerts(&events, &overrides, &agencies, &distances);

    let expenses_doc = data.expenses()?;
    let expense_overrides = data.expense_overrides()?;
    let (expenses, expense_warnings) =
        crate::expenses::enrich(&expenses_doc.rows, &expense_overrides);
    warnings.extend(expense_warnings);

    Ok((concerts, expenses, warnings))
}

fn load_year(data: &DataDir, year: i32) -> Result<LoadedYear> {
    let (concerts, expenses, warnings) = load(data)?;
    let cfg = data.fiscal_config()?;
    let mileage = mileage_from_concerts(&concerts);
    let (entries, ledger_warnings) = aggregate(&concerts, &expenses, &mileage, &cfg);
    for w in warnings.iter().chain(&ledger_warnings) {
        eprintln!("{}", w.yellow());
    }
    Ok(LoadedYear {
        concerts,
        entries: entries.into_iter().filter(|e| e.year == year).collect(),
    })
}

pub fn ledger(year: Option<i32>) -> Result<()> {
    let year = year.unwrap_or_else(current_year);
    let data = DataDir::open()?;
    let loaded = load_year(&data, year)?;
    let entries = &loaded.entries;

    if entries.is_empty() {
        println!("No activity in {year}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Month", "Income", "VAT liq.", "Expenses", "VAT ded.", "VAT bal.", "Km", "Mileage",
        "Result", "Aut. tax",
    ]);
    for e in entries {
        table.add_row(vec![
            Cell::new(format!("{year}-{:02}", e.month)),
            Cell::new(money(e.income)),
            Cell::new(money(e.vat_liquidated)),
            Cell::new(money(e.expense_cost)),
            Cell::new(money(e.vat_deductible)),
            Cell::new(money(e.vat_balance)),
            Cell::new(format!("{:.1}", e.km)),
            Cell::new(money(e.mileage_cost)),
            Cell::new(money(e.result)),
            Cell::new(money(e.autonomous_tax)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(money(entries.iter().map(|e| e.income).sum())),
        Cell::new(money(entries.iter().map(|e| e.vat_liquidated).sum())),
        Cell::new(money(entries.iter().map(|e| e.expense_cost).sum())),
        Cell::new(money(entries.iter().map(|e| e.vat_deductible).sum())),
        Cell::new(money(entries.iter().map(|e| e.vat_balance).sum())),
        Cell::new(format!("{:.1}", entries.iter().map(|e| e.km).sum::<f64>())),
        Cell::new(money(entries.iter().map(|e| e.mileage_cost).sum())),
        Cell::new(money(entries.iter().map(|e| e.result).sum())),
        Cell::new(money(entries.iter().map(|e| e.autonomous_tax).sum())),
    ]);
    println!("Ledger {year}\n{table}");

    // Category breakdown over the year.
    let mut categories: BTreeMap<&str, f64> = BTreeMap::new();
    for e in entries {
        for (cat, total) in &e.category_totals {
            *categories.entry(cat).or_insert(0.0) += total;
        }
    }
    if !categories.is_empty() {
        let mut ctable = Table::new();
        ctable.set_header(vec!["Category", "Cost"]);
        for (cat, total) in &categories {
            ctable.add_row(vec![Cell::new(*cat), Cell::new(money(*total))]);
        }
        println!("\nExpenses by Category\n{ctable}");
    }

    // Annual figures are identical on every entry of the year.
    let annual = &entries[0];
    let mut atable = Table::new();
    atable.set_header(vec!["Annual", "Amount"]);
    atable.add_row(vec![Cell::new("Result"), Cell::new(money(annual.result_year))]);
    atable.add_row(vec![Cell::new("IRC"), Cell::new(money(annual.irc_year))]);
    atable.add_row(vec![
        Cell::new("Municipal surcharge"),
        Cell::new(money(annual.surcharge_year)),
    ]);
    atable.add_row(vec![
        Cell::new("Autonomous taxation"),
        Cell::new(money(annual.ta_year)),
    ]);
    atable.add_row(vec![
        Cell::new("Tax due".bold()),
        Cell::new(money(annual.tax_due_year)),
    ]);
    println!("\nTax Position {year}\n{atable}");

    if annual.provisional_installments.is_empty() {
        println!("No provisional payments due in {year}.");
    } else {
        let each = annual.provisional_installments[0];
        println!(
            "{} 3 × {} (July, September, December)",
            "Provisional payments:".bold(),
            money(each)
        );
    }

    let overlaps = count_overlaps(&loaded.concerts, year);
    if overlaps > 0 {
        eprintln!(
            "{}",
            format!("{overlaps} conflicting concert(s) in {year} — see `palco report conflicts`")
                .red()
        );
    }
    Ok(())
}

pub fn conflicts(year: Option<i32>) -> Result<()> {
    let year = year.unwrap_or_else(current_year);
    let data = DataDir::open()?;
    let (concerts, _, warnings) = load(&data)?;
    for w in &warnings {
        eprintln!("{}", w.yellow());
    }

    let days = overlap_days(&concerts, year);
    if days.is_empty() {
        println!("No double-booked days in {year}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Date", "Time", "Artist", "Event", "Location"]);
    for (day, group) in &days {
        for c in group {
            table.add_row(vec![
                Cell::new(day.format("%d/%m/%Y").to_string()),
                Cell::new(&c.time),
                Cell::new(&c.artist),
                Cell::new(&c.event),
                Cell::new(&c.location),
            ]);
        }
    }
    let total: usize = days.values().map(Vec::len).sum();
    println!(
        "{}\n{table}",
        format!("Conflicts {year}: {total} concert(s) on {} day(s)", days.len())
            .red()
            .bold()
    );
    Ok(())
}
