use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::expenses::{enrich, CATEGORY_RULES};
use crate::fmt::money;
use crate::store::DataDir;

pub fn list(year: Option<i32>) -> Result<()> {
    let data = DataDir::open()?;
    let doc = data.expenses()?;
    let overrides = data.expense_overrides()?;

    let (rows, warnings) = enrich(&doc.rows, &overrides);
    for w in &warnings {
        eprintln!("{}", w.yellow());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Key", "Supplier", "Category", "SNC", "Base", "VAT ded.", "Cost",
    ]);
    let mut total_cost = 0.0;
    let mut shown = 0usize;
    for e in &rows {
        if let Some(y) = year {
            if !e.record.invoice_date.starts_with(&format!("{y}-")) {
                continue;
            }
        }
        let category = if overrides.contains_key(&e.key) {
            Cell::new(format!("{} *", e.category))
        } else {
            Cell::new(&e.category)
        };
        table.add_row(vec![
            Cell::new(&e.key),
            Cell::new(&e.record.supplier),
            category,
            Cell::new(format!("{} {}", e.snc_account, e.snc_label)),
            Cell::new(money(e.record.taxable_base)),
            Cell::new(money(e.vat_deductible)),
            Cell::new(money(e.irc_cost)),
        ]);
        total_cost += e.irc_cost;
        shown += 1;
    }
    println!("Expenses ({shown}, * = overridden)\n{table}");
    println!("Total cost: {}", money(total_cost).bold());
    if let Some(ts) = &doc.last_sync {
        println!("Last expense sync: {ts}");
    }
    Ok(())
}

pub fn set_category(key: &str, category: &str) -> Result<()> {
    let data = DataDir::open()?;
    data.set_expense_category(key, category)?;
    println!("Set category {category} on {key}");
    Ok(())
}

pub fn categories() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Category", "SNC", "VAT deductible", "Representation"]);
    for rule in CATEGORY_RULES {
        table.add_row(vec![
            Cell::new(rule.name),
            Cell::new(format!("{} {}", rule.snc_account, rule.snc_label)),
            Cell::new(format!("{:.0}%", rule.vat_factor * 100.0)),
            Cell::new(if rule.is_representation { "yes" } else { "" }),
        ]);
    }
    println!("Categories\n{table}");
    Ok(())
}
