use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::store::DataDir;

pub fn show() -> Result<()> {
    let data = DataDir::open()?;
    let cfg = data.fiscal_config()?;

    let mut table = Table::new();
    table.set_header(vec!["Key", "Value"]);
    table.add_row(vec![
        Cell::new("vat_income_rate"),
        Cell::new(format!("{} %", cfg.vat_income_rate)),
    ]);
    table.add_row(vec![
        Cell::new("irc_reduced_rate"),
        Cell::new(format!("{} %", cfg.irc_reduced_rate)),
    ]);
    table.add_row(vec![
        Cell::new("irc_reduced_threshold"),
        Cell::new(format!("{:.2} €", cfg.irc_reduced_threshold)),
    ]);
    table.add_row(vec![
        Cell::new("irc_normal_rate"),
        Cell::new(format!("{} %", cfg.irc_normal_rate)),
    ]);
    table.add_row(vec![
        Cell::new("surcharge_rate"),
        Cell::new(format!("{} %", cfg.surcharge_rate)),
    ]);
    table.add_row(vec![
        Cell::new("mileage_rate"),
        Cell::new(format!("{:.2} €/km", cfg.mileage_rate)),
    ]);
    println!("Fiscal Parameters\n{table}");
    Ok(())
}

pub fn set(key: &str, value: f64) -> Result<()> {
    let data = DataDir::open()?;
    data.update_fiscal_config(key, value)?;
    println!("Set {key} = {value}");
    Ok(())
}
