use colored::Colorize;

use crate::error::Result;
use crate::models::FiscalConfig;
use crate::settings::{save_settings, Settings};
use crate::store::DataDir;

pub fn run(data_dir: Option<String>) -> Result<()> {
    let settings = match data_dir {
        Some(dir) => Settings { data_dir: dir },
        None => Settings::default(),
    };
    save_settings(&settings)?;

    let data = DataDir::new(&settings.data_dir)?;
    // Materialize the fiscal defaults so `config show` has a file to edit.
    if !data.path(crate::store::FISCAL_FILE).exists() {
        data.save_fiscal_config(&FiscalConfig::default())?;
    }

    println!("{} {}", "Data directory:".bold(), settings.data_dir);
    println!("Palco is ready. Start with `palco sync calendar <file>`.");
    Ok(())
}
