use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::fmt::round2;
use crate::models::{EnrichedExpense, ExpenseOverridesDoc, ExpenseRecord};

/// Autonomous taxation on representation expenses (art. 88.º n.º 7 CIRC).
pub const AUTONOMOUS_RATE_REPRESENTATION: f64 = 0.10;

// ---------------------------------------------------------------------------
// Category rule table
// ---------------------------------------------------------------------------

/// Tax metadata for an expense category: SNC account (DL 158/2009), the
/// VAT-deductible fraction (art. 21.º CIVA) and whether the category counts
/// as a representation expense subject to autonomous taxation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryRule {
    pub name: &'static str,
    pub snc_account: &'static str,
    pub snc_label: &'static str,
    pub vat_factor: f64,
    pub is_representation: bool,
}

const DEFAULT_CATEGORY: &str = "Outros";

pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule { name: "Telecomunicações", snc_account: "6228", snc_label: "Comunicação", vat_factor: 1.0, is_representation: false },
    CategoryRule { name: "Electricidade e Energia", snc_account: "6221", snc_label: "Energia e fluídos", vat_factor: 1.0, is_representation: false },
    CategoryRule { name: "Água e Saneamento", snc_account: "6221", snc_label: "Energia e fluídos", vat_factor: 1.0, is_representation: false },
    CategoryRule { name: "Combustíveis e Lubrificantes", snc_account: "6226", snc_label: "Combustíveis", vat_factor: 0.5, is_representation: false },
    CategoryRule { name: "Material de Escritório", snc_account: "6224", snc_label: "Material de escritório", vat_factor: 1.0, is_representation: false },
    CategoryRule { name: "Alimentação e Bebidas", snc_account: "6227", snc_label: "Deslocações, estadas e transportes", vat_factor: 0.0, is_representation: true },
    CategoryRule { name: "Alojamento e Hotelaria", snc_account: "6227", snc_label: "Deslocações, estadas e transportes", vat_factor: 0.0, is_representation: true },
    CategoryRule { name: "Transportes e Deslocações", snc_account: "6227", snc_label: "Deslocações, estadas e transportes", vat_factor: 1.0, is_representation: false },
    CategoryRule { name: "Software e Tecnologia", snc_account: "628", snc_label: "Outros FSE", vat_factor: 1.0, is_representation: false },
    CategoryRule { name: "Publicidade e Marketing", snc_account: "625", snc_label: "Publicidade e propaganda", vat_factor: 1.0, is_representation: false },
    CategoryRule { name: "Seguros", snc_account: "6229", snc_label: "Seguros", vat_factor: 1.0, is_representation: false },
    CategoryRule { name: "Contabilidade e Consultoria", snc_account: "6233", snc_label: "Honorários", vat_factor: 1.0, is_representation: false },
    CategoryRule { name: "Serviços Jurídicos", snc_account: "6232", snc_label: "Contencioso e notariado", vat_factor: 1.0, is_representation: false },
    CategoryRule { name: "Saúde e Bem-estar", snc_account: "628", snc_label: "Outros FSE", vat_factor: 1.0, is_representation: false },
    CategoryRule { name: "Formação e Educação", snc_account: "628", snc_label: "Outros FSE", vat_factor: 1.0, is_representation: false },
    CategoryRule { name: "Manutenção e Reparação", snc_account: "624", snc_label: "Conservação e reparação", vat_factor: 1.0, is_representation: false },
    CategoryRule { name: "Rendas e Alugueres", snc_account: "6299", snc_label: "Rendas e alugueres", vat_factor: 1.0, is_representation: false },
    CategoryRule { name: "Outros", snc_account: "628", snc_label: "Outros FSE", vat_factor: 1.0, is_representation: false },
];

pub fn rule_for(category: &str) -> &'static CategoryRule {
    CATEGORY_RULES
        .iter()
        .find(|r| r.name == category)
        .unwrap_or_else(|| {
            CATEGORY_RULES
                .iter()
                .find(|r| r.name == DEFAULT_CATEGORY)
                .expect("default category present in rule table")
        })
}

pub fn is_known_category(category: &str) -> bool {
    CATEGORY_RULES.iter().any(|r| r.name == category)
}

// ---------------------------------------------------------------------------
// Composite key
// ---------------------------------------------------------------------------

/// Natural identity of an expense row. Two rows sharing (invoice date,
/// supplier, invoice number) are the same logical expense — a category
/// override applies to both. Known limitation, not a bug.
pub fn composite_key(record: &ExpenseRecord) -> String {
    format!(
        "{}|{}|{}",
        record.invoice_date, record.supplier, record.invoice_number
    )
}

// ---------------------------------------------------------------------------
// Raw sheet row normalization
// ---------------------------------------------------------------------------

/// A spreadsheet row as delivered by the sync collaborator, keyed by the
/// sheet's header names. Cells arrive as raw (unformatted) values, which
/// in JSON may still be either numbers or strings.
#[derive(Debug, Default, Deserialize)]
pub struct RawExpenseRow {
    #[serde(rename = "Data Fatura", default)]
    pub invoice_date: Value,
    #[serde(rename = "Fornecedor", default)]
    pub supplier: Value,
    #[serde(rename = "NIF", default)]
    pub tax_id: Value,
    #[serde(rename = "Numero Fatura", default)]
    pub invoice_number: Value,
    #[serde(rename = "Descricao", default)]
    pub description: Value,
    #[serde(rename = "Tipo Despesa", default)]
    pub category: Value,
    #[serde(rename = "Base Tributavel", default)]
    pub taxable_base: Value,
    #[serde(rename = "Base 6%", default)]
    pub base_6: Value,
    #[serde(rename = "IVA 6%", default)]
    pub vat_6: Value,
    #[serde(rename = "Base 13%", default)]
    pub base_13: Value,
    #[serde(rename = "IVA 13%", default)]
    pub vat_13: Value,
    #[serde(rename = "Base 23%", default)]
    pub base_23: Value,
    #[serde(rename = "IVA 23%", default)]
    pub vat_23: Value,
    #[serde(rename = "IVA", default)]
    pub vat_total: Value,
    #[serde(rename = "Total", default)]
    pub total: Value,
    #[serde(rename = "Moeda", default)]
    pub currency: Value,
}

/// Parse a monetary string; accepts a comma decimal separator. Only
/// finite values are amounts ("NaN"/"inf" parse as floats but not money).
pub fn parse_amount(raw: &str) -> f64 {
    let s = raw.trim().replace(',', ".");
    s.parse().ok().filter(|v: &f64| v.is_finite()).unwrap_or(0.0)
}

pub fn amount_from(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_amount(s),
        _ => 0.0,
    }
}

fn string_from(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        },
        _ => String::new(),
    }
}

/// Sheets epoch: days since 1899-12-30. Integer day arithmetic only;
/// floating serial-date conversions drift by a day around DST boundaries.
/// A day count outside the representable range (someone pasted an epoch
/// timestamp into the date column) yields an empty date, not a crash.
pub fn serial_to_date(days: i64) -> String {
    let base = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    chrono::Duration::try_days(days)
        .and_then(|d| base.checked_add_signed(d))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Normalize a date cell to YYYY-MM-DD. Accepts a numeric serial day
/// count, DD/MM/YYYY, or an already-normalized YYYY-MM-DD string.
pub fn normalize_date(value: &Value) -> String {
    if let Value::Number(n) = value {
        if let Some(days) = n.as_f64() {
            if days > 0.0 {
                return serial_to_date(days as i64);
            }
        }
        return String::new();
    }
    let s = string_from(value);
    if s.is_empty() {
        return s;
    }
    if s.contains('/') {
        if let Ok(d) = NaiveDate::parse_from_str(&s, "%d/%m/%Y") {
            return d.format("%Y-%m-%d").to_string();
        }
    }
    s
}

pub fn normalize_row(raw: &RawExpenseRow) -> ExpenseRecord {
    let currency = string_from(&raw.currency);
    ExpenseRecord {
        invoice_date: normalize_date(&raw.invoice_date),
        supplier: string_from(&raw.supplier),
        tax_id: string_from(&raw.tax_id),
        invoice_number: string_from(&raw.invoice_number),
        description: string_from(&raw.description),
        category: string_from(&raw.category),
        taxable_base: amount_from(&raw.taxable_base),
        base_6: amount_from(&raw.base_6),
        vat_6: amount_from(&raw.vat_6),
        base_13: amount_from(&raw.base_13),
        vat_13: amount_from(&raw.vat_13),
        base_23: amount_from(&raw.base_23),
        vat_23: amount_from(&raw.vat_23),
        vat_total: amount_from(&raw.vat_total),
        total: amount_from(&raw.total),
        currency: if currency.is_empty() {
            "EUR".to_string()
        } else {
            currency
        },
    }
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

/// Resolve each row's category (override > synced > "Outros") and attach
/// tax metadata. Best-effort: odd rows produce warnings, never errors.
/// Deductible VAT is rounded per row, at the point the figure is stored.
pub fn enrich(
    rows: &[ExpenseRecord],
    overrides: &ExpenseOverridesDoc,
) -> (Vec<EnrichedExpense>, Vec<String>) {
    let mut result = Vec::with_capacity(rows.len());
    let mut warnings = Vec::new();

    for row in rows {
        let key = composite_key(row);
        let category = overrides
            .get(&key)
            .cloned()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| {
                if row.category.is_empty() {
                    DEFAULT_CATEGORY.to_string()
                } else {
                    row.category.clone()
                }
            });
        if !is_known_category(&category) {
            warnings.push(format!(
                "expense {key}: unknown category '{category}', treated as {DEFAULT_CATEGORY}"
            ));
        }
        let rule = rule_for(&category);

        let vat_deductible = round2(row.vat_total * rule.vat_factor);
        let vat_nondeductible = round2(row.vat_total - vat_deductible);
        let irc_cost = round2(row.taxable_base + vat_nondeductible);
        let autonomous_tax = if rule.is_representation {
            round2(row.taxable_base * AUTONOMOUS_RATE_REPRESENTATION)
        } else {
            0.0
        };

        result.push(EnrichedExpense {
            key,
            record: row.clone(),
            category,
            snc_account: rule.snc_account,
            snc_label: rule.snc_label,
            vat_factor: rule.vat_factor,
            vat_deductible,
            vat_nondeductible,
            irc_cost,
            is_representation: rule.is_representation,
            autonomous_tax,
        });
    }

    (result, warnings)
}
