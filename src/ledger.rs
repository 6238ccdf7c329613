use std::collections::BTreeMap;

use crate::expenses::parse_amount;
use crate::fmt::round2;
use crate::models::{CanonicalConcert, EnrichedExpense, FiscalConfig};

/// Autonomous taxation on mileage compensation (art. 88.º n.º 9 CIRC).
pub const AUTONOMOUS_RATE_MILEAGE: f64 = 0.05;

/// Prior-year assessed IRC above which provisional payments are due
/// (art. 104.º n.º 2 CIRC).
pub const PROVISIONAL_THRESHOLD: f64 = 1000.0;

/// One ledger line per (year, month) with activity. Monetary fields are
/// rounded to cents here, at the point they are stored; intermediate sums
/// keep full precision.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub year: i32,
    pub month: u32,
    /// Gross concert income (own concerts only, substitute-free, fee > 0).
    pub income: f64,
    pub concert_count: usize,
    /// VAT charged on income at the configured rate.
    pub vat_liquidated: f64,
    /// Corporate-tax-relevant expense cost (taxable base + non-deductible VAT).
    pub expense_cost: f64,
    /// Deductible VAT per bracket and in total.
    pub vat_ded_6: f64,
    pub vat_ded_13: f64,
    pub vat_ded_23: f64,
    pub vat_deductible: f64,
    /// Liquidated minus deductible; positive means VAT owed to the state.
    pub vat_balance: f64,
    pub km: f64,
    pub mileage_cost: f64,
    /// income − expense_cost − mileage_cost.
    pub result: f64,
    pub representation_cost: f64,
    pub ta_representation: f64,
    pub ta_mileage: f64,
    pub autonomous_tax: f64,
    /// Taxable base spent per category label.
    pub category_totals: BTreeMap<String, f64>,
    // Annual figures, identical on every entry of the same year.
    pub result_year: f64,
    pub irc_year: f64,
    pub surcharge_year: f64,
    pub ta_year: f64,
    pub tax_due_year: f64,
    /// Three equal provisional installments, empty when none are due.
    pub provisional_installments: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
struct MonthAccumulator {
    income: f64,
    concert_count: usize,
    expense_cost: f64,
    vat_ded_6: f64,
    vat_ded_13: f64,
    vat_ded_23: f64,
    vat_deductible: f64,
    km: f64,
    representation_cost: f64,
    ta_representation: f64,
    category_totals: BTreeMap<String, f64>,
}

fn expense_month(date: &str) -> Option<(i32, u32)> {
    let d = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some((chrono::Datelike::year(&d), chrono::Datelike::month(&d)))
}

/// Round-trip km per (year, month), own concerts only. A concert played by
/// a substitute incurs no travel of ours.
pub fn mileage_from_concerts(concerts: &[CanonicalConcert]) -> BTreeMap<(i32, u32), f64> {
    let mut by_month = BTreeMap::new();
    for c in concerts {
        if c.day.is_none() || !c.substitute.is_empty() {
            continue;
        }
        if let Some(km) = c.km {
            *by_month.entry((c.year, c.month)).or_insert(0.0) += km;
        }
    }
    by_month
}

/// Two-bracket IRC over a positive annual result: the reduced rate up to
/// the threshold, the normal rate on the excess. Zero on a loss.
fn bracket_irc(result_year: f64, cfg: &FiscalConfig) -> f64 {
    if result_year <= 0.0 {
        return 0.0;
    }
    let reduced_base = result_year.min(cfg.irc_reduced_threshold);
    let excess = (result_year - cfg.irc_reduced_threshold).max(0.0);
    reduced_base * cfg.irc_reduced_rate / 100.0 + excess * cfg.irc_normal_rate / 100.0
}

/// Aggregate concerts, enriched expenses and mileage into ledger entries,
/// one per (year, month) with activity, ordered chronologically.
///
/// IRC, the municipal surcharge and the provisional-payment check are
/// annual: computed over the year's total result and repeated on each of
/// the year's entries. Provisional payments look at the PRIOR year — they
/// are due when its bracket IRC alone exceeds the threshold, and each of
/// the three installments is 80% of (IRC + surcharge) split in three.
pub fn aggregate(
    concerts: &[CanonicalConcert],
    expenses: &[EnrichedExpense],
    mileage_by_month: &BTreeMap<(i32, u32), f64>,
    cfg: &FiscalConfig,
) -> (Vec<LedgerEntry>, Vec<String>) {
    let mut warnings = Vec::new();
    let mut months: BTreeMap<(i32, u32), MonthAccumulator> = BTreeMap::new();

    for c in concerts {
        if c.day.is_none() {
            // Already warned about at merge time; not attributable to a month.
            continue;
        }
        if !c.substitute.is_empty() {
            continue;
        }
        let fee = parse_amount(&c.fee);
        if fee <= 0.0 {
            continue;
        }
        let acc = months.entry((c.year, c.month)).or_default();
        acc.income += fee;
        acc.concert_count += 1;
    }

    for e in expenses {
        let Some((year, month)) = expense_month(&e.record.invoice_date) else {
            warnings.push(format!(
                "expense {}: unparsable invoice date '{}', excluded from the ledger",
                e.key, e.record.invoice_date
            ));
            continue;
        };
        let acc = months.entry((year, month)).or_default();
        acc.expense_cost += e.irc_cost;
        acc.vat_ded_6 += e.record.vat_6 * e.vat_factor;
        acc.vat_ded_13 += e.record.vat_13 * e.vat_factor;
        acc.vat_ded_23 += e.record.vat_23 * e.vat_factor;
        acc.vat_deductible += e.vat_deductible;
        acc.ta_representation += e.autonomous_tax;
        if e.is_representation {
            acc.representation_cost += e.irc_cost;
        }
        // Per-category breakdown tracks the spend itself (taxable base);
        // non-deductible VAT only enters the overall cost figure.
        *acc.category_totals.entry(e.category.clone()).or_insert(0.0) += e.record.taxable_base;
    }

    for (&(year, month), &km) in mileage_by_month {
        months.entry((year, month)).or_default().km += km;
    }

    // First pass: monthly figures plus per-year running totals.
    let mut entries = Vec::with_capacity(months.len());
    let mut year_result: BTreeMap<i32, f64> = BTreeMap::new();
    let mut year_ta: BTreeMap<i32, f64> = BTreeMap::new();

    for ((year, month), acc) in months {
        let vat_liquidated = acc.income * cfg.vat_income_rate / 100.0;
        let mileage_cost = acc.km * cfg.mileage_rate;
        let result = acc.income - acc.expense_cost - mileage_cost;
        let ta_mileage = mileage_cost * AUTONOMOUS_RATE_MILEAGE;
        let autonomous_tax = acc.ta_representation + ta_mileage;

        *year_result.entry(year).or_insert(0.0) += result;
        *year_ta.entry(year).or_insert(0.0) += autonomous_tax;

        entries.push(LedgerEntry {
            year,
            month,
            income: round2(acc.income),
            concert_count: acc.concert_count,
            vat_liquidated: round2(vat_liquidated),
            expense_cost: round2(acc.expense_cost),
            vat_ded_6: round2(acc.vat_ded_6),
            vat_ded_13: round2(acc.vat_ded_13),
            vat_ded_23: round2(acc.vat_ded_23),
            vat_deductible: round2(acc.vat_deductible),
            vat_balance: round2(vat_liquidated - acc.vat_deductible),
            km: acc.km,
            mileage_cost: round2(mileage_cost),
            result: round2(result),
            representation_cost: round2(acc.representation_cost),
            ta_representation: round2(acc.ta_representation),
            ta_mileage: round2(ta_mileage),
            autonomous_tax: round2(autonomous_tax),
            category_totals: acc
                .category_totals
                .into_iter()
                .map(|(k, v)| (k, round2(v)))
                .collect(),
            result_year: 0.0,
            irc_year: 0.0,
            surcharge_year: 0.0,
            ta_year: 0.0,
            tax_due_year: 0.0,
            provisional_installments: Vec::new(),
        });
    }

    // Second pass: annual rollups onto every entry of the year.
    for entry in &mut entries {
        let result_year = year_result.get(&entry.year).copied().unwrap_or(0.0);
        let ta_year = year_ta.get(&entry.year).copied().unwrap_or(0.0);
        let irc_year = bracket_irc(result_year, cfg);
        let surcharge_year = if result_year > 0.0 {
            result_year * cfg.surcharge_rate / 100.0
        } else {
            0.0
        };

        entry.result_year = round2(result_year);
        entry.irc_year = round2(irc_year);
        entry.surcharge_year = round2(surcharge_year);
        entry.ta_year = round2(ta_year);
        entry.tax_due_year = round2(irc_year + surcharge_year + ta_year);

        let prior_result = year_result.get(&(entry.year - 1)).copied().unwrap_or(0.0);
        let prior_irc = bracket_irc(prior_result, cfg);
        if prior_irc > PROVISIONAL_THRESHOLD {
            let prior_surcharge = prior_result * cfg.surcharge_rate / 100.0;
            let installment = round2(0.8 * (prior_irc + prior_surcharge) / 3.0);
            entry.provisional_installments = vec![installment; 3];
        }
    }

    (entries, warnings)
}
