/// Round to 2 decimal places. Applied at the point of storage/output only,
/// so rounding error never compounds across aggregation steps.
pub fn round2(val: f64) -> f64 {
    (val * 100.0).round() / 100.0
}

/// Round to 1 decimal place (distance cache values).
pub fn round1(val: f64) -> f64 {
    (val * 10.0).round() / 10.0
}

/// Format a float as a euro amount with thousands separators: €1,234.56
/// Non-finite values render as zero; amounts are validated upstream.
pub fn money(val: f64) -> String {
    if !val.is_finite() {
        return "€0.00".to_string();
    }
    let negative = val < 0.0;
    let abs = val.abs();
    let cents = format!("{:.2}", abs);
    let parts: Vec<&str> = cents.split('.').collect();
    let int_part = parts[0];
    let dec_part = parts[1];

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-€{with_commas}.{dec_part}")
    } else {
        format!("€{with_commas}.{dec_part}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56), "€1,234.56");
        assert_eq!(money(-500.00), "-€500.00");
        assert_eq!(money(0.0), "€0.00");
        assert_eq!(money(1000000.99), "€1,000,000.99");
        assert_eq!(money(42.10), "€42.10");
    }

    #[test]
    fn test_money_non_finite_is_zero() {
        assert_eq!(money(f64::NAN), "€0.00");
        assert_eq!(money(f64::INFINITY), "€0.00");
        assert_eq!(money(f64::NEG_INFINITY), "€0.00");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(13.855000000000001), 13.86);
        assert_eq!(round2(13.854), 13.85);
        assert_eq!(round2(100.0), 100.0);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(118.19999999), 118.2);
        assert_eq!(round1(59.14), 59.1);
    }
}
