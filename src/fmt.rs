/// Format an amount with thousands separators and two decimals: 1,234.50
pub fn amount(val: f64) -> String {
    let negative = val < 0.0;
    let fixed = format!("{:.2}", val.abs());
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if negative && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{dec_part}")
}

/// Same as [`amount`] with a dollar sign: $1,234.50, -$12.00
pub fn money(val: f64) -> String {
    let formatted = amount(val);
    match formatted.strip_prefix('-') {
        Some(rest) => format!("-${rest}"),
        None => format!("${formatted}"),
    }
}
