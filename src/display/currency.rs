/// Non-finite figures are shown as zero; the engine itself never clamps.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Formats a rupee amount the way `en-IN` currency formatting does with no
/// fraction digits: `1300000.0` becomes `₹13,00,000`.
pub fn format_inr(value: f64) -> String {
    let rounded = finite_or_zero(value).round();
    let digits = format!("{:.0}", rounded.abs());
    let grouped = group_indian(&digits);
    if rounded < 0.0 {
        format!("-₹{grouped}")
    } else {
        format!("₹{grouped}")
    }
}

// Last three digits, then pairs: 12,34,56,789.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::with_capacity(head.len() / 2 + 1);
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}
