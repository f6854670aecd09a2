//! Text rendering of estimates for the terminal

use crate::types::{PriceEstimate, PropertyInput};
use std::fmt::Write;

/// Format a price as rupiah with thousands separators, e.g. `Rp 1,234,567.89`
pub fn format_rupiah(price: f64) -> String {
    if !price.is_finite() {
        return format!("Rp {}", price);
    }

    let fixed = format!("{:.2}", price.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if price < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("Rp {}{}.{}", sign, grouped, frac_part)
}

/// Two-column table echoing the submitted attributes
pub fn input_table(input: &PropertyInput) -> String {
    let rows = [
        ("Bedrooms", input.bedrooms.to_string()),
        ("Bathrooms", input.bathrooms.to_string()),
        ("Land size (m²)", format!("{:.1}", input.land_size_m2)),
        ("Building size (m²)", format!("{:.1}", input.building_size_m2)),
        ("Floors", input.floors.to_string()),
        ("City", input.city.to_string()),
        ("Furnishing", input.furnishing.to_string()),
    ];

    let width = rows.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for (key, value) in rows {
        let pad = width - key.chars().count();
        let _ = writeln!(out, "  {}{}  {}", key, " ".repeat(pad), value);
    }
    out
}

/// Full report for one estimate
pub fn render_estimate(estimate: &PriceEstimate) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Property");
    out.push_str(&input_table(&estimate.input));
    let _ = writeln!(out);
    let _ = writeln!(out, "Estimated price: {}", format_rupiah(estimate.price));
    let _ = writeln!(out, "The estimate is indicative, produced by a machine learning model.");

    if estimate.used_fallback {
        let _ = writeln!(out, "(columns were reordered alphabetically to match the model)");
    }

    if !estimate.importances.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Feature importance");
        let width = estimate
            .importances
            .iter()
            .map(|i| i.feature.chars().count())
            .max()
            .unwrap_or(0);
        for (rank, item) in estimate.importances.iter().enumerate() {
            let pad = width - item.feature.chars().count();
            let _ = writeln!(
                out,
                "  {:>2}. {}{}  {:.4}",
                rank + 1,
                item.feature,
                " ".repeat(pad),
                item.importance
            );
        }
    }

    out
}
