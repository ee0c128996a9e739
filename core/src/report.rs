//! Report builder: Markdown narrative of a finished analysis.
//!
//! Pure function of its inputs: no clock, no randomness, no I/O. Every
//! undefined number (NaN, missing test, empty table) renders as "N/A".

use crate::{
    comparator::Comparison,
    config::AnalysisConfig,
    daily_aggregator::DailySummary,
    segment_aggregator::SegmentTable,
    stats::{self, Correlation, TestOutcome},
    types::SegmentRow,
};

pub const NOT_AVAILABLE: &str = "N/A";

/// `€1,234.56` style: symbol, sign, thousands separators, two decimals.
pub fn format_currency(value: f64, symbol: &str) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{symbol}{sign}{grouped}.{frac_part}")
}

fn fixed(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{value:.decimals$}")
    } else {
        NOT_AVAILABLE.to_string()
    }
}

/// Scientific notation with a signed, two-digit exponent (`2.6331e-04`).
fn scientific(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let raw = format!("{value:.4e}");
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        None => raw,
    }
}

fn signed_pct(value: f64) -> String {
    if value.is_finite() {
        format!("{value:+.2}%")
    } else {
        NOT_AVAILABLE.to_string()
    }
}

fn coefficient(c: Option<Correlation>) -> String {
    c.map(|c| fixed(c.coefficient, 4))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn correlation_p(c: Option<Correlation>) -> String {
    c.map(|c| scientific(c.p_value))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn statistic(t: Option<TestOutcome>, prefix: &str, decimals: usize) -> String {
    t.map(|t| format!("{prefix} = {}", fixed(t.statistic, decimals)))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn test_p(t: Option<TestOutcome>) -> String {
    t.map(|t| scientific(t.p_value))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn image(config: &AnalysisConfig, alt: &str, file: &str) -> String {
    format!("![{alt}]({}/{file})", config.images.base_url)
}

fn segment_table(lines: &mut Vec<String>, table: &SegmentTable, label: &str, symbol: &str) {
    if table.is_empty() {
        lines.push(format!("_No incidents recorded, no {label} breakdown available ({NOT_AVAILABLE})._"));
        return;
    }
    lines.push(format!("| {label} | Mean revenue | Std. dev. | Cases | Mean duration (min) |"));
    lines.push("|---|---:|---:|---:|---:|".into());
    for row in table.rows() {
        lines.push(format!(
            "| {} | {} | {} | {} | {} |",
            row.category,
            format_currency(row.mean_revenue, symbol),
            format_currency(row.std_revenue, symbol),
            row.count,
            fixed(row.mean_duration, 2),
        ));
    }
}

fn worst_line(row: Option<&SegmentRow>, symbol: &str) -> String {
    match row {
        Some(r) => format!(
            "- {} — Mean revenue: **{}**",
            r.category,
            format_currency(r.mean_revenue, symbol)
        ),
        None => format!("- {NOT_AVAILABLE} — Mean revenue: **{NOT_AVAILABLE}**"),
    }
}

pub fn build_report(
    daily: &DailySummary,
    comparison: &Comparison,
    by_type: &SegmentTable,
    by_severity: &SegmentTable,
    config: &AnalysisConfig,
) -> String {
    let symbol = config.currency_symbol.as_str();
    let alpha = config.significance_level;
    let money = |v: f64| format_currency(v, symbol);

    let (conclusion_corr, correlation_txt) = match comparison.correlation_significant() {
        Some(true) => (
            format!("**Significant**: there is evidence of correlation between incidents and revenue (p < {alpha})."),
            "Incidents have a significant influence on revenue.",
        ),
        Some(false) => (
            format!("**Not significant**: there is no evidence of correlation between incidents and revenue (p ≥ {alpha})."),
            "Incidents do NOT have a significant influence on revenue.",
        ),
        None => (
            format!("**Undefined**: the correlation could not be computed ({NOT_AVAILABLE})."),
            "There is not enough variation in the data to assess the correlation.",
        ),
    };

    let (conclusion_ttest, impact_txt) = match comparison.difference_significant() {
        Some(true) => (
            format!("✓ H0 rejected (p < {alpha}). There is a significant difference."),
            "Incidents DO have a measurable impact on revenue.",
        ),
        Some(false) => (
            format!("✗ H0 not rejected (p ≥ {alpha}). No evidence of a significant difference."),
            "There is not enough evidence of impact.",
        ),
        None => (
            format!("Test undefined ({NOT_AVAILABLE}): each group needs at least two days."),
            "The impact could not be tested with the available days.",
        ),
    };

    let direction = if comparison.mean_difference.is_nan() {
        NOT_AVAILABLE.to_string()
    } else if comparison.mean_difference >= 0.0 {
        "✓ Days WITH incidents generate MORE revenue (possible confounding)".to_string()
    } else {
        "⚠️ Days WITH incidents generate LESS revenue".to_string()
    };

    let difference = format!(
        "{} ({})",
        money(comparison.mean_difference),
        signed_pct(comparison.mean_difference_pct)
    );

    let total_days = daily.len();
    let days_with = daily.days_with_incidents();
    let pct_days = stats::safe_pct(days_with as f64, total_days as f64);
    let period = daily
        .period()
        .map(|(from, to)| format!("{from} — {to}"))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let mut lines: Vec<String> = Vec::new();
    lines.push("# Impact of Incidents on Revenue\n".into());
    lines.push("## Executive summary".into());
    lines.push("This report analyses the statistical relationship between operational incidents and sales revenue.\n".into());

    lines.push("## Objectives".into());
    lines.push("- Determine whether daily incident counts correlate with daily revenue.".into());
    lines.push("- Determine whether revenue differs between days WITH and WITHOUT incidents.".into());
    lines.push("- Break incidents down by type and severity and compare the categories.".into());
    lines.push("- Quantify, where possible, the economic effect of incidents.\n".into());

    lines.push("Sales and incidents are aggregated into a single table with one row per sales day:\n".into());
    lines.push("| Date | Revenue | Tickets | Incidents | Duration (min) | Has incident |".into());
    lines.push("|---|---:|---:|---:|---:|---:|".into());
    for row in daily.rows().iter().take(config.excerpt_rows) {
        lines.push(format!(
            "| {} | {} | {} | {} | {} | {} |",
            row.date,
            fixed(row.revenue, 2),
            row.tickets,
            row.incidents,
            fixed(row.duration_min, 1),
            row.has_incident(),
        ));
    }
    if daily.is_empty() {
        lines.push(format!("| {NOT_AVAILABLE} | | | | | |"));
    }

    lines.push("\n## Correlation heatmap".into());
    lines.push("A correlation matrix over revenue, tickets, incident count and incident duration gives a first view of which relationships are worth studying.".into());
    lines.push(image(config, "Correlation matrix", &config.images.correlation_matrix));

    lines.push("\n# ANALYSIS".into());
    lines.push("\n## 1. Incidents vs revenue".into());
    lines.push("### Correlation analysis".into());
    lines.push(image(config, "Incidents vs revenue", &config.images.scatter));
    lines.push("\nThe incident variable is binary or a small count, so Pearson's coefficient is not appropriate.".into());
    lines.push("\nThe point-biserial correlation is used, with Spearman's rank correlation as a reference.".into());

    lines.push("\n### Results".into());
    lines.push("| Metric | Value |".into());
    lines.push("|---:|:---|".into());
    lines.push(format!("| Point-biserial correlation (r) | {} |", coefficient(comparison.point_biserial)));
    lines.push(format!("| p-value (point-biserial) | {} |", correlation_p(comparison.point_biserial)));
    lines.push(format!("| Spearman (rho) | {} |", coefficient(comparison.spearman)));
    lines.push(format!("| p-value (Spearman) | {} |", correlation_p(comparison.spearman)));
    lines.push(String::new());
    lines.push(format!("**📊 Conclusion:** {conclusion_corr}"));
    lines.push(String::new());
    lines.push(correlation_txt.into());

    lines.push("\n---\n".into());
    lines.push("## 2. Days WITH vs WITHOUT incidents".into());
    lines.push("Is mean daily revenue different on days with incidents compared to days without?".into());
    lines.push(format!("\n{}", image(config, "Mean revenue WITH vs WITHOUT incidents", &config.images.comparison_bar)));
    lines.push("\n### Comparison".into());
    lines.push(String::new());
    lines.push(format!(
        "- 📈 Days WITH incidents ({} days)\n  - Mean: {}\n  - Std. dev.: {}",
        comparison.with_stats.n,
        money(comparison.with_stats.mean),
        money(comparison.with_stats.std)
    ));
    lines.push(String::new());
    lines.push(format!(
        "- 📉 Days WITHOUT incidents ({} days)\n  - Mean: {}\n  - Std. dev.: {}",
        comparison.without_stats.n,
        money(comparison.without_stats.mean),
        money(comparison.without_stats.std)
    ));
    lines.push(String::new());
    lines.push("**💰 ECONOMIC IMPACT**".into());
    lines.push(format!("- Mean difference: **{difference}**"));
    lines.push(format!("- Conclusion: {direction}"));

    lines.push("\n### Hypothesis tests".into());
    lines.push("| Test | Statistic | p-value |".into());
    lines.push("|---|---:|---:|".into());
    lines.push(format!(
        "| Student t-test, pooled variance (parametric) | {} | {} |",
        statistic(comparison.t_test, "t", 4),
        test_p(comparison.t_test)
    ));
    lines.push(format!(
        "| Mann-Whitney U (non-parametric) | {} | {} |",
        statistic(comparison.mann_whitney, "U", 2),
        test_p(comparison.mann_whitney)
    ));
    lines.push(String::new());
    lines.push(format!("**Conclusion:** {conclusion_ttest}"));

    lines.push("\n---\n".into());
    lines.push("### Box plot".into());
    lines.push(image(config, "Revenue distribution WITH vs WITHOUT incidents", &config.images.comparison_box));

    lines.push("\n## 3. By incident TYPE".into());
    lines.push("Each incident inherits the total revenue of its day. Categories are sorted by mean revenue, lowest first.\n".into());
    segment_table(&mut lines, by_type, "Type", symbol);
    lines.push(format!("\n{}", image(config, "Mean revenue by incident type", &config.images.by_type)));

    lines.push("\n## 4. By SEVERITY".into());
    segment_table(&mut lines, by_severity, "Severity", symbol);
    lines.push(format!("\n{}", image(config, "Mean revenue by severity", &config.images.by_severity)));

    lines.push("\n## Summary of findings".into());
    lines.push(impact_txt.into());

    lines.push("\n---\n".into());
    lines.push("### 📊 Overview".into());
    lines.push("| Metric | Value |".into());
    lines.push("|---|---:|".into());
    lines.push(format!("| Period analysed | {period} |"));
    lines.push(format!("| Total days | {total_days} |"));
    lines.push(format!("| Days with incidents | {days_with} ({pct_days:.1}%) |"));
    lines.push(format!("| Total incidents | {} |", daily.total_incidents()));

    lines.push("\n### 💰 Economic impact".into());
    lines.push("| Metric | Value (mean) |".into());
    lines.push("|---|---:|".into());
    lines.push(format!("| Revenue on days WITH incidents | {} |", money(comparison.with_stats.mean)));
    lines.push(format!("| Revenue on days WITHOUT incidents | {} |", money(comparison.without_stats.mean)));
    lines.push(format!("| Mean daily difference | **{difference}** |"));

    lines.push("\n### 📈 Correlation and significance".into());
    lines.push("| Metric | Value |".into());
    lines.push("|---|---:|".into());
    lines.push(format!(
        "| Point-biserial | {} (p = {}) |",
        coefficient(comparison.point_biserial),
        correlation_p(comparison.point_biserial)
    ));
    lines.push(format!("| Test outcome | {impact_txt} |"));

    lines.push("\n### ⚠️ Most problematic type".into());
    lines.push(worst_line(by_type.worst(), symbol));

    lines.push("\n### 🎯 Most critical severity".into());
    lines.push(worst_line(by_severity.worst(), symbol));

    lines.push("\n---\n".into());
    lines.push("## Limitations".into());
    lines.push(format!(
        "- Four tests are read at α = {alpha} with no multiple-comparison correction."
    ));
    lines.push(format!(
        "- The daily table is anchored on sales days: {} incident-only day(s) are not represented.",
        daily.incident_only_dates().len()
    ));
    if comparison.mean_difference_pct.is_nan() {
        lines.push(format!("- The relative difference is {NOT_AVAILABLE}."));
    }

    lines.push("\n## Annexes".into());
    lines.push("- Reproducible with `impact-runner analyze`.".into());

    lines.join("\n")
}
