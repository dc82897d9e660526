use std::fmt::Write;

use chrono::NaiveDate;

use crate::aggregate::{self, Aggregation};
use crate::models::{RankedEntry, ReportScope};

pub fn ranking_line(entry: &RankedEntry<String>) -> String {
    let stats = &entry.aggregate;
    format!(
        "{:>3}. {} mean {:.2} (min {:.2}, max {:.2}, sd {:.2}) across {} scores - {}",
        entry.rank,
        stats.entity_id,
        stats.mean,
        stats.min,
        stats.max,
        stats.std_dev,
        stats.count,
        entry.tier.label()
    )
}

pub fn ranking_json(ranked: &[RankedEntry<String>]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(ranked)?)
}

pub fn build_report(
    scope: &ReportScope,
    generated_on: NaiveDate,
    aggregation: &Aggregation<String>,
) -> String {
    let ranked = aggregate::rank(aggregation.results.clone());
    let tiers = aggregate::tier_distribution(&ranked);

    let mut output = String::new();

    let _ = writeln!(output, "# Grade Ranking Report");
    let _ = writeln!(
        output,
        "Generated for {} on {}",
        scope.describe(),
        generated_on
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Tier Distribution");

    if ranked.is_empty() {
        let _ = writeln!(output, "No scores recorded for this scope.");
    } else {
        for tier in tiers.iter() {
            let _ = writeln!(output, "- {}: {}", tier.tier.label(), tier.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Ranking");

    if ranked.is_empty() {
        let _ = writeln!(output, "No statistics available.");
    } else {
        let _ = writeln!(output, "| Rank | Entity | Mean | Min | Max | Std dev | Scores | Tier |");
        let _ = writeln!(output, "|---:|---|---:|---:|---:|---:|---:|---|");
        for entry in ranked.iter().take(10) {
            let stats = &entry.aggregate;
            let _ = writeln!(
                output,
                "| {} | {} | {:.2} | {:.2} | {:.2} | {:.2} | {} | {} |",
                entry.rank,
                stats.entity_id,
                stats.mean,
                stats.min,
                stats.max,
                stats.std_dev,
                stats.count,
                entry.tier.label()
            );
        }
    }

    if !aggregation.rejected.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Discarded Records");
        let _ = writeln!(
            output,
            "{} records were skipped as invalid.",
            aggregation.rejected.len()
        );
        for rejected in aggregation.rejected.iter().take(5) {
            let _ = writeln!(output, "- {}: {}", rejected.entity_id, rejected.reason);
        }
    }

    output
}
