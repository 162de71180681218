use anyhow::Result;
use chisholm_game::{Ending, Grade};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

use super::simulation::DriveRecord;

/// Per-strategy roll-up of simulated drives.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyAggregate {
    pub strategy: String,
    pub runs: usize,
    pub survived: usize,
    pub delivered: usize,
    pub early_sales: usize,
    pub unfinished: usize,
    /// Failed drives keyed by the resource that gave out.
    pub failures: BTreeMap<&'static str, usize>,
    pub survival_rate: f64,
    pub mean_delivered_fraction: f64,
    pub mean_turns: f64,
    pub mean_payout: f64,
    pub grades: BTreeMap<Grade, usize>,
}

#[derive(Debug)]
struct AggregateBuilder {
    strategy: String,
    runs: usize,
    survived: usize,
    delivered: usize,
    early_sales: usize,
    unfinished: usize,
    failures: BTreeMap<&'static str, usize>,
    delivered_fraction_sum: f64,
    turns_sum: f64,
    payout_sum: f64,
    grades: BTreeMap<Grade, usize>,
}

impl AggregateBuilder {
    fn new(strategy: &str) -> Self {
        Self {
            strategy: strategy.to_string(),
            runs: 0,
            survived: 0,
            delivered: 0,
            early_sales: 0,
            unfinished: 0,
            failures: BTreeMap::new(),
            delivered_fraction_sum: 0.0,
            turns_sum: 0.0,
            payout_sum: 0.0,
            grades: Grade::ALL.into_iter().map(|grade| (grade, 0)).collect(),
        }
    }

    fn ingest(&mut self, record: &DriveRecord) {
        self.runs += 1;
        match record.ending {
            Some(Ending::Delivered) => self.delivered += 1,
            Some(Ending::SoldEarly) => self.early_sales += 1,
            Some(Ending::Failed { cause }) => {
                *self.failures.entry(cause.key()).or_default() += 1;
            }
            None => self.unfinished += 1,
        }
        if record.survived() {
            self.survived += 1;
        }
        self.delivered_fraction_sum += record.delivered_fraction;
        self.turns_sum += f64::from(record.turns);
        #[allow(clippy::cast_precision_loss)]
        {
            self.payout_sum += record.payout as f64;
        }
        *self.grades.entry(record.grade).or_default() += 1;
    }

    fn finish(self) -> StrategyAggregate {
        #[allow(clippy::cast_precision_loss)]
        let denom = self.runs.max(1) as f64;
        #[allow(clippy::cast_precision_loss)]
        let survival_rate = self.survived as f64 / denom;
        StrategyAggregate {
            strategy: self.strategy,
            runs: self.runs,
            survived: self.survived,
            delivered: self.delivered,
            early_sales: self.early_sales,
            unfinished: self.unfinished,
            failures: self.failures,
            survival_rate,
            mean_delivered_fraction: self.delivered_fraction_sum / denom,
            mean_turns: self.turns_sum / denom,
            mean_payout: self.payout_sum / denom,
            grades: self.grades,
        }
    }
}

/// Roll records up per strategy, in first-seen strategy order.
#[must_use]
pub fn aggregate(records: &[DriveRecord]) -> Vec<StrategyAggregate> {
    let mut order: Vec<String> = Vec::new();
    let mut builders: BTreeMap<String, AggregateBuilder> = BTreeMap::new();

    for record in records {
        let builder = builders.entry(record.strategy.clone()).or_insert_with(|| {
            order.push(record.strategy.clone());
            AggregateBuilder::new(&record.strategy)
        });
        builder.ingest(record);
    }

    order
        .iter()
        .filter_map(|strategy| builders.remove(strategy))
        .map(AggregateBuilder::finish)
        .collect()
}

fn ending_label(ending: Option<Ending>) -> String {
    ending.map_or_else(|| "unfinished".to_string(), |ending| ending.to_string())
}

fn grade_line(grades: &BTreeMap<Grade, usize>) -> String {
    grades
        .iter()
        .map(|(grade, count)| format!("{grade}:{count}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Colored summary for a terminal.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn generate_console_report<W: Write>(
    out: &mut W,
    aggregates: &[StrategyAggregate],
    records: &[DriveRecord],
    verbose: bool,
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Drive Simulation Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "===========================".cyan())?;
    writeln!(out, "Total drives: {}", records.len())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for agg in aggregates {
        let rate = format!("{:.1}%", agg.survival_rate * 100.0);
        let rate = if agg.survival_rate >= 0.5 {
            rate.green()
        } else {
            rate.red()
        };
        writeln!(out, "{} ({} drives)", agg.strategy.bold(), agg.runs)?;
        writeln!(out, "   Survival: {rate}")?;
        writeln!(
            out,
            "   Delivered: {}  Sold early: {}  Unfinished: {}",
            agg.delivered.to_string().green(),
            agg.early_sales.to_string().yellow(),
            agg.unfinished
        )?;
        if !agg.failures.is_empty() {
            let failures = agg
                .failures
                .iter()
                .map(|(cause, count)| format!("{cause} {count}"))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(out, "   Failures: {}", failures.red())?;
        }
        writeln!(
            out,
            "   Mean delivered: {:.1}%  Mean turns: {:.1}  Mean payout: ${}",
            agg.mean_delivered_fraction * 100.0,
            agg.mean_turns,
            group_payout(agg.mean_payout)
        )?;
        writeln!(out, "   Grades: {}", grade_line(&agg.grades))?;
        writeln!(out)?;
    }

    if verbose {
        writeln!(out, "{}", "🐂 Drives".bright_yellow().bold())?;
        writeln!(out, "{}", "=========".yellow())?;
        for record in records {
            writeln!(
                out,
                "  {:>8} seed {:<6} {:<14} grade {} herd {}/{} in {} turns",
                record.strategy,
                record.seed,
                ending_label(record.ending),
                record.grade,
                record.herd_delivered,
                record.herd_start,
                record.turns
            )?;
            for decision in &record.decisions {
                writeln!(
                    out,
                    "      day {:>2} {}: {} [{}]",
                    decision.day, decision.event_title, decision.choice_label, decision.effects
                )?;
            }
        }
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn group_payout(mean: f64) -> String {
    chisholm_game::result::group_thousands(mean.round() as i64)
}

#[derive(Serialize)]
struct JsonReport<'a> {
    aggregates: &'a [StrategyAggregate],
    records: &'a [DriveRecord],
}

/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn generate_json_report<W: Write>(
    out: &mut W,
    aggregates: &[StrategyAggregate],
    records: &[DriveRecord],
) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, &JsonReport { aggregates, records })?;
    writeln!(out)?;
    Ok(())
}

/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn generate_markdown_report<W: Write>(
    out: &mut W,
    aggregates: &[StrategyAggregate],
    records: &[DriveRecord],
) -> Result<()> {
    writeln!(out, "# Chisholm Drive Simulation Results\n")?;
    if records.is_empty() {
        writeln!(out, "_No drives simulated._")?;
        return Ok(());
    }

    writeln!(out, "## Strategies\n")?;
    writeln!(
        out,
        "| Strategy | Runs | Survival | Delivered | Sold early | Failed | Unfinished | Mean delivered | Mean turns | Grades |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|---|---|---|")?;
    for agg in aggregates {
        let failed: usize = agg.failures.values().sum();
        writeln!(
            out,
            "| {} | {} | {:.1}% | {} | {} | {} | {} | {:.1}% | {:.1} | {} |",
            agg.strategy,
            agg.runs,
            agg.survival_rate * 100.0,
            agg.delivered,
            agg.early_sales,
            failed,
            agg.unfinished,
            agg.mean_delivered_fraction * 100.0,
            agg.mean_turns,
            grade_line(&agg.grades)
        )?;
    }

    writeln!(out, "\n## Drives\n")?;
    for record in records {
        writeln!(
            out,
            "- **{}** seed {}: {} (grade {}, {} head, {} turns)",
            record.strategy,
            record.seed,
            ending_label(record.ending),
            record.grade,
            record.herd_delivered,
            record.turns
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chisholm_game::CollapseCause;

    fn record(strategy: &str, ending: Option<Ending>, grade: Grade, turns: u32) -> DriveRecord {
        let survived = ending.is_some_and(Ending::survived);
        DriveRecord {
            seed: 1,
            strategy: strategy.to_string(),
            policy_name: strategy.to_string(),
            ending,
            grade,
            herd_start: 2_500,
            herd_delivered: if survived { 2_000 } else { 0 },
            delivered_fraction: if survived { 0.8 } else { 0.0 },
            payout: if survived { 80_000 } else { 0 },
            turns,
            days: turns * 6,
            distance: 800,
            events_seen: 3,
            repeat_events: 0,
            quiet_turns: 1,
            decisions: Vec::new(),
        }
    }

    fn sample() -> Vec<DriveRecord> {
        vec![
            record("steady", Some(Ending::Delivered), Grade::C, 11),
            record(
                "hard",
                Some(Ending::Failed {
                    cause: CollapseCause::Horses,
                }),
                Grade::F,
                4,
            ),
            record("steady", Some(Ending::SoldEarly), Grade::C, 9),
            record("steady", None, Grade::F, 1),
        ]
    }

    #[test]
    fn aggregates_by_strategy_in_first_seen_order() {
        let aggregates = aggregate(&sample());
        assert_eq!(aggregates.len(), 2);
        let steady = &aggregates[0];
        assert_eq!(steady.strategy, "steady");
        assert_eq!(steady.runs, 3);
        assert_eq!(steady.survived, 2);
        assert_eq!(steady.delivered, 1);
        assert_eq!(steady.early_sales, 1);
        assert_eq!(steady.unfinished, 1);
        assert!((steady.mean_turns - 7.0).abs() < 1e-9);
        assert_eq!(steady.grades[&Grade::C], 2);
        assert_eq!(steady.grades[&Grade::A], 0);

        let hard = &aggregates[1];
        assert_eq!(hard.failures.get("horses"), Some(&1));
        assert!(hard.survival_rate.abs() < 1e-9);
    }

    #[test]
    fn json_report_parses() {
        let records = sample();
        let aggregates = aggregate(&records);
        let mut buf = Vec::new();
        generate_json_report(&mut buf, &aggregates, &records).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["aggregates"][0]["grades"]["C"], 2);
        assert_eq!(value["records"][1]["ending"]["type"], "failed");
        assert!(value["records"][3]["ending"].is_null());
    }

    #[test]
    fn markdown_report_lists_strategies() {
        let records = sample();
        let mut buf = Vec::new();
        generate_markdown_report(&mut buf, &aggregate(&records), &records).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("| steady | 3 |"));
        assert!(text.contains("unfinished"));

        let mut empty = Vec::new();
        generate_markdown_report(&mut empty, &[], &[]).unwrap();
        assert!(String::from_utf8(empty).unwrap().contains("No drives simulated"));
    }

    #[test]
    fn console_report_mentions_failures() {
        colored::control::set_override(false);
        let records = sample();
        let mut buf = Vec::new();
        generate_console_report(&mut buf, &aggregate(&records), &records, true, Duration::ZERO)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Failures: horses 1"));
        assert!(text.contains("grade F"));
    }
}
