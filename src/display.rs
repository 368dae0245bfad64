use std::collections::BTreeMap;

use daily539::UpdateOutcome;
use daily539::models::Draw;
use daily539::stats::{Overview, StatsEngine};

const BAR_WIDTH: u32 = 40;

pub fn display_update_outcome(outcome: &UpdateOutcome) {
    match outcome {
        UpdateOutcome::Updated { added, total } => {
            println!("\n🎉 Draw table updated: {} new draws, {} in total", added, total);
        }
        UpdateOutcome::UpToDate { total } => {
            println!("\n🎉 Draw table already up to date: {} draws", total);
        }
        UpdateOutcome::NoData => {
            println!("\n⚠️ No draws could be fetched.");
        }
    }
}

pub fn display_overview(overview: &Overview) {
    println!("📊 Overview");
    println!("  Total draws   : {}", overview.total_draws);
    if let (Some(earliest), Some(latest)) = (overview.earliest_date, overview.latest_date) {
        println!("  Latest draw   : {}", latest);
        println!("  Earliest draw : {}", earliest);
    }
}

/// Newest first.
pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("No draws to display.");
        return;
    }

    for draw in draws.iter().rev() {
        println!(
            "  Period {:<10} {} ({})  {}",
            draw.period(),
            draw.display_date(),
            draw.draw_date(),
            draw.numbers_label()
        );
    }
}

fn bar(count: u32, max: u32) -> String {
    if max == 0 {
        return String::new();
    }
    "█".repeat((count * BAR_WIDTH / max) as usize)
}

pub fn display_counts(title: &str, counts: &BTreeMap<u8, u32>, key_width: usize) {
    println!("\n── {} ──", title);
    let max = counts.values().copied().max().unwrap_or(0);
    for (key, count) in counts {
        println!(
            "  {:0width$} {:>5} {}",
            key,
            count,
            bar(*count, max),
            width = key_width
        );
    }
}

fn display_labels(title: &str, rows: &[(String, u32)]) {
    println!("\n── {} ──", title);
    if rows.is_empty() {
        println!("  (no data)");
        return;
    }
    let max = rows.iter().map(|(_, c)| *c).max().unwrap_or(0);
    for (label, count) in rows {
        println!("  {:<8} {:>5} {}", label, count, bar(*count, max));
    }
}

pub fn display_report(engine: &StatsEngine, window: Option<usize>) {
    display_overview(&engine.overview());

    println!("\n🎲 Latest 5 draws");
    display_draws(engine.latest_n_draws(5));

    let scope = match window {
        Some(n) => format!("last {} draws", n),
        None => "all draws".to_string(),
    };

    display_counts(&format!("Number frequency ({})", scope), &engine.frequency(window), 2);
    display_counts("Number frequency (last 30 draws)", &engine.frequency(Some(30)), 2);

    let sums = engine.sum_analysis(window);
    println!("\n── Sum analysis ({}) ──", scope);
    match (sums.mean, sums.median, sums.min, sums.max) {
        (Some(mean), Some(median), Some(min), Some(max)) => {
            println!("  Mean    : {:.2}", mean);
            println!("  Median  : {:.2}", median);
            match sums.std_dev {
                Some(std_dev) => println!("  Std dev : {:.2}", std_dev),
                None => println!("  Std dev : n/a"),
            }
            println!("  Range   : {} - {}", min, max);
        }
        _ => println!("  (no data)"),
    }

    let ratios = engine.ratio_analysis(window);
    let odd_even: Vec<(String, u32)> = ratios
        .odd_even_distribution
        .iter()
        .map(|(k, v)| (k.label(), *v))
        .collect();
    let big_small: Vec<(String, u32)> = ratios
        .big_small_distribution
        .iter()
        .map(|(k, v)| (k.label(), *v))
        .collect();
    display_labels("Odd/even distribution", &odd_even);
    display_labels("Big/small distribution", &big_small);

    let consecutive = engine.consecutive_analysis(window);
    println!("\n── Consecutive numbers ({}) ──", scope);
    println!(
        "  {} draws with consecutive numbers ({:.2}%)",
        consecutive.draws_with_consecutive, consecutive.percentage_with_consecutive
    );
    let mut patterns: Vec<(String, u32)> = consecutive
        .patterns
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect();
    patterns.sort_by(|a, b| b.1.cmp(&a.1));
    for (pattern, count) in &patterns {
        println!("  {}  {:>5}", pattern, count);
    }

    display_counts("Last digit frequency", &engine.last_digits(window), 1);

    println!("\n⚠️ Lottery draws are random; these statistics cannot predict results.");
}
