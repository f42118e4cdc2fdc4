use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use gesturegate::classifier::GestureLabel;
use gesturegate::evaluation::{ConfirmationRecord, LevelEvaluation};
use gesturegate::trace::ReplayReport;

fn right_align(table: &mut Table, from: usize, to: usize) {
    for i in from..=to {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
}

fn validity_cell(valid: bool) -> Cell {
    if valid {
        Cell::new("VALID").fg(Color::Green)
    } else {
        Cell::new("WEAK").fg(Color::Red)
    }
}

pub fn print_confirmations(records: &[ConfirmationRecord]) {
    if records.is_empty() {
        println!("\nNo gesture was confirmed.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Time (s)").add_attribute(Attribute::Bold),
        Cell::new("Gesture").add_attribute(Attribute::Bold),
        Cell::new("Conf").fg(Color::Cyan),
        Cell::new("Avg Conf"),
        Cell::new("Stable"),
        Cell::new("Level"),
        Cell::new("Thresh"),
        Cell::new("Result"),
    ]);

    for r in records {
        table.add_row(vec![
            Cell::new(format!("{:.3}", r.at_secs)),
            Cell::new(format!("{} ({})", r.label.display_name(), r.label.id())),
            Cell::new(format!("{:.1}%", r.confidence * 100.0)),
            Cell::new(format!("{:.1}%", r.avg_confidence * 100.0)),
            Cell::new(r.stability),
            Cell::new(r.level),
            Cell::new(format!("{:.0}%", r.threshold * 100.0)),
            validity_cell(r.valid),
        ]);
    }
    right_align(&mut table, 2, 6);

    println!("\n=== CONFIRMED GESTURES ===");
    println!("{}", table);
}

pub fn print_evaluation(level: u8, eval: Option<&LevelEvaluation>) {
    let Some(e) = eval else {
        println!("\nLevel {}: no evaluation (nothing confirmed).", level);
        return;
    };

    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.add_row(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![Cell::new("Level"), Cell::new(level)]);
    table.add_row(vec![
        Cell::new("Valid / All"),
        Cell::new(format!("{} / {}", e.total_valid, e.total_all)),
    ]);
    table.add_row(vec![
        Cell::new("Valid Ratio"),
        Cell::new(format!("{:.2}%", e.valid_ratio_pct)).fg(Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("Avg Confidence"),
        Cell::new(format!("{:.2}%", e.avg_confidence_pct)).fg(Color::Cyan),
    ]);
    table.add_row(vec![
        Cell::new("Avg Latency"),
        Cell::new(format!("{:.2} ms", e.avg_latency_ms)),
    ]);
    table.add_row(vec![
        Cell::new("Total Latency"),
        Cell::new(format!("{:.2} ms", e.total_latency_ms)),
    ]);
    right_align(&mut table, 1, 1);

    println!("\n=== LEVEL EVALUATION ===");
    println!("{}", table);
}

pub fn print_label_breakdown(counts: &[(GestureLabel, u32, u32)]) {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.add_row(vec![
        Cell::new("Gesture").add_attribute(Attribute::Bold),
        Cell::new("Direction"),
        Cell::new("Confirmed"),
        Cell::new("Valid").fg(Color::Green),
    ]);
    for (label, total, valid) in counts {
        table.add_row(vec![
            Cell::new(label.display_name()),
            Cell::new(label.direction()),
            Cell::new(total),
            Cell::new(valid),
        ]);
    }
    right_align(&mut table, 2, 3);

    println!("\n=== PER-GESTURE BREAKDOWN ===");
    println!("{}", table);
}

pub fn print_replay_report(report: &ReplayReport) {
    println!(
        "\nReplayed {} frames at level {}; {} action(s) delivered.",
        report.frames,
        report.level,
        report.actions.len()
    );
    print_confirmations(&report.confirmations);
    print_label_breakdown(&report.label_counts);
    print_evaluation(report.level, report.evaluation.as_ref());
}

pub fn print_sweep_report(reports: &[ReplayReport], thresholds: &[(u8, f32)]) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Level").add_attribute(Attribute::Bold),
        Cell::new("Thresh"),
        Cell::new("Confirmed"),
        Cell::new("Valid").fg(Color::Green),
        Cell::new("Ratio").fg(Color::Cyan),
        Cell::new("Avg Conf"),
    ]);

    for r in reports {
        let thresh = thresholds
            .iter()
            .find(|(l, _)| *l == r.level)
            .map(|(_, t)| format!("{:.0}%", t * 100.0))
            .unwrap_or_else(|| "-".to_string());
        let (confirmed, valid, ratio, avg) = match &r.evaluation {
            Some(e) => (
                e.total_all.to_string(),
                e.total_valid.to_string(),
                format!("{:.1}%", e.valid_ratio_pct),
                format!("{:.1}%", e.avg_confidence_pct),
            ),
            None => ("0".into(), "0".into(), "-".into(), "-".into()),
        };
        table.add_row(vec![
            Cell::new(r.level),
            Cell::new(thresh),
            Cell::new(confirmed),
            Cell::new(valid),
            Cell::new(ratio),
            Cell::new(avg),
        ]);
    }
    right_align(&mut table, 1, 5);

    println!("\n=== LEVEL SWEEP ===");
    println!("{}", table);
}
