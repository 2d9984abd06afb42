use crate::cmd::benchmark::{BenchmarkRecord, HeuristicKind, Variant};
use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use heurigen::benchmark::Ranking;
use heurigen::evolution::Solution;
use itertools::Itertools;
use std::sync::Arc;
use strum::IntoEnumIterator;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Top `limit` solutions by average rank, with their per-network costs.
pub fn ranking(solutions: &[Arc<Solution>], ranking: &Ranking, limit: usize) {
    let mut table = new_table();

    let mut header = vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Length"),
        Cell::new("Avg Rank").fg(Color::Cyan),
    ];
    header.extend(ranking.network_names.iter().map(Cell::new));
    header.push(Cell::new("Program").add_attribute(Attribute::Bold));
    table.set_header(header);

    let numeric_columns = 1..3 + ranking.network_names.len();
    for i in numeric_columns {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    for (position, &index) in ranking.order.iter().take(limit).enumerate() {
        let solution = &solutions[index];
        let mut row = vec![
            Cell::new(position + 1).add_attribute(Attribute::Bold),
            Cell::new(solution.program_length()),
            Cell::new(format!("{:.2}", ranking.average_ranks[index])).fg(Color::Cyan),
        ];
        row.extend(ranking.costs.iter().map(|costs| Cell::new(costs[index])));
        row.push(Cell::new(solution.pretty().lines().join("\n")));
        table.add_row(row);
    }

    println!("\n{}", table);
}

/// One row per network and heuristic, one column per pruning variant.
/// The smallest valid set of each variant on a network is highlighted.
pub fn benchmark(records: &[BenchmarkRecord], heuristics: &[HeuristicKind]) {
    let mut table = new_table();

    let mut header = vec![
        Cell::new("Network").add_attribute(Attribute::Bold),
        Cell::new("Heuristic").add_attribute(Attribute::Bold),
    ];
    header.extend(Variant::iter().map(|v| Cell::new(v.to_string())));
    table.set_header(header);

    for i in 2..2 + Variant::iter().count() {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    for (network, group) in &records.iter().chunk_by(|r| r.network.as_str()) {
        let group: Vec<&BenchmarkRecord> = group.collect();
        let best_size = |variant: Variant| {
            group
                .iter()
                .filter(|r| r.variant == variant && r.valid)
                .map(|r| r.target_set_size)
                .min()
        };

        for kind in heuristics {
            let label = kind.to_string();
            let mut row = vec![Cell::new(network), Cell::new(&label)];
            for variant in Variant::iter() {
                let record = group
                    .iter()
                    .find(|r| r.heuristic == label && r.variant == variant);
                row.push(match record {
                    None => Cell::new("-"),
                    Some(r) if !r.valid => {
                        Cell::new(format!("{} (invalid)", r.target_set_size)).fg(Color::Red)
                    }
                    Some(r) => {
                        let cell = Cell::new(format!("{} ({} ms)", r.target_set_size, r.elapsed_ms));
                        if best_size(variant) == Some(r.target_set_size) {
                            cell.fg(Color::Green).add_attribute(Attribute::Bold)
                        } else {
                            cell
                        }
                    }
                });
            }
            table.add_row(row);
        }
    }

    println!("\n{}", table);
}
