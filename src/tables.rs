use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use pv_sizer::{
    core::Metrics,
    optimiser::{Diagnostics, Termination},
    study::{OptimisationResult, SensitivityReport, SweepReport},
};

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

fn optional<T: ToString>(value: Option<T>) -> Cell {
    value.map_or_else(|| Cell::new("n/a").add_attribute(Attribute::Dim), Cell::new)
}

fn percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

pub fn build_result_table(result: &OptimisationResult) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Design", "Value"]);
    table.add_row(vec![Cell::new("Goal"), Cell::new(result.goal).fg(Color::Cyan)]);
    table.add_row(vec![
        Cell::new("PV capacity"),
        Cell::new(result.parameters.pv_capacity).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new("Storage capacity"),
        Cell::new(result.parameters.storage_capacity).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new("Score"),
        Cell::new(format!("{:.6}", result.score)).set_alignment(CellAlignment::Right),
    ]);
    table
}

pub fn build_metrics_table(metrics: &Metrics) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![Cell::new("LCOE"), optional(metrics.lcoe)]);
    table.add_row(vec![Cell::new("Blended LCOE"), optional(metrics.blended_lcoe)]);
    table.add_row(vec![
        Cell::new("Self-consumption"),
        Cell::new(percent(metrics.self_consumption_rate)).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new("Self-sufficiency"),
        Cell::new(percent(metrics.self_sufficiency_rate)).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![Cell::new("Capex"), Cell::new(metrics.capex)]);
    table.add_row(vec![Cell::new("Annual opex"), Cell::new(metrics.annual_opex)]);
    table.add_row(vec![Cell::new("Annual cost"), Cell::new(metrics.annual_cost)]);
    table.add_row(vec![
        Cell::new("Annual savings"),
        Cell::new(metrics.annual_savings).fg(if metrics.annual_savings.0 >= 0.0 {
            Color::Green
        } else {
            Color::Red
        }),
    ]);
    table.add_row(vec![
        Cell::new("Net present value"),
        Cell::new(metrics.net_present_value).fg(if metrics.net_present_value.0 >= 0.0 {
            Color::Green
        } else {
            Color::Red
        }),
    ]);
    table.add_row(vec![
        Cell::new("Internal rate of return"),
        optional(metrics.internal_rate_of_return.map(percent)),
    ]);
    table.add_row(vec![
        Cell::new("Payback"),
        optional(metrics.payback_years.map(|years| format!("{years:.1} years"))),
    ]);
    table.add_row(vec![Cell::new("Generation"), Cell::new(metrics.annual_generation)]);
    table.add_row(vec![Cell::new("Load"), Cell::new(metrics.annual_load)]);
    table.add_row(vec![Cell::new("Self-consumed"), Cell::new(metrics.annual_self_consumed)]);
    table.add_row(vec![Cell::new("Import"), Cell::new(metrics.annual_import)]);
    table.add_row(vec![Cell::new("Export"), Cell::new(metrics.annual_export)]);
    table.add_row(vec![
        Cell::new("Curtailed"),
        Cell::new(metrics.annual_curtailed).add_attribute(Attribute::Dim),
    ]);
    table
}

pub fn build_diagnostics_table(diagnostics: &Diagnostics) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Evaluations", "Failed", "Generations", "Termination"]);
    table.add_row(vec![
        Cell::new(diagnostics.evaluations).set_alignment(CellAlignment::Right),
        Cell::new(diagnostics.failed_evaluations).set_alignment(CellAlignment::Right).fg(
            if diagnostics.failed_evaluations == 0 { Color::Reset } else { Color::DarkYellow },
        ),
        Cell::new(diagnostics.generations).set_alignment(CellAlignment::Right),
        Cell::new(format!("{:?}", diagnostics.termination)).fg(match diagnostics.termination {
            Termination::Converged => Color::Green,
            Termination::BudgetExhausted => Color::DarkYellow,
            Termination::Cancelled => Color::Red,
        }),
    ]);
    table
}

pub fn build_sweep_table(report: &SweepReport) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "PV",
        "Storage",
        "Score",
        "LCOE",
        "Self-consumption",
        "Self-sufficiency",
        "NPV",
    ]);
    for (index, point) in report.points.iter().enumerate() {
        let is_best = report.best == Some(index);
        let score = Cell::new(format!("{:.6}", point.score)).set_alignment(CellAlignment::Right);
        table.add_row(vec![
            Cell::new(point.parameters.pv_capacity).set_alignment(CellAlignment::Right),
            Cell::new(point.parameters.storage_capacity).set_alignment(CellAlignment::Right),
            if is_best { score.fg(Color::Green).add_attribute(Attribute::Bold) } else { score },
            optional(point.metrics.lcoe),
            Cell::new(percent(point.metrics.self_consumption_rate))
                .set_alignment(CellAlignment::Right),
            Cell::new(percent(point.metrics.self_sufficiency_rate))
                .set_alignment(CellAlignment::Right),
            Cell::new(point.metrics.net_present_value).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn build_sensitivity_table(report: &SensitivityReport) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        Cell::new(report.field),
        Cell::new("PV"),
        Cell::new("Storage"),
        Cell::new("Score"),
        Cell::new("LCOE"),
        Cell::new("Self-consumption"),
        Cell::new("NPV"),
    ]);
    for point in &report.points {
        let metrics = &point.result.metrics;
        table.add_row(vec![
            Cell::new(point.value).add_attribute(Attribute::Bold),
            Cell::new(point.result.parameters.pv_capacity).set_alignment(CellAlignment::Right),
            Cell::new(point.result.parameters.storage_capacity).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.6}", point.result.score)).set_alignment(CellAlignment::Right),
            optional(metrics.lcoe),
            Cell::new(percent(metrics.self_consumption_rate)).set_alignment(CellAlignment::Right),
            Cell::new(metrics.net_present_value).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
