use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
use fleet_optimizer::{
    extraction::solution::{EnergySolution, RoutingSolution},
    problem::{node::NodeIdx, problem_instance::ProblemInstance},
};

/// `HH:MM` of a time expressed in minutes after midnight.
pub fn format_clock(minutes: f64) -> String {
    let total = minutes.round() as i64;
    format!("{:02}:{:02}", total.div_euclid(60), total.rem_euclid(60))
}

fn node_label(instance: &ProblemInstance, node: NodeIdx) -> String {
    instance.node(node).external_id().to_owned()
}

pub fn routing_table(instance: &ProblemInstance, solution: &RoutingSolution) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED).set_header(vec![
        "Vehicle",
        "Route",
        "Departure",
        "Return",
        "Travel (min)",
        "Max load",
    ]);

    for route in solution.routes() {
        let stops = route
            .stops()
            .iter()
            .map(|stop| {
                format!(
                    "{} [{} p{}]",
                    node_label(instance, stop.node),
                    format_clock(stop.arrival),
                    stop.period
                )
            })
            .collect::<Vec<_>>()
            .join(" → ");
        let max_load = route
            .stops()
            .iter()
            .map(|stop| stop.load)
            .fold(0.0, f64::max);

        table.add_row(vec![
            Cell::new(route.vehicle()),
            Cell::new(stops),
            Cell::new(route.departure().map(format_clock).unwrap_or_default()),
            Cell::new(route.return_time().map(format_clock).unwrap_or_default()),
            Cell::new(format!("{:.1}", route.travel_time())),
            Cell::new(format!("{max_load:.0}")),
        ]);
    }

    table
}

pub fn energy_table(instance: &ProblemInstance, solution: &EnergySolution) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED).set_header(vec![
        "Vehicle",
        "Route",
        "Distance (m)",
        "Energy",
        "Budget w[k]",
    ]);

    for route in solution.routes() {
        let nodes = if route.is_active() {
            route
                .nodes()
                .into_iter()
                .map(|node| node_label(instance, node))
                .collect::<Vec<_>>()
                .join(" → ")
        } else {
            String::from("unused")
        };

        table.add_row(vec![
            Cell::new(route.vehicle()),
            Cell::new(nodes),
            Cell::new(format!("{:.1}", route.distance())),
            Cell::new(format!("{:.2}", route.energy_draw())),
            Cell::new(format!("{:.2}", route.peak_energy())),
        ]);
    }

    table
}
