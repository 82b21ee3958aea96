use fleet_optimizer::{
    json::types::JsonProblemInstance,
    parsers::{json_instance::JsonInstanceParser, parser::DatasetParser, place_geometry},
    problem::{
        node::NodeIdx,
        periods::PeriodIdx,
    },
};

mod common;

#[test]
fn test_reference_instance() {
    let instance = JsonInstanceParser
        .parse(common::fixture("reference_instance.json"))
        .unwrap();

    assert_eq!(instance.id(), Some("reference"));
    assert_eq!(instance.num_customers(), 3);
    assert_eq!(instance.num_periods(), 3);
    assert_eq!(instance.periods().breakpoints(), &[480.0, 540.0, 600.0, 660.0]);
    assert_eq!(
        instance.travel_time(PeriodIdx::new(0), NodeIdx::new(0), NodeIdx::new(3)),
        89.0
    );
    assert_eq!(instance.total_handling_time(), 15.0);
    assert_eq!(instance.fleet().battery_capacity(), Some(100.0));
}

#[test]
fn test_solve_reference_instance() {
    let instance = JsonInstanceParser
        .parse(common::fixture("reference_instance.json"))
        .unwrap();
    let optimizer = common::default_optimizer();

    let routing = optimizer.solve_routing(&instance).unwrap();
    assert_eq!(routing.verify(&instance), vec![]);
    // Every arc takes 5 minutes between 9:00 and 10:00.
    assert!(routing.objective() <= 25.0 + 1e-6);

    // Mixed deliveries and pickups, every customer hangs off a depot route.
    let energy = optimizer.solve_energy(&instance).unwrap();
    assert_eq!(energy.verify(&instance), vec![]);
    assert_eq!(
        energy
            .active_routes()
            .map(|route| route.customers().count())
            .sum::<usize>(),
        3
    );
    assert!(
        energy
            .active_routes()
            .flat_map(|route| route.arcs())
            .all(|arc| arc.load >= -1e-9)
    );
    // 2 vehicles * 270 meters over all arcs.
    assert!((energy.costs().distance - 540.0).abs() < 1e-9);
}

#[test]
fn test_attach_place_geometry() {
    let mut instance = JsonInstanceParser
        .parse(common::fixture("reference_instance.json"))
        .unwrap();
    let coordinates = place_geometry::parse_file(common::fixture("places_geometry.txt")).unwrap();

    instance.attach_coordinates(&coordinates);

    let depot = instance.node(NodeIdx::new(0)).coordinates().unwrap();
    assert_eq!(depot.lat(), 45.4654219);
    assert_eq!(depot.lng(), 9.1859243);
}

#[test]
fn test_instance_json_round_trip() {
    let instance = common::uniform_instance();

    let json = serde_json::to_string(&JsonProblemInstance::from(&instance)).unwrap();
    let parsed: JsonProblemInstance = serde_json::from_str(&json).unwrap();
    let rebuilt = parsed.build_instance().unwrap();

    assert_eq!(rebuilt.num_nodes(), instance.num_nodes());
    assert_eq!(rebuilt.total_handling_time(), instance.total_handling_time());
}
