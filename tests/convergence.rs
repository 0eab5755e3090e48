use ls_router::config::{LinkConfig, LinkEvent, ProbeConfig, ScenarioConfig, TimedEvent};
use ls_router::simulation::{Network, TraceResult, MAX_DELIVERIES};

const HEARTBEAT: u64 = 1_000;

fn network(routers: &[&str], links: &[(&str, &str, f64)]) -> Network {
    let mut network = Network::new(HEARTBEAT);
    for router in routers {
        network.add_router(*router).unwrap();
    }
    for (a, b, cost) in links {
        network.add_link(a, b, *cost).unwrap();
    }
    network.run_until_quiet(MAX_DELIVERIES);
    network
}

fn diamond() -> Network {
    network(
        &["A", "B", "C", "D"],
        &[("A", "B", 1.0), ("A", "C", 5.0), ("B", "D", 1.0), ("C", "D", 1.0)],
    )
}

#[test]
fn destination_behind_cheap_neighbor() {
    let network = network(
        &["A", "B", "C", "D"],
        &[("A", "B", 1.0), ("A", "C", 5.0), ("B", "D", 1.0)],
    );
    let a = network.router("A").unwrap();
    let port_to_b = a.links().port_for("B").unwrap();

    assert_eq!(a.forwarding_table().port_for("D"), Some(port_to_b));
    assert_eq!(a.forwarding_table().cost_to("D"), Some(2.0));
}

#[test]
fn every_router_reaches_every_other_after_refresh() {
    let mut network = network(
        &["A", "B", "C", "D", "E"],
        &[("A", "B", 2.0), ("B", "C", 2.0), ("C", "D", 2.0), ("D", "E", 2.0), ("E", "A", 3.0)],
    );
    network.advance(HEARTBEAT, HEARTBEAT);

    for router in network.routers() {
        let table = router.forwarding_table();
        assert_eq!(table.len(), 4, "{} has {:?}", router.address(), table);
    }

    assert_eq!(network.router("A").unwrap().forwarding_table().cost_to("C"), Some(4.0));
    assert_eq!(network.router("A").unwrap().forwarding_table().cost_to("D"), Some(5.0));

    let trace = network.trace("A", "D", 8).unwrap();
    assert_eq!(trace.path, vec!["A", "E", "D"]);
    assert!(trace.is_delivered());
}

#[test]
fn databases_agree_on_sequence_numbers_after_refresh() {
    let mut network = diamond();
    network.advance(HEARTBEAT, HEARTBEAT);

    for router in network.routers() {
        for origin in network.routers() {
            assert_eq!(
                router.lsdb().sequence_of(origin.address()),
                Some(origin.sequence_number()),
                "{} view of {}",
                router.address(),
                origin.address()
            );
        }
    }
}

#[test]
fn link_failure_reroutes_around_it() {
    let mut network = diamond();
    assert_eq!(network.trace("A", "D", 8).unwrap().path, vec!["A", "B", "D"]);

    network.remove_link("B", "D").unwrap();
    network.run_until_quiet(MAX_DELIVERIES);

    let a = network.router("A").unwrap();
    assert_eq!(a.forwarding_table().cost_to("D"), Some(6.0));
    assert_eq!(a.forwarding_table().port_for("D"), a.links().port_for("C"));
    assert_eq!(network.trace("A", "D", 8).unwrap().path, vec!["A", "C", "D"]);
}

#[test]
fn cost_change_shifts_traffic() {
    let mut network = diamond();
    network.set_link_cost("A", "C", 0.5).unwrap();
    network.run_until_quiet(MAX_DELIVERIES);

    assert_eq!(network.trace("A", "D", 8).unwrap().path, vec!["A", "C", "D"]);
    assert_eq!(network.router("A").unwrap().forwarding_table().cost_to("D"), Some(1.5));
}

#[test]
fn partition_drops_routes_to_far_side() {
    let mut network = network(&["A", "B", "C"], &[("A", "B", 1.0), ("B", "C", 1.0)]);
    network.remove_link("A", "B").unwrap();
    network.run_until_quiet(MAX_DELIVERIES);

    let a = network.router("A").unwrap();
    assert!(a.forwarding_table().is_empty());
    let b = network.router("B").unwrap();
    assert!(!b.forwarding_table().contains("A"));
    assert!(b.forwarding_table().contains("C"));

    let trace = network.trace("C", "A", 8).unwrap();
    assert_eq!(trace.path, vec!["C"]);
    assert_eq!(trace.result, TraceResult::Unreachable);
}

#[test]
fn late_joiner_learns_full_topology_from_heartbeats() {
    let mut network = diamond();
    network.add_router("E").unwrap();
    network.add_link("D", "E", 1.0).unwrap();
    network.run_until_quiet(MAX_DELIVERIES);

    // Only D's advertisement has reached E so far
    let e = network.router("E").unwrap();
    assert!(e.forwarding_table().contains("B"));
    assert!(!e.forwarding_table().contains("A"));

    network.advance(HEARTBEAT, 100);
    let e = network.router("E").unwrap();
    assert_eq!(e.forwarding_table().cost_to("A"), Some(3.0));
    assert!(network.trace("E", "A", 8).unwrap().is_delivered());
}

#[test]
fn probes_to_self_are_delivered_in_place() {
    let mut network = diamond();
    let trace = network.trace("B", "B", 8).unwrap();
    assert_eq!(trace.path, vec!["B"]);
    assert!(trace.is_delivered());
}

#[test]
fn scenario_with_timed_events() {
    let config = ScenarioConfig {
        duration_ms: 3_000,
        events: vec![
            TimedEvent {
                at_ms: 1_000,
                event: LinkEvent::Down { a: "B".into(), b: "D".into() },
            },
            TimedEvent {
                at_ms: 2_000,
                event: LinkEvent::Up { a: "A".into(), b: "D".into(), cost: 1.0 },
            },
        ],
        probes: vec![
            ProbeConfig { from: "A".into(), to: "D".into() },
            ProbeConfig { from: "D".into(), to: "B".into() },
        ],
        ..ScenarioConfig::example()
    };
    config.validate().unwrap();

    let report = Network::run_scenario(&config).unwrap();

    assert_eq!(report.time_ms, 3_000);
    assert_eq!(report.traces[0].path, vec!["A", "D"]);
    assert_eq!(report.traces[1].path, vec!["D", "A", "B"]);
    assert_eq!(report.tables["A"].cost_to("D"), Some(1.0));
    assert!(report.stats.delivered > 0);
}

#[test]
fn scenario_rejects_unknown_link_event() {
    let config = ScenarioConfig {
        routers: vec!["A".into(), "B".into()],
        links: vec![LinkConfig { a: "A".into(), b: "B".into(), cost: 1.0 }],
        events: vec![TimedEvent {
            at_ms: 0,
            event: LinkEvent::Cost { a: "B".into(), b: "A".into(), cost: 2.0 },
        }],
        ..ScenarioConfig::default()
    };
    assert!(Network::run_scenario(&config).is_ok());

    let broken = ScenarioConfig {
        events: vec![TimedEvent {
            at_ms: 0,
            event: LinkEvent::Down { a: "A".into(), b: "A".into() },
        }],
        ..config
    };
    assert!(broken.validate().is_err());
    assert!(Network::run_scenario(&broken).is_err());
}
