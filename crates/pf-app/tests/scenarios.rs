//! End-to-end plant scenarios: direct and transported connections, cost
//! fan-in and cached sub-simulations.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use pf_app::{AppError, Engine, EngineOptions, compile_plant};
use pf_core::{HOURS_PER_YEAR, Value};
use pf_project::{Project, parse_yaml};

fn unique_temp_dir(label: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!(
        "pf-app-{}-{}-{}-{}",
        label,
        std::process::id(),
        n,
        nanos
    ))
}

fn wind_electrolyzer(connection: &str) -> Project {
    parse_yaml(&format!(
        r#"
name: scenario
technologies:
  - name: wind
    performance_model: {{model: dummy_wind_turbine}}
    details:
      swept_area_m2: 5000
  - name: electrolyzer
    performance_model: {{model: pem_electrolyzer}}
    details:
      cluster_size_mw: 1.0
plant:
  technology_interconnections:
    - {connection}
"#
    ))
    .unwrap()
}

fn no_cache() -> Engine {
    Engine::new(EngineOptions::default().without_cache())
}

#[test]
fn direct_connection_passes_series_through() {
    let project = wind_electrolyzer("[wind, electrolyzer, electricity]");
    let plant = compile_plant(&project).unwrap();
    assert_eq!(plant.graph().edges().len(), 1);
    assert_eq!(plant.order(), vec!["wind", "electrolyzer"]);
    assert!(!plant.has_aggregator());

    let results = no_cache().run(&project, None).unwrap().results;
    let produced = results.get("wind", "electricity").unwrap();
    assert_eq!(produced.len(), Some(HOURS_PER_YEAR));
    assert_eq!(results.input("electrolyzer", "electricity"), Some(produced));
    assert!(results.get("electrolyzer", "hydrogen").is_some());
}

#[test]
fn cable_is_inserted_between_technologies() {
    let project = wind_electrolyzer("[wind, electrolyzer, electricity, cable]");
    let plant = compile_plant(&project).unwrap();
    let cable = "wind_to_electrolyzer_electricity_cable";
    assert_eq!(plant.graph().edges().len(), 2);
    assert_eq!(plant.order(), vec!["wind", cable, "electrolyzer"]);
    assert!(plant.graph().edges().iter().all(|e| e.via.is_some()));

    let results = no_cache().run(&project, None).unwrap().results;
    let wind = results.get("wind", "electricity").unwrap();
    assert_eq!(results.get(cable, "electricity_output"), Some(wind));
    assert_eq!(results.input("electrolyzer", "electricity"), Some(wind));
}

#[test]
fn lossy_cable_scales_delivery() {
    let mut project = wind_electrolyzer("[wind, electrolyzer, electricity, cable]");
    project.plant.transport.insert(
        "cable".into(),
        pf_project::TransportDef { loss_fraction: 0.1 },
    );
    let results = no_cache().run(&project, None).unwrap().results;
    let sent = results.get("wind", "electricity").unwrap().total();
    let received = results.input("electrolyzer", "electricity").unwrap().total();
    assert!((received - 0.9 * sent).abs() < 1e-6 * sent.max(1.0));
}

#[test]
fn aggregator_compounds_costs_to_plant_year() {
    let project = parse_yaml(
        r#"
name: three costed technologies
technologies:
  - name: wind
    performance_model: {model: wind_plant}
    cost_model: {model: wind_plant}
  - name: electrolyzer
    performance_model: {model: dummy_electrolyzer}
    cost_model: {model: dummy_electrolyzer}
  - name: ammonia
    performance_model: {model: ammonia}
    cost_model: {model: ammonia}
    details:
      plant_capacity_kgpy: 1.0e7
      capacity_factor: 0.9
plant:
  cost_year: 2025
  technology_interconnections:
    - [wind, electrolyzer, electricity]
    - [electrolyzer, ammonia, hydrogen]
  finance_parameters:
    costing_general_inflation: 0.025
    discount_years:
      wind: 2020
      electrolyzer: 2022
      ammonia: 2025
"#,
    )
    .unwrap();

    let plant = compile_plant(&project).unwrap();
    assert_eq!(plant.order().last(), Some(&"plant_financials"));

    let results = no_cache().run(&project, None).unwrap().results;
    let years = [("wind", 2020), ("electrolyzer", 2022), ("ammonia", 2025)];
    let compound = |name: &str, port: &str, year: i32| {
        results.scalar(name, port).unwrap() * 1.025_f64.powi(2025 - year)
    };
    let capex: f64 = years.iter().map(|(n, y)| compound(n, "CapEx", *y)).sum();
    let opex: f64 = years.iter().map(|(n, y)| compound(n, "OpEx", *y)).sum();

    let total_capex = results.total_capex().unwrap();
    let total_opex = results.total_opex().unwrap();
    assert!((total_capex - capex).abs() <= 1e-9 * capex.abs().max(1.0));
    assert!((total_opex - opex).abs() <= 1e-9 * opex.abs().max(1.0));
}

#[test]
fn produced_commodity_is_priced_without_explicit_key() {
    let project = parse_yaml(
        r#"
name: implicit commodity
technologies:
  - name: wind
    performance_model: {model: wind_plant}
    cost_model: {model: wind_plant}
  - name: electrolyzer
    performance_model: {model: pem_electrolyzer}
    cost_model: {model: pem_electrolyzer}
    details:
      cluster_size_mw: 10
plant:
  technology_interconnections:
    - [wind, electrolyzer, electricity]
  finance_parameters:
    costing_general_inflation: 0.025
"#,
    )
    .unwrap();

    let plant = compile_plant(&project).unwrap();
    let graph = plant.graph();
    let electrolyzer = graph.node_id("electrolyzer").unwrap();
    let aggregator = graph.node_id("plant_financials").unwrap();
    assert!(graph.edges().iter().any(|e| {
        e.source.node == electrolyzer
            && e.source.port == "total_hydrogen_produced"
            && e.dest.node == aggregator
            && e.dest.port == "total_hydrogen_produced"
    }));

    let results = no_cache().run(&project, None).unwrap().results;
    let lcoh = results.levelized_cost().unwrap();
    assert!(lcoh.is_finite() && lcoh > 0.0);
}

#[test]
fn costs_without_producer_skip_levelized_cost() {
    let project = parse_yaml(
        r#"
name: wind only
technologies:
  - name: wind
    performance_model: {model: wind_plant}
    cost_model: {model: wind_plant}
plant:
  finance_parameters: {}
"#,
    )
    .unwrap();
    let results = no_cache().run(&project, None).unwrap().results;
    assert!(results.total_capex().unwrap() > 0.0);
    assert_eq!(results.levelized_cost(), None);
}

#[test]
fn commodity_is_priced_when_produced() {
    let project = parse_yaml(
        r#"
name: priced hydrogen
technologies:
  - name: wind
    performance_model: {model: wind_plant}
    cost_model: {model: wind_plant}
  - name: electrolyzer
    performance_model: {model: pem_electrolyzer}
    cost_model: {model: pem_electrolyzer}
    details:
      cluster_size_mw: 10
plant:
  plant_life: 20
  technology_interconnections:
    - [wind, electrolyzer, electricity]
  finance_parameters:
    commodity: hydrogen
"#,
    )
    .unwrap();
    let results = no_cache().run(&project, None).unwrap().results;
    let lcoh = results.levelized_cost().unwrap();
    assert!(lcoh.is_finite() && lcoh > 0.0);
    match results.get("plant_financials", "net_cash_flow") {
        Some(Value::Series(flows)) => assert_eq!(flows.len(), 21),
        other => panic!("unexpected net cash flow {:?}", other),
    }
    // The technology-level financial stage still runs inside the node.
    assert!(results.scalar("electrolyzer", "LCOH").is_some());
}

#[test]
fn cached_hybrid_plant_hits_on_second_run() {
    let project = parse_yaml(
        r#"
name: cached hybrid
technologies:
  - name: hybrid
    performance_model: {model: hybrid_plant}
    details:
      wind_capacity_kw: 5000
      solar_capacity_kw: 2000
plant:
  plant_life: 25
"#,
    )
    .unwrap();
    let dir = unique_temp_dir("hybrid");
    let engine = Engine::new(EngineOptions::default().with_cache_dir(&dir));

    let first = engine.run(&project, None).unwrap();
    assert_eq!(first.results.cache_misses(), 1);
    assert_eq!(first.results.cache_hits(), 0);
    assert_eq!(first.cache_dir.as_deref(), Some(dir.as_path()));

    let second = engine.run(&project, None).unwrap();
    assert_eq!(second.results.cache_hits(), 1);
    assert_eq!(second.results.cache_misses(), 0);
    assert_eq!(first.results.node("hybrid"), second.results.node("hybrid"));

    // A different lifetime is a different scenario.
    let mut longer = project.clone();
    longer.plant.plant_life = 30;
    let third = engine.run(&longer, None).unwrap();
    assert_eq!(third.results.cache_misses(), 1);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn project_local_cache_sits_beside_project() {
    let dir = unique_temp_dir("project");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("hybrid.yaml");
    std::fs::write(
        &path,
        r#"
name: local cache
technologies:
  - name: hybrid
    performance_model: {model: hybrid_plant}
    details:
      solar_capacity_kw: 1000
plant: {}
"#,
    )
    .unwrap();

    let first = pf_app::run_project(&path, EngineOptions::default()).unwrap();
    assert_eq!(first.cache_dir, Some(dir.join(".plantflow").join("cache")));
    let listed = pf_app::list_cache(&path, &EngineOptions::default()).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].namespace, "hybrid_plant/hybrid");

    let second = pf_app::run_project(&path, EngineOptions::default()).unwrap();
    assert_eq!(second.results.cache_hits(), 1);
    assert_eq!(pf_app::clear_cache(&path, &EngineOptions::default()).unwrap(), 1);

    let uncached = pf_app::run_project(&path, EngineOptions::default().without_cache()).unwrap();
    assert_eq!(uncached.cache_dir, None);
    assert_eq!(uncached.results.cache_misses(), 0);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn feedstock_supplies_electrolyzer() {
    let project = parse_yaml(
        r#"
name: grid hydrogen
technologies:
  - name: grid
    feedstocks:
      - {name: electricity, units: MW, rate: 2.0, price_per_unit: 0.05}
  - name: electrolyzer
    performance_model: {model: pem_electrolyzer}
    details:
      cluster_size_mw: 1.0
plant:
  technology_interconnections:
    - [grid, electrolyzer, electricity]
"#,
    )
    .unwrap();
    let results = no_cache().run(&project, None).unwrap().results;
    // 2 MW arrives as 2000 kW
    match results.input("electrolyzer", "electricity") {
        Some(Value::Series(power)) => {
            assert_eq!(power.len(), HOURS_PER_YEAR);
            assert!(power.iter().all(|p| (p - 2000.0).abs() < 1e-9));
        }
        other => panic!("unexpected input {:?}", other),
    }
}

#[test]
fn configuration_order_does_not_fix_schedule() {
    let project = parse_yaml(
        r#"
name: reversed
technologies:
  - name: electrolyzer
    performance_model: {model: dummy_electrolyzer}
  - name: grid
    feedstocks:
      - {name: electricity, units: kW, rate: 100.0}
plant:
  technology_interconnections:
    - [grid, electrolyzer, electricity]
"#,
    )
    .unwrap();
    let results = no_cache().run(&project, None).unwrap().results;
    assert_eq!(results.order(), ["grid", "electrolyzer"]);
}

#[test]
fn connection_to_missing_port_is_invalid() {
    let err = no_cache()
        .run(&wind_electrolyzer("[wind, electrolyzer, hydrogen]"), None)
        .err()
        .unwrap();
    assert!(matches!(err, AppError::InvalidConnection { .. }));
}

#[test]
fn demo_projects_assemble_and_run() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos");
    for name in ["wind_electrolyzer.yaml", "wind_ammonia.yaml", "hybrid_h2.yaml"] {
        let path = root.join(name);
        let response = pf_app::run_project(&path, EngineOptions::default().without_cache())
            .unwrap_or_else(|e| panic!("{}: {}", name, e));
        assert!(!response.results.order().is_empty(), "{}", name);
    }
}

#[test]
fn combiner_joins_two_feeds() {
    let yaml = |extra: &str| {
        format!(
            r#"
name: combined supply
technologies:
  - name: wind
    performance_model: {{model: dummy_wind_turbine}}
  - name: grid
    feedstocks:
      - {{name: electricity, units: kW, rate: 250.0}}
  - name: combiner
    performance_model: {{model: combiner}}
  - name: electrolyzer
    performance_model: {{model: pem_electrolyzer}}
    details:
      cluster_size_mw: 1.0
plant:
  technology_interconnections:
    - [wind, combiner, electricity]
    - [grid, combiner, electricity]
    - [combiner, electrolyzer, electricity, cable]
{extra}"#
        )
    };
    let project = parse_yaml(&yaml("")).unwrap();
    let plant = compile_plant(&project).unwrap();
    assert_eq!(
        plant.order(),
        vec![
            "wind",
            "grid",
            "combiner",
            "combiner_to_electrolyzer_electricity_cable",
            "electrolyzer"
        ]
    );

    let results = no_cache().run(&project, None).unwrap().results;
    let (Some(Value::Series(wind)), Some(Value::Series(combined))) = (
        results.get("wind", "electricity"),
        results.get("combiner", "electricity_output"),
    ) else {
        panic!("expected hourly series");
    };
    assert_eq!(combined.len(), HOURS_PER_YEAR);
    for (c, w) in combined.iter().zip(wind) {
        assert!((c - (w + 250.0)).abs() < 1e-9);
    }
    assert_eq!(
        results.input("electrolyzer", "electricity"),
        results.get("combiner", "electricity_output")
    );

    // Both combiner inputs are taken; a third feed has nowhere to land.
    let crowded = parse_yaml(&yaml("    - [wind, combiner, electricity]\n")).unwrap();
    assert!(matches!(
        compile_plant(&crowded).err(),
        Some(AppError::InvalidConnection { .. })
    ));
}
