//! Plant-level fan-in of technology costs.

use pf_core::{Shape, Unit};
use pf_graph::PortSpec;
use pf_models::{ModelError, ModelResult, PortValues, SubModel};
use tracing::{debug, info};

use crate::cashflow::{CapitalItem, CashFlowSpec, Depreciation, FixedCost};
use crate::inflation::to_cost_year;
use crate::solver::{DiscountedCashFlowSolver, PriceSolver};

/// Name of the aggregator node in every plant graph.
pub const AGGREGATOR_NAME: &str = "plant_financials";

pub fn capex_port(tech: &str) -> String {
    format!("capex_{}", tech)
}

pub fn opex_port(tech: &str) -> String {
    format!("opex_{}", tech)
}

pub fn produced_port(commodity: &str) -> String {
    format!("total_{}_produced", commodity)
}

/// A technology whose costs enter the plant totals.
#[derive(Debug, Clone, PartialEq)]
pub struct TechnologyCost {
    pub name: String,
    /// Year the technology's CapEx and OpEx are denominated in.
    pub cost_year: i32,
}

/// Plant-wide financial parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorConfig {
    pub plant_cost_year: i32,
    pub inflation_rate: f64,
    pub plant_life: u32,
    /// Primary commodity priced by the solver, e.g. `hydrogen`.
    pub commodity: Option<String>,
    pub discount_rate: f64,
    pub tax_rate: f64,
    pub depreciation: Depreciation,
    pub fixed_cost_escalation: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            plant_cost_year: 2022,
            inflation_rate: 0.0,
            plant_life: 30,
            commodity: None,
            discount_rate: 0.0824,
            tax_rate: 0.257,
            depreciation: Depreciation::default(),
            fixed_cost_escalation: 0.0,
        }
    }
}

/// Collects every technology's CapEx/OpEx, brings them to the plant cost
/// year and, when a commodity is configured, solves its levelized cost.
///
/// Inputs: `capex_{tech}` (USD), `opex_{tech}` (USD/year) and, with a
/// commodity, `total_{commodity}_produced` (kg per year).
/// Outputs: `capex_adjusted_{tech}`, `opex_adjusted_{tech}`,
/// `total_capex_adjusted`, `total_opex_adjusted` and, with a commodity,
/// `levelized_cost` (USD/kg) and `net_cash_flow` (one entry per year,
/// construction year first).
pub struct FinancialAggregator {
    technologies: Vec<TechnologyCost>,
    config: AggregatorConfig,
    solver: Box<dyn PriceSolver>,
}

impl FinancialAggregator {
    pub fn new(technologies: Vec<TechnologyCost>, config: AggregatorConfig) -> Self {
        Self::with_solver(technologies, config, Box::new(DiscountedCashFlowSolver))
    }

    pub fn with_solver(
        technologies: Vec<TechnologyCost>,
        config: AggregatorConfig,
        solver: Box<dyn PriceSolver>,
    ) -> Self {
        Self {
            technologies,
            config,
            solver,
        }
    }

    pub fn technologies(&self) -> &[TechnologyCost] {
        &self.technologies
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    fn adjust(&self, value: f64, tech: &TechnologyCost) -> f64 {
        to_cost_year(
            value,
            self.config.inflation_rate,
            tech.cost_year,
            self.config.plant_cost_year,
        )
    }

    fn cash_flow(&self, adjusted: &[(String, f64, f64)], produced: f64) -> CashFlowSpec {
        let cfg = &self.config;
        adjusted.iter().fold(
            CashFlowSpec::new(cfg.plant_life, produced, cfg.discount_rate, cfg.tax_rate),
            |spec, (tech, capex, opex)| {
                spec.with_capital(CapitalItem {
                    name: tech.clone(),
                    cost: *capex,
                    depreciation: cfg.depreciation,
                })
                .with_fixed_cost(FixedCost {
                    name: tech.clone(),
                    annual: *opex,
                    escalation: cfg.fixed_cost_escalation,
                })
            },
        )
    }
}

impl SubModel for FinancialAggregator {
    fn name(&self) -> &str {
        AGGREGATOR_NAME
    }

    fn declare_ports(&self) -> (Vec<PortSpec>, Vec<PortSpec>) {
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        for tech in &self.technologies {
            inputs.push(PortSpec::scalar(capex_port(&tech.name), Unit::Usd).with_default(0.0));
            inputs.push(
                PortSpec::scalar(opex_port(&tech.name), Unit::UsdPerYear).with_default(0.0),
            );
            outputs.push(PortSpec::scalar(
                format!("capex_adjusted_{}", tech.name),
                Unit::Usd,
            ));
            outputs.push(PortSpec::scalar(
                format!("opex_adjusted_{}", tech.name),
                Unit::UsdPerYear,
            ));
        }
        outputs.push(PortSpec::scalar("total_capex_adjusted", Unit::Usd));
        outputs.push(PortSpec::scalar("total_opex_adjusted", Unit::UsdPerYear));

        if let Some(commodity) = &self.config.commodity {
            inputs.push(PortSpec::scalar(produced_port(commodity), Unit::Kilogram));
            outputs.push(PortSpec::scalar("levelized_cost", Unit::UsdPerKilogram));
            outputs.push(PortSpec::new(
                "net_cash_flow",
                Unit::Usd,
                Shape::Series(self.config.plant_life as usize + 1),
            ));
        }
        (inputs, outputs)
    }

    fn evaluate(&mut self, inputs: &PortValues) -> ModelResult<PortValues> {
        let mut out = PortValues::new();
        let mut adjusted = Vec::with_capacity(self.technologies.len());
        let (mut total_capex, mut total_opex) = (0.0, 0.0);

        for tech in &self.technologies {
            let capex = self.adjust(inputs.scalar(&capex_port(&tech.name))?, tech);
            let opex = self.adjust(inputs.scalar(&opex_port(&tech.name))?, tech);
            debug!(tech = %tech.name, capex, opex, "adjusted technology costs");
            out.insert(format!("capex_adjusted_{}", tech.name), capex);
            out.insert(format!("opex_adjusted_{}", tech.name), opex);
            total_capex += capex;
            total_opex += opex;
            adjusted.push((tech.name.clone(), capex, opex));
        }
        out.insert("total_capex_adjusted", total_capex);
        out.insert("total_opex_adjusted", total_opex);

        if let Some(commodity) = &self.config.commodity {
            let produced = inputs.scalar(&produced_port(commodity))?;
            let spec = self.cash_flow(&adjusted, produced);
            let solution = self
                .solver
                .solve(&spec)
                .map_err(|e| ModelError::evaluation(format!("{} price: {}", commodity, e)))?;
            info!(
                commodity = %commodity,
                levelized_cost = solution.price,
                "solved levelized cost"
            );
            out.insert("levelized_cost", solution.price);
            out.insert("net_cash_flow", solution.net_cash_flows());
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn techs() -> Vec<TechnologyCost> {
        [("wind", 2020), ("electrolyzer", 2022), ("tank", 2025)]
            .into_iter()
            .map(|(name, cost_year)| TechnologyCost {
                name: name.into(),
                cost_year,
            })
            .collect()
    }

    #[test]
    fn adjusted_totals_compound_to_plant_year() {
        let config = AggregatorConfig {
            plant_cost_year: 2025,
            inflation_rate: 0.025,
            ..Default::default()
        };
        let mut agg = FinancialAggregator::new(techs(), config);
        let inputs = PortValues::new()
            .with("capex_wind", 100.0)
            .with("capex_electrolyzer", 200.0)
            .with("capex_tank", 300.0)
            .with("opex_wind", 10.0)
            .with("opex_electrolyzer", 20.0)
            .with("opex_tank", 30.0);
        let out = agg.evaluate(&inputs).unwrap();

        let r: f64 = 1.025;
        let capex = 100.0 * r.powi(5) + 200.0 * r.powi(3) + 300.0;
        let opex = 10.0 * r.powi(5) + 20.0 * r.powi(3) + 30.0;
        assert!((out.scalar("total_capex_adjusted").unwrap() - capex).abs() < 1e-9);
        assert!((out.scalar("total_opex_adjusted").unwrap() - opex).abs() < 1e-9);
        assert_eq!(out.scalar("capex_adjusted_tank").unwrap(), 300.0);
        assert!(!out.contains("levelized_cost"));
    }

    #[test]
    fn commodity_adds_price_ports() {
        let config = AggregatorConfig {
            commodity: Some("hydrogen".into()),
            plant_life: 20,
            ..Default::default()
        };
        let agg = FinancialAggregator::new(techs(), config);
        let (inputs, outputs) = agg.declare_ports();
        assert!(inputs.iter().any(|p| p.name == "total_hydrogen_produced"));
        let flow = outputs.iter().find(|p| p.name == "net_cash_flow").unwrap();
        assert_eq!(flow.shape, Shape::Series(21));
    }

    #[test]
    fn zero_production_is_evaluation_error() {
        let config = AggregatorConfig {
            commodity: Some("hydrogen".into()),
            ..Default::default()
        };
        let mut agg = FinancialAggregator::new(techs(), config);
        let inputs = techs()
            .iter()
            .flat_map(|t| [(capex_port(&t.name), 1.0), (opex_port(&t.name), 1.0)])
            .fold(PortValues::new(), |acc, (k, v)| acc.with(k, v))
            .with("total_hydrogen_produced", 0.0);
        assert!(matches!(
            agg.evaluate(&inputs),
            Err(ModelError::Evaluation { .. })
        ));
    }
}
