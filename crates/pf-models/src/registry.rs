//! Model registry: a closed set of model kinds, each with a factory per
//! capability it supports.

use core::fmt;
use core::str::FromStr;

use pf_core::Dimension;
use pf_graph::TechnologyKind;

use crate::ammonia::{AmmoniaCost, AmmoniaPerformance};
use crate::electrolyzer::{
    DummyElectrolyzerCost, DummyElectrolyzerPerformance, PemCost, PemFinancial, PemPerformance,
};
use crate::error::{ModelResult, RegistryError, RegistryResult};
use crate::hybrid::HybridPlant as HybridPlantModel;
use crate::steel::{SteelCost, SteelPerformance};
use crate::storage::{TankCost, TankPerformance};
use crate::traits::{ModelContext, SubModel};
use crate::transport::{PowerCombiner, TransportLink};
use crate::wind::{DummyTurbineCost, DummyTurbinePerformance, WindPlantCost, WindPlantPerformance};

/// Role a sub-model plays inside its technology node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Performance,
    Cost,
    Financial,
    /// Pass-through link inserted on a connection.
    Transport,
    /// Inseparable performance + cost + financial model.
    Composite,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Performance => "performance",
            Capability::Cost => "cost",
            Capability::Financial => "financial",
            Capability::Transport => "transport",
            Capability::Composite => "composite",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Factory producing one sub-model instance.
pub type Constructor = fn(&ModelContext) -> ModelResult<Box<dyn SubModel>>;

fn boxed<M: SubModel + 'static>(model: ModelResult<M>) -> ModelResult<Box<dyn SubModel>> {
    model.map(|m| Box::new(m) as Box<dyn SubModel>)
}

/// Every model kind the engine can instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    DummyWindTurbine,
    WindPlant,
    PemElectrolyzer,
    DummyElectrolyzer,
    HydrogenTank,
    Ammonia,
    Steel,
    HybridPlant,
    Cable,
    Pipe,
    Combiner,
}

impl ModelKind {
    pub const ALL: [ModelKind; 11] = [
        ModelKind::DummyWindTurbine,
        ModelKind::WindPlant,
        ModelKind::PemElectrolyzer,
        ModelKind::DummyElectrolyzer,
        ModelKind::HydrogenTank,
        ModelKind::Ammonia,
        ModelKind::Steel,
        ModelKind::HybridPlant,
        ModelKind::Cable,
        ModelKind::Pipe,
        ModelKind::Combiner,
    ];

    /// Identifier used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::DummyWindTurbine => "dummy_wind_turbine",
            ModelKind::WindPlant => "wind_plant",
            ModelKind::PemElectrolyzer => "pem_electrolyzer",
            ModelKind::DummyElectrolyzer => "dummy_electrolyzer",
            ModelKind::HydrogenTank => "hydrogen_tank",
            ModelKind::Ammonia => "ammonia",
            ModelKind::Steel => "steel",
            ModelKind::HybridPlant => "hybrid_plant",
            ModelKind::Cable => "cable",
            ModelKind::Pipe => "pipe",
            ModelKind::Combiner => "combiner",
        }
    }

    /// Node role of technologies built from this kind.
    pub fn technology_kind(self) -> TechnologyKind {
        match self {
            ModelKind::HydrogenTank => TechnologyKind::Storage,
            ModelKind::Cable | ModelKind::Pipe | ModelKind::Combiner => TechnologyKind::Transport,
            _ => TechnologyKind::Converter,
        }
    }

    /// Quantity dimension a transport kind can carry.
    pub fn carries(self) -> Option<Dimension> {
        match self {
            ModelKind::Cable => Some(Dimension::Power),
            ModelKind::Pipe => Some(Dimension::MassRate),
            _ => None,
        }
    }

    /// Factory for `capability`, if this kind provides it.
    pub fn constructor(self, capability: Capability) -> Option<Constructor> {
        use Capability::*;
        use ModelKind::*;

        let ctor: Constructor = match (self, capability) {
            (DummyWindTurbine, Performance) => |c| boxed(DummyTurbinePerformance::from_context(c)),
            (DummyWindTurbine, Cost) => |c| boxed(DummyTurbineCost::from_context(c)),
            (WindPlant, Performance) => |c| boxed(WindPlantPerformance::from_context(c)),
            (WindPlant, Cost) => |c| boxed(WindPlantCost::from_context(c)),
            (PemElectrolyzer, Performance) => |c| boxed(PemPerformance::from_context(c)),
            (PemElectrolyzer, Cost) => |c| boxed(PemCost::from_context(c)),
            (PemElectrolyzer, Financial) => |c| boxed(PemFinancial::from_context(c)),
            (DummyElectrolyzer, Performance) => {
                |c| boxed(DummyElectrolyzerPerformance::from_context(c))
            }
            (DummyElectrolyzer, Cost) => |c| boxed(DummyElectrolyzerCost::from_context(c)),
            (HydrogenTank, Performance) => |c| boxed(TankPerformance::from_context(c)),
            (HydrogenTank, Cost) => |c| boxed(TankCost::from_context(c)),
            (Ammonia, Performance) => |c| boxed(AmmoniaPerformance::from_context(c)),
            (Ammonia, Cost) => |c| boxed(AmmoniaCost::from_context(c)),
            (Steel, Performance) => |c| boxed(SteelPerformance::from_context(c)),
            (Steel, Cost) => |c| boxed(SteelCost::from_context(c)),
            (HybridPlant, Composite) => |c| boxed(HybridPlantModel::from_context(c)),
            (Cable, Transport) => |c| boxed(TransportLink::cable(c)),
            (Pipe, Transport) => |c| boxed(TransportLink::pipe(c)),
            (Combiner, Performance) => |c| boxed(PowerCombiner::from_context(c)),
            _ => return None,
        };
        Some(ctor)
    }

    /// Capabilities this kind provides, in canonical order.
    pub fn capabilities(self) -> Vec<Capability> {
        [
            Capability::Performance,
            Capability::Cost,
            Capability::Financial,
            Capability::Transport,
            Capability::Composite,
        ]
        .into_iter()
        .filter(|c| self.constructor(*c).is_some())
        .collect()
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        ModelKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == key)
            .ok_or_else(|| RegistryError::UnknownModel {
                model: key.to_string(),
            })
    }
}

/// Resolve a configured model identifier to the factory for `capability`.
///
/// Fails with [`RegistryError::UnknownModel`] when the identifier is not a
/// known kind and with [`RegistryError::UnsupportedCapability`] when the kind
/// exists but lacks the capability.
pub fn resolve(model: &str, capability: Capability) -> RegistryResult<Constructor> {
    let kind: ModelKind = model.parse()?;
    kind.constructor(capability)
        .ok_or_else(|| RegistryError::UnsupportedCapability {
            model: kind.as_str().to_string(),
            capability,
        })
}

/// Like [`resolve`], but a known kind without the capability yields `None`.
///
/// Unknown identifiers are still an error.
pub fn resolve_optional(model: &str, capability: Capability) -> RegistryResult<Option<Constructor>> {
    match resolve(model, capability) {
        Ok(ctor) => Ok(Some(ctor)),
        Err(RegistryError::UnsupportedCapability { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}
