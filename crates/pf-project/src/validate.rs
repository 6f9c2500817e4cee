//! Project validation logic.

use std::collections::HashSet;

use pf_core::Unit;

use crate::schema::{FinanceParameters, PlantDef, Project, TechnologyDef};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Structural checks that need no model knowledge.
///
/// Interconnection arity and model identifiers are checked later, during
/// plant assembly, where they map to their own error kinds.
pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version > crate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }
    if project.name.trim().is_empty() {
        return Err(invalid("name", "", "project name must not be empty"));
    }

    let mut names = HashSet::new();
    for tech in &project.technologies {
        if !names.insert(tech.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: tech.name.clone(),
                context: "technologies".to_string(),
            });
        }
        validate_technology(tech)?;
    }

    validate_plant(&project.plant, &names)
}

fn validate_technology(tech: &TechnologyDef) -> Result<(), ValidationError> {
    if tech.name.trim().is_empty() {
        return Err(invalid("technology name", "", "must not be empty"));
    }
    let context = |slot: &str| format!("technology '{}' {}", tech.name, slot);

    match (&tech.performance_model, tech.feedstocks.is_empty()) {
        (Some(_), false) => {
            return Err(invalid(
                context("feedstocks"),
                tech.feedstocks.len(),
                "a modelled technology cannot also list feedstocks",
            ));
        }
        (None, true) => {
            if tech.cost_model.is_some() || tech.financial_model.is_some() {
                return Err(ValidationError::MissingReference {
                    id: "performance_model".to_string(),
                    context: tech.name.clone(),
                });
            }
            return Err(invalid(
                context("definition"),
                "none",
                "needs a performance_model or a feedstocks list",
            ));
        }
        _ => {}
    }

    for (slot, model) in [
        ("performance_model", &tech.performance_model),
        ("cost_model", &tech.cost_model),
        ("financial_model", &tech.financial_model),
    ] {
        if let Some(m) = model
            && m.model.trim().is_empty()
        {
            return Err(invalid(context(slot), "", "model identifier must not be empty"));
        }
    }

    let mut feedstock_names = HashSet::new();
    for feed in &tech.feedstocks {
        if !feedstock_names.insert(feed.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: feed.name.clone(),
                context: context("feedstocks"),
            });
        }
        if feed.units.parse::<Unit>().is_err() {
            return Err(invalid(
                context(&format!("feedstock '{}' units", feed.name)),
                &feed.units,
                "unknown unit",
            ));
        }
        if !feed.rate.is_finite() || feed.rate < 0.0 {
            return Err(invalid(
                context(&format!("feedstock '{}' rate", feed.name)),
                feed.rate,
                "must be finite and non-negative",
            ));
        }
        if !feed.price_per_unit.is_finite() {
            return Err(invalid(
                context(&format!("feedstock '{}' price_per_unit", feed.name)),
                feed.price_per_unit,
                "must be finite",
            ));
        }
    }
    Ok(())
}

fn validate_plant(plant: &PlantDef, techs: &HashSet<&str>) -> Result<(), ValidationError> {
    if plant.plant_life == 0 {
        return Err(invalid("plant.plant_life", 0, "must be at least one year"));
    }

    if let Some(site) = &plant.site {
        if !(-90.0..=90.0).contains(&site.latitude) {
            return Err(invalid("plant.site.latitude", site.latitude, "out of range"));
        }
        if !(-180.0..=180.0).contains(&site.longitude) {
            return Err(invalid("plant.site.longitude", site.longitude, "out of range"));
        }
        if !site.elevation_m.is_finite() {
            return Err(invalid("plant.site.elevation_m", site.elevation_m, "must be finite"));
        }
    }

    // Arity is the resolver's concern; only references of well-formed
    // entries are checked here.
    for connection in &plant.technology_interconnections {
        if !(3..=4).contains(&connection.len()) {
            continue;
        }
        for tech in &connection[..2] {
            if !techs.contains(tech.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: tech.clone(),
                    context: format!("technology_interconnections {:?}", connection),
                });
            }
        }
    }

    for (kind, transport) in &plant.transport {
        let lf = transport.loss_fraction;
        if !(0.0..1.0).contains(&lf) {
            return Err(invalid(
                format!("plant.transport.{}.loss_fraction", kind),
                lf,
                "must be in [0, 1)",
            ));
        }
    }

    if let Some(finance) = &plant.finance_parameters {
        validate_finance(finance, techs)?;
    }
    Ok(())
}

fn validate_finance(
    finance: &FinanceParameters,
    techs: &HashSet<&str>,
) -> Result<(), ValidationError> {
    let field = |name: &str| format!("plant.finance_parameters.{}", name);

    for (name, rate) in [
        ("costing_general_inflation", finance.costing_general_inflation),
        ("discount_rate", finance.discount_rate),
        ("fixed_cost_escalation", finance.fixed_cost_escalation),
    ] {
        if !rate.is_finite() || rate <= -1.0 {
            return Err(invalid(field(name), rate, "must be finite and above -1"));
        }
    }
    if !(0.0..1.0).contains(&finance.tax_rate) {
        return Err(invalid(field("tax_rate"), finance.tax_rate, "must be in [0, 1)"));
    }

    for tech in finance.discount_years.keys() {
        if !techs.contains(tech.as_str()) {
            return Err(ValidationError::MissingReference {
                id: tech.clone(),
                context: field("discount_years"),
            });
        }
    }

    let dep = &finance.depreciation;
    if dep.canonical_method().is_none() {
        return Err(invalid(
            field("depreciation.method"),
            &dep.method,
            "expected straight_line or macrs",
        ));
    }
    if dep.period == 0 {
        return Err(invalid(field("depreciation.period"), 0, "must be positive"));
    }

    if let Some(commodity) = &finance.commodity
        && commodity.trim().is_empty()
    {
        return Err(invalid(field("commodity"), "", "must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::*;

    fn project() -> Project {
        Project {
            version: 1,
            name: "test".into(),
            description: None,
            technologies: vec![
                TechnologyDef {
                    name: "wind".into(),
                    performance_model: Some(ModelRef::new("dummy_wind_turbine")),
                    cost_model: None,
                    financial_model: None,
                    feedstocks: vec![],
                    details: serde_yaml::Value::Null,
                },
                TechnologyDef {
                    name: "electrolyzer".into(),
                    performance_model: Some(ModelRef::new("pem_electrolyzer")),
                    cost_model: Some(ModelRef::new("pem_electrolyzer")),
                    financial_model: None,
                    feedstocks: vec![],
                    details: serde_yaml::Value::Null,
                },
            ],
            plant: PlantDef {
                technology_interconnections: vec![vec![
                    "wind".into(),
                    "electrolyzer".into(),
                    "electricity".into(),
                ]],
                ..Default::default()
            },
        }
    }

    #[test]
    fn valid_project_passes() {
        validate_project(&project()).unwrap();
    }

    #[test]
    fn duplicate_technology_rejected() {
        let mut p = project();
        p.technologies.push(p.technologies[0].clone());
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn bad_arity_left_to_assembly() {
        let mut p = project();
        p.plant
            .technology_interconnections
            .push(vec!["wind".into(), "nowhere".into()]);
        validate_project(&p).unwrap();
    }

    #[test]
    fn unknown_connection_endpoint_rejected() {
        let mut p = project();
        p.plant.technology_interconnections[0][1] = "tank".into();
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::MissingReference { .. })
        ));
    }

    #[test]
    fn discount_year_for_unknown_technology_rejected() {
        let mut p = project();
        let mut finance = FinanceParameters::default();
        finance.discount_years.insert("steel".into(), 2020);
        p.plant.finance_parameters = Some(finance);
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::MissingReference { .. })
        ));
    }

    #[test]
    fn depreciation_method_ignores_case() {
        let mut p = project();
        let mut finance = FinanceParameters::default();
        for method in ["MACRS", "Straight_Line", "straight-line", "SL"] {
            finance.depreciation.method = method.into();
            p.plant.finance_parameters = Some(finance.clone());
            validate_project(&p).unwrap();
        }

        finance.depreciation.method = "double_declining".into();
        p.plant.finance_parameters = Some(finance);
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn zero_life_rejected() {
        let mut p = project();
        p.plant.plant_life = 0;
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn empty_technology_rejected() {
        let mut p = project();
        p.technologies[0].performance_model = None;
        assert!(validate_project(&p).is_err());
    }

    #[test]
    fn feedstock_units_checked() {
        let mut p = project();
        p.technologies.push(TechnologyDef {
            name: "grid".into(),
            performance_model: None,
            cost_model: None,
            financial_model: None,
            feedstocks: vec![FeedstockDef {
                name: "electricity".into(),
                units: "horsepower".into(),
                rate: 1.0,
                price_per_unit: 0.05,
            }],
            details: serde_yaml::Value::Null,
        });
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::InvalidValue { .. })
        ));
    }
}
