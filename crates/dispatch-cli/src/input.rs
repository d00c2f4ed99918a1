//! Reading catalog snapshots, request batches and query conditions.

use anyhow::{bail, Context, Result};
use dispatch_core::{Catalog, DeliveryRequest, QueryCondition};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("reading {what} from {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {what} in {}", path.display()))
}

pub fn read_catalog(path: &Path) -> Result<Catalog> {
    read_json(path, "catalog")
}

pub fn read_requests(path: &Path) -> Result<Vec<DeliveryRequest>> {
    read_json(path, "delivery requests")
}

/// Problems in a catalog that the planner would silently work around.
pub fn catalog_problems(catalog: &Catalog) -> Vec<String> {
    let mut problems = Vec::new();
    for area in &catalog.restricted_areas {
        for problem in area.validate() {
            problems.push(format!("restricted area {:?}: {}", area.name, problem));
        }
    }
    for point in &catalog.service_points {
        for problem in point.location.validate() {
            problems.push(format!("service point {}: {}", point.id, problem));
        }
    }
    for binding in &catalog.service_point_drones {
        if !catalog
            .service_points
            .iter()
            .any(|point| point.id == binding.service_point_id)
        {
            problems.push(format!(
                "drones bound to unknown service point {}",
                binding.service_point_id
            ));
        }
    }
    problems
}

const OPERATOR_CHARS: &[char] = &['<', '>', '!', '='];

/// Split `capacity>=4` into attribute, operator and value.
pub fn parse_condition(raw: &str) -> Result<QueryCondition> {
    let Some(start) = raw.find(OPERATOR_CHARS) else {
        bail!("condition {raw:?} has no comparison operator");
    };
    let rest = &raw[start..];
    let length = rest.find(|c| !OPERATOR_CHARS.contains(&c)).unwrap_or(rest.len());

    let attribute = raw[..start].trim();
    let operator = &rest[..length];
    let value = rest[length..].trim();
    if attribute.is_empty() || value.is_empty() {
        bail!("condition {raw:?} must look like attribute<op>value");
    }
    Ok(QueryCondition::new(attribute, operator, value))
}
