//! Fleet queries: attribute filters and availability checks over drones.

use crate::availability::AvailabilityIndex;
use crate::error::{Error, Result};
use crate::models::{DeliveryRequest, Drone, Requirements};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Ids of drones whose cooling support equals `state`.
pub fn drones_with_cooling(drones: &[Drone], state: bool) -> Vec<String> {
    drones
        .iter()
        .filter(|drone| drone.capability.cooling == state)
        .map(|drone| drone.id.clone())
        .collect()
}

pub fn drone_details<'a>(drones: &'a [Drone], id: &str) -> Option<&'a Drone> {
    drones.iter().find(|drone| drone.id == id)
}

/// Queryable drone attributes, by wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DroneAttribute {
    Id,
    Name,
    Cooling,
    Heating,
    Capacity,
    MaxMoves,
    CostPerMove,
    CostInitial,
    CostFinal,
}

impl DroneAttribute {
    pub const ALL: [DroneAttribute; 9] = [
        DroneAttribute::Id,
        DroneAttribute::Name,
        DroneAttribute::Cooling,
        DroneAttribute::Heating,
        DroneAttribute::Capacity,
        DroneAttribute::MaxMoves,
        DroneAttribute::CostPerMove,
        DroneAttribute::CostInitial,
        DroneAttribute::CostFinal,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            DroneAttribute::Id => "id",
            DroneAttribute::Name => "name",
            DroneAttribute::Cooling => "cooling",
            DroneAttribute::Heating => "heating",
            DroneAttribute::Capacity => "capacity",
            DroneAttribute::MaxMoves => "maxMoves",
            DroneAttribute::CostPerMove => "costPerMove",
            DroneAttribute::CostInitial => "costInitial",
            DroneAttribute::CostFinal => "costFinal",
        }
    }

    /// The attribute's value on `drone`.
    pub fn read(self, drone: &Drone) -> AttributeValue {
        let capability = &drone.capability;
        match self {
            DroneAttribute::Id => AttributeValue::Text(drone.id.clone()),
            DroneAttribute::Name => AttributeValue::Text(drone.name.clone()),
            DroneAttribute::Cooling => AttributeValue::Flag(capability.cooling),
            DroneAttribute::Heating => AttributeValue::Flag(capability.heating),
            DroneAttribute::Capacity => AttributeValue::Number(capability.capacity),
            DroneAttribute::MaxMoves => AttributeValue::Integer(i64::from(capability.max_moves)),
            DroneAttribute::CostPerMove => AttributeValue::Number(capability.cost_per_move),
            DroneAttribute::CostInitial => AttributeValue::Number(capability.cost_initial),
            DroneAttribute::CostFinal => AttributeValue::Number(capability.cost_final),
        }
    }

    /// Parse a query operand as this attribute's type.
    pub fn parse_value(self, raw: &str) -> Result<AttributeValue> {
        let invalid = |expected: &'static str| Error::InvalidQueryValue {
            attribute: self.wire_name().to_string(),
            value: raw.to_string(),
            expected,
        };
        let trimmed = raw.trim();
        match self {
            DroneAttribute::Id | DroneAttribute::Name => Ok(AttributeValue::Text(raw.to_string())),
            DroneAttribute::Cooling | DroneAttribute::Heating => {
                if trimmed.eq_ignore_ascii_case("true") {
                    Ok(AttributeValue::Flag(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Ok(AttributeValue::Flag(false))
                } else {
                    Err(invalid("boolean"))
                }
            }
            DroneAttribute::MaxMoves => trimmed
                .parse::<i64>()
                .map(AttributeValue::Integer)
                .map_err(|_| invalid("integer")),
            DroneAttribute::Capacity
            | DroneAttribute::CostPerMove
            | DroneAttribute::CostInitial
            | DroneAttribute::CostFinal => trimmed
                .parse::<f64>()
                .map(AttributeValue::Number)
                .map_err(|_| invalid("number")),
        }
    }
}

impl FromStr for DroneAttribute {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        DroneAttribute::ALL
            .into_iter()
            .find(|attribute| attribute.wire_name() == name)
            .ok_or_else(|| Error::UnknownAttribute {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for DroneAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Flag(bool),
    Integer(i64),
    Number(f64),
}

impl AttributeValue {
    /// Ordering between values of the same kind. Text and flags only
    /// support equality, so they never order.
    fn ordering(&self, other: &AttributeValue) -> Option<Ordering> {
        match (self, other) {
            (AttributeValue::Integer(a), AttributeValue::Integer(b)) => Some(a.cmp(b)),
            (AttributeValue::Number(a), AttributeValue::Number(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
}

impl Comparison {
    /// Evaluate `left OP right`.
    pub fn holds(self, left: &AttributeValue, right: &AttributeValue) -> bool {
        match self {
            Comparison::Equal => left == right,
            Comparison::NotEqual => left != right,
            Comparison::Less => left.ordering(right) == Some(Ordering::Less),
            Comparison::Greater => left.ordering(right) == Some(Ordering::Greater),
            Comparison::LessOrEqual => matches!(
                left.ordering(right),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Comparison::GreaterOrEqual => matches!(
                left.ordering(right),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    }
}

impl FromStr for Comparison {
    type Err = Error;

    fn from_str(operator: &str) -> Result<Self> {
        match operator {
            "=" => Ok(Comparison::Equal),
            "!=" => Ok(Comparison::NotEqual),
            "<" => Ok(Comparison::Less),
            ">" => Ok(Comparison::Greater),
            "<=" => Ok(Comparison::LessOrEqual),
            ">=" => Ok(Comparison::GreaterOrEqual),
            other => Err(Error::UnknownOperator {
                operator: other.to_string(),
            }),
        }
    }
}

/// A query condition as it arrives on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryCondition {
    pub attribute: String,
    pub operator: String,
    pub value: String,
}

impl QueryCondition {
    pub fn new(attribute: &str, operator: &str, value: &str) -> Self {
        Self {
            attribute: attribute.to_string(),
            operator: operator.to_string(),
            value: value.to_string(),
        }
    }
}

/// A parsed, type-checked condition.
#[derive(Debug, Clone, PartialEq)]
pub struct DroneFilter {
    pub attribute: DroneAttribute,
    pub comparison: Comparison,
    pub value: AttributeValue,
}

impl DroneFilter {
    pub fn parse(condition: &QueryCondition) -> Result<Self> {
        let attribute: DroneAttribute = condition.attribute.parse()?;
        let comparison: Comparison = condition.operator.parse()?;
        let value = attribute.parse_value(&condition.value)?;
        Ok(Self {
            attribute,
            comparison,
            value,
        })
    }

    pub fn matches(&self, drone: &Drone) -> bool {
        self.comparison
            .holds(&self.attribute.read(drone), &self.value)
    }
}

/// Ids of drones matching every condition.
///
/// Each condition reads `drone.attribute OP value`, so `capacity > 5` selects
/// drones holding more than 5. Services that put the value on the left
/// (`5 > capacity`) select the opposite set; that order is not reproduced.
///
/// All conditions are parsed up front so a malformed query fails even
/// against an empty fleet.
pub fn query(drones: &[Drone], conditions: &[QueryCondition]) -> Result<Vec<String>> {
    let filters = conditions
        .iter()
        .map(DroneFilter::parse)
        .collect::<Result<Vec<_>>>()?;

    Ok(drones
        .iter()
        .filter(|drone| filters.iter().all(|filter| filter.matches(drone)))
        .map(|drone| drone.id.clone())
        .collect())
}

fn meets_requirements(drone: &Drone, requirements: &Requirements) -> bool {
    let capability = &drone.capability;
    requirements.capacity <= capability.capacity
        && (!requirements.needs_cooling() || capability.cooling)
        && (!requirements.needs_heating() || capability.heating)
}

/// Ids of drones that could serve every request on its own.
///
/// Requests spanning more than one date yield an empty list.
pub fn query_available_drones(
    drones: &[Drone],
    index: &AvailabilityIndex,
    requests: &[DeliveryRequest],
) -> Vec<String> {
    let dates: HashSet<_> = requests.iter().map(|request| request.date).collect();
    if dates.len() > 1 {
        tracing::debug!("availability query spans {} dates", dates.len());
        return Vec::new();
    }

    drones
        .iter()
        .filter(|drone| {
            requests.iter().all(|request| {
                index.is_available(&drone.id, request.date, request.time)
                    && meets_requirements(drone, &request.requirements)
            })
        })
        .map(|drone| drone.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Availability, Capability, Coordinate, DayOfWeek, DroneAvailability, ServicePoint,
        ServicePointDrones,
    };
    use chrono::{NaiveDate, NaiveTime};

    fn drone(id: &str, cooling: bool, capacity: f64, max_moves: u32) -> Drone {
        Drone {
            id: id.to_string(),
            name: format!("Drone {id}"),
            capability: Capability {
                cooling,
                heating: !cooling,
                capacity,
                max_moves,
                cost_per_move: 0.01,
                cost_initial: 4.3,
                cost_final: 6.5,
            },
        }
    }

    fn fleet() -> Vec<Drone> {
        vec![
            drone("1", true, 4.0, 2000),
            drone("2", false, 8.0, 1000),
            drone("3", true, 12.0, 4000),
        ]
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn cooling_and_details_lookups() {
        let drones = fleet();
        assert_eq!(drones_with_cooling(&drones, true), ids(&["1", "3"]));
        assert_eq!(drones_with_cooling(&drones, false), ids(&["2"]));
        assert_eq!(drone_details(&drones, "2").map(|d| d.capability.capacity), Some(8.0));
        assert!(drone_details(&drones, "9").is_none());
    }

    #[test]
    fn numeric_conditions_read_drone_on_the_left() {
        let drones = fleet();
        let result = query(&drones, &[QueryCondition::new("capacity", ">", "5")]).unwrap();
        assert_eq!(result, ids(&["2", "3"]), "capacity > 5");

        let result = query(&drones, &[QueryCondition::new("capacity", "<", "5")]).unwrap();
        assert_eq!(result, ids(&["1"]), "capacity < 5");

        let result = query(
            &drones,
            &[
                QueryCondition::new("maxMoves", "<=", "2000"),
                QueryCondition::new("cooling", "=", "true"),
            ],
        )
        .unwrap();
        assert_eq!(result, ids(&["1"]));

        let result = query(&drones, &[QueryCondition::new("costFinal", "!=", "6.5")]).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn text_and_flag_attributes_only_support_equality() {
        let drones = fleet();
        assert_eq!(
            query(&drones, &[QueryCondition::new("id", "=", "3")]).unwrap(),
            ids(&["3"])
        );
        assert!(query(&drones, &[QueryCondition::new("name", "<", "Z")])
            .unwrap()
            .is_empty());
        assert!(query(&drones, &[QueryCondition::new("heating", ">=", "false")])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn malformed_conditions_are_errors() {
        let drones = fleet();
        assert!(matches!(
            query(&drones, &[QueryCondition::new("wingspan", "=", "3")]),
            Err(Error::UnknownAttribute { .. })
        ));
        assert!(matches!(
            query(&drones, &[QueryCondition::new("capacity", "~", "3")]),
            Err(Error::UnknownOperator { .. })
        ));
        assert!(matches!(
            query(&[], &[QueryCondition::new("maxMoves", "=", "many")]),
            Err(Error::InvalidQueryValue { .. })
        ));
        assert!(matches!(
            query(&drones, &[QueryCondition::new("cooling", "=", "yes")]),
            Err(Error::InvalidQueryValue { .. })
        ));
    }

    #[test]
    fn empty_conditions_match_every_drone() {
        assert_eq!(query(&fleet(), &[]).unwrap(), ids(&["1", "2", "3"]));
    }

    #[test]
    fn attribute_names_round_trip() {
        for attribute in DroneAttribute::ALL {
            assert_eq!(attribute.wire_name().parse::<DroneAttribute>().unwrap(), attribute);
        }
    }

    fn availability_index() -> AvailabilityIndex {
        let window = Availability {
            day_of_week: DayOfWeek::Monday,
            from: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            until: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        };
        AvailabilityIndex::new(
            &[ServicePoint {
                id: 1,
                name: "Appleton Tower".to_string(),
                location: Coordinate::new(-3.1863, 55.9446),
            }],
            &[ServicePointDrones {
                service_point_id: 1,
                drones: ["1", "2"]
                    .iter()
                    .map(|id| DroneAvailability {
                        id: id.to_string(),
                        availability: vec![window.clone()],
                    })
                    .collect(),
            }],
        )
    }

    fn dispatch(id: u32, day: u32, hour: u32, capacity: f64, cooling: bool) -> DeliveryRequest {
        DeliveryRequest {
            id,
            date: NaiveDate::from_ymd_opt(2025, 12, day).unwrap(),
            time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            requirements: Requirements {
                capacity,
                cooling: Some(cooling),
                heating: None,
                max_cost: None,
            },
            delivery: Coordinate::new(-3.19, 55.94),
        }
    }

    #[test]
    fn available_drones_meet_every_request() {
        let drones = fleet();
        let index = availability_index();

        let requests = [dispatch(1, 22, 10, 3.0, false), dispatch(2, 22, 12, 3.5, false)];
        assert_eq!(query_available_drones(&drones, &index, &requests), ids(&["1", "2"]));

        let requests = [dispatch(1, 22, 10, 6.0, false)];
        assert_eq!(
            query_available_drones(&drones, &index, &requests),
            ids(&["2"]),
            "drone 1 is too small, drone 3 is not stationed"
        );

        let requests = [dispatch(1, 22, 10, 1.0, true)];
        assert_eq!(query_available_drones(&drones, &index, &requests), ids(&["1"]));

        let requests = [dispatch(1, 22, 19, 1.0, false)];
        assert!(query_available_drones(&drones, &index, &requests).is_empty());
    }

    #[test]
    fn requests_over_several_dates_yield_nothing() {
        let requests = [dispatch(1, 22, 10, 1.0, false), dispatch(2, 29, 10, 1.0, false)];
        assert!(query_available_drones(&fleet(), &availability_index(), &requests).is_empty());
    }
}
