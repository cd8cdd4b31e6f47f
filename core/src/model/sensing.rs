//! The built-in SensorThings sensing model.

use super::entity::{ComplexType, ValueType};
use super::id::IdKind;
use super::registry::{EntityTypeDef, LinkEnd, ModelBuilder, ModelError, ModelPlugin, ModelRegistry};

const UNIT_OF_MEASUREMENT: &str = "UnitOfMeasurement";

fn unit_of_measurement() -> ValueType {
    ValueType::Complex(UNIT_OF_MEASUREMENT.into())
}

/// Things, Locations, Datastreams and the rest of the sensing core.
pub struct SensingCore {
    pub id_kind: IdKind,
}

impl SensingCore {
    pub fn new(id_kind: IdKind) -> Self {
        Self { id_kind }
    }

    fn entity(&self, name: &str, plural: &str) -> EntityTypeDef {
        EntityTypeDef::new(name, plural).key("id", self.id_kind)
    }
}

impl ModelPlugin for SensingCore {
    fn name(&self) -> &str {
        "sensing_core"
    }

    fn register(&self, builder: &mut ModelBuilder) -> Result<(), ModelError> {
        builder.add_complex_type(
            ComplexType::new(UNIT_OF_MEASUREMENT)
                .field("name", ValueType::String)
                .field("symbol", ValueType::String)
                .field("definition", ValueType::String),
        )?;

        builder
            .add_entity_type(
                self.entity("Thing", "Things")
                    .required("name", ValueType::String)
                    .required("description", ValueType::String)
                    .property("properties", ValueType::Object),
            )?
            .add_entity_type(
                self.entity("Location", "Locations")
                    .required("name", ValueType::String)
                    .required("description", ValueType::String)
                    .required("encodingType", ValueType::String)
                    .required("location", ValueType::Geometry)
                    .property("properties", ValueType::Object),
            )?
            .add_entity_type(
                self.entity("HistoricalLocation", "HistoricalLocations")
                    .required("time", ValueType::TimeInstant),
            )?
            .add_entity_type(
                self.entity("Datastream", "Datastreams")
                    .required("name", ValueType::String)
                    .required("description", ValueType::String)
                    .required("observationType", ValueType::String)
                    .required("unitOfMeasurement", unit_of_measurement())
                    .property("observedArea", ValueType::Geometry)
                    .property("phenomenonTime", ValueType::TimeInterval)
                    .property("resultTime", ValueType::TimeInterval)
                    .property("properties", ValueType::Object),
            )?
            .add_entity_type(
                self.entity("Sensor", "Sensors")
                    .required("name", ValueType::String)
                    .required("description", ValueType::String)
                    .required("encodingType", ValueType::String)
                    .required("metadata", ValueType::Any)
                    .property("properties", ValueType::Object),
            )?
            .add_entity_type(
                self.entity("ObservedProperty", "ObservedProperties")
                    .required("name", ValueType::String)
                    .required("definition", ValueType::String)
                    .required("description", ValueType::String)
                    .property("properties", ValueType::Object),
            )?
            .add_entity_type(
                self.entity("Observation", "Observations")
                    .required("phenomenonTime", ValueType::TimeValue)
                    .property("resultTime", ValueType::TimeInstant)
                    .required("result", ValueType::Any)
                    .property("resultQuality", ValueType::Any)
                    .property("validTime", ValueType::TimeInterval)
                    .property("parameters", ValueType::Object),
            )?
            .add_entity_type(
                self.entity("FeatureOfInterest", "FeaturesOfInterest")
                    .required("name", ValueType::String)
                    .required("description", ValueType::String)
                    .required("encodingType", ValueType::String)
                    .required("feature", ValueType::Geometry)
                    .property("properties", ValueType::Object),
            )?;

        builder
            .link(LinkEnd::many("Thing", "Locations"), LinkEnd::many("Location", "Things"))
            .link(
                LinkEnd::many("Thing", "HistoricalLocations"),
                LinkEnd::one("HistoricalLocation", "Thing").required(),
            )
            .link(
                LinkEnd::many("Location", "HistoricalLocations"),
                LinkEnd::many("HistoricalLocation", "Locations"),
            )
            .link(
                LinkEnd::many("Thing", "Datastreams"),
                LinkEnd::one("Datastream", "Thing").required(),
            )
            .link(
                LinkEnd::many("Sensor", "Datastreams"),
                LinkEnd::one("Datastream", "Sensor").required(),
            )
            .link(
                LinkEnd::many("ObservedProperty", "Datastreams"),
                LinkEnd::one("Datastream", "ObservedProperty").required(),
            )
            .link(
                LinkEnd::many("Datastream", "Observations"),
                LinkEnd::one("Observation", "Datastream").required(),
            )
            .link(
                LinkEnd::many("FeatureOfInterest", "Observations"),
                LinkEnd::one("Observation", "FeatureOfInterest").required(),
            );
        Ok(())
    }
}

/// Datastreams carrying several observed properties per observation.
/// Requires [`SensingCore`] to be applied first.
pub struct MultiDatastreams {
    pub id_kind: IdKind,
}

impl MultiDatastreams {
    pub fn new(id_kind: IdKind) -> Self {
        Self { id_kind }
    }
}

impl ModelPlugin for MultiDatastreams {
    fn name(&self) -> &str {
        "multi_datastream"
    }

    fn register(&self, builder: &mut ModelBuilder) -> Result<(), ModelError> {
        builder.add_entity_type(
            EntityTypeDef::new("MultiDatastream", "MultiDatastreams")
                .key("id", self.id_kind)
                .required("name", ValueType::String)
                .required("description", ValueType::String)
                .required(
                    "multiObservationDataTypes",
                    ValueType::List(Box::new(ValueType::String)),
                )
                .required(
                    "unitOfMeasurements",
                    ValueType::List(Box::new(unit_of_measurement())),
                )
                .property("observedArea", ValueType::Geometry)
                .property("phenomenonTime", ValueType::TimeInterval)
                .property("resultTime", ValueType::TimeInterval)
                .property("properties", ValueType::Object),
        )?;

        builder
            .link(
                LinkEnd::many("Thing", "MultiDatastreams"),
                LinkEnd::one("MultiDatastream", "Thing").required(),
            )
            .link(
                LinkEnd::many("Sensor", "MultiDatastreams"),
                LinkEnd::one("MultiDatastream", "Sensor").required(),
            )
            .link(
                LinkEnd::many("ObservedProperty", "MultiDatastreams"),
                LinkEnd::many("MultiDatastream", "ObservedProperties").required(),
            )
            .link(
                LinkEnd::many("MultiDatastream", "Observations"),
                LinkEnd::one("Observation", "MultiDatastream"),
            );
        Ok(())
    }
}

/// Builds the sensing core model with every key of the given kind.
pub fn sensing_model(id_kind: IdKind) -> Result<ModelRegistry, ModelError> {
    let mut builder = ModelBuilder::new();
    builder.apply(&SensingCore::new(id_kind))?;
    builder.finalize()
}
