//! Regions and placement zones.

use super::Identified;

/// Region derived from the identity service catalog.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Region {
    id: String,
}

impl Region {
    pub(crate) const fn new(id: String) -> Self {
        Self { id }
    }

    /// Region name; identical to the id on catalog-derived regions.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.id
    }

    /// Returns a placement zone value scoped to this region.
    #[must_use]
    pub fn zone(&self, zone: impl Into<String>) -> PlacementZone {
        PlacementZone::new(zone, Some(self.id.as_str()))
    }
}

impl Identified for Region {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Availability zone in which instances and volumes are placed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlacementZone {
    id: String,
    region: Option<String>,
}

impl PlacementZone {
    /// Creates a zone value from its name and optional region.
    #[must_use]
    pub fn new(id: impl Into<String>, region: Option<&str>) -> Self {
        Self {
            id: id.into(),
            region: region.map(str::to_owned),
        }
    }

    /// Region the zone belongs to, when known.
    #[must_use]
    pub fn region_name(&self) -> Option<&str> {
        self.region.as_deref()
    }
}

impl Identified for PlacementZone {
    fn id(&self) -> &str {
        &self.id
    }
}
