//! Point-of-interest model

use serde::{Deserialize, Serialize};

/// WGS-style coordinate pair as reported by the maps service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    /// Parse the maps service's `"lng,lat"` notation
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let (lng, lat) = value.split_once(',')?;
        Some(Self {
            longitude: lng.trim().parse().ok()?,
            latitude: lat.trim().parse().ok()?,
        })
    }
}

/// One physical location. Only `name` is required; within a single
/// recommendation run two items with the same name are the same place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl PlaceItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn with_distance(mut self, meters: f64) -> Self {
        self.distance_meters = Some(meters);
        self
    }

    /// `名称（地址） 距离 120m`, omitting the parts that are absent
    #[must_use]
    pub fn describe(&self) -> String {
        let mut line = self.name.clone();
        if let Some(address) = &self.address {
            line.push_str(&format!("（{address}）"));
        }
        if let Some(distance) = self.distance_meters {
            line.push_str(&format!(" 距离 {distance:.0}m"));
        }
        line
    }
}
