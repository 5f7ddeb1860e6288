//! Locations that scope an issue or report-type lookup.
//!
//! Each location renders itself as query arguments. URL assembly
//! percent-encodes the values, so implementations return them raw.

use std::fmt;

use crate::error::{Error, Result};

/// Something that can be expressed as location query arguments.
pub trait Location: fmt::Debug + Send + Sync {
    fn query_arguments(&self) -> Result<Vec<(String, String)>>;
}

impl<L: Location + ?Sized> Location for Box<L> {
    fn query_arguments(&self) -> Result<Vec<(String, String)>> {
        (**self).query_arguments()
    }
}

impl<L: Location + ?Sized> Location for &L {
    fn query_arguments(&self) -> Result<Vec<(String, String)>> {
        (**self).query_arguments()
    }
}

// Shortest round-trip form: 42.0 renders as "42".
fn finite(name: &'static str, value: f64) -> Result<String> {
    if value.is_finite() {
        Ok(value.to_string())
    } else {
        Err(Error::InvalidCoordinate { name, value })
    }
}

/// A single coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl Location for Point {
    fn query_arguments(&self) -> Result<Vec<(String, String)>> {
        Ok(vec![
            ("lat".to_string(), finite("lat", self.latitude)?),
            ("lng".to_string(), finite("lng", self.longitude)?),
        ])
    }
}

/// A rectangle given by its south-west and north-east corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// South-west latitude
    pub min_latitude: f64,
    /// North-east latitude
    pub max_latitude: f64,
    /// South-west longitude
    pub min_longitude: f64,
    /// North-east longitude
    pub max_longitude: f64,
}

impl BoundingBox {
    pub fn new(min_latitude: f64, max_latitude: f64, min_longitude: f64, max_longitude: f64) -> Self {
        Self {
            min_latitude,
            max_latitude,
            min_longitude,
            max_longitude,
        }
    }
}

impl Location for BoundingBox {
    fn query_arguments(&self) -> Result<Vec<(String, String)>> {
        Ok(vec![
            ("min_lat".to_string(), finite("min_lat", self.min_latitude)?),
            ("min_lng".to_string(), finite("min_lng", self.min_longitude)?),
            ("max_lat".to_string(), finite("max_lat", self.max_latitude)?),
            ("max_lng".to_string(), finite("max_lng", self.max_longitude)?),
        ])
    }
}

/// A free-form street address or postal code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub address: String,
}

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

impl Location for Address {
    fn query_arguments(&self) -> Result<Vec<(String, String)>> {
        Ok(vec![("address".to_string(), self.address.clone())])
    }
}

/// Another location viewed at a map zoom level.
#[derive(Debug)]
pub struct Area {
    pub location: Box<dyn Location>,
    pub zoom: f64,
}

impl Area {
    pub fn new(location: impl Location + 'static, zoom: f64) -> Self {
        Self {
            location: Box::new(location),
            zoom,
        }
    }
}

impl Location for Area {
    fn query_arguments(&self) -> Result<Vec<(String, String)>> {
        let mut arguments = self.location.query_arguments()?;
        arguments.push(("zoom".to_string(), finite("zoom", self.zoom)?));
        Ok(arguments)
    }
}
