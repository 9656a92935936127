//! Geolocation
//!
//! Every submission is stamped with coordinates; without a fix the
//! submission aborts. The locator is a trait so deployments can plug in a
//! live position source, while fixed-station installs configure static
//! coordinates.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ClientError, Result};

/// A latitude/longitude pair. Displays as `"lat, long"`, the wire form of
/// the `LatLong` field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Source of the submission location fix.
#[async_trait]
pub trait GeoLocator: Send + Sync {
    async fn locate(&self) -> Result<Coordinates>;
}

/// Locator returning configured static coordinates.
pub struct FixedLocator {
    coordinates: Coordinates,
}

impl FixedLocator {
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl GeoLocator for FixedLocator {
    async fn locate(&self) -> Result<Coordinates> {
        Ok(self.coordinates)
    }
}

/// Locator for installs with no location source: always denies, which
/// aborts any submission attempt.
pub struct DeniedLocator;

#[async_trait]
impl GeoLocator for DeniedLocator {
    async fn locate(&self) -> Result<Coordinates> {
        Err(ClientError::Location("no location source configured".into()))
    }
}

/// Client-generated activity id: the digits of the timestamp concatenated
/// with the digits of the coordinate pair, joined by `_`. Signs and
/// decimal points are stripped along with every other non-digit.
pub fn activity_id(at: DateTime<Utc>, coordinates: &Coordinates) -> String {
    let stamp = at.format("%Y-%m-%d %H:%M:%S").to_string();
    let time_digits: String = stamp.chars().filter(char::is_ascii_digit).collect();
    let coord_digits: String = coordinates
        .to_string()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    format!("{time_digits}_{coord_digits}")
}
