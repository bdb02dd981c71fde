use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::error::{CatalogError, CatalogResult};
use super::pagination::{PageQuery, PageRequest};
use super::validate;

/// Geographic point, serialized in GeoJSON order: `{"type": "Point", "coordinates": [lng, lat]}`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Serialize, Deserialize)]
struct GeoJson {
    #[serde(rename = "type", default = "point_type")]
    kind: String,
    coordinates: Vec<f64>,
}

fn point_type() -> String {
    "Point".to_string()
}

impl Serialize for GeoPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        GeoJson {
            kind: point_type(),
            coordinates: vec![self.longitude, self.latitude],
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GeoPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = GeoJson::deserialize(deserializer)?;
        if raw.kind != "Point" {
            return Err(serde::de::Error::custom("location type must be 'Point'"));
        }
        match raw.coordinates.as_slice() {
            [longitude, latitude] => Ok(GeoPoint {
                longitude: *longitude,
                latitude: *latitude,
            }),
            _ => Err(serde::de::Error::custom(
                "location coordinates must be [longitude, latitude]",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub pincode: String,
    pub location: GeoPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestaurantStatus {
    Open,
    Closed,
}

impl RestaurantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestaurantStatus::Open => "open",
            RestaurantStatus::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(RestaurantStatus::Open),
            "closed" => Some(RestaurantStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: Uuid,
    pub merchant_id: String,
    pub name: String,
    pub description: String,
    pub address: Address,
    pub status: RestaurantStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Restaurant {
    pub fn is_open(&self) -> bool {
        self.status == RestaurantStatus::Open
    }
}

/// Create payload; the merchant is the intended owner of the new restaurant
#[derive(Debug, Clone, Deserialize)]
pub struct NewRestaurant {
    pub merchant_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub address: Address,
}

impl NewRestaurant {
    pub fn validate(&self) -> CatalogResult<()> {
        validate::required("merchant_id", &self.merchant_id)?;
        validate::required("name", &self.name)?;
        validate::length("name", &self.name, 2, 30)?;
        validate::max_length("description", &self.description, 120)?;

        let address = &self.address;
        validate::required("address.street", &address.street)?;
        validate::required("address.city", &address.city)?;
        validate::required("address.state", &address.state)?;
        validate::required("address.country", &address.country)?;
        validate::required("address.pincode", &address.pincode)?;
        validate::longitude("address.location.longitude", address.location.longitude)?;
        validate::latitude("address.location.latitude", address.location.latitude)?;
        Ok(())
    }

    /// New restaurants start closed
    pub fn into_restaurant(self, now: DateTime<Utc>) -> Restaurant {
        Restaurant {
            id: Uuid::new_v4(),
            merchant_id: self.merchant_id,
            name: self.name,
            description: self.description,
            address: self.address,
            status: RestaurantStatus::Closed,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusChange {
    pub status: RestaurantStatus,
}

/// Query string of the restaurant search
#[derive(Debug, Clone, Deserialize)]
pub struct ListRestaurantsQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub merchant_id: Option<String>,
    #[serde(default)]
    pub page_number: u64,
    #[serde(default)]
    pub page_size: u64,
}

/// Resolved filter shared by the page fetch and the count query
#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantFilter {
    pub center: GeoPoint,
    pub radius_meters: f64,
    pub merchant_id: Option<String>,
    pub page: PageRequest,
}

impl ListRestaurantsQuery {
    pub fn resolve(
        self,
        default_size: u64,
        max_size: u64,
        radius_meters: f64,
    ) -> CatalogResult<RestaurantFilter> {
        validate::latitude("latitude", self.latitude)?;
        validate::longitude("longitude", self.longitude)?;
        let page = PageQuery {
            page_number: self.page_number,
            page_size: self.page_size,
        }
        .resolve(default_size, max_size)?;
        let merchant_id = match self.merchant_id {
            Some(id) if id.trim().is_empty() => {
                return Err(CatalogError::validation("merchant_id", "must not be blank"))
            }
            other => other,
        };

        Ok(RestaurantFilter {
            center: GeoPoint {
                longitude: self.longitude,
                latitude: self.latitude,
            },
            radius_meters,
            merchant_id,
            page,
        })
    }
}

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

impl GeoPoint {
    /// Great-circle distance in meters
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (other.longitude - self.longitude).to_radians();
        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
    }
}

impl RestaurantFilter {
    pub fn matches(&self, restaurant: &Restaurant) -> bool {
        if let Some(merchant_id) = &self.merchant_id {
            if &restaurant.merchant_id != merchant_id {
                return false;
            }
        }
        self.center.distance_to(&restaurant.address.location) <= self.radius_meters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> NewRestaurant {
        serde_json::from_value(json!({
            "merchant_id": "merchant-1",
            "name": "Spice Route",
            "description": "North Indian kitchen",
            "address": {
                "street": "12 MG Road",
                "city": "Bengaluru",
                "state": "KA",
                "country": "IN",
                "pincode": "560001",
                "location": { "type": "Point", "coordinates": [77.5946, 12.9716] }
            }
        }))
        .unwrap()
    }

    #[test]
    fn location_round_trips_as_geojson() {
        let restaurant = payload().into_restaurant(Utc::now());
        let value = serde_json::to_value(&restaurant).unwrap();
        assert_eq!(
            value["address"]["location"],
            json!({ "type": "Point", "coordinates": [77.5946, 12.9716] })
        );
        assert_eq!(value["status"], "closed");
    }

    #[test]
    fn location_requires_two_coordinates() {
        let result: Result<GeoPoint, _> =
            serde_json::from_value(json!({ "type": "Point", "coordinates": [1.0] }));
        assert!(result.is_err());
    }

    #[test]
    fn validation_rejects_out_of_range_longitude() {
        let mut restaurant = payload();
        restaurant.address.location.longitude = 181.0;
        let err = restaurant.validate().unwrap_err();
        assert!(matches!(err, CatalogError::Validation { ref field, .. } if field == "address.location.longitude"));
    }

    #[test]
    fn validation_enforces_name_length() {
        let mut restaurant = payload();
        restaurant.name = "X".into();
        assert!(restaurant.validate().is_err());
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut restaurant = payload();
        restaurant.name = "   ".into();
        assert!(matches!(
            restaurant.validate(),
            Err(CatalogError::Validation { ref field, ref message }) if field == "name" && message == "is required"
        ));
    }

    #[test]
    fn distance_is_roughly_correct() {
        let mg_road = GeoPoint { longitude: 77.5946, latitude: 12.9716 };
        let koramangala = GeoPoint { longitude: 77.6245, latitude: 12.9352 };
        let meters = mg_road.distance_to(&koramangala);
        assert!((4_500.0..5_500.0).contains(&meters), "got {}", meters);
    }
}
