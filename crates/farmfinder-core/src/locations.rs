use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::{DisplayPoint, StorePoint};
use crate::{ConfigError, CoreError};

/// Lowercases and folds `-`, `_` and spaces so `"Farm Store"`, `"farm-store"`
/// and `"FARM_STORE"` compare equal.
fn fold(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum BusinessType {
    Farm,
    FarmStore,
    FarmersMarket,
    GroceryStore,
    Restaurant,
    CoopPickup,
}

impl BusinessType {
    pub const ALL: [BusinessType; 6] = [
        BusinessType::Farm,
        BusinessType::FarmStore,
        BusinessType::FarmersMarket,
        BusinessType::GroceryStore,
        BusinessType::Restaurant,
        BusinessType::CoopPickup,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BusinessType::Farm => "Farm",
            BusinessType::FarmStore => "Farm Store",
            BusinessType::FarmersMarket => "Farmers Market",
            BusinessType::GroceryStore => "Grocery Store",
            BusinessType::Restaurant => "Restaurant",
            BusinessType::CoopPickup => "Co-op Pickup",
        }
    }
}

impl std::fmt::Display for BusinessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BusinessType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded = fold(s);
        Self::ALL
            .into_iter()
            .find(|t| fold(t.as_str()) == folded)
            .ok_or_else(|| CoreError::UnknownBusinessType(s.to_string()))
    }
}

impl TryFrom<String> for BusinessType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BusinessType> for &'static str {
    fn from(value: BusinessType) -> Self {
        value.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Practice {
    Regenerative,
    Organic,
    Biodynamic,
    GrassFed,
    Pastured,
}

impl Practice {
    pub const ALL: [Practice; 5] = [
        Practice::Regenerative,
        Practice::Organic,
        Practice::Biodynamic,
        Practice::GrassFed,
        Practice::Pastured,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Practice::Regenerative => "Regenerative",
            Practice::Organic => "Organic",
            Practice::Biodynamic => "Biodynamic",
            Practice::GrassFed => "Grass-fed",
            Practice::Pastured => "Pastured",
        }
    }

    /// Parse a comma-separated list such as `"organic, grass-fed"`.
    /// Empty segments are ignored and duplicates collapse.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownPractice`] for the first unrecognized entry.
    pub fn parse_list(raw: &str) -> Result<Vec<Practice>, CoreError> {
        let mut out = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let practice: Practice = part.parse()?;
            if !out.contains(&practice) {
                out.push(practice);
            }
        }
        Ok(out)
    }
}

impl std::fmt::Display for Practice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Practice {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded = fold(s);
        Self::ALL
            .into_iter()
            .find(|p| fold(p.as_str()) == folded)
            .ok_or_else(|| CoreError::UnknownPractice(s.to_string()))
    }
}

impl TryFrom<String> for Practice {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Practice> for &'static str {
    fn from(value: Practice) -> Self {
        value.as_str()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductItem {
    pub name: String,
    /// `Year-round`, `Seasonal` or `Limited`.
    #[serde(default = "default_availability")]
    pub availability: String,
}

fn default_availability() -> String {
    "Year-round".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductGroup {
    pub category: String,
    #[serde(default)]
    pub items: Vec<ProductItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingHours {
    pub day: String,
    pub open: String,
    pub close: String,
}

/// How a location hands goods to customers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fulfillment {
    #[serde(default)]
    pub supports_pickup: bool,
    #[serde(default)]
    pub supports_delivery: bool,
    /// Maximum delivery/shipping distance. `None` means no cap.
    pub delivery_radius_miles: Option<f64>,
    pub minimum_order: Option<Decimal>,
    pub notes: Option<String>,
}

impl Fulfillment {
    /// Whether a delivery-capable location will serve a customer `distance_miles` away.
    #[must_use]
    pub fn delivers_to(&self, distance_miles: f64) -> bool {
        self.supports_delivery
            && self
                .delivery_radius_miles
                .is_none_or(|radius| distance_miles <= radius)
    }
}

/// A searchable farm, store or restaurant as read from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationRecord {
    pub id: i64,
    pub public_id: Uuid,
    pub slug: String,
    pub name: String,
    pub business_types: Vec<BusinessType>,
    #[serde(rename = "coordinates")]
    pub point: StorePoint,
    pub address: Address,
    pub description: Option<String>,
    pub practices: Vec<Practice>,
    pub products: Vec<ProductGroup>,
    pub operating_hours: Vec<OperatingHours>,
    pub contact: Contact,
    pub fulfillment: Fulfillment,
    pub verified: bool,
}

/// One entry of the YAML locations file used to seed the store.
///
/// Coordinates are spelled out as `latitude`/`longitude` so the file is
/// unambiguous about axis order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    pub name: String,
    pub business_types: Vec<BusinessType>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Address,
    pub description: Option<String>,
    #[serde(default)]
    pub practices: Vec<Practice>,
    #[serde(default)]
    pub products: Vec<ProductGroup>,
    #[serde(default)]
    pub operating_hours: Vec<OperatingHours>,
    #[serde(default)]
    pub contact: Contact,
    #[serde(default)]
    pub fulfillment: Fulfillment,
    #[serde(default)]
    pub verified: bool,
}

impl LocationConfig {
    /// Generate a URL-safe slug from the location name and city.
    #[must_use]
    pub fn slug(&self) -> String {
        let base = match &self.address.city {
            Some(city) => format!("{} {}", self.name, city),
            None => self.name.clone(),
        };
        base.to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinate`] if the coordinates are out of range.
    pub fn store_point(&self) -> Result<StorePoint, CoreError> {
        DisplayPoint::new(self.latitude, self.longitude).map(StorePoint::from)
    }
}

#[derive(Debug, Deserialize)]
pub struct LocationsFile {
    pub locations: Vec<LocationConfig>,
}

/// Load and validate the locations seed file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_locations(path: &Path) -> Result<LocationsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LocationsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_locations(&content)
}

fn parse_locations(content: &str) -> Result<LocationsFile, ConfigError> {
    let file: LocationsFile =
        serde_yaml::from_str(content).map_err(ConfigError::LocationsFileParse)?;
    validate_locations(&file)?;
    Ok(file)
}

fn validate_locations(file: &LocationsFile) -> Result<(), ConfigError> {
    let mut seen_slugs = HashSet::new();

    for location in &file.locations {
        if location.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "location name must be non-empty".to_string(),
            ));
        }

        if location.business_types.is_empty() {
            return Err(ConfigError::Validation(format!(
                "location '{}' must declare at least one business type",
                location.name
            )));
        }

        location.store_point().map_err(|e| {
            ConfigError::Validation(format!("location '{}': {e}", location.name))
        })?;

        if let Some(radius) = location.fulfillment.delivery_radius_miles {
            if !radius.is_finite() || radius < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "location '{}' has invalid delivery radius {radius}",
                    location.name
                )));
            }
        }

        let slug = location.slug();
        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate location slug: '{}' (from location '{}')",
                slug, location.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
locations:
  - name: Hudson Valley Greens
    business_types: [Farm, farm-store]
    latitude: 41.7
    longitude: -73.9
    address:
      city: Poughkeepsie
      state: NY
    practices: [Organic, grass_fed]
    fulfillment:
      supports_pickup: true
      supports_delivery: true
      delivery_radius_miles: 40
      minimum_order: '25.00'
  - name: Chelsea Co-op
    business_types: [Co-op Pickup]
    latitude: 40.745
    longitude: -74.0
";

    #[test]
    fn business_type_parses_loose_spellings() {
        assert_eq!(
            "farm-store".parse::<BusinessType>().unwrap(),
            BusinessType::FarmStore
        );
        assert_eq!(
            "FARMERS_MARKET".parse::<BusinessType>().unwrap(),
            BusinessType::FarmersMarket
        );
        assert_eq!(
            "co-op pickup".parse::<BusinessType>().unwrap(),
            BusinessType::CoopPickup
        );
        assert!(matches!(
            "bakery".parse::<BusinessType>(),
            Err(CoreError::UnknownBusinessType(_))
        ));
    }

    #[test]
    fn business_type_serializes_display_name() {
        let json = serde_json::to_string(&BusinessType::GroceryStore).unwrap();
        assert_eq!(json, "\"Grocery Store\"");
    }

    #[test]
    fn practice_list_dedupes_and_skips_blanks() {
        let list = Practice::parse_list("organic, ,Grass-fed,ORGANIC").unwrap();
        assert_eq!(list, vec![Practice::Organic, Practice::GrassFed]);
        assert!(Practice::parse_list("organic,hydroponic").is_err());
        assert!(Practice::parse_list("").unwrap().is_empty());
    }

    #[test]
    fn delivers_to_honors_radius() {
        let capped = Fulfillment {
            supports_delivery: true,
            delivery_radius_miles: Some(5.0),
            ..Fulfillment::default()
        };
        assert!(capped.delivers_to(5.0));
        assert!(!capped.delivers_to(8.0));

        let uncapped = Fulfillment {
            supports_delivery: true,
            ..Fulfillment::default()
        };
        assert!(uncapped.delivers_to(2_000.0));

        let pickup_only = Fulfillment {
            supports_pickup: true,
            ..Fulfillment::default()
        };
        assert!(!pickup_only.delivers_to(0.0));
    }

    #[test]
    fn parse_locations_reads_sample() {
        let file = parse_locations(SAMPLE).expect("sample parses");
        assert_eq!(file.locations.len(), 2);
        let first = &file.locations[0];
        assert_eq!(
            first.business_types,
            vec![BusinessType::Farm, BusinessType::FarmStore]
        );
        assert_eq!(first.practices, vec![Practice::Organic, Practice::GrassFed]);
        assert_eq!(first.slug(), "hudson-valley-greens-poughkeepsie");
        assert_eq!(first.fulfillment.minimum_order, Some(Decimal::new(2500, 2)));
        let point = first.store_point().unwrap();
        assert_eq!(point.xy(), (-73.9, 41.7));

        let second = &file.locations[1];
        assert_eq!(second.slug(), "chelsea-co-op");
        assert!(!second.fulfillment.supports_pickup);
    }

    #[test]
    fn shipped_seed_file_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/locations.yaml");
        let file = load_locations(&path).expect("config/locations.yaml loads");
        assert!(!file.locations.is_empty());
    }

    #[test]
    fn validation_rejects_duplicate_slugs() {
        let yaml = r"
locations:
  - name: Twin Farm
    business_types: [Farm]
    latitude: 40.0
    longitude: -75.0
  - name: twin farm
    business_types: [Farm]
    latitude: 40.1
    longitude: -75.1
";
        let err = parse_locations(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn validation_rejects_swapped_coordinates() {
        let yaml = r"
locations:
  - name: Swapped
    business_types: [Farm]
    latitude: -118.2
    longitude: 34.0
";
        assert!(matches!(
            parse_locations(yaml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn validation_rejects_missing_business_type() {
        let yaml = r"
locations:
  - name: Nameless Stall
    business_types: []
    latitude: 40.0
    longitude: -75.0
";
        assert!(matches!(
            parse_locations(yaml),
            Err(ConfigError::Validation(_))
        ));
    }
}
