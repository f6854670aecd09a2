//! Property attributes submitted for a price estimate

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cities the price model was trained on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum City {
    Bekasi,
    Bogor,
    Depok,
    #[serde(rename = "Jakarta Barat")]
    JakartaBarat,
    #[serde(rename = "Jakarta Pusat")]
    JakartaPusat,
    #[serde(rename = "Jakarta Selatan")]
    JakartaSelatan,
    #[serde(rename = "Jakarta Timur")]
    JakartaTimur,
    #[serde(rename = "Jakarta Utara")]
    JakartaUtara,
    Tangerang,
}

impl City {
    /// All cities, in the column order used by the one-hot encoding
    pub const ALL: [City; 9] = [
        City::Bekasi,
        City::Bogor,
        City::Depok,
        City::JakartaBarat,
        City::JakartaPusat,
        City::JakartaSelatan,
        City::JakartaTimur,
        City::JakartaUtara,
        City::Tangerang,
    ];

    /// Display label, also used to build feature column names
    pub fn label(&self) -> &'static str {
        match self {
            City::Bekasi => "Bekasi",
            City::Bogor => "Bogor",
            City::Depok => "Depok",
            City::JakartaBarat => "Jakarta Barat",
            City::JakartaPusat => "Jakarta Pusat",
            City::JakartaSelatan => "Jakarta Selatan",
            City::JakartaTimur => "Jakarta Timur",
            City::JakartaUtara => "Jakarta Utara",
            City::Tangerang => "Tangerang",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for City {
    type Err = String;

    /// Case-insensitive; underscores and hyphens stand in for spaces
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        City::ALL
            .iter()
            .copied()
            .find(|c| normalize_label(c.label()) == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown city '{}' (expected one of: {})",
                    s,
                    City::ALL.map(|c| c.label()).join(", ")
                )
            })
    }
}

/// Furnishing status of the property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Furnishing {
    /// Newly built, never occupied
    Baru,
    Furnished,
    #[serde(rename = "semi furnished")]
    SemiFurnished,
    Unfurnished,
}

impl Furnishing {
    pub const ALL: [Furnishing; 4] = [
        Furnishing::Baru,
        Furnishing::Furnished,
        Furnishing::SemiFurnished,
        Furnishing::Unfurnished,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Furnishing::Baru => "baru",
            Furnishing::Furnished => "furnished",
            Furnishing::SemiFurnished => "semi furnished",
            Furnishing::Unfurnished => "unfurnished",
        }
    }
}

impl fmt::Display for Furnishing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Furnishing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        Furnishing::ALL
            .iter()
            .copied()
            .find(|f| normalize_label(f.label()) == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown furnishing '{}' (expected one of: {})",
                    s,
                    Furnishing::ALL.map(|f| f.label()).join(", ")
                )
            })
    }
}

fn normalize_label(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Accepted input ranges, mirroring the limits of the entry form
pub mod limits {
    pub const BEDROOMS: (u32, u32) = (1, 8);
    pub const BATHROOMS: (u32, u32) = (1, 4);
    pub const FLOORS: (u32, u32) = (1, 6);
    pub const AREA_M2: (f64, f64) = (1.0, 20000.0);
}

/// Attributes of a property submitted for estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInput {
    /// Number of bedrooms
    pub bedrooms: u32,

    /// Number of bathrooms
    pub bathrooms: u32,

    /// Land area in square metres
    #[serde(alias = "land")]
    pub land_size_m2: f64,

    /// Building area in square metres
    #[serde(alias = "building")]
    pub building_size_m2: f64,

    /// Number of floors
    pub floors: u32,

    pub city: City,

    pub furnishing: Furnishing,
}

impl PropertyInput {
    /// Create an input with the form's default values for the given location
    pub fn new(city: City, furnishing: Furnishing) -> Self {
        Self {
            bedrooms: 3,
            bathrooms: 2,
            land_size_m2: 100.0,
            building_size_m2: 90.0,
            floors: 2,
            city,
            furnishing,
        }
    }

    pub fn with_rooms(mut self, bedrooms: u32, bathrooms: u32) -> Self {
        self.bedrooms = bedrooms;
        self.bathrooms = bathrooms;
        self
    }

    pub fn with_sizes(mut self, land_size_m2: f64, building_size_m2: f64) -> Self {
        self.land_size_m2 = land_size_m2;
        self.building_size_m2 = building_size_m2;
        self
    }

    pub fn with_floors(mut self, floors: u32) -> Self {
        self.floors = floors;
        self
    }
}

impl Default for PropertyInput {
    fn default() -> Self {
        Self::new(City::Bekasi, Furnishing::Baru)
    }
}
