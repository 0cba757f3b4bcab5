use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One entry of the country seed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryConfig {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub has_trends: bool,
    #[serde(default)]
    pub woeid: Option<i64>,
    pub centroid_lat: f64,
    pub centroid_lng: f64,
}

impl CountryConfig {
    /// Normalized (uppercase, trimmed) ISO code used as the database key.
    #[must_use]
    pub fn normalized_code(&self) -> String {
        self.code.trim().to_ascii_uppercase()
    }
}

#[derive(Debug, Deserialize)]
pub struct CountriesFile {
    pub countries: Vec<CountryConfig>,
}

/// Load and validate the country seed file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_countries(path: &Path) -> Result<CountriesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CountriesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_countries(&content)
}

/// Parse and validate seed YAML that is already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_countries(content: &str) -> Result<CountriesFile, ConfigError> {
    let countries_file: CountriesFile = serde_yaml::from_str(content)?;
    validate_countries(&countries_file)?;
    Ok(countries_file)
}

fn validate_countries(countries_file: &CountriesFile) -> Result<(), ConfigError> {
    let mut seen_codes = HashSet::new();

    for country in &countries_file.countries {
        let code = country.normalized_code();
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::Validation(format!(
                "country code '{}' must be two ASCII letters",
                country.code
            )));
        }

        if country.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "country '{code}' must have a non-empty name"
            )));
        }

        if !(-90.0..=90.0).contains(&country.centroid_lat)
            || !(-180.0..=180.0).contains(&country.centroid_lng)
        {
            return Err(ConfigError::Validation(format!(
                "country '{code}' has an out-of-range centroid ({}, {})",
                country.centroid_lat, country.centroid_lng
            )));
        }

        if !seen_codes.insert(code.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate country code: '{code}'"
            )));
        }
    }

    Ok(())
}
