//! Runtime configuration read from the environment (and `.env`).

use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: '{value}'")]
    InvalidVar { name: &'static str, value: String },
    #[error("failed to read company profile {path}: {source}")]
    ProfileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse company profile {path}: {source}")]
    ProfileParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Business identity printed on every document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompanyProfile {
    /// Postal address, printed after the company name.
    pub address_line: String,
    pub company_name: String,
    pub tax_id: String,
    pub contact_person: String,
    pub phone: String,
    pub email: String,
    pub account_holder: String,
    pub bank_name: String,
    pub iban: String,
    pub currency_symbol: String,
}

impl Default for CompanyProfile {
    fn default() -> Self {
        Self {
            address_line: "Calle Mayor 1, 46001 Valencia, Spain".to_string(),
            company_name: "Example Services".to_string(),
            tax_id: "00000000T".to_string(),
            contact_person: "Billing Department".to_string(),
            phone: "600000000".to_string(),
            email: "billing@example.com".to_string(),
            account_holder: "Example Services".to_string(),
            bank_name: "Example Bank".to_string(),
            iban: "ES00 0000 0000 0000 0000 0000".to_string(),
            currency_symbol: "€".to_string(),
        }
    }
}

impl CompanyProfile {
    /// `<company name>, <address>`, shown under the logo and in the footer.
    pub fn identity_line(&self) -> String {
        [self.company_name.trim(), self.address_line.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Load a profile from a JSON file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ProfileIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::ProfileParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Get the static assets directory path.
pub fn get_static_dir() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static"))
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Shared directory holding generated PDFs.
    pub artifact_dir: PathBuf,
    pub logo_path: PathBuf,
    pub tax_rate: Decimal,
    pub company: CompanyProfile,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_var(&lookup, "PORT", 8080u16)?;
        let tax_rate = parse_var(&lookup, "TAX_RATE", Decimal::new(21, 2))?;
        if tax_rate.is_sign_negative() {
            return Err(ConfigError::InvalidVar {
                name: "TAX_RATE",
                value: tax_rate.to_string(),
            });
        }

        let artifact_dir = lookup("ARTIFACT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        let logo_path = lookup("LOGO_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| get_static_dir().join("img").join("logo.png"));
        let company = match lookup("COMPANY_PROFILE_PATH") {
            Some(path) => CompanyProfile::load(Path::new(&path))?,
            None => CompanyProfile::default(),
        };

        Ok(Self {
            host,
            port,
            artifact_dir,
            logo_path,
            tax_rate,
            company,
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidVar { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.tax_rate, Decimal::new(21, 2));
        assert_eq!(config.artifact_dir, std::env::temp_dir());
        assert!(config.logo_path.ends_with("static/img/logo.png"));
        assert_eq!(config.company, CompanyProfile::default());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("PORT", "9000"),
            ("TAX_RATE", "0.10"),
            ("ARTIFACT_DIR", "/srv/invoices"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.tax_rate, Decimal::new(10, 2));
        assert_eq!(config.artifact_dir, PathBuf::from("/srv/invoices"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { name: "PORT", .. }));

        let err = AppConfig::from_lookup(lookup_from(&[("TAX_RATE", "-0.21")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { name: "TAX_RATE", .. }));
    }

    #[test]
    fn test_company_profile_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("company.json");
        std::fs::write(
            &path,
            r#"{ "company_name": "Cervera Reformas", "iban": "ES14 2100 0000 0000 0000 0000" }"#,
        )
        .unwrap();

        let profile = CompanyProfile::load(&path).unwrap();
        assert_eq!(profile.company_name, "Cervera Reformas");
        assert_eq!(profile.iban, "ES14 2100 0000 0000 0000 0000");
        assert_eq!(profile.currency_symbol, "€");

        let config = AppConfig::from_lookup(lookup_from(&[(
            "COMPANY_PROFILE_PATH",
            path.to_str().unwrap(),
        )]))
        .unwrap();
        assert_eq!(config.company.company_name, "Cervera Reformas");
    }

    #[test]
    fn test_identity_line() {
        let mut profile = CompanyProfile::default();
        assert_eq!(
            profile.identity_line(),
            "Example Services, Calle Mayor 1, 46001 Valencia, Spain"
        );

        profile.address_line = "  ".to_string();
        assert_eq!(profile.identity_line(), "Example Services");
    }

    #[test]
    fn test_missing_company_profile_is_an_error() {
        let err = CompanyProfile::load(Path::new("/definitely/missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::ProfileIo { .. }));
    }
}
