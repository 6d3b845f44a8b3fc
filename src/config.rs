use std::env;

use crate::error::Error;

const MONGODB_URI: &str = "CAMPAIGN_TYPES_MONGODB_URI";
const DATABASE: &str = "CAMPAIGN_TYPES_DATABASE";
const SEED: &str = "CAMPAIGN_TYPES_SEED";

// transactions need a replica set, even a single-node one
const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017/?replicaSet=rs0";
const DEFAULT_DATABASE: &str = "campaign_types";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub mongodb_uri: String,
    pub database: String,
    pub seed: bool,
}

impl Config {
    pub fn from_env() -> Result<Config, Error> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, Error> {
        let seed = match lookup(SEED) {
            Some(value) => parse_bool(SEED, &value)?,
            None => false,
        };

        Ok(Config {
            mongodb_uri: lookup(MONGODB_URI).unwrap_or_else(|| DEFAULT_MONGODB_URI.to_string()),
            database: lookup(DATABASE).unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            seed,
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(Error::InvalidConfiguration {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, Error> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]).unwrap();

        assert_eq!(config.mongodb_uri, DEFAULT_MONGODB_URI);
        assert_eq!(config.database, "campaign_types");
        assert!(!config.seed);
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            (MONGODB_URI, "mongodb://db:27017/?replicaSet=prod"),
            (DATABASE, "mail"),
            (SEED, "TRUE"),
        ])
        .unwrap();

        assert_eq!(config.mongodb_uri, "mongodb://db:27017/?replicaSet=prod");
        assert_eq!(config.database, "mail");
        assert!(config.seed);
    }

    #[test]
    fn rejects_unparseable_flags() {
        assert_eq!(
            config(&[(SEED, "maybe")]).unwrap_err(),
            Error::InvalidConfiguration {
                key: SEED.to_string(),
                value: "maybe".to_string(),
            }
        );
    }
}
