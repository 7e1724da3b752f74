use super::error::UtilError;
use crate::structs::toml::ServiceToml;
use log::error;
use std::str::from_utf8;

impl ServiceToml {
    // Parse the service TOML config file
    pub(crate) fn parse_service_toml(toml_data: &[u8]) -> Result<ServiceToml, UtilError> {
        let toml_results = toml::from_str(from_utf8(toml_data).unwrap_or_default());
        let mut config: ServiceToml = match toml_results {
            Ok(results) => results,
            Err(err) => {
                error!("[gptcore] Failed to parse TOML data. Error: {err:?}");
                return Err(UtilError::BadToml);
            }
        };

        // Level names are always lowercase
        config.service.log_level = config.service.log_level.to_lowercase();
        Ok(config)
    }
}
