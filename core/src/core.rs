use crate::{
    datastore::PolicyDataStore,
    error::CoreError,
    filesystem::files::read_file,
    policies::{aggregate, cache::DefinitionCache},
    registry::store::list_pol_file,
    structs::toml::{ServiceConfig, ServiceToml},
    utils::logging::{create_log_file, log_level},
};
use common::{policy::PolicyTree, registry::RegistryEntry};
use log::{error, info};
use simplelog::{Config, SimpleLogger, WriteLogger};

/// Parse a TOML config file at provided path
pub fn parse_config_file(path: &str) -> Result<ServiceToml, CoreError> {
    let buffer_results = read_file(path);
    let buffer = match buffer_results {
        Ok(results) => results,
        Err(_) => {
            return Err(CoreError::NoFile);
        }
    };

    parse_config_data(&buffer)
}

/// Parse an already read TOML config file
pub fn parse_config_data(data: &[u8]) -> Result<ServiceToml, CoreError> {
    let toml_results = ServiceToml::parse_service_toml(data);
    match toml_results {
        Ok(results) => Ok(results),
        Err(_) => Err(CoreError::BadToml),
    }
}

/// Install the logger. Logs go to the configured file, or the terminal when there is none
pub fn setup_logging(config: &ServiceConfig) {
    let level = log_level(&config.log_level);
    if let Some(path) = &config.log_file {
        if let Ok(log_file) = create_log_file(path) {
            let _ = WriteLogger::init(level, Config::default(), log_file);
            return;
        }
    }
    let _ = SimpleLogger::init(level, Config::default());
}

/// Parse every ADMX file under a PolicyDefinitions directory into the Machine and User trees
pub fn build_policy_tree(path: &str, locale: &str) -> Result<PolicyTree, CoreError> {
    let mut cache = DefinitionCache::new();
    let result = aggregate::build_policy_tree(path, locale, &mut cache);
    match result {
        Ok(tree) => Ok(tree),
        Err(err) => {
            error!("[gptcore] Core failed to build policy tree from {path}: {err:?}");
            Err(CoreError::BadDefinitions)
        }
    }
}

/// Open a data store for the configured sysvol and load the configured definitions
pub fn open_data_store(config: &ServiceConfig) -> Result<PolicyDataStore, CoreError> {
    let store = PolicyDataStore::new(&config.sysvol_path, &config.locale);
    if !store.load_from_directory(&config.definitions_path) {
        return Err(CoreError::BadDefinitions);
    }
    info!(
        "[gptcore] Core loaded policy definitions from {}",
        config.definitions_path
    );
    Ok(store)
}

/// Read every value of a Registry.pol file in file order
pub fn read_registry_pol(path: &str) -> Result<Vec<RegistryEntry>, CoreError> {
    let result = list_pol_file(path);
    match result {
        Ok(entries) => Ok(entries),
        Err(err) => {
            error!("[gptcore] Core failed to parse Registry.pol file {path}: {err:?}");
            Err(CoreError::BadRegistryFile)
        }
    }
}
