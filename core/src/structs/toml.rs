use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServiceToml {
    #[serde(default)]
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /**Directory holding the ADMX files and their locale subdirectories */
    #[serde(default = "default_definitions_path")]
    pub definitions_path: String,
    /**Root of the sysvol tree holding the GPO directories */
    #[serde(default = "default_sysvol_path")]
    pub sysvol_path: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    /**error, warn, info or debug */
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub log_file: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            definitions_path: default_definitions_path(),
            sysvol_path: default_sysvol_path(),
            locale: default_locale(),
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

fn default_definitions_path() -> String {
    String::from("/usr/share/PolicyDefinitions")
}

fn default_sysvol_path() -> String {
    String::from("/var/lib/freeipa/sysvol")
}

fn default_locale() -> String {
    String::from("en-US")
}

fn default_log_level() -> String {
    String::from("warn")
}
