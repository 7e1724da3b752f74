use clap::Parser;
use commands::CommandArgs;
use gptcore::{
    core::{parse_config_file, read_registry_pol, setup_logging},
    datastore::PolicyDataStore,
    structs::toml::ServiceConfig,
};
use log::info;
use serde::Serialize;
use std::process::ExitCode;

mod commands;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Full path to TOML config file
    #[clap(short, long, value_parser)]
    config: Option<String>,

    /// PolicyDefinitions directory holding ADMX files
    #[clap(short, long, value_parser)]
    definitions: Option<String>,

    /// Sysvol root holding GPO directories
    #[clap(short, long, value_parser)]
    sysvol: Option<String>,

    /// Preferred ADML locale
    #[clap(short, long, value_parser)]
    locale: Option<String>,

    #[command(subcommand)]
    command: CommandArgs,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match parse_config_file(path) {
            Ok(result) => result.service,
            Err(err) => {
                eprintln!("[gptedit] Failed to parse config {path}: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => ServiceConfig::default(),
    };
    if let Some(definitions) = args.definitions {
        config.definitions_path = definitions;
    }
    if let Some(sysvol) = args.sysvol {
        config.sysvol_path = sysvol;
    }
    if let Some(locale) = args.locale {
        config.locale = locale;
    }
    setup_logging(&config);

    if run(&config, &args.command) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run(config: &ServiceConfig, command: &CommandArgs) -> bool {
    if let CommandArgs::Dump { file } = command {
        return match read_registry_pol(file) {
            Ok(entries) => print_json(&entries),
            Err(err) => {
                eprintln!("[gptedit] Failed to read {file}: {err}");
                false
            }
        };
    }

    let store = PolicyDataStore::new(&config.sysvol_path, &config.locale);
    if command.needs_definitions() && !store.load_from_directory(&config.definitions_path) {
        eprintln!(
            "[gptedit] Failed to load policy definitions from {}",
            config.definitions_path
        );
        return false;
    }

    match command {
        CommandArgs::Tree {} => {
            let json = match store.tree_json() {
                Some(result) => result,
                None => return false,
            };
            println!("{json}");
            let tree = store.tree();
            eprintln!(
                "[gptedit] Total categories: {}, total policies: {}, duplicates removed: {}",
                tree.meta.total_categories, tree.meta.total_policies, tree.meta.duplicates_removed
            );
            true
        }
        CommandArgs::Get { path } => match store.get(path) {
            Some(value) => print_json(&value),
            None => {
                eprintln!("[gptedit] Nothing found at {path}");
                false
            }
        },
        CommandArgs::List { path } => {
            for child in store.list_children(path) {
                println!("{child}");
            }
            true
        }
        CommandArgs::Find { pattern, by } => {
            for path in store.find(pattern, by) {
                println!("{path}");
            }
            true
        }
        CommandArgs::Set {
            gpo,
            target,
            metadata,
            key_path,
            value,
        } => {
            let status = store.set(
                key_path,
                value,
                gpo,
                target.as_deref(),
                metadata.as_deref(),
            );
            if status {
                info!("[gptedit] Set {key_path} in {gpo}");
            }
            status
        }
        CommandArgs::Value {
            gpo,
            target,
            key_path,
        } => match store.get_current_value(key_path, gpo, target.as_deref()) {
            Some(entry) => print_json(&entry),
            None => {
                eprintln!("[gptedit] No value {key_path} in {gpo}");
                false
            }
        },
        CommandArgs::Delete {
            gpo,
            target,
            key_path,
        } => store.delete_value(key_path, gpo, target.as_deref()),
        CommandArgs::Dump { .. } => false,
    }
}

fn print_json<T: Serialize + ?Sized>(data: &T) -> bool {
    match serde_json::to_string_pretty(data) {
        Ok(result) => {
            println!("{result}");
            true
        }
        Err(err) => {
            eprintln!("[gptedit] Could not serialize output: {err:?}");
            false
        }
    }
}
