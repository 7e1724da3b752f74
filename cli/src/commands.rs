use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub(crate) enum CommandArgs {
    /// Print the aggregated policy tree as JSON
    Tree {},
    /// Print the JSON value at a logical path
    Get {
        /// Logical path such as /Machine/categories
        path: String,
    },
    /// List the names below a logical path
    List {
        #[arg(default_value_t = String::from("/"))]
        path: String,
    },
    /// Search policy names, categories or registry keys
    Find {
        pattern: String,
        /// name, category, key or all
        #[arg(long, default_value_t = String::from("all"))]
        by: String,
    },
    /// Write a registry value to a GPO Registry.pol file
    Set {
        /// GPO path relative to the sysvol root, or a Registry.pol path
        #[arg(long)]
        gpo: String,
        /// Machine or User
        #[arg(long, default_value = None)]
        target: Option<String>,
        /// Logical path of the policy that owns the value
        #[arg(long, default_value = None)]
        metadata: Option<String>,
        /// Registry key path ending with the value name
        key_path: String,
        /// Value as JSON or a literal
        value: String,
    },
    /// Print a value stored in a GPO Registry.pol file
    Value {
        #[arg(long)]
        gpo: String,
        #[arg(long, default_value = None)]
        target: Option<String>,
        key_path: String,
    },
    /// Remove a value from a GPO Registry.pol file
    Delete {
        #[arg(long)]
        gpo: String,
        #[arg(long, default_value = None)]
        target: Option<String>,
        key_path: String,
    },
    /// Print every entry of a Registry.pol file as JSON
    Dump {
        file: String,
    },
}

impl CommandArgs {
    /// Commands that only need the sysvol store and never read definitions
    pub(crate) fn needs_definitions(&self) -> bool {
        !matches!(
            self,
            CommandArgs::Value { .. } | CommandArgs::Delete { .. } | CommandArgs::Dump { .. }
        )
    }
}
