//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};
use uuid::Uuid;

use crate::domain::params::{CLOUD_FORMAT, PARAM_FORMAT};
use crate::domain::{parse_node_param, CommandRegistry, Level, NodeParam, NodeParamKind};
use crate::infrastructure::api::parse_endpoint;

/// SlipStream command line tool.
#[derive(Parser, Debug)]
#[command(name = "slipstream")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The config file section to use instead of 'nuvla'
    #[arg(short = 'P', long, value_name = "PROFILE")]
    pub profile: Option<String>,

    /// The config file to use instead of '~/.slipstream/config'
    #[arg(short = 'c', long, value_name = "FILE", value_parser = existing_file, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// The SlipStream username to connect with
    #[arg(short = 'u', long, value_name = "USERNAME")]
    pub username: Option<String>,

    /// The SlipStream password to connect with
    #[arg(short = 'p', long, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// The SlipStream endpoint to use
    #[arg(short = 'e', long, value_name = "URL", value_parser = endpoint_url, value_hint = ValueHint::Url)]
    pub endpoint: Option<String>,

    /// Do not fail if SSL security checks fail
    #[arg(short = 'i', long)]
    pub insecure: bool,

    /// Never enter interactive mode
    #[arg(short = 'b', long = "batch-mode", visible_alias = "batch_mode")]
    pub batch_mode: bool,

    /// Give less output. Can be used up to 3 times
    #[arg(short, long, action = ArgAction::Count)]
    pub quiet: u8,

    /// Give more output. Can be used up to 4 times
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Message threshold from the `-v`/`-q` counts.
    pub fn level(&self) -> Level {
        Level::from_counts(self.verbose, self.quiet)
    }

    /// Whether a password was given on the command line (globally or to `login`).
    pub fn password_supplied(&self) -> bool {
        self.password.is_some()
            || matches!(&self.command, Commands::Login(login) if login.password.is_some())
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List currently defined aliases
    Aliases,

    /// Log in with your SlipStream credentials
    Login(LoginArgs),

    /// Clear local authentication credentials
    Logout,

    /// List available applications in the app store
    Appstore,

    /// List project content, starting from the root project if PATH is not given
    List {
        /// List only elements of the specified type
        #[arg(short = 'k', long = "type", value_enum)]
        kind: Option<ElementKind>,

        /// List projects recursively
        #[arg(short, long)]
        recurse: bool,

        path: Option<String>,
    },

    /// Show project, component or application details
    Show {
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Show a deployment
    Deployment {
        #[arg(value_name = "UUID")]
        id: Uuid,
    },

    /// List deployments
    Deployments {
        /// Include inactive runs
        #[arg(short, long)]
        inactive: bool,
    },

    /// List virtual machines filtered according to given options
    Virtualmachines {
        /// The deployment UUID to filter with
        #[arg(long, value_name = "UUID")]
        deployment_id: Option<Uuid>,

        /// The cloud service name to filter with
        #[arg(long, value_name = "CLOUD")]
        cloud: Option<String>,

        /// The status to filter with
        #[arg(long, value_name = "STATUS")]
        status: Option<String>,
    },

    /// Deploy a component or an application
    Deploy {
        /// Cloud service to be used
        #[arg(short = 'c', long = "cloud", value_name = CLOUD_FORMAT, value_parser = cloud_param)]
        clouds: Vec<NodeParam>,

        /// Set application or component parameters
        #[arg(short = 'p', long = "param", value_name = PARAM_FORMAT, value_parser = parameter)]
        params: Vec<NodeParam>,

        /// Don't launch the deployment
        #[arg(short, long)]
        dry_run: bool,

        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Build the given component
    Build {
        /// The cloud service to run the image with
        #[arg(long)]
        cloud: Option<String>,

        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Terminate the given deployment
    Terminate {
        #[arg(value_name = "UUID")]
        id: Uuid,
    },

    /// List current usage and quota by cloud service
    Usage,

    /// Publish PATH and VERSION to the app store (superuser only)
    ///
    /// If VERSION is not given, assumes the latest one.
    Publish(VersionedPath),

    /// Unpublish PATH and VERSION from the app store (superuser only)
    ///
    /// If VERSION is not given, assumes the latest one.
    Unpublish(VersionedPath),

    /// Delete an element (project/component/application)
    Delete(VersionedPath),

    /// Manage the local configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    /// Alias or unknown command, resolved before dispatch
    #[command(external_subcommand)]
    External(Vec<String>),
}

#[derive(clap::Args, Debug, Default)]
pub struct LoginArgs {
    /// The SlipStream username to connect with
    #[arg(short = 'u', long, value_name = "USERNAME")]
    pub username: Option<String>,

    /// The SlipStream password to connect with
    #[arg(short = 'p', long, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// The SlipStream endpoint to use
    #[arg(short = 'e', long, value_name = "URL", value_parser = endpoint_url)]
    pub endpoint: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct VersionedPath {
    #[arg(value_name = "PATH")]
    pub path: String,

    #[arg(value_name = "VERSION")]
    pub version: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective settings of the active profile
    Show,

    /// Print the config file path
    Path,

    /// Persist a setting in the active profile
    Set { key: String, value: String },

    /// Remove a setting from the active profile
    Unset { key: String },

    /// Define an alias; the target may be a subcommand path ("config show")
    Alias {
        alias: String,
        #[arg(required = true, num_args = 1..)]
        target: Vec<String>,
    },

    /// Remove an alias
    Unalias { alias: String },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Application,
    Component,
    Project,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Component => "component",
            Self::Project => "project",
        }
    }
}

/// Canonical command tree derived from the clap definition.
pub fn command_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    register(&Cli::command(), &mut Vec::new(), &mut registry);
    registry
}

fn register(command: &clap::Command, prefix: &mut Vec<String>, registry: &mut CommandRegistry) {
    for sub in command.get_subcommands() {
        prefix.push(sub.get_name().to_string());
        registry.insert_path(prefix);
        register(sub, prefix, registry);
        prefix.pop();
    }
}

fn existing_file(raw: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(shellexpand::tilde(raw).as_ref());
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("File '{raw}' does not exist."))
    }
}

fn endpoint_url(raw: &str) -> Result<String, String> {
    parse_endpoint(raw)
        .map(|_| raw.to_string())
        .map_err(|e| e.to_string())
}

fn parameter(raw: &str) -> Result<NodeParam, String> {
    parse_node_param(raw, NodeParamKind::Parameter).map_err(|e| e.to_string())
}

fn cloud_param(raw: &str) -> Result<NodeParam, String> {
    parse_node_param(raw, NodeParamKind::Cloud).map_err(|e| e.to_string())
}
