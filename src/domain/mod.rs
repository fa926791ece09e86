//! Domain layer: profiles, settings, aliases and command paths
//!
//! This layer is independent of external concerns (no I/O, no CLI, no HTTP).

pub mod alias;
pub mod error;
pub mod params;
pub mod profile;
pub mod resources;
pub mod settings;
pub mod verbosity;

pub use alias::{AliasTable, CommandRegistry, Resolution};
pub use error::{DomainError, DomainResult};
pub use params::{parse_node_param, NodeParam, NodeParamKind};
pub use profile::{Profile, DEFAULT_PROFILE};
pub use resources::{Deployment, Element, Tabular, Usage, VirtualMachine};
pub use settings::{parse_scalar, SettingValue, Settings, DEFAULT_ENDPOINT};
pub use verbosity::Level;
