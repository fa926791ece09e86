//! SlipStream command line client
//!
//! Layers, leaf first: `domain` (profiles, settings, aliases), `config`
//! (the persisted store), `infrastructure` (HTTP API, terminal), `application`
//! (login flow, remote commands) and `cli` (parsing, dispatch, error translation).

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
