//! Command dispatch
//!
//! ```text
//! argv ─parse─> Cli ─load─> ConfigStore ─alias rewrite─> Cli
//!   local (aliases, config, completion): run against the ConfigStore
//!   remote: ServiceContainer ─[login gate]─> command
//! ```

use std::io;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::PublishOutcome;
use crate::cli::args::{command_registry, Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{default_config_path, ConfigStore};
use crate::domain::settings::{ENDPOINT, INSECURE, PASSWORD, USERNAME};
use crate::domain::{parse_scalar, AliasTable, NodeParam, Profile, Resolution, SettingValue};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::Reporter;

/// Run one invocation: load the profile, resolve aliases, dispatch.
#[instrument(level = "debug", skip_all)]
pub fn execute_command(cli: Cli, argv: &[String], reporter: Arc<dyn Reporter>) -> CliResult<()> {
    let profile = Profile::parse(cli.profile.as_deref())?;
    let path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = ConfigStore::load(path, profile)?;

    let cli = resolve_aliases(cli, argv, config.aliases())?;
    apply_overrides(&cli, &mut config);

    if is_local(&cli.command) {
        return run_local(&cli.command, &mut config, reporter.as_ref());
    }
    let mut container = ServiceContainer::new(config, reporter)?;
    dispatch(&cli, &mut container)
}

/// Replace an alias in command position by its canonical path and parse again.
///
/// The parser captures a token that is not a registered command as an external
/// subcommand; everything from that token on is kept verbatim.
pub fn resolve_aliases(cli: Cli, argv: &[String], aliases: &AliasTable) -> CliResult<Cli> {
    let Commands::External(tokens) = &cli.command else {
        return Ok(cli);
    };
    let Some((token, rest)) = tokens.split_first() else {
        return Ok(cli);
    };

    match command_registry().resolve(token, aliases) {
        Resolution::Found(path) => {
            let position = argv.len().saturating_sub(tokens.len());
            let rewritten: Vec<String> = argv[..position]
                .iter()
                .cloned()
                .chain(path)
                .chain(rest.iter().cloned())
                .collect();
            debug!(?rewritten, "alias expanded");
            Ok(Cli::try_parse_from(rewritten)?)
        }
        Resolution::Unresolved => Err(Cli::command()
            .error(ErrorKind::InvalidSubcommand, format!("No such command '{token}'."))
            .into()),
    }
}

/// Command-line layer of the settings. `login` options win over global ones.
pub fn apply_overrides(cli: &Cli, config: &mut ConfigStore) {
    let login = match &cli.command {
        Commands::Login(login) => Some(login),
        _ => None,
    };
    let username = login.and_then(|l| l.username.as_ref()).or(cli.username.as_ref());
    let password = login.and_then(|l| l.password.as_ref()).or(cli.password.as_ref());
    let endpoint = login.and_then(|l| l.endpoint.as_ref()).or(cli.endpoint.as_ref());

    if let Some(username) = username {
        config.set_override(USERNAME, username.as_str());
    }
    if let Some(password) = password {
        config.set_override(PASSWORD, SettingValue::Secret(password.clone()));
    }
    if let Some(endpoint) = endpoint {
        config.set_override(ENDPOINT, endpoint.as_str());
    }
    if cli.insecure {
        config.set_override(INSECURE, true);
    }
}

/// Commands that never talk to the remote service.
fn is_local(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Aliases
            | Commands::Config { .. }
            | Commands::Completion { .. }
            | Commands::External(_)
    )
}

/// Commands that need a session before they run.
fn requires_session(command: &Commands) -> bool {
    !is_local(command) && !matches!(command, Commands::Login(_) | Commands::Logout)
}

/// Run a parsed command, logging in first when the session is missing.
#[instrument(level = "debug", skip_all, fields(profile = %container.config.profile()))]
pub fn dispatch(cli: &Cli, container: &mut ServiceContainer) -> CliResult<()> {
    if requires_session(&cli.command)
        && (cli.password_supplied() || !container.config.session_file().exists())
    {
        debug!("no usable session, logging in first");
        container
            .auth_service()
            .login(&mut container.config, cli.batch_mode)?;
    }

    let reporter = Arc::clone(&container.reporter);
    let elements = container.element_service();

    match &cli.command {
        Commands::Login(_) => {
            container
                .auth_service()
                .login(&mut container.config, cli.batch_mode)?;
        }
        Commands::Logout => {
            container.api.logout()?;
            reporter.notify("Local credentials cleared.");
        }
        Commands::Appstore => {
            let apps = elements.appstore()?;
            if apps.is_empty() {
                reporter.warning("No applications found in the appstore.");
            } else {
                output::print_records(&apps);
            }
        }
        Commands::List {
            kind,
            recurse,
            path,
        } => {
            let modules = elements.list(path.as_deref(), *recurse, kind.map(|k| k.as_str()))?;
            if modules.is_empty() {
                reporter.warning("No element found matching your criteria.");
            } else {
                output::print_records(&modules);
            }
        }
        Commands::Show { path } => {
            output::print_records(&[elements.show(path)?]);
        }
        Commands::Deployment { id } => {
            output::print_records(&[elements.deployment(id)?]);
        }
        Commands::Deployments { inactive } => {
            let deployments = elements.deployments(*inactive)?;
            if deployments.is_empty() {
                reporter.warning("No deployment found.");
            } else {
                output::print_records(&deployments);
            }
        }
        Commands::Virtualmachines {
            deployment_id,
            cloud,
            status,
        } => {
            let vms = elements.virtual_machines(
                deployment_id.as_ref(),
                cloud.as_deref(),
                status.as_deref(),
            )?;
            if vms.is_empty() {
                reporter.warning("No virtual machines found matching your criteria.");
            } else {
                output::print_records(&vms);
            }
        }
        Commands::Deploy {
            clouds,
            params,
            dry_run,
            path,
        } => {
            let request = elements.prepare_deploy(path, params.clone(), clouds.clone())?;
            if *dry_run {
                output::info(&format!(
                    "Not sending the request to deploy: {}\n- with the following parameters:{}\n- on the following cloud(s):{}",
                    request.path,
                    bullets(&request.params),
                    bullets(&request.clouds),
                ));
            } else {
                output::info(&elements.deploy(&request)?);
            }
        }
        Commands::Build { cloud, path } => {
            output::info(&elements.build(path, cloud.as_deref())?);
        }
        Commands::Terminate { id } => {
            elements.terminate(id)?;
            reporter.info("Deployment successfully terminated.");
        }
        Commands::Usage => {
            output::print_records(&elements.usage()?);
        }
        Commands::Publish(target) => match elements.publish(&target.path, target.version)? {
            PublishOutcome::Published(v) => {
                reporter.notify(&format!("'{}' #{v} published.", target.path));
            }
            PublishOutcome::AlreadyPublished(v) => {
                reporter.warning(&format!("'{}' #{v} is already published.", target.path));
            }
        },
        Commands::Unpublish(target) => {
            let v = elements.unpublish(&target.path, target.version)?;
            reporter.notify(&format!("'{}' #{v} unpublished.", target.path));
        }
        Commands::Delete(target) => {
            let deleted = elements.delete(&target.path, target.version)?;
            reporter.notify(&format!("Deleted {deleted}"));
        }
        Commands::Aliases
        | Commands::Config { .. }
        | Commands::Completion { .. }
        | Commands::External(_) => {
            return run_local(&cli.command, &mut container.config, reporter.as_ref())
        }
    }
    Ok(())
}

/// Commands served from the configuration alone.
pub fn run_local(
    command: &Commands,
    config: &mut ConfigStore,
    reporter: &dyn Reporter,
) -> CliResult<()> {
    match command {
        Commands::Aliases => {
            let rows: Vec<Vec<String>> = config
                .aliases()
                .grouped()
                .into_iter()
                .map(|(command, aliases)| vec![command, aliases.join(", ")])
                .collect();
            output::info(output::table(&["command", "aliases"], &rows).trim_end());
            Ok(())
        }
        Commands::Config { command } => run_config(command, config, reporter),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "slipstream", &mut io::stdout());
            Ok(())
        }
        Commands::External(tokens) => Err(CliError::Usage(format!(
            "No such command '{}'.",
            tokens.first().map(String::as_str).unwrap_or_default()
        ))),
        other => Err(CliError::Usage(format!("{other:?} needs the remote service"))),
    }
}

fn run_config(
    command: &ConfigCommands,
    config: &mut ConfigStore,
    reporter: &dyn Reporter,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::header(&format!("[{}]", config.profile()));
            for (key, value) in config.settings().iter() {
                output::info(&format!("{key} = {value}"));
            }
        }
        ConfigCommands::Path => output::info(&config.path().display()),
        ConfigCommands::Set { key, value } => {
            if key == PASSWORD {
                return Err(CliError::Usage(
                    "Passwords are never stored in the config file.".to_string(),
                ));
            }
            config.set_override(key.as_str(), parse_scalar(value));
            config.save()?;
            reporter.notify(&format!("Set '{key}' in profile '{}'.", config.profile()));
        }
        ConfigCommands::Unset { key } => {
            config.clear(key)?;
            config.save()?;
            reporter.notify(&format!("Removed '{key}' from profile '{}'.", config.profile()));
        }
        ConfigCommands::Alias { alias, target } => {
            let registry = command_registry();
            if registry.contains(alias) {
                return Err(CliError::Usage(format!("'{alias}' is already a command.")));
            }
            if registry.find_path(target.iter().map(String::as_str)).is_none() {
                return Err(CliError::Usage(format!(
                    "'{}' is not a command.",
                    target.iter().join(" ")
                )));
            }
            config.aliases_mut().insert(alias.as_str(), &target.join(" "));
            config.save()?;
            reporter.notify(&format!("Alias '{alias}' -> '{}' saved.", target.join(" ")));
        }
        ConfigCommands::Unalias { alias } => {
            if config.aliases_mut().remove(alias).is_none() {
                return Err(CliError::Usage(format!("No such alias '{alias}'.")));
            }
            config.save()?;
            reporter.notify(&format!("Alias '{alias}' removed."));
        }
    }
    Ok(())
}

fn bullets(params: &[NodeParam]) -> String {
    params
        .iter()
        .map(|p| format!("\n  - {} => {}", p.key, p.value))
        .collect()
}
