use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result, anyhow, bail};
use cadence_engine::{
    EngineConfig, ExternalContext, Navigator, Notifier, WorkflowBundle, WorkflowDefinition, WorkflowRunner, global_registry,
    init_global_registry, parse_workflow_file, validate_workflow,
};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let matches = build_cli().get_matches();

    let config = EngineConfig::load().context("failed to load engine configuration")?;
    if !init_global_registry(config.built_in_options()) {
        debug!("action registry already initialized");
    }

    match matches.subcommand() {
        Some(("run", sub)) => run_cmd(&config, sub).await,
        Some(("validate", sub)) => validate_cmd(sub),
        Some(("actions", _)) => {
            for name in global_registry().names() {
                println!("{name}");
            }
            Ok(())
        }
        _ => bail!("expected one of: run, validate, actions"),
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_cli() -> Command {
    let file_arg = Arg::new("file")
        .long("file")
        .short('f')
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Path to a workflow YAML/JSON document");
    let object_arg = |name: &'static str, help: &'static str| Arg::new(name).long(name).action(ArgAction::Set).help(help);

    Command::new("cadence")
        .about("Run declarative JSON/YAML workflows")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Run a workflow and print its final result")
                .arg(file_arg.clone())
                .arg(Arg::new("name").long("name").action(ArgAction::Set).help("Workflow name within the file"))
                .arg(object_arg("input", "JSON object exposed as {{input.*}}"))
                .arg(object_arg("globals", "JSON object exposed as {{globals.*}}"))
                .arg(object_arg("user", "JSON object exposed as {{user.*}}"))
                .arg(
                    Arg::new("report")
                        .long("report")
                        .action(ArgAction::SetTrue)
                        .help("Print the per-step run report instead of the final result"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Check workflows for unknown actions and bad placeholders")
                .arg(file_arg),
        )
        .subcommand(Command::new("actions").about("List registered actions"))
}

async fn run_cmd(config: &EngineConfig, matches: &ArgMatches) -> Result<()> {
    let file = matches.get_one::<PathBuf>("file").context("--file is required")?;
    let bundle = Arc::new(parse_workflow_file(file)?);
    let definition = select_workflow(&bundle, matches.get_one::<String>("name").map(String::as_str))?.clone();

    let runner = WorkflowRunner::new(global_registry());
    let cancellation = CancellationToken::new();
    let builder = ExternalContext::builder()
        .input(json_arg(matches, "input")?)
        .globals(json_arg(matches, "globals")?)
        .user(json_arg(matches, "user")?)
        .notifier(Arc::new(StderrNotifier))
        .navigator(Arc::new(EchoNavigator))
        .workflow_invoker(Arc::new(runner.clone()))
        .catalog(Arc::clone(&bundle))
        .cancellation(cancellation.clone());
    let context = config.apply_to(builder).build();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling after the current step");
            cancellation.cancel();
        }
    });

    let output = if matches.get_flag("report") {
        serde_json::to_value(runner.run_with_report(&definition, &context).await?)?
    } else {
        runner.run(&definition, &context).await?.unwrap_or(Value::Null)
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn validate_cmd(matches: &ArgMatches) -> Result<()> {
    let file = matches.get_one::<PathBuf>("file").context("--file is required")?;
    let bundle = parse_workflow_file(file)?;
    let registry = global_registry();

    let mut issue_count = 0;
    for (name, definition) in &bundle.workflows {
        let issues = validate_workflow(definition, &registry);
        if issues.is_empty() {
            println!("{name}: ok");
            continue;
        }
        issue_count += issues.len();
        for issue in issues {
            println!("{name}: {issue}");
        }
    }

    if issue_count > 0 {
        bail!("{issue_count} validation issue(s) found in {}", file.display());
    }
    Ok(())
}

fn select_workflow<'a>(bundle: &'a WorkflowBundle, name: Option<&str>) -> Result<&'a WorkflowDefinition> {
    match name {
        Some(name) => bundle.get(name).ok_or_else(|| anyhow!("workflow '{name}' not found in file")),
        None => bundle
            .first()
            .map(|(_, definition)| definition)
            .ok_or_else(|| anyhow!("file contains no workflows")),
    }
}

fn json_arg(matches: &ArgMatches, name: &str) -> Result<Value> {
    let Some(raw) = matches.get_one::<String>(name) else {
        return Ok(json!({}));
    };
    let value: Value = serde_json::from_str(raw).with_context(|| format!("--{name} must be valid JSON"))?;
    if !value.is_object() {
        bail!("--{name} must be a JSON object");
    }
    Ok(value)
}

/// Prints toasts to stderr so stdout stays machine-readable.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        eprintln!("[toast] {message}");
    }
}

/// Echoes navigation targets; the CLI has no routes of its own.
struct EchoNavigator;

#[async_trait::async_trait]
impl Navigator for EchoNavigator {
    async fn navigate(&self, target: &Value) -> Result<Value> {
        eprintln!("[navigate] {target}");
        Ok(json!({ "navigatedTo": target }))
    }
}
