mod config;
mod prompt;

use std::{fs, path::Path, sync::Arc};

use anyhow::{Context, Result, bail};
use apiplan_api::ApiClient;
use apiplan_engine::{DirectoryCatalogStore, DryRunSender, Engine, EngineError, HttpSender, StepError};
use apiplan_types::{ApiKeyLocation, Catalog, ExecutionPlan, Operation, ParameterLocation, ParameterSource, SecuritySchemeKind};
use apiplan_util::{expand_tilde, keystore::Keystore, status_error_message};
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::{config::AgentConfig, prompt::TerminalInput};

fn main() -> Result<()> {
    init_tracing();
    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("run", sub)) => run_plan(sub),
        Some(("validate", sub)) => validate_plan(sub),
        Some(("details", sub)) => show_details(sub),
        Some(("auth-info", sub)) => show_auth_info(sub),
        _ => bail!("expected a subcommand; see --help"),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_cli() -> Command {
    let alias = Arg::new("alias")
        .long("alias")
        .short('a')
        .required(true)
        .action(ArgAction::Set)
        .help("Alias the API was learned under");
    let plan = Arg::new("plan")
        .long("plan")
        .short('p')
        .required(true)
        .action(ArgAction::Set)
        .help("Path to the plan JSON file");
    let catalog_dir = Arg::new("catalog-dir")
        .long("catalog-dir")
        .global(true)
        .action(ArgAction::Set)
        .help("Directory holding <alias>.json catalogs (overrides config)");

    Command::new("apiplan")
        .about("Execute declarative multi-step API plans")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg(catalog_dir)
        .subcommand(
            Command::new("run")
                .about("Show a plan, ask for confirmation and execute it")
                .arg(alias.clone())
                .arg(plan.clone())
                .arg(
                    Arg::new("yes")
                        .long("yes")
                        .short('y')
                        .action(ArgAction::SetTrue)
                        .help("Skip the confirmation prompt"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Synthesize requests without sending them"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Check a plan against the catalog without executing it")
                .arg(alias.clone())
                .arg(plan),
        )
        .subcommand(
            Command::new("details")
                .about("List the operations of a learned API with their parameters and body fields")
                .arg(alias.clone())
                .arg(
                    Arg::new("operation")
                        .long("operation")
                        .short('o')
                        .action(ArgAction::Set)
                        .help("Show only this operation id"),
                ),
        )
        .subcommand(
            Command::new("auth-info")
                .about("Show the security schemes of a learned API")
                .arg(alias),
        )
}

fn run_plan(matches: &ArgMatches) -> Result<()> {
    let config = AgentConfig::load()?;
    let (alias, plan) = alias_and_plan(matches)?;
    let dry_run = matches.get_flag("dry-run");

    let sender: Arc<dyn HttpSender> = if dry_run {
        Arc::new(DryRunSender)
    } else {
        Arc::new(ApiClient::new(config.client_config()).context("failed to build HTTP client")?)
    };
    let engine = build_engine(&config, matches, sender);

    engine.validate(&plan, alias)?;
    eprintln!("{}", describe_plan(&plan));

    if !matches.get_flag("yes") && !prompt::confirm_execution().context("failed to read confirmation")? {
        eprintln!("Plan execution cancelled.");
        return Ok(());
    }

    info!(alias, dry_run, steps = plan.len(), "executing plan");
    let result = engine.execute(&plan, alias).inspect_err(print_status_hint)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn print_status_hint(error: &EngineError) {
    if let Some(StepError::Transport(transport)) = error.step_error()
        && let Some(hint) = transport.status().and_then(status_error_message)
    {
        eprintln!("{hint}");
    }
}

fn validate_plan(matches: &ArgMatches) -> Result<()> {
    let config = AgentConfig::load()?;
    let (alias, plan) = alias_and_plan(matches)?;
    let engine = build_engine(&config, matches, Arc::new(DryRunSender));

    engine.validate(&plan, alias)?;
    println!("Plan is valid: {} step(s) against '{alias}'.", plan.len());
    Ok(())
}

fn show_details(matches: &ArgMatches) -> Result<()> {
    let config = AgentConfig::load()?;
    let alias = matches.get_one::<String>("alias").context("missing --alias")?;
    let catalog = build_engine(&config, matches, Arc::new(DryRunSender)).catalog(alias)?;
    let operation_id = matches.get_one::<String>("operation").map(String::as_str);

    println!("{}", describe_operations(&catalog, alias, operation_id)?);
    Ok(())
}

fn show_auth_info(matches: &ArgMatches) -> Result<()> {
    let config = AgentConfig::load()?;
    let alias = matches.get_one::<String>("alias").context("missing --alias")?;
    let catalog = build_engine(&config, matches, Arc::new(DryRunSender)).catalog(alias)?;

    println!("{}", describe_security(&catalog, alias));
    Ok(())
}

fn alias_and_plan(matches: &ArgMatches) -> Result<(&str, ExecutionPlan)> {
    let alias = matches.get_one::<String>("alias").context("missing --alias")?;
    let plan_path = matches.get_one::<String>("plan").context("missing --plan")?;
    Ok((alias.as_str(), load_plan(Path::new(plan_path))?))
}

fn load_plan(path: &Path) -> Result<ExecutionPlan> {
    let content = fs::read_to_string(path).with_context(|| format!("failed to read plan {}", path.display()))?;
    let plan = ExecutionPlan::from_json_str(&content).with_context(|| format!("invalid plan {}", path.display()))?;
    debug!(path = %path.display(), steps = plan.len(), "plan loaded");
    Ok(plan)
}

fn build_engine(config: &AgentConfig, matches: &ArgMatches, sender: Arc<dyn HttpSender>) -> Engine {
    let catalog_dir = matches
        .get_one::<String>("catalog-dir")
        .map(|dir| expand_tilde(dir))
        .unwrap_or_else(|| config.catalog_dir());
    debug!(catalog_dir = %catalog_dir.display(), "using catalog directory");

    Engine::new(
        Arc::new(DirectoryCatalogStore::new(catalog_dir)),
        Arc::new(Keystore::from_env()),
        sender,
        Arc::new(TerminalInput),
    )
}

/// Human-readable plan listing shown before confirmation.
fn describe_plan(plan: &ExecutionPlan) -> String {
    let mut lines = vec![format!("Plan with {} step(s):", plan.len())];
    for step in &plan.steps {
        let mut line = format!("  Step {}: {}", step.step_id, step.operation_id);
        if !step.reasoning.trim().is_empty() {
            line.push_str(&format!(" ({})", step.reasoning.trim()));
        }
        lines.push(line);
        for (name, source) in &step.parameters {
            let origin = match source {
                ParameterSource::Literal { value } => format!("= {value}"),
                ParameterSource::Interactive => "asked when the step runs".to_string(),
                ParameterSource::Derived { from_step, path } => format!("from step {from_step} at {path}"),
            };
            lines.push(format!("      {name} {origin}"));
        }
    }
    lines.join("\n")
}

/// Operation listing for `details`; `operation_id` narrows it to one entry.
fn describe_operations(catalog: &Catalog, alias: &str, operation_id: Option<&str>) -> Result<String> {
    let mut lines = Vec::new();
    match operation_id {
        Some(id) => {
            let operation = catalog
                .operation(id)
                .with_context(|| format!("operation '{id}' not found in API '{alias}'"))?;
            lines.push(format!("Details for operation: {id}"));
            describe_operation(operation, &mut lines)?;
        }
        None => {
            lines.push(format!("Available operations for API: {alias}"));
            for operation in catalog.operations.values() {
                describe_operation(operation, &mut lines)?;
            }
        }
    }
    Ok(lines.join("\n"))
}

fn describe_operation(operation: &Operation, lines: &mut Vec<String>) -> Result<()> {
    lines.push("-".repeat(50));
    lines.push(format!("Operation ID: {}", operation.operation_id));
    lines.push(format!("  {} {}", operation.http_method.to_ascii_uppercase(), operation.path));
    if let Some(description) = operation.description.as_deref().filter(|text| !text.trim().is_empty()) {
        lines.push(format!("  Description: {}", description.trim()));
    }

    if !operation.parameters.is_empty() {
        lines.push("  Parameters:".to_string());
        for parameter in &operation.parameters {
            let location = match parameter.location {
                ParameterLocation::Path => "path",
                ParameterLocation::Query => "query",
                ParameterLocation::Header => "header",
            };
            lines.push(format!("    - {} (in: {location}, required: {})", parameter.name, parameter.required));
        }
    }

    if let Some(schema) = &operation.request_body_schema {
        lines.push("  Request body fields (application/json):".to_string());
        let rendered = serde_json::to_string_pretty(schema).context("failed to render request body schema")?;
        lines.extend(rendered.lines().map(|line| format!("    {line}")));
    }
    Ok(())
}

/// Security scheme listing for `auth-info`.
fn describe_security(catalog: &Catalog, alias: &str) -> String {
    if catalog.security_schemes.is_empty() {
        return format!("No security schemes defined for API '{alias}'.");
    }

    let mut lines = vec![format!("Authentication information for API: {alias}")];
    for (name, scheme) in &catalog.security_schemes {
        lines.push("-".repeat(50));
        lines.push(format!("Scheme name: {name}"));
        match &scheme.kind {
            SecuritySchemeKind::ApiKey { location, parameter_name } => {
                let location = match location {
                    ApiKeyLocation::Header => "header",
                    ApiKeyLocation::Query => "query",
                    ApiKeyLocation::Cookie => "cookie",
                };
                lines.push("  Type: apiKey".to_string());
                lines.push(format!("  Location: {location}"));
                lines.push(format!("  Parameter name: {parameter_name}"));
            }
            SecuritySchemeKind::HttpBearer => {
                lines.push("  Type: http".to_string());
                lines.push("  Scheme: bearer (Authorization: Bearer <credential>)".to_string());
            }
            SecuritySchemeKind::Other { description } => {
                lines.push("  Type: not applied by apiplan".to_string());
                if let Some(description) = description {
                    lines.push(format!("  Description: {description}"));
                }
            }
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiplan_types::ExecutionStep;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn run_accepts_flags() {
        let matches = build_cli()
            .try_get_matches_from(["apiplan", "run", "--alias", "items", "--plan", "plan.json", "--yes", "--dry-run"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "run");
        assert!(sub.get_flag("yes"));
        assert!(sub.get_flag("dry-run"));
        assert_eq!(sub.get_one::<String>("alias").map(String::as_str), Some("items"));
    }

    #[test]
    fn describe_plan_lists_steps_and_sources() {
        let mut first = ExecutionStep::new("1", "createItem").with_parameter("name", ParameterSource::literal("widget"));
        first.reasoning = "create the item".into();
        let plan = ExecutionPlan::new(vec![
            first,
            ExecutionStep::new("2", "getItemById")
                .with_parameter("itemId", ParameterSource::derived("1", "$.id"))
                .with_parameter("verbose", ParameterSource::Interactive),
        ]);

        let text = describe_plan(&plan);
        assert!(text.contains("Step 1: createItem (create the item)"));
        assert!(text.contains("name = \"widget\""));
        assert!(text.contains("itemId from step 1 at $.id"));
        assert!(text.contains("verbose asked when the step runs"));
    }

    const CATALOG: &str = r#"{
        "serverUrls": ["https://api.example.com"],
        "operations": {
            "createItem": {
                "operationId": "createItem",
                "httpMethod": "post",
                "path": "/items",
                "description": "Create an item",
                "requestBodySchema": {
                    "kind": "object",
                    "required": ["name"],
                    "properties": { "name": { "kind": "scalar", "type": "string" } }
                }
            },
            "getItemById": {
                "operationId": "getItemById",
                "httpMethod": "GET",
                "path": "/items/{itemId}",
                "parameters": [{ "name": "itemId", "in": "path", "required": true }],
                "security": [{ "ApiKeyAuth": [] }]
            }
        },
        "securitySchemes": {
            "ApiKeyAuth": { "name": "ApiKeyAuth", "kind": "apiKey", "location": "header", "parameterName": "X-API-KEY" },
            "BearerAuth": { "name": "BearerAuth", "kind": "httpBearer" },
            "OAuth": { "name": "OAuth", "kind": "other", "description": "oauth2 authorization code" }
        }
    }"#;

    #[test]
    fn details_and_auth_info_take_an_alias() {
        let matches = build_cli()
            .try_get_matches_from(["apiplan", "details", "--alias", "items", "-o", "getItemById"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "details");
        assert_eq!(sub.get_one::<String>("operation").map(String::as_str), Some("getItemById"));

        let matches = build_cli().try_get_matches_from(["apiplan", "auth-info", "--alias", "items"]).unwrap();
        assert_eq!(matches.subcommand_name(), Some("auth-info"));
        assert!(build_cli().try_get_matches_from(["apiplan", "auth-info"]).is_err());
    }

    #[test]
    fn details_lists_every_operation() {
        let catalog = Catalog::from_json_str(CATALOG).unwrap();
        let text = describe_operations(&catalog, "items", None).unwrap();

        assert!(text.starts_with("Available operations for API: items"));
        assert!(text.contains("Operation ID: createItem"));
        assert!(text.contains("  POST /items"));
        assert!(text.contains("  Description: Create an item"));
        assert!(text.contains("\"required\": ["));
        assert!(text.contains("  GET /items/{itemId}"));
        assert!(text.contains("    - itemId (in: path, required: true)"));
    }

    #[test]
    fn details_for_one_operation() {
        let catalog = Catalog::from_json_str(CATALOG).unwrap();
        let text = describe_operations(&catalog, "items", Some("getItemById")).unwrap();
        assert!(text.starts_with("Details for operation: getItemById"));
        assert!(!text.contains("createItem"));

        let error = describe_operations(&catalog, "items", Some("deleteItem")).unwrap_err();
        assert_eq!(error.to_string(), "operation 'deleteItem' not found in API 'items'");
    }

    #[test]
    fn auth_info_describes_each_scheme() {
        let catalog = Catalog::from_json_str(CATALOG).unwrap();
        let text = describe_security(&catalog, "items");

        assert!(text.contains("Scheme name: ApiKeyAuth"));
        assert!(text.contains("  Location: header"));
        assert!(text.contains("  Parameter name: X-API-KEY"));
        assert!(text.contains("Scheme name: BearerAuth"));
        assert!(text.contains("  Scheme: bearer"));
        assert!(text.contains("  Description: oauth2 authorization code"));

        assert_eq!(describe_security(&Catalog::default(), "empty"), "No security schemes defined for API 'empty'.");
    }

    #[test]
    fn load_plan_reports_path_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        fs::write(&path, "{").unwrap();
        let error = load_plan(&path).unwrap_err();
        assert!(error.to_string().contains("plan.json"));
    }
}
