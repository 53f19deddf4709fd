//! Bifrost CLI - studio paths and department gating

use std::collections::BTreeMap;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tokio_util::sync::CancellationToken;

use bifrost::{
    Bifrost, BifrostConfig, BifrostError, Context, ContextValue, EntityKind, FixSuggestion, Platform,
    PruneConfirmation,
};

#[derive(Parser)]
#[command(name = "bifrost")]
#[command(about = "Bifrost - studio path templates, folder sync and department gating")]
#[command(version)]
struct Cli {
    /// Pipeline documents directory (dependencies.yaml, folder_mapping.yaml, projects/)
    #[arg(long, global = true)]
    config_dir: Option<Utf8PathBuf>,

    /// Target path flavor (posix, windows)
    #[arg(long, global = true)]
    platform: Option<Platform>,

    /// Print the event log as JSON when done
    #[arg(long, global = true)]
    events: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Studio + context shared by the path commands
#[derive(Args)]
struct PathArgs {
    /// Path type (e.g. shot_anim_path)
    path_type: String,

    /// Studio id (defaults to the configured or default studio)
    #[arg(short, long)]
    studio: Option<String>,

    /// Context value, repeatable
    #[arg(short = 'v', long = "var", value_name = "KEY=VALUE", value_parser = parse_pair)]
    vars: Vec<(String, String)>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate every pipeline document
    Validate,

    /// Resolve a path type for a studio
    Resolve(PathArgs),

    /// Resolve the same context in two studios
    Translate {
        /// Path type
        path_type: String,

        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        #[arg(short = 'v', long = "var", value_name = "KEY=VALUE", value_parser = parse_pair)]
        vars: Vec<(String, String)>,
    },

    /// Resolve a path and create its missing directories
    Ensure(PathArgs),

    /// Compare expected directories with what is on disk
    Drift {
        #[command(flatten)]
        path: PathArgs,

        /// YAML file holding a list of contexts; --var values fill their gaps
        #[arg(long)]
        contexts: Option<Utf8PathBuf>,

        /// Scan timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Delete extra directories (needs --confirm)
        #[arg(long, requires = "confirm")]
        prune: bool,

        /// Confirmation printed by a previous scan
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Check whether a department may start on an entity
    CanStart {
        /// Department id
        department: String,

        /// Entity name (asset or shot)
        #[arg(short, long)]
        entity: String,

        #[arg(short, long)]
        project: Option<String>,

        /// Current department status, repeatable
        #[arg(long = "status", value_name = "DEPT=STATUS", value_parser = parse_pair)]
        statuses: Vec<(String, String)>,
    },

    /// Shot id from the series numbering pattern
    ShotId {
        episode: String,
        sequence: String,
        number: u32,
    },

    /// Show the department sequence for an entity type
    Workflow {
        /// asset or shot
        kind: EntityKind,

        /// Entity type (e.g. character, standard)
        entity_type: String,

        #[arg(short, long)]
        project: Option<String>,

        /// Entity name; with --status lists the departments ready to start
        #[arg(short, long)]
        entity: Option<String>,

        #[arg(long = "status", value_name = "DEPT=STATUS", value_parser = parse_pair)]
        statuses: Vec<(String, String)>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), BifrostError> {
    let mut config = BifrostConfig::load()?.with_env();
    if let Some(dir) = cli.config_dir {
        config.pipeline.config_dir = Some(dir);
    }
    if let Some(platform) = cli.platform {
        config.pipeline.platform = Some(platform);
    }

    let service = Bifrost::open(&config)?;
    let studio_for = |studio: Option<String>| -> String {
        studio
            .or_else(|| config.pipeline.studio.clone())
            .unwrap_or_else(|| service.snapshot().registry().default_studio().to_string())
    };

    match cli.command {
        Commands::Validate => validate(&service),
        Commands::Resolve(args) => {
            let studio = studio_for(args.studio);
            let path = service.resolve(&studio, &args.path_type, &context_from(&args.vars))?;
            println!("{}", path);
            Ok(())
        }
        Commands::Translate {
            path_type,
            from,
            to,
            vars,
        } => {
            let translation = service.translate(&context_from(&vars), &path_type, &from, &to)?;
            println!("{} {}", from.cyan(), translation.from);
            println!("{} {}", to.cyan(), translation.to);
            Ok(())
        }
        Commands::Ensure(args) => {
            let studio = studio_for(args.studio);
            let (path, outcome) =
                service.ensure(&studio, &args.path_type, &context_from(&args.vars))?;
            if outcome.is_noop() {
                println!("{} {} already exists", "✓".green(), path);
            } else {
                for dir in &outcome.created {
                    println!("{} {}", "+".green(), dir);
                }
            }
            Ok(())
        }
        Commands::Drift {
            path,
            contexts,
            timeout,
            prune,
            confirm,
        } => {
            let studio = studio_for(path.studio.clone());
            let base = context_from(&path.vars);
            let contexts_file = contexts;
            let contexts = match &contexts_file {
                Some(file) => {
                    let fill: BTreeMap<String, ContextValue> = base.into();
                    load_contexts(file)?
                        .into_iter()
                        .map(|c| c.with_defaults(&fill))
                        .collect()
                }
                None => vec![base],
            };
            let timeout = timeout.map_or_else(|| config.scan_timeout(), Duration::from_secs);

            let report = service
                .scan_drift_with_timeout(
                    &studio,
                    &path.path_type,
                    &contexts,
                    timeout,
                    CancellationToken::new(),
                )
                .await?;

            for dir in &report.missing {
                println!("{} {}", "missing".yellow(), dir);
            }
            for dir in &report.extra {
                println!("{} {}", "extra".red(), dir);
            }

            match (prune, confirm) {
                (true, Some(hex)) => {
                    let outcome =
                        service.prune_extra(&report, PruneConfirmation::from_hex(&hex)?)?;
                    for dir in &outcome.removed {
                        println!("{} {}", "-".red(), dir);
                    }
                }
                _ if report.is_clean() => println!("{} no drift", "✓".green()),
                _ if !report.extra.is_empty() => {
                    let hint = prune_hint(
                        &config,
                        &studio,
                        &path,
                        contexts_file.as_ref(),
                        &report.fingerprint_hex(),
                    );
                    println!("  {} bifrost {}", "To prune:".dimmed(), hint.join(" "));
                }
                _ => {}
            }
            Ok(())
        }
        Commands::CanStart {
            department,
            entity,
            project,
            statuses,
        } => {
            let statuses: BTreeMap<String, String> = statuses.into_iter().collect();
            let decision = service.evaluate(project.as_deref(), &entity, &department, &statuses)?;
            if decision.allowed {
                println!("{} {} can start on {}", "✓".green(), department, entity);
            } else {
                println!("{} {} is blocked on {}", "✗".red(), department, entity);
            }
            for unmet in &decision.unmet {
                println!(
                    "  {} {} is {} (needs {})",
                    "blocking".red(),
                    unmet.department,
                    unmet.current_status,
                    unmet.required_status
                );
            }
            for advisory in &decision.advisories {
                println!(
                    "  {} {} is {} (wants {})",
                    "advisory".yellow(),
                    advisory.department,
                    advisory.current_status,
                    advisory.required_status
                );
            }
            if !decision.allowed {
                std::process::exit(2);
            }
            Ok(())
        }
        Commands::ShotId {
            episode,
            sequence,
            number,
        } => {
            let snapshot = service.snapshot();
            let series = snapshot.series();
            let listed = series.sequence(&episode, &sequence).is_some();
            if series.episode(&episode).is_some() && !listed {
                eprintln!(
                    "{} sequence {} is not listed for {}",
                    "warning:".yellow(),
                    sequence,
                    episode
                );
            }
            println!("{}", service.generate_shot_id(&episode, &sequence, number));
            Ok(())
        }
        Commands::Workflow {
            kind,
            entity_type,
            project,
            entity,
            statuses,
        } => {
            let sequence = service.workflow_sequence(project.as_deref(), kind, &entity_type)?;
            let names: Vec<&str> = sequence.iter().map(AsRef::as_ref).collect();
            println!("{} {}", entity_type.cyan().bold(), names.join(" → "));

            if let Some(entity) = entity {
                let statuses: BTreeMap<String, String> = statuses.into_iter().collect();
                let ready = service.next_departments(
                    project.as_deref(),
                    kind,
                    &entity_type,
                    &entity,
                    &statuses,
                )?;
                let ready: Vec<&str> = ready.iter().map(AsRef::as_ref).collect();
                println!("  {} {}", "Ready:".green(), ready.join(", "));
            }
            Ok(())
        }
    }?;

    if cli.events {
        let json = serde_json::to_string_pretty(&service.events().to_json())?;
        println!("{}", json);
    }
    Ok(())
}

fn validate(service: &Bifrost) -> Result<(), BifrostError> {
    let snapshot = service.snapshot();
    let registry = snapshot.registry();
    let engine = snapshot.engine();

    println!("{} Pipeline configuration is valid", "✓".green());
    println!("  Default studio: {}", registry.default_studio());
    for studio in registry.studio_ids() {
        let types = registry.path_types(&studio)?;
        println!("  Studio {}: {} path types", studio.cyan(), types.len());
    }
    println!("  Departments: {}", engine.global_graph().departments().count());
    println!("  Workflows: {}", engine.workflow_names().len());
    println!("  Projects: {}", engine.project_names().len());
    println!("  Episodes: {}", snapshot.series().episodes().len());
    println!("  Fingerprint: {}", snapshot.fingerprint_hex());
    Ok(())
}

/// Arguments that repeat a scan with `--prune`, shell-quoted
fn prune_hint(
    config: &BifrostConfig,
    studio: &str,
    path: &PathArgs,
    contexts: Option<&Utf8PathBuf>,
    fingerprint: &str,
) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(dir) = &config.pipeline.config_dir {
        args.extend(["--config-dir".to_string(), shell_word(dir.as_str())]);
    }
    if let Some(platform) = config.pipeline.platform {
        args.extend(["--platform".to_string(), platform.to_string()]);
    }
    args.extend(["drift".to_string(), shell_word(&path.path_type)]);
    args.extend(["--studio".to_string(), shell_word(studio)]);
    for (key, value) in &path.vars {
        args.extend(["--var".to_string(), shell_word(&format!("{}={}", key, value))]);
    }
    if let Some(file) = contexts {
        args.extend(["--contexts".to_string(), shell_word(file.as_str())]);
    }
    args.extend([
        "--prune".to_string(),
        "--confirm".to_string(),
        fingerprint.to_string(),
    ]);
    args
}

fn shell_word(s: &str) -> String {
    let plain = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

fn context_from(vars: &[(String, String)]) -> Context {
    Context::from_pairs(vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
}

fn load_contexts(file: &Utf8PathBuf) -> Result<Vec<Context>, BifrostError> {
    let yaml = std::fs::read_to_string(file)?;
    Ok(serde_yaml::from_str(&yaml)?)
}
