use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::Value;
use stockroom_api::{
    auth::{AuthConfig, AuthService, Role},
    config::{self, AppConfig},
    db,
    repositories::{self, SharedStore},
    services::{
        reconciliation::{BatchReconciler, EntityKind},
        reports::{CompanyQuantity, QuantitySource, ReportService},
    },
};
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config().context("failed to load application config")?;
    config::init_tracing(&config.log_level, config.log_json);

    match cli.command {
        Commands::Import(args) => handle_import(&config, args).await?,
        Commands::Report(args) => handle_report(&config, args, cli.json).await?,
        Commands::Token(args) => handle_token(&config, args)?,
        Commands::Migrate => handle_migrate(&config).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "stockroom", about = "Stockroom operator CLI for imports, reports and tokens", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render report output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a JSON batch file against the configured store
    Import(ImportArgs),
    /// Print a company quantity report
    Report(ReportArgs),
    /// Issue a bearer token
    Token(TokenArgs),
    /// Run database migrations
    Migrate,
}

#[derive(Clone, Copy, ValueEnum)]
enum ImportKind {
    Companies,
    Products,
    DamageRecords,
}

impl From<ImportKind> for EntityKind {
    fn from(kind: ImportKind) -> Self {
        match kind {
            ImportKind::Companies => EntityKind::Companies,
            ImportKind::Products => EntityKind::Products,
            ImportKind::DamageRecords => EntityKind::DamageRecords,
        }
    }
}

#[derive(Args)]
struct ImportArgs {
    #[arg(value_enum, help = "Which entity the batch holds")]
    kind: ImportKind,
    #[arg(long, help = "Path to a JSON array of records")]
    file: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportMode {
    /// Top five companies ordered by name
    ByName,
    /// All companies ordered by quantity
    ByQuantity,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Stock,
    Damage,
}

impl From<SourceArg> for QuantitySource {
    fn from(source: SourceArg) -> Self {
        match source {
            SourceArg::Stock => QuantitySource::Stock,
            SourceArg::Damage => QuantitySource::Damage,
        }
    }
}

#[derive(Args)]
struct ReportArgs {
    #[arg(value_enum)]
    mode: ReportMode,
    #[arg(long, value_enum, default_value = "stock", help = "Sum product stock or unreleased damage")]
    source: SourceArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    R1,
    R2,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::R1 => Role::R1,
            RoleArg::R2 => Role::R2,
        }
    }
}

#[derive(Args)]
struct TokenArgs {
    #[arg(long, help = "Subject placed in the `sub` claim")]
    subject: String,
    #[arg(long, value_enum, ignore_case = true, help = "Role placed in the `roleId` claim")]
    role: RoleArg,
}

async fn open_store(config: &AppConfig) -> Result<SharedStore> {
    repositories::open_store(config)
        .await
        .context("failed to open storage")
}

async fn handle_import(config: &AppConfig, args: ImportArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let payload: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", args.file.display()))?;

    let store = open_store(config).await?;
    let reconciler = BatchReconciler::new(
        store,
        config.reference_validation,
        config.max_batch_size,
    );
    let kind = EntityKind::from(args.kind);
    debug!(target: "stockroom_cli", %kind, file = %args.file.display(), "running import");

    let outcome = reconciler
        .reconcile(kind, payload)
        .await
        .with_context(|| format!("{} import failed", kind))?;
    print_json(&outcome)
}

async fn handle_report(config: &AppConfig, args: ReportArgs, json: bool) -> Result<()> {
    let reports = ReportService::new(open_store(config).await?);
    let source = QuantitySource::from(args.source);
    let rows = match args.mode {
        ReportMode::ByName => reports.top_companies(source).await,
        ReportMode::ByQuantity => reports.company_ranking(source).await,
    }
    .context("failed to build report")?;

    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No companies with {} quantities", source);
    }
    rows.iter().for_each(render_row);
    Ok(())
}

fn handle_token(config: &AppConfig, args: TokenArgs) -> Result<()> {
    let auth = AuthService::new(AuthConfig::from(config));
    let token = auth
        .issue_token(&args.subject, Role::from(args.role))
        .context("failed to issue token")?;
    println!("{}", token);
    Ok(())
}

async fn handle_migrate(config: &AppConfig) -> Result<()> {
    if config.uses_in_memory_store() {
        bail!("storage_backend is in-memory; there is no database to migrate");
    }
    let pool = db::establish_connection_with_config(&db::DbConfig::from(config))
        .await
        .context("failed to connect to database")?;
    db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;
    println!("Migrations applied");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_row(row: &CompanyQuantity) {
    println!("- {} • {}", row.company_name, row.total_quantity);
}
