mod envelope;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use simp_core::{ConstantKind, ConstantRequest, ConstantResult, Resolution, Resolver};
use simp_store::{Config, Store};

use crate::envelope::Envelope;

#[derive(Parser)]
#[command(
    name = "simp",
    about = "Physical constants (Sef, Kp, density) for pitometric KPC calculations"
)]
struct Cli {
    /// Config file (default: $SIMP_DATA_DIR/simp.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Listen address, overrides server.bind
        #[arg(long)]
        bind: Option<String>,
    },

    /// Resolve one constant, or all of them with `todos`
    Resolve {
        /// sef, kp, densidade or todos
        tipo: String,

        /// Nominal diameter (mm)
        #[arg(long)]
        diametro_nominal: Option<String>,

        /// TAP projection (mm)
        #[arg(long)]
        projecao_tap: Option<String>,

        /// Water temperature (°C), default 25
        #[arg(long, allow_negative_numbers = true)]
        temperatura: Option<String>,

        /// Print the JSON envelope served over HTTP
        #[arg(long)]
        json: bool,
    },

    /// Insert or update a calibrated reference value
    Set {
        /// sef, kp or densidade
        kind: String,
        /// Reference key (DN for sef, projection for kp, °C for densidade)
        #[arg(allow_negative_numbers = true)]
        reference: f64,
        /// Value (m² for sef, dimensionless for kp, kg/m³ or fraction for densidade)
        #[arg(allow_negative_numbers = true)]
        value: f64,
        /// Secondary key (DN, kp only)
        #[arg(long)]
        reference_b: Option<f64>,
    },

    /// Remove a calibrated reference value
    Remove {
        kind: String,
        #[arg(allow_negative_numbers = true)]
        reference: f64,
        #[arg(long)]
        reference_b: Option<f64>,
    },

    /// List calibrated reference values
    List {
        /// Only this kind
        kind: Option<String>,
    },

    /// Load the standard reference tables into the store
    Seed {
        /// Replace values that already exist
        #[arg(long)]
        overwrite: bool,
    },

    /// Show constant definitions and units
    Kinds,
}

struct Settings {
    base_dir: PathBuf,
    config: Config,
}

impl Settings {
    fn load(cli: &Cli) -> Result<Self> {
        let base_dir = std::env::var("SIMP_DATA_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(simp_store::default_base_dir);
        let config = Config::load(cli.config.as_deref(), &base_dir)
            .context("failed to load configuration")?;
        Ok(Self { base_dir, config })
    }

    fn open_store(&self) -> Result<Store> {
        let path = self.config.database_path(&self.base_dir);
        Store::open_with(&path, &self.config.database)
            .with_context(|| format!("failed to open store at {}", path.display()))
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let ctx = Settings::load(&cli)?;

    match &cli.command {
        Commands::Serve { bind } => cmd_serve(&ctx, bind.as_deref()).await,
        Commands::Resolve {
            tipo,
            diametro_nominal,
            projecao_tap,
            temperatura,
            json,
        } => cmd_resolve(
            &ctx,
            tipo,
            diametro_nominal.as_deref(),
            projecao_tap.as_deref(),
            temperatura.as_deref(),
            *json,
        ),
        Commands::Set {
            kind,
            reference,
            value,
            reference_b,
        } => cmd_set(&ctx, kind, *reference, *reference_b, *value),
        Commands::Remove {
            kind,
            reference,
            reference_b,
        } => cmd_remove(&ctx, kind, *reference, *reference_b),
        Commands::List { kind } => cmd_list(&ctx, kind.as_deref()),
        Commands::Seed { overwrite } => cmd_seed(&ctx, *overwrite),
        Commands::Kinds => cmd_kinds(&ctx),
    }
}

fn parse_kind(kind: &str) -> Result<ConstantKind> {
    kind.parse::<ConstantKind>().map_err(anyhow::Error::from)
}

async fn cmd_serve(ctx: &Settings, bind: Option<&str>) -> Result<()> {
    let store = ctx.open_store()?;
    let bind = bind.unwrap_or(ctx.config.server.bind.as_str());
    let state = Arc::new(server::AppState::new(
        store,
        ctx.config.server.lock_timeout(),
    ));
    tracing::info!("starting constants server on {bind}");
    server::serve(state, bind).await
}

fn cmd_resolve(
    ctx: &Settings,
    tipo: &str,
    diametro_nominal: Option<&str>,
    projecao_tap: Option<&str>,
    temperatura: Option<&str>,
    json: bool,
) -> Result<()> {
    let request = match ConstantRequest::parse(Some(tipo), diametro_nominal, projecao_tap, temperatura)
    {
        Ok(request) => request,
        Err(e) => {
            if json {
                println!("{}", serde_json::to_string(&Envelope::error(&e))?);
            }
            return Err(e.into());
        }
    };

    let store = ctx.open_store()?;
    let resolution = Resolver::new(&store).resolve_request(&request);

    if json {
        println!("{}", serde_json::to_string_pretty(&Envelope::from(resolution))?);
        return Ok(());
    }

    match resolution {
        Resolution::One(kind, result) => print_result(kind, &result),
        Resolution::All(set) => {
            print_result(ConstantKind::Sef, &set.sef);
            print_result(ConstantKind::Kp, &set.kp);
            print_result(ConstantKind::Densidade, &set.densidade);
        }
    }
    Ok(())
}

fn print_result(kind: ConstantKind, result: &ConstantResult) {
    let label = format!("{kind}:");
    match result.format {
        Some(format) => println!("{label:<11}{} ({}, {format})", result.value, result.source),
        None => println!("{label:<11}{} ({})", result.value, result.source),
    }
}

fn cmd_set(
    ctx: &Settings,
    kind: &str,
    reference: f64,
    reference_b: Option<f64>,
    value: f64,
) -> Result<()> {
    let kind = parse_kind(kind)?;
    let store = ctx.open_store()?;
    let id = store
        .upsert_reference(kind, reference, reference_b, value)
        .context("failed to store reference value")?;
    println!("{} {} = {value} (row {id})", kind, format_key(reference, reference_b));
    Ok(())
}

fn cmd_remove(ctx: &Settings, kind: &str, reference: f64, reference_b: Option<f64>) -> Result<()> {
    let kind = parse_kind(kind)?;
    let store = ctx.open_store()?;
    let removed = store
        .delete_reference(kind, reference, reference_b)
        .context("failed to remove reference value")?;
    if removed {
        println!("removed {} {}", kind, format_key(reference, reference_b));
    } else {
        println!("no {} row at {}", kind, format_key(reference, reference_b));
    }
    Ok(())
}

fn cmd_list(ctx: &Settings, kind: Option<&str>) -> Result<()> {
    let kind = kind.map(parse_kind).transpose()?;
    let store = ctx.open_store()?;
    let rows = store
        .list_references(kind)
        .context("failed to list reference values")?;

    if rows.is_empty() {
        println!("(no reference values)");
        return Ok(());
    }

    println!("{:<10} {:>10} {:>10} {:>12}", "kind", "reference", "ref_b", "value");
    for row in &rows {
        let reference_b = row
            .reference_b
            .map(|b| b.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<10} {:>10} {:>10} {:>12}",
            row.kind.to_string(),
            row.reference,
            reference_b,
            row.value
        );
    }
    println!("{} rows", rows.len());
    Ok(())
}

fn cmd_seed(ctx: &Settings, overwrite: bool) -> Result<()> {
    let store = ctx.open_store()?;
    let written = store
        .seed_standard_tables(overwrite)
        .context("failed to seed reference tables")?;
    println!("seeded {written} reference values");
    Ok(())
}

fn cmd_kinds(ctx: &Settings) -> Result<()> {
    let store = ctx.open_store()?;
    for def in store.definitions().context("failed to read definitions")? {
        let reference = match &def.reference_b_unit {
            Some(b) => format!("{} × {b}", def.reference_unit),
            None => def.reference_unit.clone(),
        };
        let value = def.value_unit.as_deref().unwrap_or("dimensionless");
        println!("{:<10} reference: {reference:<10} value: {value}", def.name);
    }
    Ok(())
}

fn format_key(reference: f64, reference_b: Option<f64>) -> String {
    match reference_b {
        Some(b) => format!("[{reference}, {b}]"),
        None => format!("[{reference}]"),
    }
}
