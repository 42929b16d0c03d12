use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use promap_blueprint::{Blueprint, BlueprintDef, VisibilityFilter};
use promap_engine::{EngineConfig, GeneratedProcess, InstantiateRequest, TemplateEngine};
use promap_process::MaterializedProcess;
use promap_store::{SqliteStore, Store};

/// Promap - create business processes from reusable templates
#[derive(Parser)]
#[command(name = "promap")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.promap)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// SQLite database URL (default: sqlite://<data-dir>/promap.db)
  #[arg(long, global = true)]
  database_url: Option<String>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Create or upgrade the database schema
  Migrate,

  /// Manage the template catalog
  Template {
    #[command(subcommand)]
    action: TemplateAction,
  },

  /// Create a process from a template
  Instantiate {
    /// ID of the template to instantiate
    template_id: String,

    /// Organization creating the process
    #[arg(long)]
    org: String,

    /// User creating the process
    #[arg(long)]
    user: String,

    /// Process name (default: the template's name)
    #[arg(long)]
    name: Option<String>,

    /// Process description (default: the template's description)
    #[arg(long)]
    description: Option<String>,
  },

  /// Persist a generated process graph from a JSON file
  Generate {
    /// Path to the generated process (JSON)
    process_file: PathBuf,

    #[arg(long)]
    org: String,

    #[arg(long)]
    user: String,
  },

  /// Inspect materialized processes
  Process {
    #[command(subcommand)]
    action: ProcessAction,
  },
}

#[derive(Subcommand)]
enum TemplateAction {
  /// Add a template definition (JSON) to the catalog
  Import {
    /// Path to the template file
    template_file: PathBuf,

    /// Owning organization; may only be omitted for public templates
    #[arg(long)]
    org: Option<String>,

    #[arg(long)]
    user: Option<String>,
  },

  /// List the templates an organization can see
  List {
    #[arg(long)]
    org: String,
  },
}

#[derive(Subcommand)]
enum ProcessAction {
  /// Print a process with its steps and connections
  Show { process_id: String },

  /// List an organization's processes
  List {
    #[arg(long)]
    org: String,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".promap"),
  };

  let Some(command) = cli.command else {
    println!("promap - use --help to see available commands");
    return Ok(());
  };

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async {
    let store = open_store(&data_dir, cli.database_url.as_deref()).await?;
    run(command, store).await
  })
}

async fn open_store(data_dir: &Path, database_url: Option<&str>) -> Result<SqliteStore> {
  let url = match database_url {
    Some(url) => url.to_string(),
    None => {
      tokio::fs::create_dir_all(data_dir)
        .await
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;
      format!("sqlite://{}", data_dir.join("promap.db").display())
    }
  };

  let store = SqliteStore::connect(&url)
    .await
    .with_context(|| format!("failed to open database: {url}"))?;
  store
    .migrate()
    .await
    .context("failed to run database migrations")?;
  Ok(store)
}

async fn run(command: Commands, store: SqliteStore) -> Result<()> {
  match command {
    Commands::Migrate => {
      eprintln!("Database is up to date");
      Ok(())
    }
    Commands::Template { action } => match action {
      TemplateAction::Import {
        template_file,
        org,
        user,
      } => import_template(&store, &template_file, org, user).await,
      TemplateAction::List { org } => {
        let templates = store
          .list_blueprints(&VisibilityFilter::for_organization(org))
          .await
          .context("failed to list templates")?;
        for template in templates {
          println!(
            "{}\t{}\t{}\t{}",
            template.id,
            template.name(),
            template.def.category.as_deref().unwrap_or("-"),
            template.usage_count
          );
        }
        Ok(())
      }
    },
    Commands::Instantiate {
      template_id,
      org,
      user,
      name,
      description,
    } => {
      let engine = TemplateEngine::new(store, EngineConfig::default());
      let mut request = InstantiateRequest::new(template_id, org, user);
      request.overrides.name = name;
      request.overrides.description = description;

      let graph = engine
        .instantiate(request)
        .await
        .context("failed to create process from template")?;
      print_process(&graph)
    }
    Commands::Generate {
      process_file,
      org,
      user,
    } => {
      let content = tokio::fs::read_to_string(&process_file)
        .await
        .with_context(|| format!("failed to read process file: {}", process_file.display()))?;
      let draft: GeneratedProcess = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse process file: {}", process_file.display()))?;

      let engine = TemplateEngine::new(store, EngineConfig::default());
      let graph = engine
        .materialize_generated(draft, &org, &user)
        .await
        .context("failed to create generated process")?;
      print_process(&graph)
    }
    Commands::Process { action } => match action {
      ProcessAction::Show { process_id } => {
        let graph = store
          .get_process(&process_id)
          .await
          .with_context(|| format!("failed to load process: {process_id}"))?;
        print_process(&graph)
      }
      ProcessAction::List { org } => {
        let processes = store
          .list_processes(&org)
          .await
          .context("failed to list processes")?;
        for process in processes {
          println!(
            "{}\t{}\t{:?}\t{}",
            process.id,
            process.name,
            process.status,
            process.template_id.as_deref().unwrap_or("-")
          );
        }
        Ok(())
      }
    },
  }
}

async fn import_template(
  store: &SqliteStore,
  template_file: &Path,
  org: Option<String>,
  user: Option<String>,
) -> Result<()> {
  let content = tokio::fs::read_to_string(template_file)
    .await
    .with_context(|| format!("failed to read template file: {}", template_file.display()))?;

  let def = BlueprintDef::from_json(&content)
    .with_context(|| format!("failed to parse template file: {}", template_file.display()))?;
  let blueprint = Blueprint::import(uuid::Uuid::new_v4().to_string(), def, org, user)
    .context("invalid template definition")?;
  store
    .create_blueprint(&blueprint)
    .await
    .context("failed to store template")?;

  eprintln!(
    "Imported template: {} ({} steps, {} connections)",
    blueprint.name(),
    blueprint.template_data().steps.len(),
    blueprint.template_data().connections.len()
  );
  println!("{}", blueprint.id);
  Ok(())
}

fn print_process(graph: &MaterializedProcess) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(graph)?);
  Ok(())
}
