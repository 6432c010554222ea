use anyhow::Context;
use clap::Parser;
use srcpack_lib::fs_utils::total_size;
use srcpack_lib::size::encode_size;
use srcpack_lib::{Bundler, Config};
use std::path::PathBuf;
use std::{collections::HashMap, env, fs, io};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Bundle a source directory into a zip file", long_about = None)]
pub struct Cli {
    /// The source directory to bundle (e.g. 'src')
    #[arg(required_unless_present = "generate_yaml_config")]
    pub source_directory: Option<PathBuf>,

    /// The name for the output zip file (without extension)
    #[arg(required_unless_present = "generate_yaml_config")]
    pub output_name: Option<String>,

    /// Directory to write the archive to (defaults to the directory of this executable)
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Size in MB above which a warning is printed
    #[arg(short, long)]
    pub max_size_mb: Option<f64>,

    /// Path substrings to exclude; replaces the default set (can be specified multiple times)
    #[arg(short, long)]
    pub blacklist: Vec<String>,

    /// Store entries without compression
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub store: bool,

    /// Dry run (just list files and parameters)
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    pub dry: bool,

    /// Generate YAML config to stdout
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub generate_yaml_config: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    // Step 1: Read environment
    let env_config = read_env();

    // Step 2: Read config file (if exists)
    let mut file_config = Config::default();
    if let Some(path) = cli.config.clone().or(env_config.config.clone()) {
        file_config = read_config_file(&path)?;
    }

    // Step 3: Merge configs: env < file < CLI
    let merged = merge_configs(env_config, file_config, cli_to_config(&cli));
    tracing::debug!(?merged, "merged configuration");

    if cli.generate_yaml_config {
        let yaml = serde_yaml::to_string(&merged)?;
        println!("{yaml}");
        return Ok(());
    }

    let (Some(source), Some(output_name)) = (cli.source_directory, cli.output_name) else {
        anyhow::bail!("both <SOURCE_DIRECTORY> and <OUTPUT_NAME> are required");
    };

    let bundler = Bundler::from_config(&merged)?;

    // Dry run: list what would be bundled
    if merged.dry.unwrap_or(false) {
        let plan = bundler.plan(&source)?;
        println!("--- DRY RUN ---");
        println!("Bundling the following files:");
        for entry in &plan.entries {
            println!("{}", entry.relative.display());
        }
        println!("Total entries: {}", plan.entries.len());
        println!("Total size: {}", encode_size(total_size(&plan.entries)?));
        println!("Output: {}", bundler.archive_path(&output_name)?.display());
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    bundler.bundle(&source, &output_name, &mut out)?;
    Ok(())
}

fn parse_bool(v: &str) -> bool {
    v == "true" || v == "1" || v.eq_ignore_ascii_case("yes")
}

/// Reads environment variables prefixed with SRCPACK_
fn read_env() -> Config {
    let vars: HashMap<String, String> = env::vars().collect();
    config_from_vars(&vars)
}

fn config_from_vars(vars: &HashMap<String, String>) -> Config {
    macro_rules! get_env {
        ($key:expr) => {
            vars.get(&format!("SRCPACK_{}", $key)).cloned()
        };
    }

    Config {
        output_dir: get_env!("OUTPUT_DIR"),
        config: get_env!("CONFIG"),
        max_size_mb: get_env!("MAX_SIZE_MB").and_then(|v| v.parse().ok()),
        max_size: None,
        blacklist: get_env!("BLACKLIST").map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        }),
        dry: get_env!("DRY").map(|v| parse_bool(&v)),
        compress: get_env!("COMPRESS").map(|v| parse_bool(&v)),
    }
}

/// Reads YAML or JSON config from file
fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading config file {path}"))?;
    let lower = path.to_lowercase();
    let cfg = if lower.ends_with(".json") {
        serde_json::from_str(&content).with_context(|| format!("parsing {path}"))?
    } else {
        serde_yaml::from_str(&content).with_context(|| format!("parsing {path}"))?
    };
    Ok(cfg)
}

/// Converts CLI struct into Config
fn cli_to_config(cli: &Cli) -> Config {
    Config {
        output_dir: cli.output_dir.clone(),
        config: cli.config.clone(),
        max_size_mb: cli.max_size_mb,
        max_size: None,
        blacklist: if cli.blacklist.is_empty() {
            None
        } else {
            Some(cli.blacklist.clone())
        },
        dry: cli.dry.then_some(true),
        compress: cli.store.then_some(false),
    }
}

/// Merge configs by priority: env < file < cli
fn merge_configs(env: Config, file: Config, cli: Config) -> Config {
    fn pick<T: Clone>(env: Option<T>, file: Option<T>, cli: Option<T>) -> Option<T> {
        cli.or(file).or(env)
    }

    // Both size fields describe one ceiling, so the highest layer setting either wins.
    fn ceiling(cfg: &Config) -> Option<(Option<f64>, Option<String>)> {
        (cfg.max_size_mb.is_some() || cfg.max_size.is_some())
            .then(|| (cfg.max_size_mb, cfg.max_size.clone()))
    }
    let (max_size_mb, max_size) =
        pick(ceiling(&env), ceiling(&file), ceiling(&cli)).unwrap_or_default();

    Config {
        output_dir: pick(env.output_dir, file.output_dir, cli.output_dir),
        config: pick(env.config, file.config, cli.config),
        max_size_mb,
        max_size,
        blacklist: pick(env.blacklist, file.blacklist, cli.blacklist),
        dry: pick(env.dry, file.dry, cli.dry),
        compress: pick(env.compress, file.compress, cli.compress),
    }
}
