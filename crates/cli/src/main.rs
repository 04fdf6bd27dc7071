use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize as _;
use std::path::PathBuf;
use unrelated_mcp_config::injection::{BuildMode, InjectedVariables, project, write_artifact};
use unrelated_mcp_config::{ResolvedConfig, find_config_file, load_config};
use unrelated_mcp_runtime::logging::{LogFormat, init_tracing};

#[derive(Debug, Parser)]
#[command(name = "unrelated-mcp", version, about = "Build tool for Unrelated MCP servers")]
struct Cli {
    /// Log level / filter (overridden by `RUST_LOG`).
    #[arg(long, global = true, env = "UNRELATED_MCP_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// `text` or `json`.
    #[arg(long, global = true, env = "UNRELATED_MCP_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve the config and write the injected-variables artifact.
    Build(BuildArgs),
    /// Same as `build`, in development mode (HTTP debug on).
    Dev(ProjectArgs),
    /// Print the resolved transports and the variables a build would inject.
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
struct ProjectArgs {
    /// Project directory to search for the config file.
    #[arg(long, default_value = ".")]
    project: PathBuf,

    /// Explicit config file (skips discovery).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory, relative to the project directory unless absolute.
    #[arg(long, default_value = ".unrelated-mcp")]
    out: PathBuf,
}

#[derive(Debug, Args)]
struct BuildArgs {
    #[command(flatten)]
    project: ProjectArgs,

    #[arg(long, value_enum, default_value_t = Mode::Production)]
    mode: Mode,
}

#[derive(Debug, Args)]
struct InspectArgs {
    #[command(flatten)]
    project: ProjectArgs,

    #[arg(long, value_enum, default_value_t = Mode::Development)]
    mode: Mode,

    /// Print the variables as one JSON object.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Development,
    Production,
}

impl From<Mode> for BuildMode {
    fn from(m: Mode) -> Self {
        match m {
            Mode::Development => Self::Development,
            Mode::Production => Self::Production,
        }
    }
}

fn resolve_project(args: &ProjectArgs) -> anyhow::Result<(PathBuf, ResolvedConfig)> {
    let path = match &args.config {
        Some(p) => p.clone(),
        None => find_config_file(&args.project)?,
    };
    let config = load_config(&path).with_context(|| format!("load {}", path.display()))?;
    let resolved = config.resolve();
    resolved.ensure_transport()?;
    Ok((path, resolved))
}

fn out_dir(args: &ProjectArgs) -> PathBuf {
    if args.out.is_absolute() {
        args.out.clone()
    } else {
        args.project.join(&args.out)
    }
}

fn transports(resolved: &ResolvedConfig) -> String {
    let mut enabled = Vec::new();
    if let Some(http) = &resolved.http {
        enabled.push(format!("http ({}:{}{})", http.host, http.port, http.endpoint));
    }
    if resolved.stdio.is_some() {
        enabled.push("stdio".to_string());
    }
    enabled.join(", ")
}

fn build(args: &ProjectArgs, mode: BuildMode) -> anyhow::Result<()> {
    let (config_path, resolved) = resolve_project(args)?;
    let vars = project(&resolved, mode)?;
    let out = out_dir(args);
    let artifact = write_artifact(&out, &vars)
        .with_context(|| format!("write artifact to {}", out.display()))?;

    println!(
        "{} {} ({} mode)",
        "✔".green(),
        "Build complete".bold(),
        mode
    );
    println!("  {} {}", "config:".dimmed(), config_path.display());
    println!("  {} {}", "transports:".dimmed(), transports(&resolved));
    println!("  {} {}", "tools:".dimmed(), resolved.paths.tools);
    println!("  {} {}", "artifact:".dimmed(), artifact.display());
    Ok(())
}

fn print_variables(vars: &InjectedVariables) -> anyhow::Result<()> {
    for (name, value) in vars {
        let parsed: serde_json::Value =
            serde_json::from_str(value).with_context(|| format!("decode {name}"))?;
        println!("{}", name.cyan().bold());
        println!("{}", serde_json::to_string_pretty(&parsed)?);
    }
    Ok(())
}

fn inspect(args: &InspectArgs) -> anyhow::Result<()> {
    let (config_path, resolved) = resolve_project(&args.project)?;
    let vars = project(&resolved, args.mode.into())?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&vars)?);
        return Ok(());
    }
    println!("{} {}", "config:".dimmed(), config_path.display());
    println!("{} {}", "transports:".dimmed(), transports(&resolved));
    if resolved.oauth.is_some() {
        println!("{} {}", "oauth:".dimmed(), "declared".yellow());
    }
    println!();
    print_variables(&vars)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Build(args) => build(&args.project, args.mode.into()),
        Command::Dev(args) => build(&args, BuildMode::Development),
        Command::Inspect(args) => inspect(&args),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(Some(&cli.log_level), cli.log_format);
    if let Err(e) = run(cli) {
        eprintln!("{} {e:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
