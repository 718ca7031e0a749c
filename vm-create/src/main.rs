use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use prism_module::{ModuleArgs, ModuleArgsError, ModuleOutput, run_module};
use prism_vm::NutanixVmCreate;
use thiserror::Error;
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(
    name = "nutanix_vm_create",
    about = "Create a virtual machine through the Nutanix Prism v3 API.",
    version
)]
struct Cli {
    /// Path to a JSON file of module arguments, as passed by Ansible.
    #[arg(
        value_name = "ARGS_FILE",
        conflicts_with = "params",
        required_unless_present = "params"
    )]
    args_file: Option<PathBuf>,

    /// Module arguments as a JSON string (top-level object).
    #[arg(long = "params", value_name = "PARAMS")]
    params: Option<String>,

    /// Report what would change without calling the API.
    #[arg(long = "check")]
    check: bool,

    /// Log level (e.g., trace, debug, info, warn, error). Logs go to stderr.
    #[arg(
        long = "log",
        value_name = "LEVEL",
        env = "NUTANIX_VM_CREATE_LOG",
        default_value = "warn"
    )]
    log: String,
}

#[derive(Error, Debug)]
enum AppError {
    #[error("failed to read module arguments from {path}: {source}")]
    ReadArgs {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    ModuleArgs(#[from] ModuleArgsError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    install_tracing(&cli.log);
    debug!(args_file = ?cli.args_file, check = cli.check, "parsed cli");

    let output = match load_args(&cli).await {
        Ok(args) => run_module::<NutanixVmCreate>(args.with_check_mode(cli.check)).await,
        Err(err) => {
            error!("{err}");
            ModuleOutput::failed(err.to_string(), None)
        }
    };

    let mut stdout = tokio::io::stdout();
    if let Err(err) = output.write(&mut stdout).await {
        error!("{err}");
        return ExitCode::FAILURE;
    }

    if output.is_failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn load_args(cli: &Cli) -> Result<ModuleArgs, AppError> {
    let json = match (&cli.params, &cli.args_file) {
        (Some(json), _) => json.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .map_err(|source| AppError::ReadArgs {
                path: path.clone(),
                source,
            })?,
        (None, None) => "{}".to_string(),
    };
    Ok(json.parse::<ModuleArgs>()?)
}

fn install_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .json()
        .with_current_span(true)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();
}
