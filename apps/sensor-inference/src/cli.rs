use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "sensor-inference",
    version,
    about = "Pump/motor sensor forecasting and anomaly detection service"
)]
pub struct Args {
    /// Overrides INFER_HTTP_BIND.
    #[arg(long)]
    pub bind: Option<String>,
    /// Overrides INFER_MODEL_DIR.
    #[arg(long)]
    pub model_dir: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    pub print_registry: bool,
    /// Load artifacts, print the capability report and exit.
    #[arg(long, default_value_t = false)]
    pub print_status: bool,
}
