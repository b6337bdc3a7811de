use clap::Parser;
use hostbind_config_hcl::HclParser;
use hostbind_engine::config::{AppConfig, TomlParser};
use hostbind_engine::FunctionApp;

#[derive(Parser)]
#[command(name = "hostbind-manifest", about = "Validate a function app and print its binding manifest")]
struct Cli {
    /// Path to the app configuration (.toml or .hcl).
    #[arg(long, default_value = "functions.toml", env = "HOSTBIND_CONFIG")]
    config: String,

    /// Print only this function's function.json.
    #[arg(long)]
    function: Option<String>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    tracing::info!(config = %cli.config, "loading configuration");
    let config = match AppConfig::load_with(&cli.config, &[&TomlParser, &HclParser]) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to load config");
            std::process::exit(1);
        }
    };

    let app = match FunctionApp::bootstrap(&config) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "invalid function app");
            std::process::exit(1);
        }
    };
    tracing::info!(functions = app.functions().len(), "function app validated");

    let manifest = match &cli.function {
        Some(name) => match app.function(name) {
            Some(f) => f.dict_repr(),
            None => {
                tracing::error!(function = %name, "no such function");
                std::process::exit(1);
            }
        },
        None => app.manifest(),
    };

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&manifest)
    } else {
        serde_json::to_string(&manifest)
    };
    match rendered {
        Ok(text) => println!("{text}"),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize manifest");
            std::process::exit(1);
        }
    }
}
