// wallet-gate entrypoint

use std::path::Path;

use anyhow::Result;
use wallet_gate::{lifecycle, logging, ServerConfig};

#[actix_web::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = if Path::new(&config_path).exists() {
        match ServerConfig::from_file(&config_path) {
            Ok(cfg) => {
                eprintln!("Loaded config from: {}", config_path);
                logging::init_logging(&cfg.logging)?;
                cfg
            },
            Err(e) => {
                eprintln!("FATAL: Failed to load {}: {}", config_path, e);
                std::process::exit(1);
            },
        }
    } else {
        eprintln!("No {} found, using defaults", config_path);
        let mut cfg = ServerConfig::default();
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        logging::init_simple_logging()?;
        cfg
    };

    lifecycle::run(config).await
}
