use anyhow::{bail, Context, Result};
use flexcells::config::{load_config, AppConfig, CardConfig};
use flexcells::state::StateSnapshot;
use flexcells::view::render_card;
use std::path::Path;
use tracing::{info, warn};

fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flexcells=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [card_path, states_path] = args.as_slice() else {
        bail!("usage: flexcells <card.json> <states.json>");
    };

    // Load config (file if FLEXCELLS_CONFIG is set, then env overrides)
    let mut app = match std::env::var("FLEXCELLS_CONFIG") {
        Ok(path) => load_config(&path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e))?,
        Err(_) => {
            warn!("FLEXCELLS_CONFIG not set, using defaults");
            AppConfig::default()
        }
    };
    app.apply_env();

    let card = CardConfig::load_from_file(Path::new(card_path))
        .with_context(|| format!("Failed to load card {}", card_path))?;
    let states = StateSnapshot::load_from_file(Path::new(states_path))
        .with_context(|| format!("Failed to load states {}", states_path))?;

    info!(
        rows = card.rows.len(),
        columns = card.column_count,
        entities = states.len(),
        language = %app.display.language,
        "Rendering card"
    );

    println!("{}", render_card(&card, &states, &app));
    Ok(())
}
