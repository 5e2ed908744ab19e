// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use std::env;
use std::path::PathBuf;
use tracing::info;

use migration_dashboard::logging::{self, LogTarget, TUI_LOG_FILE};
use migration_dashboard::{format_thousands, Dashboard, DashboardConfig, Dataset, VERSION};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let check = is_check(&args);

    logging::init(&log_target(check))?;

    if check {
        let config = load_config(args.get(2))?;
        run_check(config)?;
    } else {
        let config = load_config(args.get(1))?;
        run_ui_mode(config)?;
    }

    Ok(())
}

fn is_check(args: &[String]) -> bool {
    args.get(1).map(String::as_str) == Some("check")
}

/// The TUI draws on the alternate screen, so its logs go to a file
fn log_target(check: bool) -> LogTarget {
    if check {
        LogTarget::Stderr
    } else {
        LogTarget::File(PathBuf::from(TUI_LOG_FILE))
    }
}

fn load_config(path: Option<&String>) -> Result<DashboardConfig> {
    let path = path.map(PathBuf::from);
    let config = DashboardConfig::load(path.as_deref())?;
    info!(data_dir = %config.data.dir.display(), "Configuration loaded");
    Ok(config)
}

/// Load every input and build one page without starting the UI
fn run_check(config: DashboardConfig) -> Result<()> {
    println!("🗺️  US Migration Dashboard v{} - Data Check", VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n📂 Loading data...");
    let dashboard = Dashboard::load(config)?;
    let data = dashboard.data();
    println!("✓ {} county names", data.names.len());
    println!("✓ {} county pairs", format_thousands(data.interactions.len() as i64));
    println!("✓ {} out / {} in county totals", data.out_totals.len(), data.in_totals.len());
    println!("✓ {} county polygons", dashboard.counties().features.len());
    println!("✓ {} gazetteer locations", dashboard.locations()?.len());

    println!("\n🔧 Building page...");
    let page = dashboard.render(None)?;
    for dataset in [Dataset::Interactions, Dataset::OutMigration, Dataset::InMigration] {
        println!("✓ {}: {} rows", dataset.label(), dashboard.table(dataset)?.len());
    }
    println!(
        "✓ Maps: {} out / {} in counties located",
        page.out_map.figure.data.len(),
        page.in_map.figure.data.len(),
    );
    println!("✓ NY metro rows: {}", page.regional.len());

    match &page.county {
        Some(county) => println!(
            "✓ Selected {}: in {} / out {} / net {}",
            county.name, county.cards[0].value, county.cards[1].value, county.cards[2].value
        ),
        None => println!("⚠️  No county to select"),
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ Data check complete ({} cached results)", dashboard.cache().len());

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: DashboardConfig) -> Result<()> {
    println!("🖥️  Loading US Migration Dashboard...\n");

    let dashboard = Dashboard::load(config)?;
    println!("✓ Loaded {} county pairs\n", dashboard.data().interactions.len());
    println!("Starting UI... (Press 'q' to quit, logs in {})\n", TUI_LOG_FILE);

    let mut app = ui::App::new(dashboard)?;
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: DashboardConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the web UI: cargo run --bin migration-server --features server");
    eprintln!("   Or check the data: migration-dashboard check [config.toml]");
    std::process::exit(1);
}
