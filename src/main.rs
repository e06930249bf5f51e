use clap::Parser;
use colored::Colorize;
use engagement_dashboard::{
    start_dashboard_server, Config, Dashboard, Dataset, ServeOptions,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "engagement-dashboard")]
#[command(author, version, about = "Interactive social media engagement dashboard")]
struct Args {
    /// Config file (default: nearest dashboard.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Debug mode: verbose logs, pretty JSON
    #[arg(long)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.parse().expect("invalid filter"))
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn fail(context: &str, err: &dyn std::error::Error) -> ! {
    eprintln!("{} {}: {}", "Error:".red().bold(), context, err);
    std::process::exit(1);
}

fn main() {
    let args = Args::parse();

    let mut config = match Config::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => fail("configuration", &e),
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.server.debug |= args.debug;

    init_logging(config.server.debug);

    // Loaded exactly once; every request borrows it
    let dataset = match Dataset::load(&config.data.path, config.data.on_bad_row) {
        Ok(d) => d,
        Err(e) => fail(&format!("loading {}", config.data.path.display()), &e),
    };
    let dashboard = Dashboard::new(dataset);

    eprintln!("\n{}", "Social Media Engagement Dashboard".green().bold());
    eprintln!(
        "   Dataset: {} ({} rows)",
        config.data.path.display(),
        dashboard.dataset().len()
    );
    if dashboard.dataset().skipped_rows() > 0 {
        eprintln!(
            "   {}",
            format!("Skipped {} unparseable rows", dashboard.dataset().skipped_rows()).yellow()
        );
    }
    eprintln!("   Dashboard: http://{}", config.bind_addr());
    eprintln!("   Press Ctrl+C to stop\n");

    let options = ServeOptions {
        debug: config.server.debug,
    };
    if let Err(e) = start_dashboard_server(&dashboard, &config.bind_addr(), options) {
        fail("server", &e);
    }
}
