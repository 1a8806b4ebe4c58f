use anyhow::Result;
use clap::Parser;
use fund_compare::config::cli::{Cli, Command, LogFormat, PromptArgs, ServeArgs};
use fund_compare::domain::model::{FundList, PreferenceSet};
use fund_compare::utils::logger;
use fund_compare::{build_app, build_prompt};

#[tokio::main]
async fn main() -> Result<()> {
    // .env 要在解析參數前載入，clap 的 env 才讀得到
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.log_format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }

    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    match cli.command {
        Some(Command::Prompt(args)) => print_prompt(args),
        Some(Command::Serve) | None => serve(cli.serve).await,
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        origins = ?config.allowed_origins,
        model = %config.upstream.model,
        "✅ Configuration loaded"
    );

    let app = build_app(&config)?;

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Server running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}

fn print_prompt(args: PromptArgs) -> Result<()> {
    let funds = match FundList::new(&args.funds) {
        Ok(funds) => funds,
        Err(e) => {
            eprintln!("❌ {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let mut preferences = PreferenceSet::new();
    for (key, value) in args.preferences {
        preferences.insert(key, value);
    }

    println!("{}", build_prompt(&funds, &preferences));
    Ok(())
}
