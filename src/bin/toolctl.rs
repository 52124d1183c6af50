use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "toolctl")]
#[command(about = "Admin CLI for the hello-tool-base service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080", env = "TOOLCTL_URL")]
    url: String,

    #[arg(short, long, env = "TOOLCTL_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show service name, version and uptime
    Status,
    /// Dump the metrics snapshot
    Metrics {
        /// Print only the recent error history
        #[arg(long)]
        errors: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Status => {
            let res = client
                .get(format!("{base}/admin/status"))
                .headers(headers)
                .send()
                .await?;
            print_response(res, None).await?;
        }
        Commands::Metrics { errors } => {
            let res = client
                .get(format!("{base}/admin/metrics"))
                .headers(headers)
                .send()
                .await?;
            print_response(res, errors.then_some("lastErrors")).await?;
        }
    }

    Ok(())
}

async fn print_response(
    res: reqwest::Response,
    field: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: admin API returned status {status}");
        if let Ok(text) = res.text().await {
            eprintln!("Response: {text}");
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    let shown = match field {
        Some(field) => json.get(field).cloned().unwrap_or(Value::Null),
        None => json,
    };
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}
