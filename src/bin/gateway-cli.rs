use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Read-only operator CLI for the drawing gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:4000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Gateway status and registered providers
    Health,
    /// Days with recorded visits, newest first
    VisitDates,
    /// Visits recorded on a day (YYYY-MM-DD)
    Visits { date: String },
    /// Days with analysis history, newest first
    HistoryDates,
    /// Analysis attempts recorded on a day (YYYY-MM-DD)
    History { date: String },
}

impl Commands {
    fn path(&self) -> String {
        match self {
            Commands::Health => "/health".to_string(),
            Commands::VisitDates => "/visits/dates".to_string(),
            Commands::Visits { date } => format!("/visits/{}", date),
            Commands::HistoryDates => "/history/dates".to_string(),
            Commands::History { date } => format!("/history/{}", date),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let url = format!("{}{}", cli.url.trim_end_matches('/'), cli.command.path());
    let res = client.get(url).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Details: {}", text);
        }
        std::process::exit(1);
    }

    let body: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
