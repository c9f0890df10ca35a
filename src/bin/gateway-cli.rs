use clap::{Parser, Subcommand};
use reqwest::Method;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Command-line client for the RPC gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, default_value = "/rpc/multiply")]
    route: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Multiply two integers through the gateway
    Multiply {
        #[arg(allow_negative_numbers = true)]
        a: i64,
        #[arg(allow_negative_numbers = true)]
        b: i64,
    },
    /// Send a CORS preflight and print the access-control headers
    Preflight,
    /// Check gateway liveness
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let endpoint = format!("{}{}", cli.url.trim_end_matches('/'), cli.route);

    match cli.command {
        Commands::Multiply { a, b } => {
            let res = client
                .post(&endpoint)
                .json(&json!({ "A": a, "B": b }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Preflight => {
            let res = client
                .request(Method::OPTIONS, &endpoint)
                .header("Origin", "http://localhost")
                .header("Access-Control-Request-Method", "POST")
                .send()
                .await?;
            println!("{}", res.status());
            for (name, value) in res.headers() {
                if name.as_str().starts_with("access-control-") {
                    println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
                }
            }
        }
        Commands::Health => {
            let res = client
                .get(format!("{}/healthz", cli.url.trim_end_matches('/')))
                .send()
                .await?;
            println!("{} {}", res.status(), res.text().await?.trim());
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprint!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
