use clap::Parser;
use premium_client::{ClientError, Prediction, PremiumClient, ProbaOutcome, DEFAULT_URL};
use premium_core::schema::{Occupation, RawInput};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Predict the Low / Medium / High insurance premium category.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Prediction endpoint, e.g. http://host:port/predict
    #[arg(long, env = "PREMIUM_API_URL", default_value = DEFAULT_URL)]
    url: String,

    /// Age in years (1-119)
    #[arg(long, default_value_t = 34)]
    age: i64,

    /// Weight in kg
    #[arg(long, default_value_t = 82.0)]
    weight: f64,

    /// Height in meters (below 2.5)
    #[arg(long, default_value_t = 1.78)]
    height: f64,

    /// Annual income (LPA)
    #[arg(long, default_value_t = 18.2)]
    income: f64,

    #[arg(long, default_value_t = false)]
    smoker: bool,

    #[arg(long, default_value = "Seattle")]
    city: String,

    #[arg(long, default_value = "software_engineer")]
    occupation: Occupation,

    /// Also fetch class probabilities (if the server supports /predict_proba)
    #[arg(long, default_value_t = false)]
    proba: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let client = match PremiumClient::new(&args.url) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let input = RawInput {
        age: args.age,
        weight: args.weight,
        height: args.height,
        income: args.income,
        smoker: args.smoker,
        city: args.city,
        occupation: args.occupation,
    };

    let mut code = ExitCode::SUCCESS;
    match client.predict(&input).await {
        Ok(Prediction::Category(label)) => {
            println!("Predicted Insurance Premium Category: {label}");
        }
        Ok(Prediction::Other(body)) => {
            println!("Received response:");
            println!("{}", pretty(&body));
        }
        Err(ClientError::Api { status, body }) => {
            eprintln!("API Error: {status}");
            eprintln!("{}", pretty(&body));
            code = ExitCode::FAILURE;
        }
        Err(e) => {
            // unreachable server, timeout or bad input: nothing else to try
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    }

    if args.proba {
        match client.predict_proba(&input).await {
            ProbaOutcome::Available(resp) => {
                println!("Class Probabilities");
                for (class, p) in resp.classes.iter().zip(&resp.proba) {
                    println!("  {:<10} {:>8.4}", class, p);
                }
            }
            ProbaOutcome::Unavailable(reason) => {
                eprintln!("warning: {reason}");
            }
        }
    }

    code
}

fn pretty(v: &serde_json::Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}
