//! Nikola registration CLI
//!
//! Drives the private registration API of a running `nikola` server.
//!
//! ```bash
//! # Register this deployment's domain with the partner platform
//! nikola-registration --base-url http://localhost:8080 register-application
//!
//! # Create a user and print the authorization URL they should open
//! nikola-registration register-user --username alice
//!
//! # Remove a user record
//! nikola-registration delete-user --user-id 4f0c...
//! ```
//!
//! `NIKOLA_BASE_URL` may be used instead of `--base-url`.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Network or decoding error
//! - 2: The server rejected the request

use clap::{Args, Parser, Subcommand, ValueEnum};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::process;

/// Response body of `POST /api/registration/users`
#[derive(Debug, Deserialize, Serialize)]
struct RegisteredUser {
    user_id: String,
    registration_code: String,
    registration_url: String,
}

#[derive(Parser)]
#[command(
    name = "nikola-registration",
    about = "Register the application and its users with the partner platform",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[arg(
        long,
        env = "NIKOLA_BASE_URL",
        default_value = "http://localhost:8080",
        help = "Base URL of the nikola server's private listener"
    )]
    base_url: String,

    #[arg(short, long, help = "Enable verbose output for debugging")]
    verbose: bool,

    #[arg(
        long,
        value_enum,
        default_value = "json",
        help = "Output format for responses"
    )]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Json,
    JsonPretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the configured domain with the partner platform
    RegisterApplication,
    /// Create a user record and its authorization URL
    RegisterUser(RegisterUserArgs),
    /// Delete a user record
    DeleteUser(DeleteUserArgs),
}

#[derive(Args)]
struct RegisterUserArgs {
    #[arg(long, help = "Name recorded for the new user")]
    username: String,
}

#[derive(Args)]
struct DeleteUserArgs {
    #[arg(long, help = "Identifier returned by register-user")]
    user_id: String,
}

#[derive(Debug)]
enum AppError {
    Network(reqwest::Error),
    Json(serde_json::Error),
    Registration(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Json(err)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Network(err) => write!(f, "Network error: {}", err),
            AppError::Json(err) => write!(f, "JSON error: {}", err),
            AppError::Registration(msg) => write!(f, "Registration error: {}", msg),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let client = Client::new();

    let result = match &cli.command {
        Commands::RegisterApplication => register_application(&cli, &client).await,
        Commands::RegisterUser(args) => register_user(&cli, &client, args).await,
        Commands::DeleteUser(args) => delete_user(&cli, &client, args).await,
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        let code = match err {
            AppError::Network(_) | AppError::Json(_) => 1,
            AppError::Registration(_) => 2,
        };
        process::exit(code);
    }
}

fn endpoint(cli: &Cli, path: &str) -> String {
    format!("{}{}", cli.base_url.trim_end_matches('/'), path)
}

async fn register_application(cli: &Cli, client: &Client) -> Result<(), AppError> {
    let url = endpoint(cli, "/api/registration/application");
    if cli.verbose {
        eprintln!("POST {}", url);
    }

    let response = client.post(&url).send().await?;
    if cli.verbose {
        eprintln!("Response status: {}", response.status());
    }

    match response.status() {
        StatusCode::OK => {
            let body: Value = response.json().await?;
            output_response(&cli.format, &body)
        }
        status => Err(rejection(status, response.text().await?)),
    }
}

async fn register_user(
    cli: &Cli,
    client: &Client,
    args: &RegisterUserArgs,
) -> Result<(), AppError> {
    let url = endpoint(cli, "/api/registration/users");
    if cli.verbose {
        eprintln!("POST {} (username: {})", url, args.username);
    }

    let response = client
        .post(&url)
        .json(&json!({ "username": args.username }))
        .send()
        .await?;
    if cli.verbose {
        eprintln!("Response status: {}", response.status());
    }

    match response.status() {
        StatusCode::OK => {
            let user: RegisteredUser = response.json().await?;
            output_response(&cli.format, &user)
        }
        status => Err(rejection(status, response.text().await?)),
    }
}

async fn delete_user(cli: &Cli, client: &Client, args: &DeleteUserArgs) -> Result<(), AppError> {
    let url = endpoint(cli, &format!("/api/registration/users/{}", args.user_id));
    if cli.verbose {
        eprintln!("DELETE {}", url);
    }

    let response = client.delete(&url).send().await?;
    if cli.verbose {
        eprintln!("Response status: {}", response.status());
    }

    match response.status() {
        StatusCode::NO_CONTENT => {
            println!("User '{}' deleted successfully.", args.user_id);
            Ok(())
        }
        StatusCode::NOT_FOUND => Err(AppError::Registration(format!(
            "User '{}' not found",
            args.user_id
        ))),
        status => Err(rejection(status, response.text().await?)),
    }
}

/// Prefer the server's `error_description` over the raw body.
fn rejection(status: StatusCode, body: String) -> AppError {
    let description = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| value["error_description"].as_str().map(str::to_string))
        .unwrap_or(body);
    AppError::Registration(format!("Request failed with status {}: {}", status, description))
}

fn output_response<T: Serialize>(format: &OutputFormat, data: &T) -> Result<(), AppError> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(data)?);
        }
        OutputFormat::JsonPretty => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
    }
    Ok(())
}
