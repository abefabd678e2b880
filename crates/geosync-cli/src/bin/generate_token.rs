//! Print a signed token for a user.

use clap::Parser;
use geosync_cli::auth::{generate_token, TokenConfig};

/// Generate a geosync bearer token
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Identity embedded in the token
    #[arg(long)]
    user_id: String,

    /// Signing secret (defaults to GEOSYNC_JWT_SECRET or the development secret)
    #[arg(long)]
    secret: Option<String>,

    /// Validity in seconds
    #[arg(long, default_value_t = 24 * 3600, allow_hyphen_values = true)]
    ttl_secs: i64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = TokenConfig::default();
    if let Some(secret) = args.secret {
        config.secret = secret;
    }
    config.ttl_secs = args.ttl_secs;

    println!("{}", generate_token(&args.user_id, Some(config))?);
    Ok(())
}
