//! Print every position broadcast from a geosync server.

use clap::Parser;
use geosync_sdk::GeoSyncClient;

/// Watch userLocationUpdate broadcasts
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Server URL
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    /// Token for servers that require an authenticated stream
    #[arg(long)]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut client = GeoSyncClient::new(&args.url);
    client.set_stream_token(args.token);
    let mut stream = client.connect().await?;
    println!("Watching {} (Ctrl-C to stop)", args.url);

    while let Some(entries) = stream.next_broadcast().await? {
        println!("--- {} position(s)", entries.len());
        for entry in entries {
            println!(
                "{:<24} ({:>10.6}, {:>11.6}) at {}",
                entry.user_id, entry.position[0], entry.position[1], entry.timestamp
            );
        }
    }

    println!("Stream closed");
    Ok(())
}
