//! CLI tool to stream simulated positions to a geosync server.
//!
//! Simulates a single client moving in a circle.

use clap::Parser;
use geosync_cli::auth::{generate_token, TokenConfig};
use geosync_cli::sim::{CircularPath, MovementPath};
use geosync_core::ServerEvent;
use geosync_sdk::GeoSyncClient;
use std::time::Duration;
use tokio::time;

/// Send positions to a geosync server (single client, circular path)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Server URL
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    /// Identity to publish as
    #[arg(long, default_value = "alice")]
    user_id: String,

    /// Pre-issued token (generated locally when omitted)
    #[arg(long)]
    token: Option<String>,

    /// Center latitude
    #[arg(long, default_value_t = 37.7749, allow_hyphen_values = true)]
    lat: f64,

    /// Center longitude
    #[arg(long, default_value_t = -122.4194, allow_hyphen_values = true)]
    lon: f64,

    /// Circle radius in meters
    #[arg(long, default_value_t = 200.0)]
    radius: f64,

    /// Speed in meters per second
    #[arg(long, default_value_t = 5.0)]
    speed: f64,

    /// Duration in seconds
    #[arg(long, default_value_t = 60)]
    duration: u64,

    /// Update rate in Hz
    #[arg(long, default_value_t = 1.0)]
    rate: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if !args.rate.is_finite() || args.rate <= 0.0 {
        anyhow::bail!("--rate must be positive");
    }

    let token = match args.token.clone() {
        Some(token) => token,
        None => generate_token(&args.user_id, Some(TokenConfig::default()))?,
    };

    println!("Connecting to geosync server at {}...", args.url);
    let mut client = GeoSyncClient::new(&args.url);
    client.set_stream_token(Some(token.clone()));
    let mut stream = client.connect().await?;

    let path = CircularPath::new(args.lat, args.lon, args.radius, args.speed);

    println!("Starting circular path for {}", args.user_id);
    println!("  Center: ({}, {})", args.lat, args.lon);
    println!("  Radius: {}m, Speed: {}m/s", args.radius, args.speed);
    println!("  Duration: {}s, Update rate: {}Hz", args.duration, args.rate);
    println!();

    let start = time::Instant::now();
    let mut update_count = 0u32;
    let mut interval = time::interval(Duration::from_secs_f64(1.0 / args.rate));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let elapsed = start.elapsed().as_secs_f64();
                if elapsed > args.duration as f64 {
                    break;
                }

                let (lat, lon) = path.get_position(elapsed);
                match stream.send_update(&token, lat, lon).await {
                    Ok(_) => {
                        update_count += 1;
                        println!("[{:3}] Sent position ({:.6}, {:.6})", update_count, lat, lon);
                    }
                    Err(e) => {
                        eprintln!("Error sending position: {}", e);
                        break;
                    }
                }
            }
            event = stream.next_event() => {
                match event? {
                    Some(ServerEvent::Error(payload)) => eprintln!("Server error: {}", payload.message),
                    Some(ServerEvent::UserLocationUpdate(entries)) => {
                        println!("      Broadcast with {} position(s)", entries.len());
                    }
                    None => {
                        eprintln!("Server closed the stream");
                        break;
                    }
                }
            }
        }
    }

    stream.close().await.ok();
    println!("\nSimulation complete. Sent {} position updates.", update_count);
    Ok(())
}
