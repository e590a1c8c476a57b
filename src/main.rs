use anyhow::Context;
use clap::Parser;
use snap_learn::capture::{CameraRequest, CaptureAdapter, FileCamera};
use snap_learn::client::{DemoDetector, DetectionClient, Detector};
use snap_learn::config::{mask_secret, Config};
use snap_learn::controller::App;
use snap_learn::{cli, logging, server, session};
use cli::{Cli, Commands};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let mut config = Config::load()?;

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind_address = bind;
            }
            if config.google_api_key.is_none() {
                println!("⚠ GOOGLE_API_KEY is not set; detection requests will fail with 500");
            }

            let listener = TcpListener::bind(&config.bind_address)
                .await
                .with_context(|| format!("failed to bind {}", config.bind_address))?;
            println!("🔎 snap-learn detection server on http://{}{}", listener.local_addr()?, server::DETECT_PATH);

            let state = server::ServerState::from_config(&config);
            server::serve(listener, state, async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await?;
        }

        Commands::Detect { source, endpoint, json, front } => {
            if let Some(endpoint) = endpoint {
                config.endpoint = Some(endpoint);
            }
            let client = DetectionClient::new(config.endpoint()?, config.api_token.clone())?;

            let mut camera = CaptureAdapter::new(FileCamera::new(source.clone()), config.frame_bounds())
                .with_request(CameraRequest::with_front(front));
            camera.acquire().await?;
            let image = camera.capture_frame()?;
            camera.release();
            if !json {
                println!("📸 Captured {}x{} from {}", image.width, image.height, source.display());
                println!("- Analyzing...");
            }

            let result = client.detect(&image).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("\n{}", session::format_result(&result));
            }
        }

        Commands::Session { source, endpoint, demo, front } => {
            if let Some(endpoint) = endpoint {
                config.endpoint = Some(endpoint);
            }
            let detector: Arc<dyn Detector> = if demo {
                println!("Demo mode: results are simulated");
                Arc::new(DemoDetector::default())
            } else {
                Arc::new(DetectionClient::new(config.endpoint()?, config.api_token.clone())?)
            };

            let camera = CaptureAdapter::new(FileCamera::new(source), config.frame_bounds())
                .with_request(CameraRequest::with_front(front));
            let mut app = App::new(camera, detector);
            session::run_interactive(&mut app).await?;
        }

        Commands::Config { set_api_token, set_endpoint, show } => {
            if let Some(token) = set_api_token {
                config.set_api_token(token)?;
                println!("✔ API token saved");
            }

            if let Some(endpoint) = set_endpoint {
                config.set_endpoint(endpoint)?;
                println!("✔ Endpoint saved");
            }

            if show {
                println!("Config: {}", Config::config_path()?.display());
                println!("  endpoint: {}", config.endpoint.as_deref().unwrap_or("(not set)"));
                println!("  api token: {}", mask_secret(config.api_token.as_deref()));
                println!("  google api key: {}", mask_secret(config.google_api_key.as_deref()));
                println!("  gemini url: {}", config.gemini_api_url);
                println!("  bind: {}", config.bind_address);
                println!(
                    "  frame: {}x{} @ quality {}",
                    config.max_image_width, config.max_image_height, config.jpeg_quality
                );
            }
        }
    }

    Ok(())
}
