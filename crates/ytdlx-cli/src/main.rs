//! ytdlx command-line binary.

use anyhow::{anyhow, bail, Context};
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ytdlx_core::locator::{EXTRACTOR, KNOWN_TOOLS};
use ytdlx_core::{
    CoreConfig, ExtractionClient, MediaSource, SessionBuilder, SessionOutcome, SessionRequest,
    ToolPaths, TranscodeSession,
};
use ytdlx_models::canonical_video_url;

const USAGE: &str = "usage:
  ytdlx info <url> [--tor]
  ytdlx mux <video-url> <output> [--audio <url>]
  ytdlx selfcheck";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = CoreConfig::from_env();
    let tools = ToolPaths::cached().clone();

    match args.first().map(String::as_str) {
        Some("info") => info_command(&args[1..], tools, config).await,
        Some("mux") => mux_command(&args[1..], &tools, &config).await,
        Some("selfcheck") => selfcheck(&tools, &config).await,
        _ => bail!("{}", USAGE),
    }
}

/// Logs go to stderr so stdout stays machine-readable; JSON when LOG_FORMAT=json.
fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("ytdlx=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

async fn info_command(args: &[String], tools: ToolPaths, config: CoreConfig) -> anyhow::Result<()> {
    let input = args.first().ok_or_else(|| anyhow!("{}", USAGE))?;
    let use_proxy = args[1..].iter().any(|a| a == "--tor");
    let url = canonical_video_url(input).with_context(|| format!("invalid video: {}", input))?;

    let client = ExtractionClient::new(tools, config);
    let result = match client.extract(&url, use_proxy).await {
        Ok(result) => result,
        Err(e) => {
            error!(category = ?e.category(), "Extraction failed: {}", e);
            return Err(e.into());
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn mux_command(args: &[String], tools: &ToolPaths, config: &CoreConfig) -> anyhow::Result<()> {
    let (video, output) = match args {
        [video, output, ..] => (video.clone(), output.clone()),
        _ => bail!("{}", USAGE),
    };
    let audio = match args[2..] {
        [ref flag, ref url, ..] if flag == "--audio" => Some(MediaSource::detect(url.clone())),
        [] => None,
        _ => bail!("{}", USAGE),
    };

    let mut request = SessionRequest::new(video);
    if let Some(audio) = audio {
        info!(audio = %audio, hls = audio.is_manifest(), "Using separate audio source");
        request = request.with_audio(audio);
    }
    let has_audio = request.audio.is_some();

    let builder = SessionBuilder::new(tools, config)?;
    let configure = move |session: TranscodeSession| {
        let session = if has_audio {
            session.map("0:v:0").map("1:a:0")
        } else {
            session
        };
        session
            .video_codec("copy")
            .audio_codec("copy")
            .output(&output)
            .on_progress(|p| info!(out_time = %p.out_time, speed = p.speed, "Transcoding"))
            .on_error(|e| error!(category = ?e.category(), "Transcode failed: {}", e))
    };

    let outcome = builder
        .build(request, configure, |p| {
            info!(completed = p.completed, total = p.total, "Audio segments {:.0}%", p.fraction() * 100.0)
        })
        .await?;

    match outcome {
        SessionOutcome::Ready(session) => session.run().await?,
        SessionOutcome::Piped(piped) => piped.wait().await?,
    }
    Ok(())
}

async fn selfcheck(tools: &ToolPaths, config: &CoreConfig) -> anyhow::Result<()> {
    println!("ytdlx selfcheck: work_root={}", config.work_root.display());
    ensure_work_root(&config.work_root).await?;

    for name in KNOWN_TOOLS {
        match tools.get(name) {
            Some(path) => println!("  {:<8} {}", name, path.display()),
            None => println!("  {:<8} (not found)", name),
        }
    }

    tools.require(EXTRACTOR)?;
    println!("ytdlx selfcheck: ok");
    Ok(())
}

async fn ensure_work_root(path: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("cannot create {}", path.display()))
}
