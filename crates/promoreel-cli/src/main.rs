use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;

use promoreel_core::{
    Config, DriveClient, EMAIL_SUBJECT, GmailClient, MediaClient, OpenAiChat, RunDir, SceneAssets,
    VideoOptions, compose_video, copy_images, generate_script, pair_assets, parse_script,
    recipient_name, render_email_body, run_research, scraping_client, share_link, video_status,
};

#[derive(Parser)]
#[command(name = "promoreel")]
#[command(
    about = "Research a topic on a company website and produce a narrated promo video with captions"
)]
struct Cli {
    /// Topic to research and promote
    topic: String,

    /// Company website to scrape for source material
    url: String,

    /// Email address that receives the status report
    email: String,

    /// Chat model (overrides PROMOREEL_CHAT_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Playback speed applied to synthesized speech
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Final scale of the per-scene zoom-in
    #[arg(long, default_value_t = 1.3)]
    zoom_factor: f64,

    /// Caption font file (overrides PROMOREEL_FONT)
    #[arg(long)]
    font: Option<PathBuf>,

    /// Use this local image as a scene instead of a generated one (repeatable)
    #[arg(long = "image-path")]
    image_paths: Vec<PathBuf>,

    /// Also copy the finished video to this path
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Validate credentials early
    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };
    if let Some(model) = cli.model {
        config.chat_model = model;
    }
    if let Some(font) = cli.font {
        config.font_path = font;
    }

    for tool in ["ffmpeg", "ffprobe"] {
        if which::which(tool).is_err() {
            eprintln!(
                "{} {} not found in PATH",
                style("Error:").red().bold(),
                tool
            );
            std::process::exit(1);
        }
    }
    if which::which("yt-dlp").is_err() {
        println!(
            "{}",
            style("yt-dlp not found, video transcripts will be skipped").dim()
        );
    }

    println!(
        "\n{}  {}\n",
        style("promoreel").cyan().bold(),
        style("Promo Video Generator").dim()
    );

    let http = reqwest::Client::new();
    let chat = OpenAiChat::new(http.clone(), &config.openai_api_key, &config.chat_model);
    let run_dir = RunDir::create().await?;

    // Step 1: Research (browser-UA client, some sites reject the default one)
    let spinner = create_spinner(&format!("Researching \"{}\"...", cli.topic));
    let scraper = scraping_client()?;
    let summaries = run_research(
        &chat,
        &scraper,
        &cli.url,
        &cli.topic,
        &run_dir.transcripts_dir(),
    )
    .await?;
    if summaries.is_empty() {
        spinner.finish_with_message(format!(
            "{} No relevant content found for \"{}\", nothing to do",
            style("✗").yellow().bold(),
            cli.topic
        ));
        return Ok(());
    }
    spinner.finish_with_message(format!(
        "{} Researched: {} relevant sources",
        style("✓").green().bold(),
        summaries.len()
    ));

    // Step 2: Script
    let spinner = create_spinner("Writing script...");
    let script = generate_script(&chat, &cli.topic, &summaries).await?;
    let pairs = parse_script(&script);
    if pairs.is_empty() {
        spinner.finish_and_clear();
        bail!("model returned a script with no narration/image pairs");
    }
    spinner.finish_with_message(format!(
        "{} Script ready: {} scenes",
        style("✓").green().bold(),
        pairs.len()
    ));

    // Step 3: Images and speech
    let media = MediaClient::new(http.clone(), &config.openai_api_key);
    let prompts: Vec<String> = pairs.iter().map(|p| p.image_prompt.clone()).collect();
    let narrations: Vec<String> = pairs.iter().map(|p| p.narration.clone()).collect();

    let images = if cli.image_paths.is_empty() {
        let spinner = create_spinner("Generating images...");
        let images = media.generate_images(&prompts, &run_dir).await?;
        spinner.finish_with_message(format!(
            "{} Images generated: {}",
            style("✓").green().bold(),
            images.len()
        ));
        images
    } else {
        let images = copy_images(&cli.image_paths, &run_dir).await?;
        println!(
            "{} Using {} provided images",
            style("✓").green().bold(),
            images.len()
        );
        images
    };

    let spinner = create_spinner("Synthesizing speech...");
    let speeches = media
        .generate_speeches(&narrations, cli.speed, &run_dir)
        .await?;
    spinner.finish_with_message(format!(
        "{} Speech synthesized: {} clips",
        style("✓").green().bold(),
        speeches.len()
    ));

    // Step 4: Composite the video
    let scenes: Vec<SceneAssets> = pair_assets(images, speeches, narrations);
    let opts = VideoOptions {
        zoom_factor: cli.zoom_factor,
        font_path: config.font_path.clone(),
        ..VideoOptions::default()
    };
    let spinner = create_spinner("Rendering video...");
    let video_path = compose_video(&scenes, &opts, &run_dir).await?;
    spinner.finish_with_message(format!(
        "{} Video rendered: {}",
        style("✓").green().bold(),
        style(video_path.display()).dim()
    ));

    if let Some(out) = &cli.out {
        fs::copy(&video_path, out).await?;
        println!(
            "{} Copied to {}",
            style("✓").green().bold(),
            style(out.display()).cyan()
        );
    }

    // Step 5: Upload to Drive
    let drive = DriveClient::new(http.clone(), &config.drive);
    let spinner = create_spinner("Uploading to Google Drive...");
    let status = match drive.upload(&video_path, &cli.topic).await {
        Ok(file_id) => {
            let link = share_link(&file_id);
            spinner.finish_with_message(format!(
                "{} Uploaded: {}",
                style("✓").green().bold(),
                style(&link).cyan()
            ));
            video_status(&link)
        }
        Err(e) => {
            spinner.finish_with_message(format!(
                "{} Upload failed: {}",
                style("✗").yellow().bold(),
                e
            ));
            format!("Video upload failed: {}", e)
        }
    };

    // Step 6: Email the status report
    let gmail = GmailClient::new(http.clone(), &config.gmail);
    let body = render_email_body(recipient_name(&cli.email), Some(&status));
    let spinner = create_spinner(&format!("Emailing {}...", cli.email));
    match gmail.send(&cli.email, EMAIL_SUBJECT, &body).await {
        Ok(()) => spinner.finish_with_message(format!(
            "{} Email sent to {}!",
            style("✓").green().bold(),
            cli.email
        )),
        Err(e) => spinner.finish_with_message(format!(
            "{} Error sending email: {}",
            style("✗").yellow().bold(),
            e
        )),
    }

    println!(
        "\n{} {}\n",
        style("Saved:").dim(),
        style(video_path.display()).cyan()
    );

    Ok(())
}
