use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use serde::Serialize;
use tabstash_practice::audio::{
    render_click_track, write_wav, MAX_RENDER_SAMPLE_RATE, MAX_RENDER_SECONDS,
};
use tabstash_practice::scroll::{FrameQueue, ScrollState, ScrollSurface, VirtualSurface};
use tabstash_practice::search::{SearchOutcome, TabItem};
use tabstash_practice::{BeatClock, PracticeConfig, ScrollDriver, SearchService, Tempo};

#[derive(Parser, Debug)]
#[command(
    name = "tabstash",
    about = "Practice tools for TabStash: metronome, auto-scroll and tab search"
)]
struct Cli {
    /// JSON configuration file (defaults apply when absent or invalid)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play the metronome on the default output device and print each beat
    Metronome {
        /// Tempo as typed by the user; clamped to 20-300, non-numeric -> 120
        #[arg(long, default_value = "120")]
        bpm: String,
        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(long)]
        seconds: Option<f64>,
    },
    /// Render a click track to a WAV file
    Render {
        #[arg(long, default_value = "120")]
        bpm: String,
        #[arg(long, default_value_t = 8)]
        beats: u64,
        #[arg(long)]
        sample_rate: Option<u32>,
        #[arg(long)]
        output: PathBuf,
    },
    /// Query a search index file and print the results panel as JSON
    Search {
        #[arg(long)]
        index: PathBuf,
        query: String,
    },
    /// Simulate auto-scroll over a virtual document and print a summary
    Scroll {
        #[arg(long, default_value = "medium")]
        speed: String,
        /// Derive the rate from this tempo instead of the speed preset
        #[arg(long)]
        sync_bpm: Option<String>,
        #[arg(long, default_value_t = 800.0)]
        viewport: f64,
        #[arg(long, default_value_t = 2000.0)]
        document: f64,
        #[arg(long, default_value_t = 60.0)]
        fps: f64,
        #[arg(long, default_value_t = 600.0)]
        max_seconds: f64,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli
        .config
        .map(PracticeConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Commands::Metronome { bpm, seconds } => run_metronome(config, &bpm, seconds),
        Commands::Render {
            bpm,
            beats,
            sample_rate,
            output,
        } => run_render(&config, &bpm, beats, sample_rate, output),
        Commands::Search { index, query } => run_search(config, index, &query),
        Commands::Scroll {
            speed,
            sync_bpm,
            viewport,
            document,
            fps,
            max_seconds,
        } => run_scroll(
            &config,
            &speed,
            sync_bpm.as_deref(),
            viewport,
            document,
            fps,
            max_seconds,
        ),
    }
}

fn run_metronome(config: PracticeConfig, bpm: &str, seconds: Option<f64>) -> Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    runtime.block_on(async move {
        let mut clock = BeatClock::with_default_output(config.metronome, config.audio);
        let tempo = clock.set_bpm_text(bpm);
        eprintln!("Metronome at {tempo}, Ctrl-C to stop");

        let mut beats = Box::pin(clock.beat_stream());
        clock.start().context("starting metronome")?;

        let stop = async {
            match seconds {
                Some(seconds) => tokio::time::sleep(Duration::from_secs_f64(seconds.max(0.0))).await,
                None => {
                    let _ = tokio::signal::ctrl_c().await;
                }
            }
        };
        tokio::pin!(stop);

        loop {
            tokio::select! {
                _ = &mut stop => break,
                Some(beat) = beats.next() => println!("{}", serde_json::to_string(&beat)?),
            }
        }

        clock.stop();
        Ok::<_, anyhow::Error>(ExitCode::from(0))
    })
}

fn run_render(
    config: &PracticeConfig,
    bpm: &str,
    beats: u64,
    sample_rate: Option<u32>,
    output: PathBuf,
) -> Result<ExitCode> {
    let sample_rate = sample_rate.unwrap_or(config.audio.render_sample_rate);
    ensure!(
        (1..=MAX_RENDER_SAMPLE_RATE).contains(&sample_rate),
        "sample rate must be between 1 and {} Hz",
        MAX_RENDER_SAMPLE_RATE
    );

    let tempo = Tempo::parse_lenient(bpm);
    let seconds = beats as f64 * tempo.seconds_per_beat();
    ensure!(
        seconds <= MAX_RENDER_SECONDS,
        "{} beats at {} is {:.0} s of audio, the limit is {} s",
        beats,
        tempo,
        seconds,
        MAX_RENDER_SECONDS
    );
    let track = render_click_track(&config.metronome, tempo, beats, sample_rate);
    write_wav(&output, &track).with_context(|| format!("writing {}", output.display()))?;

    let report = RenderReport {
        output: output.display().to_string(),
        bpm: tempo.bpm(),
        beats: track.beats.len(),
        frames: track.samples.len(),
        sample_rate,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

fn run_search(config: PracticeConfig, index: PathBuf, query: &str) -> Result<ExitCode> {
    let mut service = SearchService::new(config.search);
    // Failures are logged by the service; the list filter still runs.
    let _ = service.load_index_file(&index);
    let items: Vec<TabItem> = service
        .index()
        .map(|index| index.documents().iter().map(TabItem::from).collect())
        .unwrap_or_default();
    service.set_tab_list(items);

    let outcome = service.query(query);
    let report = SearchReport {
        query: query.trim(),
        outcome: &outcome,
        visible: service
            .tab_list()
            .iter()
            .filter(|item| !item.hidden)
            .map(|item| item.id.as_str())
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

fn run_scroll(
    config: &PracticeConfig,
    speed: &str,
    sync_bpm: Option<&str>,
    viewport: f64,
    document: f64,
    fps: f64,
    max_seconds: f64,
) -> Result<ExitCode> {
    ensure!(fps > 0.0, "fps must be positive");

    let surface = VirtualSurface::new(viewport, document);
    let mut driver = ScrollDriver::new(surface, FrameQueue::new(), &config.scroll);
    if !driver.set_speed(speed) {
        log::warn!("[tabstash] Unknown speed '{}', keeping medium", speed);
    }
    if let Some(raw) = sync_bpm {
        let tempo = Tempo::parse_lenient(raw);
        driver.enable_sync(config.scroll.pixels_per_beat, tempo.bpm() as f64);
    }

    let step = Duration::try_from_secs_f64(1.0 / fps).context("invalid --fps")?;
    let limit = Duration::try_from_secs_f64(max_seconds.max(0.0)).context("invalid --max-seconds")?;
    let mut now = Duration::ZERO;
    let mut frames = 0u64;

    driver.start(now);
    let mut reached_end = false;
    while let Some(token) = driver.frames_mut().take_pending() {
        now += step;
        if now > limit {
            driver.stop();
            break;
        }
        driver.on_frame(token, now);
        frames += 1;
        if !driver.is_active() {
            reached_end = true;
        }
    }

    let report = ScrollReport {
        frames,
        seconds: now.min(limit).as_secs_f64(),
        scroll_top: driver.surface().scroll_top(),
        applied_pixels: driver.applied_pixels(),
        reached_end,
        state: driver.state(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

#[derive(Serialize)]
struct RenderReport {
    output: String,
    bpm: u32,
    beats: usize,
    frames: usize,
    sample_rate: u32,
}

#[derive(Serialize)]
struct SearchReport<'a> {
    query: &'a str,
    #[serde(flatten)]
    outcome: &'a SearchOutcome,
    visible: Vec<&'a str>,
}

#[derive(Serialize)]
struct ScrollReport {
    frames: u64,
    seconds: f64,
    scroll_top: f64,
    applied_pixels: f64,
    reached_end: bool,
    state: ScrollState,
}
