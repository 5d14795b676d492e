use std::process::ExitCode;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};

use ffmpeg_source::Source;
use ffmpeg_transform::VideoTransform;
use vidsync::{Session, SessionBuilder, SessionEnd, StreamSelection};

mod backend;
mod cli;
mod output;
mod render;
mod window;

use backend::{FfmpegSource, Yuv420Converter, open_audio, open_video};
use cli::Args;
use output::AudioOutput;
use render::HeadlessRenderer;
use window::{FrameShelf, WindowRenderer, run_window};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse_or_exit();

    match run(&args) {
        Ok(SessionEnd::Finished | SessionEnd::Quit) => ExitCode::SUCCESS,
        Ok(SessionEnd::SourceFailed(message)) => {
            log::error!("playback aborted: {message}");
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<SessionEnd> {
    let config = args.player_config()?;
    if let Some(dir) = &args.snapshot_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let source = Source::open(&args.source)
        .with_context(|| format!("failed to open {}", args.source.display()))?;
    if let Some(duration) = source.duration() {
        log::info!("Duration: {duration:.2}s");
    }

    // Decoders need the source's codec parameters, so open them before the
    // session takes ownership of it. A stream whose decoder fails to open is
    // dropped rather than failing playback.
    let selection = StreamSelection::select(source.streams());
    let video_size = selection
        .video
        .as_ref()
        .and_then(|stream| stream.video.as_ref())
        .map(|params| (params.width, params.height))
        .unwrap_or((0, 0));
    let audio_decoder = selection
        .audio
        .filter(|_| !args.no_audio)
        .and_then(|stream| match open_audio(&source, &stream) {
            Ok(decoder) => Some(decoder),
            Err(e) => {
                log::warn!("audio stream {} disabled: {e}", stream.index);
                None
            }
        });
    let video_decoder = selection
        .video
        .and_then(|stream| match open_video(&source, &stream) {
            Ok(decoder) => Some(decoder),
            Err(e) => {
                log::warn!("video stream {} disabled: {e}", stream.index);
                None
            }
        });

    let mut builder = SessionBuilder::new(Box::new(FfmpegSource(source)), config)?;

    if let Some(decoder) = video_decoder {
        builder.with_video(
            Box::new(decoder),
            Box::new(Yuv420Converter(VideoTransform::new())),
        )?;
    }

    let buffer_frames = builder.config().audio_buffer_frames;
    let _output = match audio_decoder {
        Some(decoder) => {
            let (engine, _) = builder.with_audio(Box::new(decoder))?;
            match AudioOutput::open(engine, buffer_frames) {
                Ok(output) => Some(output),
                Err(e) => {
                    log::warn!("audio output unavailable, playing without sound: {e:#}");
                    builder.without_audio();
                    None
                }
            }
        }
        None => None,
    };

    let mut session = builder.start().context("failed to start playback")?;

    let quit_handle = session.quit_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        log::info!("Interrupted, stopping playback");
        quit_handle.quit();
    }) {
        log::warn!("failed to install Ctrl-C handler: {e}");
    }

    if args.headless {
        play_headless(args, &mut session)
    } else {
        play_windowed(args, session, video_size)
    }
}

fn play_headless(args: &Args, session: &mut Session) -> Result<SessionEnd> {
    let mut renderer = HeadlessRenderer::new();
    if let Some(dir) = &args.snapshot_dir {
        renderer = renderer.with_snapshots(dir, args.snapshot_every);
    }

    let end = session.run(&mut renderer)?;
    log::info!("Rendered {} pictures", renderer.rendered());

    Ok(end)
}

/**
    Run the session on its own thread while the window owns the main thread.

    The audio output stays on the calling thread; it only needs to outlive
    the window loop.
*/
fn play_windowed(args: &Args, mut session: Session, video_size: (u32, u32)) -> Result<SessionEnd> {
    let shelf = FrameShelf::new();
    let quit_handle = session.quit_handle();

    let session_shelf = Arc::clone(&shelf);
    let handle = std::thread::Builder::new()
        .name("session".to_string())
        .spawn(move || {
            let mut renderer = WindowRenderer::new(Arc::clone(&session_shelf));
            let end = session.run(&mut renderer);
            log::info!("[session] Rendered {} pictures", renderer.rendered());
            session_shelf.finish();
            end
        })
        .context("failed to spawn session thread")?;

    let title = args
        .source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "vidplayer".to_string());
    run_window(title, video_size, shelf, quit_handle.clone());

    // The window may close before the session notices on its own
    quit_handle.quit();
    let end = handle
        .join()
        .map_err(|_| anyhow!("session thread panicked"))??;

    Ok(end)
}
