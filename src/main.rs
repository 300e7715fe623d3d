#[cfg(not(feature = "manifest"))]
fn main() {
    eprintln!(
        "The audio-pool CLI requires the \"manifest\" feature. Rebuild with `--features manifest` to load libraries."
    );
}

#[cfg(feature = "manifest")]
mod cli {
    use std::env;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use anyhow::{bail, Context};
    use tracing::info;

    use audio_pool::{
        AudioBackend, AudioManager, JsonVolumeStore, LibraryManifest, PlaybackBuilder, Playlist,
        Sound, VirtualBackend,
    };

    const DEFAULT_SECONDS: f32 = 10.0;
    const DEFAULT_STEP: f32 = 1.0 / 60.0;

    struct Options {
        manifest: PathBuf,
        seconds: f32,
        step: f32,
        device: bool,
        settings: Option<PathBuf>,
    }

    fn usage() {
        eprintln!(
            "Usage:\n  audio-pool [--seconds N] [--step DT] [--settings volumes.json] [--device] <library.ron>\n\nFlags:\n  --seconds N          Simulated run length (default {DEFAULT_SECONDS})\n  --step DT            Frame step in seconds (default 1/60)\n  --settings FILE      Persist output volumes in a JSON file\n  --device             Play through the default audio device{}\n  -h, --help           Show this help\n",
            if cfg!(feature = "streaming") {
                ""
            } else {
                " (needs the \"streaming\" feature)"
            }
        );
    }

    fn parse_number(flag: &str, value: Option<String>) -> anyhow::Result<f32> {
        let value = value.with_context(|| format!("{flag} requires a value"))?;
        let number: f32 = value
            .parse()
            .with_context(|| format!("{flag}: '{value}' is not a number"))?;
        if !number.is_finite() || number <= 0.0 {
            bail!("{flag} must be a positive number, got {number}");
        }
        Ok(number)
    }

    fn parse_args() -> anyhow::Result<Option<Options>> {
        let mut manifest = None;
        let mut seconds = DEFAULT_SECONDS;
        let mut step = DEFAULT_STEP;
        let mut device = false;
        let mut settings = None;

        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--help" | "-h" => {
                    usage();
                    return Ok(None);
                }
                "--seconds" => seconds = parse_number("--seconds", args.next())?,
                "--step" => step = parse_number("--step", args.next())?,
                "--device" => device = true,
                "--settings" => {
                    settings = Some(PathBuf::from(
                        args.next().context("--settings requires a file path")?,
                    ));
                }
                _ if arg.starts_with('-') => {
                    usage();
                    bail!("Unknown flag: {arg}");
                }
                _ => manifest = Some(PathBuf::from(arg)),
            }
        }

        let Some(manifest) = manifest else {
            usage();
            return Ok(None);
        };
        Ok(Some(Options {
            manifest,
            seconds,
            step,
            device,
            settings,
        }))
    }

    pub fn run() -> anyhow::Result<()> {
        let Some(options) = parse_args()? else {
            return Ok(());
        };

        let manifest = LibraryManifest::load(&options.manifest)
            .with_context(|| format!("loading {}", options.manifest.display()))?;
        let base_dir = options
            .manifest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let (library, config) = manifest.into_library(&base_dir)?;

        if options.device {
            #[cfg(feature = "streaming")]
            {
                let backend = audio_pool::RodioBackend::new()?;
                let manager = AudioManager::with_config(backend, library, config)?;
                return simulate(manager, &options, true);
            }
            #[cfg(not(feature = "streaming"))]
            bail!("--device requires the \"streaming\" feature");
        }

        let manager = AudioManager::with_config(VirtualBackend::new(), library, config)?;
        simulate(manager, &options, false)
    }

    fn simulate<B: AudioBackend>(
        manager: AudioManager<B>,
        options: &Options,
        realtime: bool,
    ) -> anyhow::Result<()> {
        let mut manager = match &options.settings {
            Some(path) => {
                let store = JsonVolumeStore::open(path)
                    .with_context(|| format!("opening {}", path.display()))?;
                manager.with_store(store)
            }
            None => manager,
        };
        manager.restore_output_volumes();

        let music_tags: Vec<String> = manager
            .library()
            .music
            .tags()
            .into_iter()
            .map(str::to_string)
            .collect();
        let sound_tags: Vec<String> = manager
            .library()
            .sounds
            .tags()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut playlist = None;
        if !music_tags.is_empty() {
            let mut list = Playlist::new(&manager, &music_tags)
                .set_loop(true)
                .set_id("soundtrack")
                .set_fade_in(0.5)
                .set_fade_out(0.5);
            list.play(&mut manager);
            info!(
                "Playlist of {} tracks, {:.2}s per pass",
                music_tags.len(),
                list.playlist_duration()
            );
            playlist = Some(list);
        }
        for tag in &sound_tags {
            Sound::new(&manager, tag)
                .set_id(tag.as_str())
                .set_spatial_sound(false)
                .play(&mut manager, 0.0);
        }

        let frames = (options.seconds / options.step).ceil() as u64;
        let mut elapsed = 0.0f32;
        for _ in 0..frames {
            manager.tick(options.step);
            elapsed += options.step;
            for event in manager.drain_events() {
                println!(
                    "{:>8.3}s  source {:>2}  {:<18} {}",
                    elapsed,
                    event.handle.index(),
                    format!("{:?}", event.kind),
                    event.id.as_deref().unwrap_or("-")
                );
            }
            if realtime {
                std::thread::sleep(Duration::from_secs_f32(options.step));
            }
        }

        if let Some(list) = &playlist {
            println!(
                "\nPlaylist: {} tracks reproduced, {} full passes",
                list.reproduced_tracks(&manager),
                list.completed_loop_cycles(&manager)
            );
        }
        manager.stop_all(0.0);
        println!(
            "Pool: {} sources created, {} still in use",
            manager.pool().len(),
            manager.pool().in_use_count()
        );
        Ok(())
    }
}

#[cfg(feature = "manifest")]
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    cli::run()
}
