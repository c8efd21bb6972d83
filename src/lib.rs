use std::{
    fmt::Display,
    fs::OpenOptions,
    path::{Path, PathBuf},
    str::FromStr,
    time::{Duration, Instant},
};

use clap::{Arg, ArgAction, Command};
use log::{debug, LevelFilter};
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

pub mod app;
pub mod core;
pub mod error;
pub mod gpu;
pub mod input;
pub mod pipeline;
pub mod util;

pub use crate::core::geometry;
pub use crate::core::{OrbitCamera, ViewerState};
pub use error::{LoadError, Result, ShaderError, ViewerError};
pub use util::format_mat4;

use geometry::Mesh;

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;
/// Auto-orbit rate for the built-in cube, degrees per second.
pub const DEFAULT_CUBE_SPEED: f32 = 30.0;

/// Everything the command line decides.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// OBJ file to show. `None` shows the built-in cube.
    pub asset: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    /// Auto-orbit in degrees per second, 0 to hold still.
    pub speed: f32,
    /// Read only the vertex positions and draw them as points.
    pub points: bool,
    pub shader_dir: Option<PathBuf>,
    pub log_level: LevelFilter,
    pub log_file: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            speed: DEFAULT_CUBE_SPEED,
            points: false,
            shader_dir: None,
            log_level: LevelFilter::Info,
            log_file: None,
        }
    }
}

impl ViewerConfig {
    pub fn load_mesh(&self) -> std::result::Result<Mesh, LoadError> {
        match &self.asset {
            None => Ok(Mesh::create_cube()),
            Some(path) if self.points => geometry::load_points(path),
            Some(path) => geometry::load_mesh(path),
        }
    }
}

pub fn create_clap_command() -> Command {
    Command::new("orbit_viewer")
        .about("Orbit-camera OpenGL viewer for OBJ meshes and point clouds")
        .version("0.1")
        .arg(
            Arg::new("args")
                .value_name("ARGS")
                .num_args(0..=3)
                .help(
                    "[ASSET] [WIDTH] [HEIGHT] to view an OBJ file, or [WIDTH] [HEIGHT] [SPEED] \
                     for the spinning cube (defaults 800, 600 and 30 deg/s)",
                ),
        )
        .arg(
            Arg::new("speed")
                .short('s')
                .long("speed")
                .value_name("DEG_PER_SEC")
                .help("Auto-orbit speed, overriding a positional one. Defaults to 0 for assets."),
        )
        .arg(
            Arg::new("points")
                .short('p')
                .long("points")
                .action(ArgAction::SetTrue)
                .help("Load only the vertex positions and draw them as a point cloud"),
        )
        .arg(
            Arg::new("shader-dir")
                .long("shader-dir")
                .value_name("DIR")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Directory holding shader.vert and shader.frag"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("More logging (-v debug, -vv trace)"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose")
                .help("Only log warnings and errors"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Also append the log to FILE"),
        )
}

/// Parses a strictly positive number, falling back to `default` for anything
/// missing or unusable.
fn positive_or<T>(raw: Option<&str>, name: &str, default: T) -> T
where
    T: FromStr + PartialOrd + Default + Display + Copy,
{
    let Some(raw) = raw else {
        return default;
    };
    match raw.parse::<T>() {
        Ok(value) if value > T::default() => value,
        _ => {
            debug!("ignoring {name} '{raw}', using {default}");
            default
        }
    }
}

/// A leading number only names an asset when a file by that name exists.
fn names_asset(first: &str) -> bool {
    first.parse::<f32>().is_err() || Path::new(first).exists()
}

pub fn handle_clap_matches(matches: &clap::ArgMatches) -> ViewerConfig {
    let positionals: Vec<&str> = matches
        .get_many::<String>("args")
        .map(|values| values.map(String::as_str).collect())
        .unwrap_or_default();
    let (asset, numbers) = match positionals.split_first() {
        Some((first, rest)) if names_asset(first) => (Some(PathBuf::from(first)), rest),
        _ => (None, positionals.as_slice()),
    };
    let default_speed = if asset.is_some() { 0.0 } else { DEFAULT_CUBE_SPEED };

    let raw_speed = matches
        .get_one::<String>("speed")
        .map(String::as_str)
        .or_else(|| numbers.get(2).copied());
    let speed = Some(positive_or(raw_speed, "speed", default_speed))
        .filter(|s| s.is_finite())
        .unwrap_or(default_speed);

    let log_level = if matches.get_flag("quiet") {
        LevelFilter::Warn
    } else {
        match matches.get_count("verbose") {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    ViewerConfig {
        width: positive_or(numbers.first().copied(), "width", DEFAULT_WIDTH),
        height: positive_or(numbers.get(1).copied(), "height", DEFAULT_HEIGHT),
        speed,
        points: matches.get_flag("points"),
        shader_dir: matches.get_one::<PathBuf>("shader-dir").cloned(),
        log_level,
        log_file: matches.get_one::<PathBuf>("log-file").cloned(),
        asset,
    }
}

/// Terminal logging, plus an appended log file when asked for. Only this
/// crate's records pass; windowing and GL loader chatter is filtered out.
pub fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<()> {
    let config = ConfigBuilder::new()
        .add_filter_allow_str("orbit_viewer")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| ViewerError::Logger(format!("{}: {e}", path.display())))?;
        loggers.push(WriteLogger::new(level, config, file));
    }

    CombinedLogger::init(loggers).map_err(|e| ViewerError::Logger(e.to_string()))
}

/// Frame timing for the auto-orbit step and the title bar.
pub struct Metrics {
    pub last_frame: Instant,
    /// Average frame time over the last completed window.
    pub frame_time: Duration,
    /// Fastest and slowest frame of the last completed window, in ms.
    pub frame_range: (f32, f32),
    pub fps_counter: u32,
    pub fps_update_timer: Instant,
    pub current_fps: f32,
    /// Frame times in ms for the current window.
    pub frame_times: Vec<f32>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Longest step handed to the auto-orbit, so a stall doesn't jump the view.
    pub const MAX_FRAME_DELTA: Duration = Duration::from_millis(100);
    pub const FPS_WINDOW: Duration = Duration::from_secs(1);

    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(now: Instant) -> Self {
        Self {
            last_frame: now,
            frame_time: Duration::from_secs_f32(1.0 / 60.0),
            frame_range: (0.0, 0.0),
            fps_counter: 0,
            fps_update_timer: now,
            current_fps: 0.0,
            frame_times: Vec::with_capacity(120),
        }
    }

    /// Marks a frame at `now` and returns the clamped step in seconds.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let delta = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.update(delta, now);
        delta.min(Self::MAX_FRAME_DELTA).as_secs_f32()
    }

    /// Records one frame. Returns `true` when this frame closed a window,
    /// after which the summary fields describe that window.
    pub fn update(&mut self, frame_delta: Duration, now: Instant) -> bool {
        self.fps_counter += 1;
        self.frame_times.push(frame_delta.as_secs_f32() * 1000.0);

        let elapsed = now.saturating_duration_since(self.fps_update_timer);
        if elapsed < Self::FPS_WINDOW {
            return false;
        }
        self.current_fps = self.fps_counter as f32 / elapsed.as_secs_f32();
        self.frame_time = elapsed / self.fps_counter;
        self.frame_range = self
            .frame_times
            .iter()
            .fold((f32::INFINITY, 0.0f32), |(lo, hi), &ms| (lo.min(ms), hi.max(ms)));
        self.fps_counter = 0;
        self.fps_update_timer = now;
        self.frame_times.clear();
        debug!("{self}");
        true
    }
}

impl Display for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (fastest, slowest) = self.frame_range;
        write!(
            f,
            "{:.1} fps, {:.2} ms/frame ({:.2}..{:.2} ms)",
            self.current_fps,
            self.frame_time.as_secs_f32() * 1000.0,
            fastest,
            slowest
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn parse(args: &[&str]) -> ViewerConfig {
        let matches = create_clap_command()
            .try_get_matches_from(std::iter::once("orbit_viewer").chain(args.iter().copied()))
            .unwrap();
        handle_clap_matches(&matches)
    }

    #[test]
    fn no_args_shows_spinning_cube() {
        let config = parse(&[]);
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.load_mesh().unwrap().vertices().len(), 24);
    }

    #[test]
    fn asset_with_size() {
        let config = parse(&["bunny.obj", "1024", "768"]);
        assert_eq!(config.asset, Some(PathBuf::from("bunny.obj")));
        assert_eq!((config.width, config.height), (1024, 768));
        assert_eq!(config.speed, 0.0);
    }

    #[test]
    fn bad_numbers_fall_back() {
        let config = parse(&["bunny.obj", "wide", "tall", "--speed", "fast"]);
        assert_eq!((config.width, config.height), (DEFAULT_WIDTH, DEFAULT_HEIGHT));
        assert_eq!(config.speed, 0.0);

        let config = parse(&["bunny.obj", "0", "480", "--speed", "12.5"]);
        assert_eq!((config.width, config.height), (DEFAULT_WIDTH, 480));
        assert_eq!(config.speed, 12.5);
    }

    #[test]
    fn flags() {
        let config = parse(&[
            "cloud.obj",
            "--points",
            "--shader-dir",
            "/tmp/shaders",
            "-vv",
            "--log-file",
            "viewer.log",
        ]);
        assert!(config.points);
        assert_eq!(config.shader_dir, Some(PathBuf::from("/tmp/shaders")));
        assert_eq!(config.log_level, LevelFilter::Trace);
        assert_eq!(config.log_file, Some(PathBuf::from("viewer.log")));
        assert_eq!(parse(&["-q"]).log_level, LevelFilter::Warn);
    }

    #[test]
    fn unknown_flag_is_an_error() {
        let err = create_clap_command()
            .try_get_matches_from(["orbit_viewer", "--bogus"])
            .unwrap_err();
        assert!(err.use_stderr());
    }

    #[test]
    fn missing_asset_fails_to_load() {
        let config = parse(&["/definitely/not/here.obj"]);
        assert!(config.load_mesh().is_err());
    }

    #[test]
    fn cube_takes_size_and_speed_positionally() {
        let config = parse(&["1024", "768", "45"]);
        assert_eq!(config.asset, None);
        assert_eq!((config.width, config.height), (1024, 768));
        assert_eq!(config.speed, 45.0);
        assert_eq!(config.load_mesh().unwrap().vertices().len(), 24);

        let config = parse(&["640", "480"]);
        assert_eq!(config.asset, None);
        assert_eq!((config.width, config.height), (640, 480));
        assert_eq!(config.speed, DEFAULT_CUBE_SPEED);

        assert_eq!(parse(&["1024", "768", "45", "--speed", "10"]).speed, 10.0);
    }

    #[test]
    fn too_many_positionals_is_an_error() {
        let err = create_clap_command()
            .try_get_matches_from(["orbit_viewer", "bunny.obj", "1", "2", "3"])
            .unwrap_err();
        assert!(err.use_stderr());
    }

    #[test]
    fn tick_clamps_long_stalls() {
        let start = Instant::now();
        let mut metrics = Metrics::starting_at(start);

        let step = metrics.tick(start + Duration::from_millis(16));
        assert_relative_eq!(step, 0.016, epsilon = 1e-6);
        let step = metrics.tick(start + Duration::from_secs(3));
        assert_relative_eq!(step, 0.1, epsilon = 1e-6);
    }

    #[test]
    fn fps_settles_after_a_window() {
        let start = Instant::now();
        let mut metrics = Metrics::starting_at(start);
        for i in 1..=60 {
            metrics.tick(start + Duration::from_micros(16_667 * i));
        }
        assert_relative_eq!(metrics.current_fps, 60.0, epsilon = 0.5);
        assert!(metrics.frame_times.is_empty());
    }

    #[test]
    fn window_summary_reports_frame_range() {
        let start = Instant::now();
        let mut metrics = Metrics::starting_at(start);

        assert!(!metrics.update(Duration::from_millis(10), start + Duration::from_millis(400)));
        assert!(!metrics.update(Duration::from_millis(30), start + Duration::from_millis(700)));
        assert!(metrics.update(Duration::from_millis(20), start + Duration::from_millis(1000)));

        assert_relative_eq!(metrics.current_fps, 3.0, epsilon = 1e-4);
        assert_relative_eq!(metrics.frame_range.0, 10.0, epsilon = 1e-4);
        assert_relative_eq!(metrics.frame_range.1, 30.0, epsilon = 1e-4);
        assert_eq!(metrics.to_string(), "3.0 fps, 333.33 ms/frame (10.00..30.00 ms)");

        assert!(!metrics.update(Duration::from_millis(5), start + Duration::from_millis(1100)));
        assert_relative_eq!(metrics.frame_range.1, 30.0, epsilon = 1e-4);
    }
}
