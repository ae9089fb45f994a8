//! chord-extract: 从吉他教学视频中提取带时间戳的和弦进行

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chord_extract::api::ChordExtractor;
use chord_extract::core::video::{sampler, FrameSource};
use chord_extract::core::vision::AnthropicAnnotator;
use chord_extract::{ChordError, ExtractionConfig};
use log::{error, info};

const USAGE: &str = "\
Usage: chord-extract <INPUT> [OPTIONS]

INPUT is a video file or an http(s) URL.

Options:
  --preset <NAME>      default | fast | noisy (threshold/debounce presets)
  --fps <N>            Frames sampled per second (default: 2)
  --threshold <X>      Change threshold, mean grey-level difference (default: 5.0)
  --debounce <N>       Minimum frames between two changes (default: 2)
  --batch-size <N>     Frames per vision request (default: 8)
  -o, --output <PATH>  Chord chart output (default: <video dir>/chord_chart.txt)
  --frames-dir <DIR>   Frames directory (default: <video dir>/frames)
  --skip-extract       Reuse frames already in the frames directory
  --parallel           Send vision batches concurrently
  --raw-json           Write every annotated frame to JSON, before dedup
  -h, --help           Show this message";

struct CliArgs {
    input: String,
    output: Option<PathBuf>,
    frames_dir: Option<PathBuf>,
    skip_extract: bool,
    raw_json: bool,
    config: ExtractionConfig,
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T, String> {
    let value = value.ok_or_else(|| format!("{} requires a value", flag))?;
    value
        .parse()
        .map_err(|_| format!("invalid value for {}: {}", flag, value))
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Option<CliArgs>, String> {
    let mut args = args.into_iter();
    let mut input = None;
    let mut output = None;
    let mut frames_dir = None;
    let mut skip_extract = false;
    let mut raw_json = false;
    let mut preset: Option<String> = None;
    let mut sample_rate = None;
    let mut threshold = None;
    let mut debounce = None;
    let mut batch_size = None;
    let mut parallel = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--preset" => preset = Some(parse_value(&arg, args.next())?),
            "--fps" => sample_rate = Some(parse_value(&arg, args.next())?),
            "--threshold" => threshold = Some(parse_value(&arg, args.next())?),
            "--debounce" => debounce = Some(parse_value(&arg, args.next())?),
            "--batch-size" => batch_size = Some(parse_value(&arg, args.next())?),
            "-o" | "--output" => output = Some(parse_value::<PathBuf>(&arg, args.next())?),
            "--frames-dir" => frames_dir = Some(parse_value::<PathBuf>(&arg, args.next())?),
            "--skip-extract" => skip_extract = true,
            "--parallel" => parallel = true,
            "--raw-json" => raw_json = true,
            flag if flag.starts_with('-') => return Err(format!("unknown option: {}", flag)),
            _ if input.is_none() => input = Some(arg),
            _ => return Err(format!("unexpected argument: {}", arg)),
        }
    }

    let input = input.ok_or_else(|| "missing <INPUT>".to_string())?;

    // 预设只提供基准值，显式参数总是覆盖预设
    let mut config = match preset.as_deref() {
        None => ExtractionConfig::default(),
        Some(name) => ExtractionConfig::preset(name).ok_or_else(|| format!("unknown preset: {}", name))?,
    };
    if let Some(v) = sample_rate {
        config.sample_rate = v;
    }
    if let Some(v) = threshold {
        config.change_threshold = v;
    }
    if let Some(v) = debounce {
        config.debounce_frames = v;
    }
    if let Some(v) = batch_size {
        config.batch_size = v;
    }
    config.parallel_batches = parallel;

    Ok(Some(CliArgs {
        input,
        output,
        frames_dir,
        skip_extract,
        raw_json,
        config,
    }))
}

fn run(args: CliArgs) -> Result<(), ChordError> {
    args.config.validate()?;

    let remote = sampler::is_remote(&args.input);
    let project_dir = if remote {
        PathBuf::from(".")
    } else {
        match Path::new(&args.input).parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    };
    let frames_dir = args.frames_dir.unwrap_or_else(|| project_dir.join("frames"));

    let mut video = PathBuf::from(&args.input);
    if remote && !args.skip_extract {
        video = project_dir.join("video.mp4");
        sampler::download_video(&args.input, &video)?;
    }

    if args.skip_extract {
        info!("[1/4] Using existing frames in {:?}", frames_dir);
    } else {
        info!("[1/4] Extracting frames at {} fps...", args.config.sample_rate);
        sampler::extract_frames(&video, &frames_dir, args.config.sample_rate)?;
    }

    let source = FrameSource::from_dir(&frames_dir, args.config.sample_rate)?;
    let annotator = AnthropicAnnotator::from_env()?;
    let extractor = ChordExtractor::create(args.config, Box::new(annotator))?;
    let report = extractor.run(&source)?;

    info!("[4/4] Formatting results...");
    let chart = report.chart(args.raw_json)?;
    let output = args
        .output
        .unwrap_or_else(|| project_dir.join("chord_chart.txt"));
    let json_path = chart.write_to(&output)?;

    println!("\n{}", chart.text);
    if report.stats.changes_above_threshold == 0 {
        println!("\nNote: no changes above the threshold, only the first frame was read. Try lowering --threshold");
    }
    if !report.stats.failed_batches.is_empty() {
        println!(
            "\nWarning: batches {:?} could not be parsed and are marked '?'",
            report.stats.failed_batches
        );
    }
    println!("\nSaved: {}", output.display());
    println!("Saved: {}", json_path.display());
    Ok(())
}

fn main() -> ExitCode {
    chord_extract::init_logging();
    dotenvy::dotenv().ok();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{}", USAGE);
            return ExitCode::SUCCESS;
        }
        Err(msg) => {
            eprintln!("error: {}\n\n{}", msg, USAGE);
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(ChordError::NoChangesDetected { threshold }) => {
            eprintln!(
                "No changes detected at threshold {}! Try lowering --threshold",
                threshold
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}
