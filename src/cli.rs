use clap::Parser;
use std::path::PathBuf;

// Build version with target info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Images: image 0.25 (png, jpeg, tiff, tga, bmp, gif)\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Sprite animation authoring tool
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Animation collection to open (JSON written by --save)
    #[arg(value_name = "FILE")]
    pub file_path: Option<PathBuf>,

    /// Start with the built-in WALK/SHOOT/JUMP demo animations
    #[arg(short = 'd', long = "demo")]
    pub demo: bool,

    /// Save the collection to FILE before exiting (".json" is enforced)
    #[arg(short = 's', long = "save", value_name = "FILE")]
    pub save: Option<PathBuf>,

    /// Slice a sprite sheet image into a new animation
    #[arg(long = "sheet", value_name = "IMAGE")]
    pub sheet: Option<PathBuf>,

    /// Sprite sheet cell size (default from settings, 32x32)
    #[arg(long = "cell", value_name = "WxH", value_parser = parse_cell)]
    pub cell: Option<(u32, u32)>,

    /// Sprite sheet offset of the first cell
    #[arg(long = "offset", value_name = "X,Y", value_parser = parse_offset, default_value = "0,0")]
    pub offset: (u32, u32),

    /// Base name for sliced frames (letters, digits, '_', '(' and ')')
    #[arg(long = "base", value_name = "NAME", default_value = "sprite")]
    pub base_name: String,

    /// Print the animation / frame / sprite tree and exit
    #[arg(short = 'L', long = "list")]
    pub list: bool,

    /// Enable debug logging to file (default: musa.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

fn parse_pair(s: &str, sep: char) -> Result<(u32, u32), String> {
    let (a, b) = s
        .split_once(sep)
        .ok_or_else(|| format!("expected two numbers separated by '{}', got '{}'", sep, s))?;
    let a = a.trim().parse::<u32>().map_err(|e| format!("'{}': {}", a, e))?;
    let b = b.trim().parse::<u32>().map_err(|e| format!("'{}': {}", b, e))?;
    Ok((a, b))
}

/// `32x48` -> (32, 48). Both sides must be non-zero.
fn parse_cell(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = parse_pair(&s.to_ascii_lowercase(), 'x')?;
    if w == 0 || h == 0 {
        return Err(format!("cell size must be non-zero, got {}x{}", w, h));
    }
    Ok((w, h))
}

fn parse_offset(s: &str) -> Result<(u32, u32), String> {
    parse_pair(s, ',')
}
