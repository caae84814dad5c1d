use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

use vec2lso::{convert, Options};

#[derive(Parser)]
#[command(name = "vec2lso")]
#[command(about = "Vector script to LSO compiler\n\nConverts timed 8-channel drive vectors into a light-sequence object.", long_about = None)]
struct Cli {
    /// Path to vector script (.vec)
    input: PathBuf,

    /// Playback options file (JSON)
    #[arg(long)]
    options: Option<PathBuf>,

    /// Output path (defaults to the input with an .lso extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Play the script once instead of looping
    #[arg(long)]
    no_loop: bool,

    /// Step between frames instead of interpolating
    #[arg(long)]
    no_smooth: bool,

    /// Go dark after the last frame (only without looping)
    #[arg(long)]
    dark_after: bool,

    /// Enable debug output (per-frame progress)
    #[arg(long)]
    debug: bool,

    /// Enable detailed debug (hex dumps every frame)
    #[arg(long)]
    ddebug: bool,
}

impl Cli {
    fn resolve_options(&self) -> Result<Options> {
        let mut options = match &self.options {
            Some(path) => Options::from_file(path)?,
            None => Options::default(),
        };

        if self.no_loop {
            options.looping = false;
        }
        if self.no_smooth {
            options.smooth = false;
        }
        if self.dark_after {
            options.dark_after = true;
        }

        Ok(options)
    }
}

fn init_logging(debug: bool, ddebug: bool) {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    );

    // ddebug implies debug
    if ddebug {
        builder.filter_level(LevelFilter::Trace);
    } else if debug {
        builder.filter_level(LevelFilter::Debug);
    }

    builder.format_timestamp(None).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug, cli.ddebug);

    let options = cli.resolve_options()?;

    convert(&cli.input, cli.output.as_deref(), &options)
        .with_context(|| format!("Failed to compile {}", cli.input.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from(["vec2lso", "show.vec", "--no-loop", "--dark-after"]);
        let options = cli.resolve_options().unwrap();

        assert_eq!(cli.input, PathBuf::from("show.vec"));
        assert!(!options.looping);
        assert!(options.smooth);
        assert!(options.dark_after);
    }

    #[test]
    fn test_input_is_required() {
        assert!(Cli::try_parse_from(["vec2lso"]).is_err());
    }
}
