//! Command line interface definition using clap.

use std::path::PathBuf;

use clap::Parser;

/// Generate an Xcode project from extracted Bazel rule records.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON file holding the extraction records, one object per rule.
    #[arg(short, long, value_name = "FILE")]
    pub records: PathBuf,

    /// JSON file holding the generator options.
    ///
    /// Options left out of the file take their defaults.
    #[arg(short, long, value_name = "FILE")]
    pub options: Option<PathBuf>,

    /// Directory the `.xcodeproj` bundle is written into.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,

    /// Enable verbose diagnostic logging.
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn output_defaults_to_current_directory() {
        let cli = Cli::try_parse_from(["xcbazel", "--records", "records.json"])
            .expect("records alone is enough");
        assert_eq!(cli.output, PathBuf::from("."));
        assert!(cli.options.is_none());
        assert!(!cli.verbose);
    }

    #[rstest]
    fn records_are_required() {
        assert!(Cli::try_parse_from(["xcbazel", "--verbose"]).is_err());
    }
}
