//! Command line interface.

pub mod command;

use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Fetch and visualise average temperature data for a year and country
pub struct Cli {
    /// The year for which to fetch the data
    #[arg(long)]
    pub year: i32,

    /// The country code for which to fetch the data (e.g. NO for Norway)
    #[arg(long, value_parser = parse_country_code)]
    pub country: String,
}

fn parse_country_code(s: &str) -> Result<String, String> {
    if s.len() == 2 && s.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(s.to_string())
    } else {
        Err(format!("`{}` is not a two character country code", s))
    }
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Switches a spinner to a byte progress bar once the download size is known.
pub fn set_byte_progress_style(bar: &ProgressBar, total_size: u64) {
    bar.set_length(total_size);
    bar.set_style(
        ProgressStyle::with_template(
            "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {eta}",
        )
        .expect("valid progress template")
        .progress_chars("=> "),
    );
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_required_options() {
        let cli = Cli::try_parse_from(["ghcn-tempmap", "--year", "2020", "--country", "NO"]).unwrap();

        assert_eq!(cli.year, 2020);
        assert_eq!(cli.country, "NO");
    }

    #[test]
    fn should_require_both_options() {
        assert!(Cli::try_parse_from(["ghcn-tempmap", "--year", "2020"]).is_err());
        assert!(Cli::try_parse_from(["ghcn-tempmap", "--country", "NO"]).is_err());
    }

    #[test]
    fn should_reject_bad_country_code() {
        assert!(Cli::try_parse_from(["ghcn-tempmap", "--year", "2020", "--country", "NOR"]).is_err());
        assert!(Cli::try_parse_from(["ghcn-tempmap", "--year", "2020", "--country", "N-"]).is_err());
    }

    #[test]
    fn should_reject_non_numeric_year() {
        assert!(Cli::try_parse_from(["ghcn-tempmap", "--year", "twenty", "--country", "NO"]).is_err());
    }

    #[test]
    fn should_convert_spinner_to_byte_bar() {
        let pb = create_spinner("Testing...".to_string());
        set_byte_progress_style(&pb, 1000);
        pb.set_position(500);

        assert_eq!(pb.length().unwrap(), 1000);
        assert_eq!(pb.position(), 500);

        pb.finish_with_message("✓ Conversion test completed");
    }
}
