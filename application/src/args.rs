//! [`Args`] definitions.

use clap::Parser;

/// Server of the personal notes API.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    ///
    /// Missing file is fine: environment variables prefixed with `CONF.` and
    /// defaults are used then.
    #[arg(short, long, env = "NOTES_CONFIG", default_value = "config.toml")]
    pub config: String,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser as _;

    use super::Args;

    #[test]
    fn accepts_config_path() {
        let args = Args::try_parse_from(["notes", "-c", "prod.toml"]).unwrap();
        assert_eq!(args.config, "prod.toml");

        let args =
            Args::try_parse_from(["notes", "--config", "dev.toml"]).unwrap();
        assert_eq!(args.config, "dev.toml");
    }
}
