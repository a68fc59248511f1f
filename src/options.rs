use std::{
    fs::File,
    io::BufReader,
    path::PathBuf,
};

use eyre::WrapErr;

use runtime::Config;

/// Connection settings shared by the binaries.
#[derive(Debug, Clone, PartialEq, Eq, Default, structopt::StructOpt)]
pub struct Options {
    /// JSON config file. Flags given on the command line take precedence.
    #[structopt(long, parse(from_os_str))]
    pub config: Option<PathBuf>,

    #[structopt(short, long)]
    pub serial_port: Option<String>,

    #[structopt(short, long)]
    pub baud: Option<u32>,

    #[structopt(long)]
    pub retry_timeout_ms: Option<u64>,

    /// Human-readable log output.
    #[structopt(long)]
    pub pretty: bool,
}

impl Options {
    pub fn load(&self) -> eyre::Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                let file = File::open(path).wrap_err_with(|| format!("opening {}", path.display()))?;

                serde_json::from_reader(BufReader::new(file))
                    .wrap_err_with(|| format!("parsing {}", path.display()))?
            },
            None => Config::default(),
        };

        self.apply(&mut config);
        tracing::debug!(?config, "loaded config");

        Ok(config)
    }

    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = &self.serial_port {
            config.serial.port = port.clone();
        }

        if let Some(baud) = self.baud {
            config.serial.baud = baud;
        }

        if let Some(retry_timeout_ms) = self.retry_timeout_ms {
            config.transport.retry_timeout_ms = retry_timeout_ms;
        }
    }
}

#[cfg(test)]
mod test {
    use structopt::StructOpt;

    use super::*;

    #[test]
    fn flags_override_file() -> eyre::Result<()> {
        let mut config: Config = serde_json::from_str(
            r#"{ "serial": { "port": "/dev/ttyUSB0", "baud": 115200 }, "transport": { "settle_delay_ms": 8 } }"#,
        )?;

        let opts = Options::from_iter_safe(["brickwire", "--baud", "9600", "--retry-timeout-ms", "20"])?;
        opts.apply(&mut config);

        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud, 9600);
        assert_eq!(config.transport.settle_delay_ms, 8);
        assert_eq!(config.transport.retry_timeout_ms, 20);

        Ok(())
    }

    #[test]
    fn defaults_without_file() -> eyre::Result<()> {
        let config = Options::default().load()?;
        assert_eq!(config, Config::default());

        Ok(())
    }

    #[test]
    fn missing_file_is_reported() {
        let opts = Options {
            config: Some("/nonexistent/brickwire.json".into()),
            ..Default::default()
        };

        let e = opts.load().unwrap_err();
        assert!(e.to_string().contains("/nonexistent/brickwire.json"));
    }
}
