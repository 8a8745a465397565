use clap::Parser;
use std::path::PathBuf;

/// Cortex Agent gateway - natural-language prompts in, narrative, SQL and rows out
#[derive(Parser, Debug, Clone)]
#[command(name = "cortex-gateway", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "CORTEX_GATEWAY_CONFIG", default_value = "cortex-gateway.toml")]
    pub config: PathBuf,

    /// Server host address
    #[arg(long, env = "CORTEX_GATEWAY_HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(long, env = "CORTEX_GATEWAY_PORT")]
    pub port: Option<u16>,

    /// Answer a single prompt, print the JSON result and exit instead of serving HTTP
    #[arg(short, long)]
    pub prompt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["cortex-gateway"]);
        assert_eq!(cli.config, PathBuf::from("cortex-gateway.toml"));
        assert!(cli.host.is_none());
        assert!(cli.port.is_none());
        assert!(cli.prompt.is_none());
    }

    #[test]
    fn test_cli_with_args() {
        let cli = Cli::parse_from([
            "cortex-gateway",
            "--config",
            "custom.toml",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--prompt",
            "top products",
        ]);
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert_eq!(cli.host, Some("0.0.0.0".to_string()));
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.prompt, Some("top products".to_string()));
    }
}
