//! Configuration and CLI argument handling

use std::time::Duration;

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "focusflow")]
#[command(about = "A study-session tracker server with a Pomodoro timer")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, env = "FOCUSFLOW_PORT", default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, env = "FOCUSFLOW_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Timer tick period in milliseconds
    #[arg(long, env = "FOCUSFLOW_TICK_MS", default_value = "1000",
          value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_ms: u64,

    /// Capacity of the timer event channel
    #[arg(long, env = "FOCUSFLOW_EVENT_BUFFER", default_value = "100")]
    pub event_buffer: usize,

    /// Enable verbose logging
    #[arg(short, long, env = "FOCUSFLOW_VERBOSE")]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
