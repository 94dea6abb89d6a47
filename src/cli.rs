use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "mysql-detect", about = "Detect MySQL servers by decoding their initial handshake")]
pub struct Cli {
    /// Target as host:port (port defaults to 3306). Repeat to probe several servers.
    #[arg(short, long = "target", value_name = "HOST:PORT", action = ArgAction::Append, required = true)]
    pub targets: Vec<String>,

    /// Connect and read timeout in whole seconds
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Max targets probed at once
    #[arg(short = 'c', long, default_value_t = 16)]
    pub concurrency: usize,

    /// Print results as JSON instead of the key/value dump
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Also write the JSON document to this file
    #[arg(long, value_name = "FILE", default_value_t = String::new())]
    pub json_out: String,

    /// More logging on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn parse() -> Self {
        Parser::parse()
    }
}
