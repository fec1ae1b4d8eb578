use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ip6ble")]
#[command(about = "IPv6-over-BLE bridge")]
pub struct Cli {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List advertising IP-over-BLE peers.
    Scan(ScanArgs),
    /// Bridge a TUN interface to one peer.
    Connect(ConnectArgs),
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    #[arg(long, default_value_t = 30)]
    pub duration_secs: u64,
    #[arg(long, default_value_t = false)]
    pub active: bool,
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Peer address, e.g. AA:BB:CC:DD:EE:FF.
    pub peer: String,
    /// Local link-layer address the interface address is derived from.
    /// Randomized when omitted.
    #[arg(long)]
    pub local: Option<String>,
    #[arg(long, default_value = "ip6ble0")]
    pub interface: String,
    #[arg(long, default_value_t = 30)]
    pub connect_timeout_secs: u64,
}
