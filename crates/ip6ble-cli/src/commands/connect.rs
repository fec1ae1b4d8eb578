use anyhow::Result;

use crate::cli::ConnectArgs;

#[cfg(not(target_os = "linux"))]
pub async fn run(_args: ConnectArgs) -> Result<()> {
    anyhow::bail!("the bridge needs a Linux TUN device");
}

#[cfg(target_os = "linux")]
pub async fn run(args: ConnectArgs) -> Result<()> {
    use std::time::Duration;

    use anyhow::Context;
    use tracing::info;

    use ble_link::btle::BtleRadio;
    use ble_link::BleAddress;
    use ip6ble::tun::TunFactory;
    use ip6ble::{BridgeConfig, BridgeEvent, BridgeService};

    let peer: BleAddress = args.peer.parse().context("invalid peer address")?;
    let local = args
        .local
        .as_deref()
        .map(str::parse::<BleAddress>)
        .transpose()
        .context("invalid local address")?;

    let mut config = BridgeConfig::new(peer);
    config.local = local;
    config.interface_name = args.interface;
    config.link.connect_timeout = Duration::from_secs(args.connect_timeout_secs);

    let radio = BtleRadio::new().await?;
    let mut service = BridgeService::start(Box::new(radio), Box::new(TunFactory), config);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("ctrl-c, stopping");
                service.stop();
            }
            event = service.next_event() => match event {
                Some(BridgeEvent::Connected { local, peer }) => {
                    println!("bridge up: {local} <-> {peer}");
                }
                Some(BridgeEvent::Disconnected) => {
                    println!("bridge down");
                }
                None => break,
            },
        }
    }

    service.wait().await?;
    Ok(())
}
