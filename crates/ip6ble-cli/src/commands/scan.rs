use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use tokio::time;

use crate::cli::ScanArgs;
use ble_link::btle::BtleRadio;
use ble_link::radio::{self, RadioEvent, ScanParams};

pub async fn run(args: ScanArgs) -> Result<()> {
    let radio = BtleRadio::new().await?;
    let (handle, mut events) = radio::spawn(Box::new(radio));

    handle.scan_start(ScanParams {
        active: args.active,
        ..ScanParams::default()
    })?;
    println!("scanning for {}s, ctrl-c to stop", args.duration_secs);

    let deadline = time::Instant::now() + Duration::from_secs(args.duration_secs);
    let mut seen = HashSet::new();
    loop {
        let event = tokio::select! {
            _ = time::sleep_until(deadline) => break,
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };
        if let RadioEvent::Advertisement { peer, rssi } = event {
            if seen.insert(peer) {
                println!("{peer}  rssi {rssi:>4}  link-local {}", peer.link_local_ipv6());
            }
        }
    }

    handle.scan_stop()?;
    if seen.is_empty() {
        println!("no peers found");
    }
    Ok(())
}
