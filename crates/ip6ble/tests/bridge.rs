use std::time::Duration;

use ble_link::radio::{BondState, GattProfile, RadioCommand, RadioEvent};
use ble_link::BleAddress;
use ip6ble::testing::{MemoryFactory, ScriptHandle, ScriptedRadio};
use ip6ble::{BridgeConfig, BridgeEvent, BridgeService};

fn peer() -> BleAddress {
    "AA:BB:CC:DD:EE:FF".parse().unwrap()
}

fn local() -> BleAddress {
    "02:11:22:33:44:55".parse().unwrap()
}

fn config() -> BridgeConfig {
    let mut config = BridgeConfig::new(peer());
    config.local = Some(local());
    config
}

async fn wait_for_commands(script: &ScriptHandle, pred: impl Fn(&[RadioCommand]) -> bool) {
    for _ in 0..200 {
        if pred(&script.commands()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("radio never saw expected commands: {:?}", script.commands());
}

#[tokio::test]
async fn bridge_relays_packets_both_ways() {
    let (radio, script) = ScriptedRadio::new();
    let (factory, mut ports) = MemoryFactory::new();
    let mut service = BridgeService::start(Box::new(radio), Box::new(factory), config());

    match service.next_event().await {
        Some(BridgeEvent::Connected {
            local: local_ip,
            peer: peer_ip,
        }) => {
            assert_eq!(local_ip, local().link_local_ipv6());
            assert_eq!(peer_ip, peer().link_local_ipv6());
        }
        other => panic!("expected Connected, got {other:?}"),
    }

    let mut port = ports.recv().await.unwrap();
    assert_eq!(port.name, "ip6ble0");
    assert_eq!(port.mtu, 1024);

    // Bring-up handshake, in order. The subscribe command races the
    // Connected event, so wait for it separately.
    let commands = script.commands();
    assert_eq!(commands[0], RadioCommand::Connect(peer()));
    assert_eq!(commands[1], RadioCommand::DiscoverServices);
    assert!(matches!(commands[2], RadioCommand::RequestMtu(_)));
    wait_for_commands(&script, |cmds| {
        cmds.contains(&RadioCommand::SubscribeC2(true))
    })
    .await;

    // Host stack to peer.
    let outbound = vec![0x60, 0x00, 0x00, 0x00, 0xAB];
    port.transmit(outbound.clone());
    wait_for_commands(&script, |cmds| {
        cmds.contains(&RadioCommand::WriteC1(outbound.clone()))
    })
    .await;

    // Peer to host stack.
    let inbound = vec![0x60, 0x01, 0x02, 0x03];
    script.inject(RadioEvent::Notification(inbound.clone()));
    assert_eq!(port.received().await, Some(inbound));

    service.stop();
    assert!(matches!(
        service.next_event().await,
        Some(BridgeEvent::Disconnected)
    ));
    service.wait().await.unwrap();
}

#[tokio::test]
async fn peer_disconnect_finishes_the_service() {
    let (radio, script) = ScriptedRadio::new();
    let (factory, _ports) = MemoryFactory::new();
    let mut service = BridgeService::start(Box::new(radio), Box::new(factory), config());

    assert!(matches!(
        service.next_event().await,
        Some(BridgeEvent::Connected { .. })
    ));

    script.inject(RadioEvent::Disconnected);
    assert!(matches!(
        service.next_event().await,
        Some(BridgeEvent::Disconnected)
    ));
    assert!(service.next_event().await.is_none());
    service.wait().await.unwrap();
}

#[tokio::test]
async fn oversize_outbound_packet_is_dropped() {
    let (radio, script) = ScriptedRadio::new();
    let (factory, mut ports) = MemoryFactory::new();
    let mut service = BridgeService::start(Box::new(radio), Box::new(factory), config());

    assert!(matches!(
        service.next_event().await,
        Some(BridgeEvent::Connected { .. })
    ));
    let port = ports.recv().await.unwrap();

    port.transmit(vec![0u8; 2048]);
    let marker = vec![0x60, 0xEE];
    port.transmit(marker.clone());

    wait_for_commands(&script, |cmds| {
        cmds.contains(&RadioCommand::WriteC1(marker.clone()))
    })
    .await;
    assert!(
        !script
            .commands()
            .iter()
            .any(|c| matches!(c, RadioCommand::WriteC1(p) if p.len() > 1024)),
        "oversize packet must never reach the radio"
    );

    service.stop();
    service.wait().await.unwrap();
}

#[tokio::test]
async fn missing_characteristics_end_the_service_quietly() {
    let (radio, _script) = ScriptedRadio::with_profile(
        BondState::None,
        GattProfile {
            has_c1: true,
            has_c2: false,
            has_c2_cccd: false,
        },
    );
    let (factory, _ports) = MemoryFactory::new();
    let mut service = BridgeService::start(Box::new(radio), Box::new(factory), config());

    // The link never came up, so there is nothing to report.
    assert!(service.next_event().await.is_none());
    service.wait().await.unwrap();
}

#[tokio::test]
async fn oversize_inbound_packet_is_dropped() {
    let (radio, script) = ScriptedRadio::new();
    let (factory, mut ports) = MemoryFactory::new();
    let mut service = BridgeService::start(Box::new(radio), Box::new(factory), config());

    assert!(matches!(
        service.next_event().await,
        Some(BridgeEvent::Connected { .. })
    ));
    let mut port = ports.recv().await.unwrap();

    script.inject(RadioEvent::Notification(vec![0u8; 2048]));
    let inbound = vec![0x60, 0x42];
    script.inject(RadioEvent::Notification(inbound.clone()));
    assert_eq!(port.received().await, Some(inbound));

    service.stop();
    service.wait().await.unwrap();
}
