//! Integration tests for the session against a mock engine.
//!
//! These tests run a real WebSocket server (the same stack the engine
//! speaks) and verify the complete connect → frames → store → subscriber
//! flow, reconnect behavior, command delivery and the activity pulse.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{WebSocketStream, accept_async};
use url::Url;

use boardsync_client::{ClientConfig, ConnectionState, Session};
use boardsync_core::{BusDeviceId, Error, PinLevel, PinMode};
use boardsync_protocol::{Command, HardwareDelta};

const TICK: Duration = Duration::from_millis(50);
const WAIT: Duration = Duration::from_secs(5);

/// Bind a listener on an ephemeral port and build a config pointing at it.
async fn listen_and_config() -> (TcpListener, ClientConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let endpoint = Url::parse(&format!("ws://{addr}/ws/execute")).unwrap();
    let mut config = ClientConfig::new(endpoint);
    config.reconnect_interval = TICK;
    config.activity_window = TICK;
    (listener, config)
}

async fn accept_client(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    timeout(WAIT, accept_async(stream)).await.unwrap().unwrap()
}

async fn wait_for_state(session: &Session, wanted: ConnectionState) {
    let mut rx = session.connectivity();
    timeout(WAIT, async {
        loop {
            if *rx.borrow() == wanted {
                return;
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .unwrap_or_else(|_| panic!("never reached state {wanted}"));
}

async fn next_delta(rx: &mut tokio::sync::broadcast::Receiver<HardwareDelta>) -> HardwareDelta {
    timeout(WAIT, rx.recv()).await.unwrap().unwrap()
}

#[tokio::test]
async fn frames_flow_into_store_and_subscribers_in_order() {
    let (listener, config) = listen_and_config().await;
    let session = Session::connect(config);
    let mut deltas = session.subscribe_deltas();

    let mut server = accept_client(&listener).await;
    wait_for_state(&session, ConnectionState::Open).await;

    server
        .send(WsMessage::Text(
            r#"{"type":"gpio_state_update","pin":17,"state":true,"mode":"output"}"#.to_string(),
        ))
        .await
        .unwrap();
    server
        .send(WsMessage::Text(
            r#"{"type":"output","content":"GPIO 17 output: False"}"#.to_string(),
        ))
        .await
        .unwrap();

    // Structured update first.
    assert_eq!(
        next_delta(&mut deltas).await,
        HardwareDelta::PinLevelSet {
            pin: 17,
            level: PinLevel::High,
            mode: Some(PinMode::Out),
        }
    );
    // Then the console line and the extracted delta from the text frame.
    assert!(matches!(
        next_delta(&mut deltas).await,
        HardwareDelta::ConsoleLine { .. }
    ));
    assert_eq!(
        next_delta(&mut deltas).await,
        HardwareDelta::PinLevelSet {
            pin: 17,
            level: PinLevel::Low,
            mode: Some(PinMode::Out),
        }
    );

    // The store reflects the last applied delta.
    let store = session.store();
    let snapshot = store.lock().await;
    let pin = snapshot.pin(17).unwrap();
    assert_eq!(pin.level, PinLevel::Low);
    assert_eq!(pin.mode, PinMode::Out);
    drop(snapshot);

    session.close().await;
}

#[tokio::test]
async fn send_fails_immediately_while_not_open() {
    // Bind an ephemeral port and immediately release it: dialing it gets
    // connection refused.
    let vacated = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = vacated.local_addr().unwrap();
    drop(vacated);

    let endpoint = Url::parse(&format!("ws://{addr}/ws/execute")).unwrap();
    let mut config = ClientConfig::new(endpoint);
    config.reconnect = false;
    config.reconnect_interval = TICK;

    let session = Session::connect(config);
    let gateway = session.gateway();

    // Before the dial resolves the state is Idle or Connecting; afterwards
    // Closed. In every one of those states a send fails without blocking.
    let result = gateway.send(&Command::Stop);
    assert!(matches!(result, Err(Error::NotConnected)));

    wait_for_state(&session, ConnectionState::Closed).await;
    let result = gateway.send(&Command::Stop);
    assert!(matches!(result, Err(Error::NotConnected)));

    session.close().await;
}

#[tokio::test]
async fn commands_reach_the_engine_verbatim() {
    let (listener, config) = listen_and_config().await;
    let session = Session::connect(config);

    let mut server = accept_client(&listener).await;
    wait_for_state(&session, ConnectionState::Open).await;

    session.gateway().send(&Command::pwm_duty(18, 75.0)).unwrap();

    let frame = timeout(WAIT, server.next()).await.unwrap().unwrap().unwrap();
    let WsMessage::Text(text) = frame else {
        panic!("expected text frame, got {frame:?}");
    };
    assert_eq!(
        text,
        r#"{"type":"pwm_control","pin":18,"action":"duty_change","duty_cycle":75.0}"#
    );

    session.close().await;
}

#[tokio::test]
async fn session_reconnects_on_fixed_interval_after_drop() {
    let (listener, config) = listen_and_config().await;
    let session = Session::connect(config);

    // First connection: accept, then drop it.
    let server = accept_client(&listener).await;
    wait_for_state(&session, ConnectionState::Open).await;
    drop(server);

    // The session re-dials by itself after the fixed backoff; accepting
    // the second connection is the observable proof. (The intermediate
    // Closed state is transient and deliberately not waited on.)
    let mut server = accept_client(&listener).await;
    wait_for_state(&session, ConnectionState::Open).await;
    assert!(session.reconnect_attempts() >= 2);

    // The revived link works end to end.
    let mut deltas = session.subscribe_deltas();
    server
        .send(WsMessage::Text(
            r#"{"type":"execution_started"}"#.to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(
        next_delta(&mut deltas).await,
        HardwareDelta::ExecutionPhase(boardsync_core::RunPhase::Started)
    );

    session.close().await;
}

#[tokio::test]
async fn closed_session_does_not_reconnect() {
    let (listener, config) = listen_and_config().await;
    let session = Session::connect(config);

    let server = accept_client(&listener).await;
    wait_for_state(&session, ConnectionState::Open).await;

    session.close().await;
    drop(server);

    // No further dial may arrive. accept() timing out is the pass signal.
    let result = timeout(TICK * 4, listener.accept()).await;
    assert!(result.is_err(), "closed session must not re-dial");
}

#[tokio::test]
async fn activity_burst_produces_exactly_one_clear() {
    let (listener, mut config) = listen_and_config().await;
    // Wide window so both pulses land inside it even on a slow runner.
    config.activity_window = Duration::from_millis(200);
    let session = Session::connect(config);
    let mut deltas = session.subscribe_deltas();

    let mut server = accept_client(&listener).await;
    wait_for_state(&session, ConnectionState::Open).await;

    let spi_frame = r#"{"type":"emu_event","event":{"type":"spi_event","event":"transfer","bus":0,"device":0,"data":[1,128,0]}}"#;
    server
        .send(WsMessage::Text(spi_frame.to_string()))
        .await
        .unwrap();
    server
        .send(WsMessage::Text(spi_frame.to_string()))
        .await
        .unwrap();

    let device = BusDeviceId::spi(0, 0);

    // Two raises...
    for _ in 0..2 {
        assert_eq!(
            next_delta(&mut deltas).await,
            HardwareDelta::BusActivity {
                device,
                active: true,
            }
        );
    }
    // ...then a single clear once the (restarted) window elapses.
    assert_eq!(
        next_delta(&mut deltas).await,
        HardwareDelta::BusActivity {
            device,
            active: false,
        }
    );
    let extra = timeout(Duration::from_millis(500), deltas.recv()).await;
    assert!(extra.is_err(), "burst must produce exactly one clear");

    let store = session.store();
    assert!(!store.lock().await.bus_device(&device).unwrap().active);

    session.close().await;
}

#[tokio::test]
async fn run_start_resets_pins_but_keeps_seeded_devices() {
    let (listener, config) = listen_and_config().await;
    let session = Session::connect(config);
    let mut deltas = session.subscribe_deltas();

    let mut server = accept_client(&listener).await;
    wait_for_state(&session, ConnectionState::Open).await;

    for frame in [
        r#"{"type":"gpio_state_update","pin":4,"state":true,"mode":"input"}"#,
        r#"{"type":"execution_started"}"#,
    ] {
        server.send(WsMessage::Text(frame.to_string())).await.unwrap();
    }

    // Drain until the reset delta is observed.
    loop {
        if next_delta(&mut deltas).await
            == HardwareDelta::ExecutionPhase(boardsync_core::RunPhase::Started)
        {
            break;
        }
    }

    let store = session.store();
    let snapshot = store.lock().await;
    let pin = snapshot.pin(4).unwrap();
    assert_eq!(pin.mode, PinMode::Unset);
    assert_eq!(pin.level, PinLevel::Low);
    assert_eq!(snapshot.bus_devices().len(), 5);
    assert!(snapshot.bus_device(&BusDeviceId::i2c(0x76)).is_some());
    drop(snapshot);

    session.close().await;
}

#[tokio::test]
async fn malformed_frames_surface_as_warnings_and_do_not_kill_the_stream() {
    let (listener, config) = listen_and_config().await;
    let session = Session::connect(config);
    let mut deltas = session.subscribe_deltas();

    let mut server = accept_client(&listener).await;
    wait_for_state(&session, ConnectionState::Open).await;

    server
        .send(WsMessage::Text("this is not json".to_string()))
        .await
        .unwrap();
    server
        .send(WsMessage::Text(
            r#"{"type":"gpio_state_update","pin":22,"state":true,"mode":"output"}"#.to_string(),
        ))
        .await
        .unwrap();

    assert!(matches!(
        next_delta(&mut deltas).await,
        HardwareDelta::ConsoleLine {
            severity: boardsync_core::Severity::Warning,
            ..
        }
    ));
    // The stream continues past the bad frame.
    assert_eq!(
        next_delta(&mut deltas).await,
        HardwareDelta::PinLevelSet {
            pin: 22,
            level: PinLevel::High,
            mode: Some(PinMode::Out),
        }
    );

    session.close().await;
}
