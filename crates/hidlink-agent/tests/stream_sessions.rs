//! Integration tests for the byte-stream transports.
//!
//! Sessions are driven with scripted `tokio_test` streams and, for TCP, a
//! real loopback socket.  Each test starts its own control loop around a
//! [`MockActuator`] and asserts on the calls it recorded.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;
use std::time::Duration;

use hidlink_agent::application::control_loop::{self, CommandHandle};
use hidlink_agent::application::dispatch::{DispatchSettings, Dispatcher, ThreadSleeper};
use hidlink_agent::infrastructure::actuator::{ActuatorCall, MockActuator};
use hidlink_agent::infrastructure::transport::tcp::serve_listener;
use hidlink_agent::infrastructure::transport::{run_session, WireProtocol};
use hidlink_core::protocol::binary::encode_command;
use hidlink_core::{Command, MouseButton};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_test::io::Builder;

fn start(actuator: &Arc<MockActuator>) -> (CommandHandle, JoinHandle<()>) {
    let dispatcher = Dispatcher::new(
        actuator.clone(),
        Box::new(ThreadSleeper),
        DispatchSettings {
            settle: Duration::from_millis(1),
            ..DispatchSettings::default()
        },
    );
    control_loop::spawn(dispatcher, 8).expect("spawn control loop")
}

// ── Line protocol ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_line_session_replies_once_per_line() {
    // Arrange
    let actuator = Arc::new(MockActuator::new());
    let (handle, _thread) = start(&actuator);
    let stream = Builder::new()
        .read(b"PING\r\nMOVE 10 -20\nFLY\n")
        .write(b"OK\nOK\nERR unknown cmd: FLY\n")
        .build();

    // Act
    run_session(stream, WireProtocol::Line, &handle, &AtomicBool::new(true))
        .await
        .unwrap();

    // Assert
    assert_eq!(
        actuator.calls(),
        vec![ActuatorCall::MoveAndScroll { dx: 10, dy: -20, wheel: 0 }]
    );
}

#[tokio::test]
async fn test_line_split_across_reads_is_reassembled() {
    // Arrange
    let actuator = Arc::new(MockActuator::new());
    let (handle, _thread) = start(&actuator);
    let stream = Builder::new()
        .read(b"TYPE h")
        .read(b"i\n")
        .write(b"OK\n")
        .build();

    // Act
    run_session(stream, WireProtocol::Line, &handle, &AtomicBool::new(true))
        .await
        .unwrap();

    // Assert
    assert_eq!(
        actuator.calls(),
        vec![ActuatorCall::TypeChar('h'), ActuatorCall::TypeChar('i')]
    );
}

#[tokio::test]
async fn test_line_session_reports_disconnected_actuator() {
    let actuator = Arc::new(MockActuator::new());
    actuator.set_connected(false);
    let (handle, _thread) = start(&actuator);
    let stream = Builder::new()
        .read(b"CLICK 1\nPING\n")
        .write(b"ERR not connected\nOK\n")
        .build();

    run_session(stream, WireProtocol::Line, &handle, &AtomicBool::new(true))
        .await
        .unwrap();

    assert!(actuator.calls().is_empty());
}

#[tokio::test]
async fn test_kcombo_line_presses_then_releases() {
    // Arrange – Ctrl+Alt+Delete
    let actuator = Arc::new(MockActuator::new());
    let (handle, _thread) = start(&actuator);
    let stream = Builder::new().read(b"KCOMBO 5 76\n").write(b"OK\n").build();

    // Act
    run_session(stream, WireProtocol::Line, &handle, &AtomicBool::new(true))
        .await
        .unwrap();

    // Assert
    assert_eq!(
        actuator.calls(),
        vec![
            ActuatorCall::Press(0xE0),
            ActuatorCall::Press(0xE2),
            ActuatorCall::Press(76),
            ActuatorCall::ReleaseAll,
            ActuatorCall::ReleaseButton(MouseButton::Left),
            ActuatorCall::ReleaseButton(MouseButton::Right),
            ActuatorCall::ReleaseButton(MouseButton::Middle),
        ]
    );
    assert!(actuator.held_keys().is_empty());
}

#[tokio::test]
async fn test_kcombo_key_list_may_contain_spaces() {
    // Arrange
    let actuator = Arc::new(MockActuator::new());
    let (handle, _thread) = start(&actuator);
    let stream = Builder::new().read(b"KCOMBO 1 4, 5\n").write(b"OK\n").build();

    // Act
    run_session(stream, WireProtocol::Line, &handle, &AtomicBool::new(true))
        .await
        .unwrap();

    // Assert
    assert_eq!(
        &actuator.calls()[..3],
        &[ActuatorCall::Press(0xE0), ActuatorCall::Press(4), ActuatorCall::Press(5)]
    );
}

#[tokio::test]
async fn test_type_keeps_leading_spaces() {
    let actuator = Arc::new(MockActuator::new());
    let (handle, _thread) = start(&actuator);
    let stream = Builder::new().read(b"TYPE  x\n").write(b"OK\n").build();

    run_session(stream, WireProtocol::Line, &handle, &AtomicBool::new(true))
        .await
        .unwrap();

    assert_eq!(
        actuator.calls(),
        vec![ActuatorCall::TypeChar(' '), ActuatorCall::TypeChar('x')]
    );
}

// ── Binary protocol ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_binary_session_executes_frames_without_replies() {
    // Arrange – a corrupted frame sandwiched between two good ones
    let actuator = Arc::new(MockActuator::new());
    let (handle, _thread) = start(&actuator);
    let mut bytes = encode_command(&Command::MouseWheel { delta: -1 }).unwrap();
    bytes.extend_from_slice(&[0xAA, 0x03, 0x01, 0x05, 0x06, 0x07]);
    bytes.extend_from_slice(&[0xAA, 0x03, 0x01, 0x05, 0x06, 0x01]);
    let stream = Builder::new().read(&bytes).build();

    // Act
    run_session(stream, WireProtocol::Binary, &handle, &AtomicBool::new(true))
        .await
        .unwrap();

    // Assert
    assert_eq!(
        actuator.calls(),
        vec![
            ActuatorCall::MoveAndScroll { dx: 0, dy: 0, wheel: -1 },
            ActuatorCall::MoveAndScroll { dx: 5, dy: 6, wheel: 0 },
        ]
    );
}

#[tokio::test]
async fn test_binary_session_skips_noise_before_start_marker() {
    let actuator = Arc::new(MockActuator::new());
    let (handle, _thread) = start(&actuator);
    let mut bytes = vec![0x00, 0x13, 0x37];
    bytes.extend(encode_command(&Command::KeyRelease).unwrap());
    let stream = Builder::new().read(&bytes).build();

    run_session(stream, WireProtocol::Binary, &handle, &AtomicBool::new(true))
        .await
        .unwrap();

    assert_eq!(actuator.calls()[0], ActuatorCall::ReleaseAll);
}

// ── TCP ───────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_tcp_client_round_trip_and_shutdown() {
    // Arrange
    let actuator = Arc::new(MockActuator::new());
    let (handle, _thread) = start(&actuator);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let running = Arc::new(AtomicBool::new(true));
    let server = tokio::spawn(serve_listener(
        listener,
        WireProtocol::Line,
        handle,
        Arc::clone(&running),
    ));

    // Act
    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(b"WHEEL 3\n").await.unwrap();
    let mut reply = [0u8; 3];
    client.read_exact(&mut reply).await.unwrap();
    drop(client);
    running.store(false, Ordering::Relaxed);

    // Assert
    assert_eq!(&reply, b"OK\n");
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("accept loop notices the shutdown flag")
        .unwrap();
    assert_eq!(
        actuator.calls(),
        vec![ActuatorCall::MoveAndScroll { dx: 0, dy: 0, wheel: 3 }]
    );
}

#[tokio::test]
async fn test_shutdown_with_idle_client_connected() {
    // Arrange
    let actuator = Arc::new(MockActuator::new());
    let (handle, _thread) = start(&actuator);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let running = Arc::new(AtomicBool::new(true));
    let server = tokio::spawn(serve_listener(
        listener,
        WireProtocol::Line,
        handle,
        Arc::clone(&running),
    ));
    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(b"PING\n").await.unwrap();
    let mut reply = [0u8; 3];
    client.read_exact(&mut reply).await.unwrap();

    // Act – the client stays connected and silent
    running.store(false, Ordering::Relaxed);

    // Assert
    tokio::time::timeout(Duration::from_secs(3), server)
        .await
        .expect("open session notices the shutdown flag")
        .unwrap();
    drop(client);
}

#[tokio::test]
async fn test_reply_is_sent_before_following_hold_finishes() {
    // Arrange
    let actuator = Arc::new(MockActuator::new());
    let (handle, _thread) = start(&actuator);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let running = Arc::new(AtomicBool::new(true));
    tokio::spawn(serve_listener(
        listener,
        WireProtocol::Line,
        handle,
        Arc::clone(&running),
    ));
    let mut client = TcpStream::connect(addr).await.unwrap();

    // Act – a move pipelined with a 3 s combo hold
    client
        .write_all(b"MOVE 1 1\nCOMBO 0 4 0 3000 1\n")
        .await
        .unwrap();
    let mut reply = [0u8; 3];
    let first = tokio::time::timeout(Duration::from_secs(1), client.read_exact(&mut reply)).await;

    // Assert
    first.expect("first reply arrives during the hold").unwrap();
    assert_eq!(&reply, b"OK\n");
    running.store(false, Ordering::Relaxed);
}
