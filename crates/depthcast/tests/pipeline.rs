use std::io::Read;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};

use depthcast::capture::{
    CaptureSession, InjectedFailure, Quantization, StreamKind, SyntheticConfig, SyntheticContext,
};
use depthcast::frame::FrameConfig;
use depthcast::transport::TcpTransport;
use depthcast::{
    run, CaptureLoop, LoopState, PipelineConfig, PipelineError, RuntimeError, SnapshotConfig,
    TransportChannel,
};

const WIDTH: usize = 640;
const HEIGHT: usize = 480;
const COLOR_LEN: usize = WIDTH * HEIGHT * 3;
const DEPTH_LEN: usize = WIDTH * HEIGHT;

struct Sink {
    port: u16,
    handle: JoinHandle<Vec<u8>>,
}

impl Sink {
    fn spawn() -> Self {
        let listener = TcpTransport::bind("127.0.0.1:0").expect("bind loopback");
        let port = listener.port();
        let handle = thread::spawn(move || {
            let mut stream = listener.accept().expect("accept");
            let mut received = Vec::new();
            stream.read_to_end(&mut received).expect("read to end");
            received
        });
        Self { port, handle }
    }

    fn received(self) -> Vec<u8> {
        self.handle.join().expect("sink thread")
    }
}

fn refused_port() -> u16 {
    TcpTransport::bind("127.0.0.1:0").expect("bind loopback").port()
}

fn synthetic(failure: Option<InjectedFailure>) -> SyntheticContext {
    SyntheticContext::new(SyntheticConfig {
        fps: 0,
        failure,
        ..SyntheticConfig::default()
    })
}

fn config(color_port: u16, depth_port: u16, iterations: Option<u64>) -> PipelineConfig {
    let mut config = PipelineConfig::new("127.0.0.1");
    config.color_port = color_port;
    config.depth_port = depth_port;
    config.iterations = iterations;
    config
}

fn split_messages(received: &[u8], payload_len: usize) -> Vec<&[u8]> {
    assert_eq!(received.len() % (payload_len + 1), 0, "partial message on the wire");
    received
        .chunks(payload_len + 1)
        .map(|message| {
            assert_eq!(message[payload_len], b'\n');
            &message[..payload_len]
        })
        .collect()
}

#[test]
fn streams_bounded_run_after_warm_up() {
    let color = Sink::spawn();
    let depth = Sink::spawn();
    let mut ctx = synthetic(None);
    let waits = ctx.wait_counter();

    let summary = run(&mut ctx, &config(color.port, depth.port, Some(3))).expect("run succeeds");

    assert_eq!(summary.iterations, 3);
    assert_eq!(summary.frames_advanced, 33);
    assert_eq!(waits.load(Ordering::SeqCst), 33);
    assert_eq!(summary.color.frames_sent, 3);
    assert_eq!(summary.color.bytes_sent, 3 * (COLOR_LEN as u64 + 1));
    assert_eq!(summary.depth.bytes_sent, 3 * (DEPTH_LEN as u64 + 1));

    let color_bytes = color.received();
    let frames = split_messages(&color_bytes, COLOR_LEN);
    assert_eq!(frames.len(), 3);
    // The first transmitted frame set is the one produced by the 30th advance.
    for (i, frame) in frames.iter().enumerate() {
        assert_eq!(frame[0] as usize, 30 + i);
        assert_eq!(frame[1] as usize, 31 + i);
    }

    let depth_bytes = depth.received();
    let frames = split_messages(&depth_bytes, DEPTH_LEN);
    assert_eq!(frames.len(), 3);
    for frame in frames {
        assert_eq!(frame[0], 0, "invalid column stays 0");
        assert_eq!(frame[1], 20, "near half");
        assert_eq!(frame[(HEIGHT - 1) * WIDTH + 1], 255, "far half");
    }
}

#[test]
fn undelimited_run_sends_bare_payloads() {
    let color = Sink::spawn();
    let depth = Sink::spawn();
    let mut ctx = synthetic(None);
    let mut cfg = config(color.port, depth.port, Some(2));
    cfg.framing = FrameConfig::undelimited();
    cfg.warm_up = 0;

    run(&mut ctx, &cfg).expect("run succeeds");

    assert_eq!(color.received().len(), 2 * COLOR_LEN);
    assert_eq!(depth.received().len(), 2 * DEPTH_LEN);
}

#[test]
fn windowed_quantization_reaches_the_wire() {
    let color = Sink::spawn();
    let depth = Sink::spawn();
    let mut ctx = synthetic(None);
    let mut cfg = config(color.port, depth.port, Some(1));
    cfg.quantization = Quantization::Window {
        near: 20 * 257,
        far: 40 * 257,
    };

    run(&mut ctx, &cfg).expect("run succeeds");
    drop(color.received());

    let depth_bytes = depth.received();
    let frames = split_messages(&depth_bytes, DEPTH_LEN);
    assert_eq!(frames[0][0], 0);
    assert_eq!(frames[0][1], 1);
    assert_eq!(frames[0][(HEIGHT - 1) * WIDTH + 1], 255);
}

#[test]
fn color_connect_failure_touches_nothing() {
    let mut ctx = synthetic(None);
    let waits = ctx.wait_counter();

    let err = run(&mut ctx, &config(refused_port(), refused_port(), Some(3))).unwrap_err();

    assert!(!err.is_device());
    assert!(matches!(
        err,
        PipelineError::Runtime(RuntimeError::Connect {
            kind: StreamKind::Color,
            ..
        })
    ));
    assert_eq!(waits.load(Ordering::SeqCst), 0);
}

#[test]
fn depth_connect_failure_sends_no_color_frames() {
    let color = Sink::spawn();
    let mut ctx = synthetic(None);
    let waits = ctx.wait_counter();

    let err = run(&mut ctx, &config(color.port, refused_port(), Some(3))).unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Runtime(RuntimeError::Connect {
            kind: StreamKind::Depth,
            ..
        })
    ));
    assert_eq!(waits.load(Ordering::SeqCst), 0);
    assert!(color.received().is_empty());
}

#[test]
fn missing_device_is_a_device_error() {
    let color = Sink::spawn();
    let depth = Sink::spawn();
    let mut ctx = SyntheticContext::new(SyntheticConfig {
        device_count: 0,
        fps: 0,
        ..SyntheticConfig::default()
    });

    let err = run(&mut ctx, &config(color.port, depth.port, Some(3))).unwrap_err();

    assert!(err.is_device());
    assert!(err.to_string().starts_with("device error calling get_device_count()"));
    assert!(color.received().is_empty());
    assert!(depth.received().is_empty());
}

#[test]
fn start_failure_is_a_device_error() {
    let color = Sink::spawn();
    let depth = Sink::spawn();
    let mut ctx = synthetic(Some(InjectedFailure::Start));

    let err = run(&mut ctx, &config(color.port, depth.port, Some(3))).unwrap_err();

    match err {
        PipelineError::Device(err) => assert_eq!(err.operation, "start"),
        other => panic!("expected device error, got {other:?}"),
    }
    drop(color.received());
    drop(depth.received());
}

#[test]
fn unbounded_run_ends_at_first_device_failure() {
    let color = Sink::spawn();
    let depth = Sink::spawn();
    // Warm-up takes frames 1..=30; the loop advances to 31, then fails.
    let mut ctx = synthetic(Some(InjectedFailure::WaitForFrames { after: 31 }));

    let err = run(&mut ctx, &config(color.port, depth.port, None)).unwrap_err();

    assert!(err.is_device());
    assert_eq!(split_messages(&color.received(), COLOR_LEN).len(), 2);
    assert_eq!(split_messages(&depth.received(), DEPTH_LEN).len(), 2);
}

#[test]
fn snapshot_failures_do_not_stop_the_run() {
    let color = Sink::spawn();
    let depth = Sink::spawn();
    let dir = tempfile::tempdir().expect("tempdir");
    let mut ctx = synthetic(None);
    let mut cfg = config(color.port, depth.port, Some(2));
    cfg.snapshot = Some(SnapshotConfig {
        path: dir.path().join("missing").join("depth.png"),
        every: 1,
    });

    let summary = run(&mut ctx, &cfg).expect("run succeeds");

    assert_eq!(summary.iterations, 2);
    assert_eq!(summary.snapshots_written, 0);
    assert_eq!(summary.snapshot_failures, 2);
    assert_eq!(split_messages(&color.received(), COLOR_LEN).len(), 2);
    assert_eq!(split_messages(&depth.received(), DEPTH_LEN).len(), 2);
}

#[test]
fn snapshot_is_written_every_n_iterations() {
    let color = Sink::spawn();
    let depth = Sink::spawn();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("depth.png");
    let mut ctx = synthetic(None);
    let mut cfg = config(color.port, depth.port, Some(3));
    cfg.snapshot = Some(SnapshotConfig {
        path: path.clone(),
        every: 2,
    });

    let summary = run(&mut ctx, &cfg).expect("run succeeds");
    drop(color.received());
    drop(depth.received());

    assert_eq!(summary.snapshots_written, 2);
    assert_eq!(summary.snapshot_failures, 0);
    let png = std::fs::read(&path).expect("snapshot exists");
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
}

fn streaming_parts(
    ctx: &mut SyntheticContext,
    color: &Sink,
    depth: &Sink,
) -> (
    CaptureSession<depthcast::capture::SyntheticDevice>,
    TransportChannel,
    TransportChannel,
) {
    let mut session = CaptureSession::open(ctx).expect("open");
    session.enable_supported_streams().expect("enable");
    session.start().expect("start");
    let color_channel = TransportChannel::connect(
        StreamKind::Color,
        "127.0.0.1",
        color.port,
        FrameConfig::default(),
    )
    .expect("color channel");
    let depth_channel = TransportChannel::connect(
        StreamKind::Depth,
        "127.0.0.1",
        depth.port,
        FrameConfig::default(),
    )
    .expect("depth channel");
    (session, color_channel, depth_channel)
}

#[test]
fn zero_warm_up_still_starts_from_a_real_frame_set() {
    let color = Sink::spawn();
    let depth = Sink::spawn();
    let mut ctx = synthetic(None);
    let waits = ctx.wait_counter();
    let mut cfg = config(color.port, depth.port, Some(2));
    cfg.warm_up = 0;

    let summary = run(&mut ctx, &cfg).expect("run succeeds");

    assert_eq!(summary.iterations, 2);
    assert_eq!(waits.load(Ordering::SeqCst), 3);
    let color_bytes = color.received();
    let frames = split_messages(&color_bytes, COLOR_LEN);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0][0], 1);
    assert_eq!(frames[1][0], 2);
    assert_eq!(split_messages(&depth.received(), DEPTH_LEN).len(), 2);
}

#[test]
fn stepping_before_warm_up_is_refused() {
    let color = Sink::spawn();
    let depth = Sink::spawn();
    let mut ctx = synthetic(None);
    let waits = ctx.wait_counter();
    let (session, color_channel, depth_channel) = streaming_parts(&mut ctx, &color, &depth);
    let mut capture = CaptureLoop::new(
        session,
        color_channel,
        depth_channel,
        Quantization::Linear,
        None,
    )
    .expect("loop");

    let err = capture.step().unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Runtime(RuntimeError::LoopState {
            operation: "step",
            state: LoopState::WarmingUp
        })
    ));
    assert_eq!(capture.state(), LoopState::WarmingUp);
    assert_eq!(waits.load(Ordering::SeqCst), 0);

    capture.warm_up(2).expect("warm-up");
    assert!(matches!(
        capture.warm_up(2),
        Err(PipelineError::Runtime(RuntimeError::LoopState {
            operation: "warm up",
            state: LoopState::Streaming
        }))
    ));
    assert_eq!(waits.load(Ordering::SeqCst), 2);

    capture.step().expect("step after warm-up");
    drop(capture);
    assert_eq!(split_messages(&color.received(), COLOR_LEN)[0][0], 2);
    assert_eq!(split_messages(&depth.received(), DEPTH_LEN).len(), 1);
}

#[test]
fn run_requires_a_warmed_up_loop() {
    let color = Sink::spawn();
    let depth = Sink::spawn();
    let mut ctx = synthetic(None);
    let (session, color_channel, depth_channel) = streaming_parts(&mut ctx, &color, &depth);
    let capture = CaptureLoop::new(
        session,
        color_channel,
        depth_channel,
        Quantization::Linear,
        None,
    )
    .expect("loop");

    let err = capture.run(Some(0)).unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Runtime(RuntimeError::LoopState {
            operation: "run",
            state: LoopState::WarmingUp
        })
    ));
    assert!(color.received().is_empty());
    assert!(depth.received().is_empty());
}

#[test]
fn capture_loop_rejects_swapped_channels() {
    let color = Sink::spawn();
    let depth = Sink::spawn();
    let mut ctx = synthetic(None);
    let mut session = CaptureSession::open(&mut ctx).expect("open");
    session.enable_supported_streams().expect("enable");
    session.start().expect("start");

    let color_channel = TransportChannel::connect(
        StreamKind::Color,
        "127.0.0.1",
        color.port,
        FrameConfig::default(),
    )
    .expect("color channel");
    let depth_channel = TransportChannel::connect(
        StreamKind::Depth,
        "127.0.0.1",
        depth.port,
        FrameConfig::default(),
    )
    .expect("depth channel");

    let err = CaptureLoop::new(
        session,
        depth_channel,
        color_channel,
        Quantization::Linear,
        None,
    )
    .map(|_| ())
    .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Runtime(RuntimeError::ChannelMismatch {
            channel: StreamKind::Depth,
            payload: StreamKind::Color
        })
    ));
    assert!(color.received().is_empty());
    assert!(depth.received().is_empty());
}

#[test]
fn capture_loop_steps_through_its_states() {
    let color = Sink::spawn();
    let depth = Sink::spawn();
    let mut ctx = synthetic(Some(InjectedFailure::WaitForFrames { after: 3 }));
    let mut session = CaptureSession::open(&mut ctx).expect("open");
    session.enable_supported_streams().expect("enable");
    session.start().expect("start");

    let color_channel = TransportChannel::connect(
        StreamKind::Color,
        "127.0.0.1",
        color.port,
        FrameConfig::default(),
    )
    .expect("color channel");
    let depth_channel = TransportChannel::connect(
        StreamKind::Depth,
        "127.0.0.1",
        depth.port,
        FrameConfig::default(),
    )
    .expect("depth channel");

    let mut capture = CaptureLoop::new(
        session,
        color_channel,
        depth_channel,
        Quantization::Linear,
        None,
    )
    .expect("loop");
    assert_eq!(capture.state(), LoopState::WarmingUp);

    capture.warm_up(2).expect("warm-up");
    assert_eq!(capture.state(), LoopState::Streaming);

    capture.step().expect("first step");
    assert_eq!(capture.iterations(), 1);
    assert_eq!(capture.session().frame_counter(), 3);

    assert!(capture.step().unwrap_err().is_device());
    assert_eq!(capture.state(), LoopState::Finished);
    assert_eq!(capture.iterations(), 1);

    // A finished loop sends nothing more.
    assert!(matches!(
        capture.step(),
        Err(PipelineError::Runtime(RuntimeError::LoopState {
            state: LoopState::Finished,
            ..
        }))
    ));
    assert_eq!(capture.iterations(), 1);

    drop(capture);
    assert_eq!(split_messages(&color.received(), COLOR_LEN).len(), 2);
    assert_eq!(split_messages(&depth.received(), DEPTH_LEN).len(), 2);
}
