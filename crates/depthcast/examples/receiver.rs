//! Minimal consumer: accepts the color and depth channels and counts frames.
//!
//! Run with:
//!   cargo run --example receiver
//!
//! In another terminal:
//!   cargo run -- 127.0.0.1 --iterations 100

use std::thread;

use depthcast::capture::StreamKind;
use depthcast::frame::{FrameError, FrameReader};
use depthcast::transport::TcpTransport;
use depthcast::{COLOR_PORT, DEPTH_PORT};

const WIDTH: usize = 640;
const HEIGHT: usize = 480;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn receive(kind: StreamKind, port: u16, payload_len: usize) -> Result<u64, BoxError> {
    let listener = TcpTransport::bind(&format!("0.0.0.0:{port}"))?;
    eprintln!("{kind}: listening on {}", listener.local_addr());

    let stream = listener.accept()?;
    eprintln!("{kind}: peer connected from {}", stream.peer_addr());

    let mut reader = FrameReader::new(stream);
    let mut frames = 0u64;
    loop {
        match reader.read_frame(payload_len) {
            Ok(frame) => {
                frames += 1;
                if frames % 30 == 0 {
                    eprintln!("{kind}: {frames} frames, first byte {}", frame[0]);
                }
            }
            Err(FrameError::ConnectionClosed) => break,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(frames)
}

fn main() -> Result<(), BoxError> {
    let color = thread::spawn(|| receive(StreamKind::Color, COLOR_PORT, WIDTH * HEIGHT * 3));
    let depth = thread::spawn(|| receive(StreamKind::Depth, DEPTH_PORT, WIDTH * HEIGHT));

    let color_frames = color.join().map_err(|_| "color receiver panicked")??;
    let depth_frames = depth.join().map_err(|_| "depth receiver panicked")??;
    eprintln!("received {color_frames} color and {depth_frames} depth frames");
    Ok(())
}
