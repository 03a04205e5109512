//! In-memory image fixtures and a one-shot HTTP responder shared by unit tests.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma, Rgb, RgbImage};

/// Small deterministic jitter so encoded fixtures do not compress to a
/// handful of bytes.
fn noise(x: u32, y: u32) -> u8 {
    ((x.wrapping_mul(73_856_093) ^ y.wrapping_mul(19_349_663)) % 4) as u8
}

fn encode(image: DynamicImage, format: ImageOutputFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image.write_to(&mut bytes, format).unwrap();
    bytes
}

fn gradient(x: u32, width: u32) -> u8 {
    let span = width.saturating_sub(1).max(1);
    (x * 250 / span) as u8
}

/// Grayscale left-to-right gradient: passes both heuristics.
pub fn xray_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let v = gradient(x, width).saturating_add(noise(x, y));
        Rgb([v, v, v])
    });
    encode(DynamicImage::ImageRgb8(img), ImageOutputFormat::Png)
}

/// Strongly colored image: fails the grayscale heuristic.
pub fn color_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([200, 40 + noise(x, y), ((x + y) % 256) as u8])
    });
    encode(DynamicImage::ImageRgb8(img), ImageOutputFormat::Png)
}

/// Near-uniform gray: passes grayscale, fails contrast.
pub fn flat_gray_png(width: u32, height: u32, level: u8) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let v = level.saturating_add(noise(x, y));
        Rgb([v, v, v])
    });
    encode(DynamicImage::ImageRgb8(img), ImageOutputFormat::Png)
}

/// Single-channel JPEG gradient.
pub fn gray_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = GrayImage::from_fn(width, height, |x, _| Luma([gradient(x, width)]));
    encode(DynamicImage::ImageLuma8(img), ImageOutputFormat::Jpeg(90))
}

/// Serve exactly one request on an ephemeral local port, answering with
/// `status` and a JSON `body`. Returns the base URL and a handle that yields
/// the raw request text once the exchange is over.
pub fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        let response = format!(
            "HTTP/1.1 {status} Test\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        request
    });
    (format!("http://{addr}"), handle)
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
        let content_length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok());
        let complete = match content_length {
            Some(len) => buf.len() >= head_end + 4 + len,
            None if head.contains("transfer-encoding: chunked") => buf.ends_with(b"0\r\n\r\n"),
            None => true,
        };
        if complete {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
