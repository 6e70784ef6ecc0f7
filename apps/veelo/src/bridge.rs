use std::path::{Path, PathBuf};
use thiserror::Error;

/// Locator scheme handed to the playback surface for local files.
pub const MEDIA_SCHEME: &str = "veelo-media";

#[derive(Debug, Error, PartialEq)]
pub enum BridgeError {
    #[error("unsupported media locator: {0}")]
    InvalidScheme(String),
}

// ---------------------------------------------------------------------------
// Locator scheme
// ---------------------------------------------------------------------------

/// `veelo-media://<url-encoded-absolute-path>` for an arbitrary local file.
///
/// No containment or allow-listing: the path is assumed to come from an
/// explicit user action (pick, drop, deep link), never remote input.
pub fn media_url(path: &Path) -> String {
    format!(
        "{MEDIA_SCHEME}://{}",
        percent_encode(&path.to_string_lossy())
    )
}

/// Decode a media locator back into the filesystem path it names. Existence
/// is checked at serve time, not here.
pub fn resolve(url: &str) -> Result<PathBuf, BridgeError> {
    let encoded = url
        .strip_prefix(MEDIA_SCHEME)
        .and_then(|rest| rest.strip_prefix("://"))
        .ok_or_else(|| BridgeError::InvalidScheme(url.to_string()))?;
    let decoded =
        percent_decode(encoded).ok_or_else(|| BridgeError::InvalidScheme(url.to_string()))?;
    Ok(PathBuf::from(decoded))
}

pub fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Decode `%XX` escapes. `None` for a truncated or non-hex escape; invalid
/// UTF-8 in the decoded bytes is replaced rather than rejected.
pub fn percent_decode(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            let hex = std::str::from_utf8(hex).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Some(String::from_utf8_lossy(&out).into_owned())
}

// ---------------------------------------------------------------------------
// Streaming server
// ---------------------------------------------------------------------------

/// Start a local HTTP server that streams bridged files with Range support,
/// so a playback surface can seek within arbitrary local media. Returns the
/// port number.
pub fn start_media_server() -> u16 {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("failed to start media server");
    let port = server
        .server_addr()
        .to_ip()
        .expect("bound to an IP address")
        .port();
    tracing::info!(port, "media server started");

    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            serve_request(request);
        }
    });

    port
}

fn serve_request(request: tiny_http::Request) {
    use std::io::{Read, Seek, SeekFrom};

    let raw_path = request.url().to_string();
    let path = match percent_decode(raw_path.strip_prefix('/').unwrap_or(&raw_path)) {
        Some(decoded) => PathBuf::from(decoded),
        None => {
            tracing::warn!(url = %raw_path, "undecodable media path");
            let resp = tiny_http::Response::from_string("Bad request").with_status_code(400);
            let _ = request.respond(resp);
            return;
        }
    };

    let file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "bridged file not served");
            let resp =
                tiny_http::Response::from_string(format!("Not found: {e}")).with_status_code(404);
            let _ = request.respond(resp);
            return;
        }
    };

    let total_size = file.metadata().map(|m| m.len()).unwrap_or(0);
    let mime =
        tiny_http::Header::from_bytes("Content-Type", mime_for(&path)).expect("valid header");
    let accept_ranges = tiny_http::Header::from_bytes("Accept-Ranges", "bytes").expect("valid");
    let cors = tiny_http::Header::from_bytes("Access-Control-Allow-Origin", "*").expect("valid");

    let range_header = request
        .headers()
        .iter()
        .find(|h| h.field.as_str() == "Range" || h.field.as_str() == "range")
        .map(|h| h.value.as_str().to_string());

    if let Some(range) = range_header {
        let Some((start, end)) = parse_range(&range, total_size) else {
            let content_range =
                tiny_http::Header::from_bytes("Content-Range", format!("bytes */{total_size}"))
                    .expect("valid header");
            let resp = tiny_http::Response::from_string("Range not satisfiable")
                .with_status_code(416)
                .with_header(content_range);
            let _ = request.respond(resp);
            return;
        };
        let length = end - start + 1;
        let mut file = file;
        let _ = file.seek(SeekFrom::Start(start));
        let reader = file.take(length);

        let content_range = tiny_http::Header::from_bytes(
            "Content-Range",
            format!("bytes {start}-{end}/{total_size}"),
        )
        .expect("valid header");

        let resp = tiny_http::Response::new(
            tiny_http::StatusCode(206),
            vec![mime, accept_ranges, cors, content_range],
            reader,
            Some(length as usize),
            None,
        );
        let _ = request.respond(resp);
    } else {
        let resp = tiny_http::Response::new(
            tiny_http::StatusCode(200),
            vec![mime, accept_ranges, cors],
            file,
            Some(total_size as usize),
            None,
        );
        let _ = request.respond(resp);
    }
}

/// Parse a `bytes=a-b` header into inclusive offsets, defaulting an open end
/// to the last byte. `None` when the file has no bytes to satisfy a range.
fn parse_range(header: &str, total_size: u64) -> Option<(u64, u64)> {
    if total_size == 0 {
        return None;
    }
    let last = total_size - 1;
    let range_str = header.strip_prefix("bytes=").unwrap_or(header);
    let mut parts = range_str.splitn(2, '-');
    let start: u64 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .unwrap_or(0)
        .min(last);
    let end: u64 = parts
        .next()
        .filter(|p| !p.is_empty())
        .and_then(|p| p.parse().ok())
        .unwrap_or(last)
        .min(last);
    Some((start, end.max(start)))
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        _ => "application/octet-stream",
    }
}
