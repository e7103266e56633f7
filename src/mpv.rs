//! `mpv` as the playback engine, driven over its JSON IPC socket.
//!
//! Requests are single JSON lines `{"command": [...], "request_id": n}`.
//! mpv answers with a line carrying the same `request_id`; asynchronous
//! `event` lines may arrive in between and are skipped.

use std::fmt;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::player::{MediaPlayer, PlayerError};

const SOCKET_TIMEOUT_MS: u64 = 800;
const CONNECT_ATTEMPTS: u32 = 50;
const CONNECT_RETRY_MS: u64 = 100;
const LOAD_TIMEOUT_SECS: u64 = 10;
const LOAD_POLL_MS: u64 = 50;

pub fn default_ipc_endpoint() -> String {
    #[cfg(windows)]
    {
        r"\\.\pipe\vocaclip-mpv".to_string()
    }
    #[cfg(not(windows))]
    {
        std::env::temp_dir()
            .join("vocaclip-mpv.sock")
            .to_string_lossy()
            .into_owned()
    }
}

#[derive(Debug, Serialize)]
struct MpvCommand {
    command: Vec<Value>,
    request_id: u64,
}

#[derive(Debug, Deserialize)]
struct MpvReply {
    #[serde(default)]
    data: Value,
    error: Option<String>,
    request_id: Option<u64>,
    event: Option<String>,
}

/// Request/reply channel to an mpv instance
pub struct MpvIpc<R: BufRead, W: Write> {
    reader: R,
    writer: W,
    next_request_id: u64,
    // bytes of a reply line not yet terminated, kept across timed-out reads
    pending: Vec<u8>,
    load_timeout: Duration,
    load_poll: Duration,
}

impl<R: BufRead, W: Write> MpvIpc<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            next_request_id: 1,
            pending: Vec::new(),
            load_timeout: Duration::from_secs(LOAD_TIMEOUT_SECS),
            load_poll: Duration::from_millis(LOAD_POLL_MS),
        }
    }

    pub fn with_load_timing(mut self, timeout: Duration, poll: Duration) -> Self {
        self.load_timeout = timeout;
        self.load_poll = poll;
        self
    }

    /// Sends one command and waits for its reply's `data`
    pub fn request(&mut self, command: Vec<Value>) -> Result<Value, PlayerError> {
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        let name = command
            .first()
            .and_then(Value::as_str)
            .unwrap_or("command")
            .to_string();

        let payload = serde_json::to_string(&MpvCommand {
            command,
            request_id,
        })
        .map_err(|e| PlayerError::Protocol(format!("could not encode {name}: {e}")))?;
        self.writer.write_all(payload.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        loop {
            // read_until keeps what it already read when the socket times out
            if self.reader.read_until(b'\n', &mut self.pending)? == 0 {
                return Err(PlayerError::Protocol(
                    "player closed the connection".to_string(),
                ));
            }
            let line = std::mem::take(&mut self.pending);
            let text = String::from_utf8_lossy(&line);
            let text = text.trim();
            if text.is_empty() {
                continue;
            }

            let reply: MpvReply = match serde_json::from_str(text) {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!(error = %e, line = text, "skipping unreadable mpv reply");
                    continue;
                }
            };
            if reply.event.is_some() || reply.request_id != Some(request_id) {
                continue;
            }

            return match reply.error.as_deref() {
                None | Some("success") => Ok(reply.data),
                Some(reason) => Err(PlayerError::Rejected {
                    command: name,
                    reason: reason.to_string(),
                }),
            };
        }
    }

    fn wait_until_loaded(&mut self) -> Result<(), PlayerError> {
        let deadline = Instant::now() + self.load_timeout;
        loop {
            match self.request(vec![json!("get_property"), json!("duration")]) {
                Ok(duration) if duration.is_number() => return Ok(()),
                // "property unavailable" until the demuxer has opened the file
                Ok(_) | Err(PlayerError::Rejected { .. }) => {}
                Err(e) => return Err(e),
            }
            if Instant::now() >= deadline {
                return Err(PlayerError::Timeout("loadfile".to_string()));
            }
            thread::sleep(self.load_poll);
        }
    }
}

impl<R: BufRead, W: Write> MediaPlayer for MpvIpc<R, W> {
    fn set_source(&mut self, path: &Path) -> Result<(), PlayerError> {
        let path = path.to_string_lossy();
        self.request(vec![json!("loadfile"), json!(path), json!("replace")])?;
        self.wait_until_loaded()
    }

    fn set_position(&mut self, ms: u64) -> Result<(), PlayerError> {
        let seconds = ms as f64 / 1000.0;
        self.request(vec![json!("seek"), json!(seconds), json!("absolute+exact")])?;
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        self.request(vec![json!("set_property"), json!("pause"), json!(false)])?;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        self.request(vec![json!("set_property"), json!("pause"), json!(true)])?;
        Ok(())
    }

    fn position(&mut self) -> Result<u64, PlayerError> {
        let data = self.request(vec![json!("get_property"), json!("time-pos")])?;
        let seconds = data
            .as_f64()
            .ok_or_else(|| PlayerError::Protocol(format!("time-pos is not a number: {data}")))?;
        Ok((seconds.max(0.0) * 1000.0).round() as u64)
    }
}

type Channel = MpvIpc<BufReader<Box<dyn Read + Send>>, Box<dyn Write + Send>>;

/// An mpv child process owned by this program
pub struct MpvPlayer {
    child: Child,
    endpoint: String,
    ipc: Channel,
}

impl MpvPlayer {
    /// Starts mpv idle and paused with an IPC server on `endpoint`, then connects to it
    pub fn launch(binary: &str, endpoint: &str) -> Result<Self, PlayerError> {
        #[cfg(unix)]
        remove_stale_socket(endpoint)?;

        let mut child = Command::new(binary)
            .arg("--idle=yes")
            .arg("--force-window=yes")
            .arg("--keep-open=yes")
            .arg("--pause")
            .arg(format!("--input-ipc-server={endpoint}"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| PlayerError::Spawn {
                program: binary.to_string(),
                source,
            })?;
        tracing::info!(pid = child.id(), endpoint, "launched mpv");

        let mut last_err = io::Error::new(io::ErrorKind::NotFound, "socket never appeared");
        for _ in 0..CONNECT_ATTEMPTS {
            if let Some(status) = child.try_wait()? {
                return Err(PlayerError::Spawn {
                    program: binary.to_string(),
                    source: io::Error::other(format!("exited early with {status}")),
                });
            }
            match connect(endpoint) {
                Ok((reader, writer)) => {
                    return Ok(Self {
                        child,
                        endpoint: endpoint.to_string(),
                        ipc: MpvIpc::new(BufReader::new(reader), writer),
                    });
                }
                Err(e) => last_err = e,
            }
            thread::sleep(Duration::from_millis(CONNECT_RETRY_MS));
        }

        let _ = child.kill();
        let _ = child.wait();
        Err(PlayerError::Connect {
            endpoint: endpoint.to_string(),
            source: last_err,
        })
    }
}

impl fmt::Debug for MpvPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MpvPlayer")
            .field("pid", &self.child.id())
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl MediaPlayer for MpvPlayer {
    fn set_source(&mut self, path: &Path) -> Result<(), PlayerError> {
        self.ipc.set_source(path)
    }

    fn set_position(&mut self, ms: u64) -> Result<(), PlayerError> {
        self.ipc.set_position(ms)
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        self.ipc.play()
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        self.ipc.pause()
    }

    fn position(&mut self) -> Result<u64, PlayerError> {
        self.ipc.position()
    }
}

impl Drop for MpvPlayer {
    fn drop(&mut self) {
        if let Err(e) = self.ipc.request(vec![json!("quit")]) {
            tracing::debug!(error = %e, "mpv did not acknowledge quit");
        }
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
        #[cfg(unix)]
        if let Err(e) = remove_stale_socket(&self.endpoint) {
            tracing::debug!(error = %e, "left mpv endpoint in place");
        }
    }
}

/// Clears a socket left behind by a crashed run, which would make mpv fail
/// to bind. Anything at `endpoint` that is not a socket is left untouched.
#[cfg(unix)]
fn remove_stale_socket(endpoint: &str) -> Result<(), PlayerError> {
    use std::os::unix::fs::FileTypeExt;

    let connect_err = |source| PlayerError::Connect {
        endpoint: endpoint.to_string(),
        source,
    };
    match std::fs::symlink_metadata(endpoint) {
        Ok(meta) if meta.file_type().is_socket() => {
            std::fs::remove_file(endpoint).map_err(connect_err)
        }
        Ok(_) => Err(connect_err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "path exists and is not a socket",
        ))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(connect_err(e)),
    }
}

#[cfg(unix)]
fn connect(endpoint: &str) -> io::Result<(Box<dyn Read + Send>, Box<dyn Write + Send>)> {
    use std::os::unix::net::UnixStream;

    let stream = UnixStream::connect(endpoint)?;
    let timeout = Some(Duration::from_millis(SOCKET_TIMEOUT_MS));
    stream.set_read_timeout(timeout)?;
    stream.set_write_timeout(timeout)?;
    let writer = stream.try_clone()?;
    Ok((Box::new(stream), Box::new(writer)))
}

#[cfg(windows)]
fn connect(endpoint: &str) -> io::Result<(Box<dyn Read + Send>, Box<dyn Write + Send>)> {
    let pipe = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(endpoint)?;
    let writer = pipe.try_clone()?;
    Ok((Box::new(pipe), Box::new(writer)))
}
