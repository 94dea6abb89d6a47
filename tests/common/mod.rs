#![allow(dead_code)]

use mysql_detect::probes::mysql_handshake::{
    HandshakeRecord, CLIENT_PLUGIN_AUTH, CLIENT_SECURE_CONNECTION, PROTOCOL_VERSION,
};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Prefix a payload with the 3-byte length and sequence id.
pub fn frame(payload: &[u8], seq: u8) -> Vec<u8> {
    let len = payload.len() as u32;
    let mut out = len.to_le_bytes()[..3].to_vec();
    out.push(seq);
    out.extend_from_slice(payload);
    out
}

/// Encode a record the way a server would. Extended fields are written when
/// `character_set` and `status` are both set; part 2 of the auth data must be
/// at least 12 bytes for the declared length to reproduce it.
pub fn build_handshake(rec: &HandshakeRecord, seq: u8) -> Vec<u8> {
    let mut body = vec![PROTOCOL_VERSION];
    body.extend_from_slice(rec.server_version.as_bytes());
    body.push(0);
    body.extend_from_slice(&rec.connection_id.to_le_bytes());
    body.extend_from_slice(&rec.auth_data[..8]);
    body.push(0); // filler
    body.extend_from_slice(&(rec.capabilities as u16).to_le_bytes());

    if let (Some(charset), Some(status)) = (rec.character_set, rec.status) {
        body.push(charset);
        body.extend_from_slice(&status.to_le_bytes());
        body.extend_from_slice(&((rec.capabilities >> 16) as u16).to_le_bytes());
        let plugin = rec.capabilities & CLIENT_PLUGIN_AUTH != 0;
        body.push(if plugin { (rec.auth_data.len() + 1) as u8 } else { 0 });
        body.extend_from_slice(&[0u8; 10]);
        if rec.capabilities & CLIENT_SECURE_CONNECTION != 0 {
            body.extend_from_slice(&rec.auth_data[8..]);
            body.push(0);
        }
        if plugin {
            body.extend_from_slice(rec.auth_plugin.as_deref().unwrap_or("").as_bytes());
            body.push(0);
        }
    }
    frame(&body, seq)
}

/// The literal greeting of a MySQL 8.0.32 server with caching_sha2_password.
pub fn mysql8_handshake() -> Vec<u8> {
    let mut body = vec![0x0a];
    body.extend_from_slice(b"8.0.32\0");
    body.extend_from_slice(&[0x0c, 0x00, 0x00, 0x00]); // connection id 12
    body.extend_from_slice(&[0x1d, 0x3f, 0x5a, 0x07, 0x62, 0x11, 0x4c, 0x6e]); // salt part 1
    body.push(0x00); // filler
    body.extend_from_slice(&[0xff, 0xff]); // capabilities lower
    body.push(0xff); // utf8mb4_0900_ai_ci
    body.extend_from_slice(&[0x02, 0x00]); // SERVER_STATUS_AUTOCOMMIT
    body.extend_from_slice(&[0xff, 0xdf]); // capabilities upper
    body.push(0x15); // auth plugin data length 21
    body.extend_from_slice(&[0u8; 10]);
    body.extend_from_slice(&[0x27, 0x12, 0x0b, 0x3c, 0x2d, 0x4e, 0x19, 0x6a, 0x33, 0x58, 0x01, 0x7f]);
    body.push(0x00);
    body.extend_from_slice(b"caching_sha2_password\0");
    frame(&body, 0)
}

/// Accept one connection, send `bytes`, then keep the socket open briefly.
pub async fn spawn_server(bytes: Vec<u8>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut s, _)) = listener.accept().await {
            let _ = s.write_all(&bytes).await;
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    });
    addr
}

/// Accept one connection, send `bytes`, then wait for the client to hang up.
/// The receiver gets the result of that follow-up read: `Ok(0)` means the
/// client closed its side.
pub async fn spawn_server_expecting_close(
    bytes: Vec<u8>,
) -> (SocketAddr, oneshot::Receiver<io::Result<usize>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        if let Ok((mut s, _)) = listener.accept().await {
            let _ = s.write_all(&bytes).await;
            let mut buf = [0u8; 64];
            let res = match tokio::time::timeout(Duration::from_secs(2), s.read(&mut buf)).await {
                Ok(res) => res,
                Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "client kept the socket open")),
            };
            let _ = tx.send(res);
        }
    });
    (addr, rx)
}

/// Accept one connection and never write to it.
pub async fn spawn_silent_server(hold: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((_s, _)) = listener.accept().await {
            tokio::time::sleep(hold).await;
        }
    });
    addr
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
