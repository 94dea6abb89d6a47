use std::io;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

/// Connect to `addr` (`host:port`), giving up after `timeout`.
pub async fn connect_with_timeout(addr: &str, timeout: Duration) -> io::Result<TcpStream> {
    match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(res) => res,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("connect to {} timed out after {:?}", addr, timeout),
        )),
    }
}

/// One read of at most `cap` bytes. Zero bytes (peer closed first) is an error.
pub async fn read_once(
    stream: &mut TcpStream,
    cap: usize,
    timeout: Duration,
) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; cap];
    let n = match tokio::time::timeout(timeout, stream.read(&mut buf)).await {
        Ok(res) => res?,
        Err(_) => {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no data within {:?}", timeout),
            ))
        }
    };
    if n == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed before any data was received",
        ));
    }
    buf.truncate(n);
    Ok(buf)
}
