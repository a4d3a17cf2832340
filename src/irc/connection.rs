//! Line-based TCP connection to an IRC server.

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use super::IrcMessage;
use crate::error::IrcError;

/// Longest line accepted from the server, line ending included.
const MAX_LINE_LENGTH: usize = 8 * 1024;

pub(super) struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    buffer: Vec<u8>,
}

impl Connection {
    pub async fn connect(host: &str, port: u16) -> Result<Self, IrcError> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        let (reader, writer) = stream.into_split();

        Ok(Self {
            reader: BufReader::new(reader),
            writer,
            buffer: Vec::with_capacity(512),
        })
    }

    pub async fn send(&mut self, message: &IrcMessage) -> Result<(), IrcError> {
        tracing::trace!(command = %message.command, "Sending to Bancho");
        let line = format!("{message}\r\n");
        self.writer.write_all(line.as_bytes()).await?;
        Ok(())
    }

    /// Read the next line. Invalid UTF-8 is replaced rather than dropping
    /// the connection.
    pub async fn read_line(&mut self) -> Result<String, IrcError> {
        self.buffer.clear();
        let mut limited = (&mut self.reader).take(MAX_LINE_LENGTH as u64);
        let read = limited.read_until(b'\n', &mut self.buffer).await?;

        if read == 0 {
            return Err(IrcError::Closed);
        }
        if read == MAX_LINE_LENGTH && !self.buffer.ends_with(b"\n") {
            return Err(IrcError::LineTooLong {
                limit: MAX_LINE_LENGTH,
            });
        }
        Ok(String::from_utf8_lossy(&self.buffer).into_owned())
    }
}

#[cfg(test)]
mod test {
    use tokio::net::TcpListener;

    use super::*;

    async fn connected(server_sends: Vec<u8>) -> Connection {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(&server_sends).await.unwrap();
        });

        Connection::connect("127.0.0.1", port).await.unwrap()
    }

    #[tokio::test]
    async fn reads_lines_until_eof() {
        let mut conn = connected(b"PING :a\r\nPING :b\n".to_vec()).await;

        assert_eq!(conn.read_line().await.unwrap(), "PING :a\r\n");
        assert_eq!(conn.read_line().await.unwrap(), "PING :b\n");
        assert!(matches!(conn.read_line().await, Err(IrcError::Closed)));
    }

    #[tokio::test]
    async fn rejects_runaway_lines() {
        let mut conn = connected(vec![b'a'; MAX_LINE_LENGTH * 2]).await;

        let error = conn.read_line().await.unwrap_err();
        assert!(matches!(error, IrcError::LineTooLong { limit: MAX_LINE_LENGTH }));
    }

    #[tokio::test]
    async fn accepts_a_line_at_the_limit() {
        let mut line = vec![b'a'; MAX_LINE_LENGTH - 2];
        line.extend_from_slice(b"\r\n");
        let mut conn = connected(line).await;

        assert_eq!(conn.read_line().await.unwrap().len(), MAX_LINE_LENGTH);
    }
}
