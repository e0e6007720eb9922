use anyhow::{bail, Context, Result};
use log::debug;
use std::marker::PhantomData;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use warden_protocol::minecraft::PingPayload;

/// Oldest protocol version every modern server still answers a status
/// request for.
const HANDSHAKE_PROTOCOL: i32 = 47;
/// Next-state field value asking for the status flow.
const NEXT_STATE_STATUS: i32 = 1;
/// Protocol cap on a packet body; anything larger is garbage.
const MAX_PACKET_LEN: i32 = (1 << 21) - 1;

// Connection state machine
pub trait SlpClientState {}

pub struct Unconnected;
impl SlpClientState for Unconnected {}

pub struct Connected;
impl SlpClientState for Connected {}

/// Minimal modern server-list-ping client: handshake, then one status
/// request. Writes are staged in `buffer` until `flush` frames them.
pub struct SlpClient<TState: SlpClientState> {
    stream: Option<TcpStream>,
    buffer: Vec<u8>,
    _state: PhantomData<TState>,
}

impl SlpClient<Unconnected> {
    pub fn new() -> Self {
        SlpClient {
            stream: None,
            buffer: Vec::new(),
            _state: PhantomData,
        }
    }

    pub async fn handshake(self, host: &str, port: u16) -> Result<SlpClient<Connected>> {
        let stream = TcpStream::connect(format!("{}:{}", host, port))
            .await
            .context(format!("failed to connect to {}:{}", host, port))?;
        let mut client = SlpClient {
            stream: Some(stream),
            buffer: Vec::new(),
            _state: PhantomData::<Connected>,
        };

        client.write_varint(HANDSHAKE_PROTOCOL);
        client.write_string(host);
        client.write_short(port);
        client.write_varint(NEXT_STATE_STATUS);
        client.flush(0).await?;

        Ok(client)
    }
}

impl<TState: SlpClientState> SlpClient<TState> {
    fn write_short(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    fn write_varint(&mut self, mut value: i32) {
        while value >= 0x80 {
            self.buffer.push((value as u8) | 0x80);
            value >>= 7;
        }
        self.buffer.push(value as u8);
    }

    fn write_string(&mut self, value: &str) {
        let data = value.as_bytes();
        self.write_varint(data.len() as i32);
        self.buffer.extend_from_slice(data);
    }

    /// Frames the staged bytes as one packet: length, then id, then body.
    async fn flush(&mut self, id: i32) -> Result<()> {
        let body = std::mem::take(&mut self.buffer);

        self.write_varint(id);
        let id_bytes = std::mem::take(&mut self.buffer);

        self.write_varint((body.len() + id_bytes.len()) as i32);
        let length_bytes = std::mem::take(&mut self.buffer);

        let stream = self.stream.as_mut().context("stream not initialized")?;
        stream.write_all(&length_bytes).await?;
        stream.write_all(&id_bytes).await?;
        stream.write_all(&body).await?;
        stream.flush().await?;
        Ok(())
    }

    fn read_varint(data: &[u8], offset: &mut usize) -> Result<i32> {
        let mut result = 0;
        let mut shift = 0;
        loop {
            if *offset >= data.len() {
                bail!("unexpected end of data");
            }
            let b = data[*offset];
            *offset += 1;
            result |= ((b & 0x7F) as i32) << shift;
            if (b & 0x80) == 0 {
                return Ok(result);
            }
            shift += 7;
            if shift >= 32 {
                bail!("varint too long");
            }
        }
    }

    fn read_string(data: &[u8], length: i32, offset: &mut usize) -> Result<String> {
        if length < 0 || *offset + length as usize > data.len() {
            bail!("not enough data for string");
        }
        let str = String::from_utf8_lossy(&data[*offset..*offset + length as usize]).into_owned();
        *offset += length as usize;
        Ok(str)
    }
}

impl SlpClient<Connected> {
    /// Sends the empty status request and parses the JSON answer.
    pub async fn status(&mut self) -> Result<PingPayload> {
        self.flush(0).await?;

        let packet = self.read_packet().await?;
        let mut offset = 0;
        let packet_id = Self::read_varint(&packet, &mut offset)?;
        let json_length = Self::read_varint(&packet, &mut offset)?;
        debug!(
            "received packet 0x{:02x} with {} bytes of status json",
            packet_id, json_length
        );

        let json = Self::read_string(&packet, json_length, &mut offset)?;
        serde_json::from_str::<PingPayload>(&json).context("failed to parse server ping payload")
    }

    /// Reads one length-prefixed packet off the wire. Unlike the writes, the
    /// length prefix has to be decoded byte by byte before the body size is
    /// known.
    async fn read_packet(&mut self) -> Result<Vec<u8>> {
        let stream = self.stream.as_mut().context("stream not initialized")?;

        let mut length = 0i32;
        let mut shift = 0;
        loop {
            let b = stream
                .read_u8()
                .await
                .context("connection closed while reading packet length")?;
            length |= ((b & 0x7F) as i32) << shift;
            if (b & 0x80) == 0 {
                break;
            }
            shift += 7;
            if shift >= 32 {
                bail!("varint too long");
            }
        }
        if length <= 0 || length > MAX_PACKET_LEN {
            bail!("invalid packet length {}", length);
        }

        let mut data = vec![0u8; length as usize];
        stream.read_exact(&mut data).await?;
        Ok(data)
    }
}

impl Default for SlpClient<Unconnected> {
    fn default() -> Self {
        Self::new()
    }
}
