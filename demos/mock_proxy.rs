//! Minimal stand-in for the load-balancing proxy.
//!
//! Accepts workers on a TCP address, heartbeats each one every second, routes
//! a `sayHello` call every third tick and confirms any STOP it receives.
//!
//! ```text
//! cargo run --example mock_proxy -- 127.0.0.1:5556
//! ```

use std::error::Error;
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use rpc_worker::{
    ApplicationException, BinaryReader, BinaryWriter, MessageHeader, MessageType, TType,
};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:5556".to_string());
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "mock proxy listening");

    loop {
        let (socket, peer) = listener.accept().await?;
        info!(%peer, "worker connected");
        tokio::spawn(async move {
            match serve(socket).await {
                Ok(()) => info!(%peer, "worker session ended"),
                Err(e) => warn!(%peer, error = %e, "worker session failed"),
            }
        });
    }
}

async fn serve(socket: TcpStream) -> Result<(), BoxError> {
    socket.set_nodelay(true)?;
    let mut framed = Framed::new(socket, LengthDelimitedCodec::new());
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut seq: i32 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                seq += 1;
                framed
                    .send(MessageHeader::new("heartbeat", MessageType::Heartbeat, seq).encode())
                    .await?;
                if seq % 3 == 0 {
                    framed.send(say_hello(seq, "proxy")).await?;
                }
            }
            frame = framed.next() => {
                let Some(frame) = frame else { return Ok(()) };
                let mut reader = BinaryReader::new(frame?.freeze());
                let header = reader.read_message_begin()?;

                match header.kind {
                    MessageType::Heartbeat => debug!(seq_id = header.seq_id, "heartbeat echoed"),
                    MessageType::Stop => {
                        info!("worker asked to be drained, confirming");
                        framed
                            .send(MessageHeader::new("stop", MessageType::StopConfirm, 0).encode())
                            .await?;
                    }
                    MessageType::Reply => {
                        let greeting = read_greeting(&mut reader)?;
                        info!(seq_id = header.seq_id, %greeting, "reply");
                    }
                    MessageType::Exception => {
                        let exc = ApplicationException::read(&mut reader)?;
                        warn!(seq_id = header.seq_id, kind = ?exc.kind, message = %exc.message, "exception");
                    }
                    other => warn!(kind = ?other, name = %header.name, "unexpected message"),
                }
            }
        }
    }
}

fn say_hello(seq_id: i32, name: &str) -> Bytes {
    let mut w = BinaryWriter::new();
    w.write_message_begin(&MessageHeader::new("sayHello", MessageType::Call, seq_id));
    w.write_field_begin(TType::String, 1);
    w.write_string(name);
    w.write_field_stop();
    w.freeze()
}

fn read_greeting(reader: &mut BinaryReader) -> Result<String, BoxError> {
    let mut greeting = String::new();
    while let Some((ty, id)) = reader.read_field_begin()? {
        match (id, ty) {
            (0, TType::String) => greeting = reader.read_string()?,
            _ => reader.skip(ty)?,
        }
    }
    Ok(greeting)
}
