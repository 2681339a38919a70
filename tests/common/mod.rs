#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::io::DuplexStream;
use tokio::time::Instant;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use rpc_worker::{
    BinaryReader, BinaryWriter, BoxedStream, Connect, Endpoint, MessageHeader, MessageType,
    ProcessError, ProcessorFn, ProcessorRef, Subscribe, TType, TransportError, Worker,
    WorkerConfig,
};

/// What the scripted connector does on one connect attempt.
pub enum Step {
    Refuse,
    Accept(DuplexStream),
}

/// Connector that replays a fixed script and records when each attempt happened.
/// Once the script runs out every attempt is refused.
#[derive(Default)]
pub struct ScriptedConnector {
    steps: Mutex<VecDeque<Step>>,
    attempts: Mutex<Vec<Instant>>,
}

impl ScriptedConnector {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into_iter().collect()),
            attempts: Mutex::new(Vec::new()),
        })
    }

    /// Attempt times as offsets from `start`, in whole seconds.
    pub fn attempt_secs(&self, start: Instant) -> Vec<u64> {
        self.attempts
            .lock()
            .iter()
            .map(|t| t.duration_since(start).as_secs())
            .collect()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.lock().len()
    }
}

#[async_trait]
impl Connect for ScriptedConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<BoxedStream, TransportError> {
        self.attempts.lock().push(Instant::now());
        let step = self.steps.lock().pop_front();
        match step {
            Some(Step::Accept(stream)) => Ok(Box::new(stream)),
            Some(Step::Refuse) | None => Err(TransportError::Connect {
                endpoint: endpoint.to_string(),
                source: std::io::ErrorKind::ConnectionRefused.into(),
            }),
        }
    }
}

/// Proxy side of one in-memory connection.
pub struct Proxy {
    framed: Framed<DuplexStream, LengthDelimitedCodec>,
}

/// Returns the worker's stream (for `Step::Accept`) and the proxy driving it.
pub fn link() -> (DuplexStream, Proxy) {
    let (worker_side, proxy_side) = tokio::io::duplex(64 * 1024);
    let proxy = Proxy {
        framed: Framed::new(proxy_side, LengthDelimitedCodec::new()),
    };
    (worker_side, proxy)
}

impl Proxy {
    pub async fn send(&mut self, frame: Bytes) {
        self.framed.send(frame).await.expect("proxy send");
    }

    pub async fn send_header(&mut self, name: &str, kind: MessageType, seq_id: i32) {
        self.send(MessageHeader::new(name, kind, seq_id).encode()).await;
    }

    pub async fn heartbeat(&mut self, seq_id: i32) {
        self.send_header("heartbeat", MessageType::Heartbeat, seq_id).await;
    }

    pub async fn confirm_stop(&mut self) {
        self.send_header("stop", MessageType::StopConfirm, 0).await;
    }

    /// Next frame, or `None` once the worker closed the connection.
    pub async fn recv(&mut self) -> Option<Bytes> {
        match self.framed.next().await {
            Some(Ok(frame)) => Some(frame.freeze()),
            Some(Err(_)) | None => None,
        }
    }

    /// Next frame decoded into header and body reader.
    pub async fn recv_message(&mut self) -> (MessageHeader, BinaryReader) {
        let frame = self.recv().await.expect("worker closed the connection");
        let mut reader = BinaryReader::new(frame);
        let header = reader.read_message_begin().expect("valid header");
        (header, reader)
    }

    /// Like `recv`, but gives up after `limit` of (virtual) time.
    pub async fn recv_within(&mut self, limit: Duration) -> Option<Bytes> {
        tokio::time::timeout(limit, self.recv()).await.ok().flatten()
    }
}

pub const TEST_SOCKET: &str = "/tmp/rpc-worker-test.sock";

/// Builds a worker on the scripted connector with no subscribers.
pub fn worker(connector: Arc<ScriptedConnector>, processor: ProcessorRef) -> Arc<Worker> {
    worker_with(connector, processor, WorkerConfig::default(), |b| b)
}

pub fn worker_with(
    connector: Arc<ScriptedConnector>,
    processor: ProcessorRef,
    cfg: WorkerConfig,
    extra: impl FnOnce(rpc_worker::WorkerBuilder) -> rpc_worker::WorkerBuilder,
) -> Arc<Worker> {
    let builder = Worker::builder(Endpoint::unix(TEST_SOCKET), processor)
        .config(cfg)
        .connector(connector)
        .with_subscribers(Vec::<Arc<dyn Subscribe>>::new());
    Arc::new(extra(builder).build())
}

/// Service used across tests.
///
/// - `sayHello(1: string name)` replies `"Hello, {name}"` in field 0.
/// - `fail` returns a handler error.
/// - `halfReply` starts a reply, then returns a handler error.
/// - `boom` panics.
/// - `log` is oneway and writes nothing.
/// - anything else is an unknown method.
pub fn hello_processor() -> ProcessorRef {
    ProcessorFn::arc(|header, input, output| match header.name.as_str() {
        "sayHello" => {
            let name = read_name_arg(input)?;
            write_hello_reply(output, header, &name);
            Ok(())
        }
        "fail" => Err(ProcessError::handler("backend unavailable")),
        "halfReply" => {
            output.write_message_begin(&header.with_kind(MessageType::Reply));
            output.write_field_begin(TType::String, 0);
            output.write_string("partial");
            Err(ProcessError::handler("gave up mid-reply"))
        }
        "boom" => panic!("handler blew up on seq {}", header.seq_id),
        "log" => {
            input.skip(TType::Struct)?;
            Ok(())
        }
        other => Err(ProcessError::UnknownMethod(other.to_string())),
    })
}

fn read_name_arg(input: &mut BinaryReader) -> Result<String, ProcessError> {
    let mut name = String::new();
    while let Some((ty, id)) = input.read_field_begin()? {
        if id == 1 && ty == TType::String {
            name = input.read_string()?;
        } else {
            input.skip(ty)?;
        }
    }
    Ok(name)
}

pub fn write_hello_reply(output: &mut BinaryWriter, header: &MessageHeader, name: &str) {
    output.write_message_begin(&header.with_kind(MessageType::Reply));
    output.write_field_begin(TType::String, 0);
    output.write_string(&format!("Hello, {name}"));
    output.write_field_stop();
}

/// Encodes a `sayHello(name)` call.
pub fn say_hello_call(seq_id: i32, name: &str) -> Bytes {
    let mut w = BinaryWriter::new();
    w.write_message_begin(&MessageHeader::new("sayHello", MessageType::Call, seq_id));
    w.write_field_begin(TType::String, 1);
    w.write_string(name);
    w.write_field_stop();
    w.freeze()
}

/// Encodes a call with an empty argument struct.
pub fn empty_call(name: &str, kind: MessageType, seq_id: i32) -> Bytes {
    let mut w = BinaryWriter::new();
    w.write_message_begin(&MessageHeader::new(name, kind, seq_id));
    w.write_field_stop();
    w.freeze()
}
