//! HelloWorld worker.
//!
//! Registers a `sayHello(1: string name)` service with the proxy and serves it
//! until Ctrl-C, at which point it asks the proxy to drain it and exits once
//! the proxy confirms.
//!
//! ```text
//! cargo run --example mock_proxy                       # terminal 1
//! cargo run --example hello_worker -- tcp://127.0.0.1 5556   # terminal 2
//! cargo run --example hello_worker -- /usr/local/proxy/hello_backend.sock
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use rpc_worker::{
    BinaryReader, BinaryWriter, Endpoint, MessageHeader, MessageType, ProcessError, Processor,
    TType, Worker, WorkerConfig,
};
use tracing_subscriber::EnvFilter;

struct HelloWorld;

impl HelloWorld {
    fn say_hello(&self, name: &str) -> String {
        format!("Hello, {name}!")
    }
}

#[async_trait]
impl Processor for HelloWorld {
    async fn process(
        &self,
        header: &MessageHeader,
        input: &mut BinaryReader,
        output: &mut BinaryWriter,
    ) -> Result<(), ProcessError> {
        match header.name.as_str() {
            "sayHello" => {
                let mut name = String::new();
                while let Some((ty, id)) = input.read_field_begin()? {
                    match (id, ty) {
                        (1, TType::String) => name = input.read_string()?,
                        _ => input.skip(ty)?,
                    }
                }

                output.write_message_begin(&header.with_kind(MessageType::Reply));
                output.write_field_begin(TType::String, 0);
                output.write_string(&self.say_hello(&name));
                output.write_field_stop();
                Ok(())
            }
            other => Err(ProcessError::UnknownMethod(other.to_string())),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "tcp://127.0.0.1".to_string());
    let port: u16 = args.next().map(|p| p.parse::<u16>()).transpose()?.unwrap_or(5556);
    let endpoint = Endpoint::parse(&host, port)?;

    let worker = Worker::builder(endpoint, Arc::new(HelloWorld))
        .config(WorkerConfig::default())
        .service("hello")
        .build();

    rpc_worker::stop_on_signal(worker.stop_handle());
    worker.run().await;
    Ok(())
}
