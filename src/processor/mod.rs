//! Request processors: the [`Processor`] trait and the closure-backed
//! [`ProcessorFn`].

mod processor;
mod processor_fn;

pub use processor::{Processor, ProcessorRef};
pub use processor_fn::ProcessorFn;
