//! Extractor invocation.

mod args;
mod client;
mod proxy;
mod runner;

pub use args::{build_extractor_args, ExtractorOptions};
pub use client::{rewrite_tool_name, ExtractionClient, PRODUCT_NAME};
pub use proxy::ProxyHelper;
pub use runner::{ProcessOutput, ProcessRunner, TokioProcessRunner};
