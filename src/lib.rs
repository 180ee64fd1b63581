#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::doc_markdown,
    clippy::float_cmp,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::needless_pass_by_value,
    clippy::return_self_not_must_use,
    clippy::similar_names,
    clippy::struct_field_names,
    clippy::too_many_lines,
    clippy::uninlined_format_args
)]

//! Configuration layer of a real-user-monitoring agent: endpoints, identity,
//! sampling, global attributes and remote configuration merging.

pub mod attributes;
pub mod config;
pub mod observability;
pub mod sampling;
pub mod span;
pub mod testing;

pub use attributes::{AttributeValue, MutableAttributes};
pub use config::{AgentConfiguration, AgentConfigurationError, EndpointConfiguration};
pub use sampling::{SamplingDecision, SessionSampler};
pub use span::{SpanData, SpanInterceptor};
