//! Span interception hook.

use crate::attributes::AttributeValue;
use crate::config::AgentConfiguration;
use std::collections::BTreeMap;
use std::sync::Arc;

/// The exportable view of a finished span, as seen by a span interceptor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpanData {
    pub name: String,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl SpanData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Callback that can rewrite an outgoing span or drop it by returning `None`.
pub type SpanInterceptor = Arc<dyn Fn(SpanData) -> Option<SpanData> + Send + Sync>;

/// Run `span` through the configured interceptor, if any.
pub fn intercept(configuration: &AgentConfiguration, span: SpanData) -> Option<SpanData> {
    match &configuration.span_interceptor {
        Some(interceptor) => {
            let name = span.name.clone();
            let result = interceptor(span);
            if result.is_none() {
                tracing::debug!(span = %name, "Span discarded by interceptor");
            }
            result
        }
        None => Some(span),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ConfigurationTestBuilder;

    #[test]
    fn spans_pass_through_without_interceptor() {
        let configuration = ConfigurationTestBuilder::build_minimal();
        let span = SpanData::new("screen.view");

        assert_eq!(intercept(&configuration, span.clone()), Some(span));
    }

    #[test]
    fn interceptor_can_drop_spans() {
        let configuration = ConfigurationTestBuilder::build_minimal()
            .span_interceptor(|span: SpanData| (!span.name.starts_with("internal.")).then_some(span));

        assert!(intercept(&configuration, SpanData::new("internal.ping")).is_none());
        assert!(intercept(&configuration, SpanData::new("screen.view")).is_some());
    }

    #[test]
    fn interceptor_can_rewrite_spans() {
        let configuration = ConfigurationTestBuilder::build_minimal()
            .span_interceptor(|span: SpanData| Some(span.with_attribute("redacted", true)));

        let span = intercept(&configuration, SpanData::new("http.request")).unwrap();
        assert_eq!(span.attributes.get("redacted"), Some(&AttributeValue::Bool(true)));
    }

    #[test]
    fn default_builder_interceptor_is_identity() {
        let configuration = ConfigurationTestBuilder::build_default();
        let span = SpanData::new("tap").with_attribute("target", "button");

        assert_eq!(intercept(&configuration, span.clone()), Some(span));
    }
}
