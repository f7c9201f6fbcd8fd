//! Distributed-trace context extraction from broker message headers.
//!
//! Trace context travels as a W3C `traceparent` header
//! (`version-traceid-spanid-flags`) on the raw message, not inside the
//! payload. The extracted trace id is recorded on the processing span so log
//! lines for one request correlate across services.

use std::collections::HashMap;

/// Header key carrying W3C trace context.
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Extracts the trace id from a `traceparent` header, if present and well
/// formed. A malformed header is ignored; tracing is best effort and must
/// never fail a message.
pub fn extract_trace_id(headers: &HashMap<String, String>) -> Option<String> {
    let value = headers.get(TRACEPARENT_HEADER)?;
    let mut parts = value.split('-');
    let _version = parts.next()?;
    let trace_id = parts.next()?;
    let _span_id = parts.next()?;
    if trace_id.len() != 32 || !trace_id.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    if trace_id.chars().all(|c| c == '0') {
        return None;
    }
    Some(trace_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(value: &str) -> HashMap<String, String> {
        HashMap::from([(TRACEPARENT_HEADER.to_string(), value.to_string())])
    }

    #[test]
    fn extracts_trace_id_from_valid_header() {
        let h = headers("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01");
        assert_eq!(
            extract_trace_id(&h).as_deref(),
            Some("4bf92f3577b34da6a3ce929d0e0e4736")
        );
    }

    #[test]
    fn missing_header_yields_none() {
        assert_eq!(extract_trace_id(&HashMap::new()), None);
    }

    #[test]
    fn malformed_header_is_ignored() {
        assert_eq!(extract_trace_id(&headers("not-a-traceparent")), None);
        assert_eq!(extract_trace_id(&headers("00-zzzz-span-01")), None);
    }

    #[test]
    fn all_zero_trace_id_is_invalid() {
        let h = headers("00-00000000000000000000000000000000-00f067aa0ba902b7-01");
        assert_eq!(extract_trace_id(&h), None);
    }
}
