//! Builders for batch envelope payloads.
//!
//! Assembles realistic multipart payloads through the real writer, so
//! framing, boundaries and changeset scoping always match what the
//! codec itself produces.

use feedwire_envelope::{BatchWriter, Method, Operation};

/// A 200 response carrying a feed or entry document.
#[must_use]
pub fn feed_response(body: impl Into<Vec<u8>>) -> Operation {
    Operation::response(200, "OK")
        .with_header("Content-Type", "application/atom+xml;type=feed;charset=utf-8")
        .with_body(body)
}

/// A 201 response announcing a created entity.
#[must_use]
pub fn created_response(content_id: &str, location: &str, body: impl Into<Vec<u8>>) -> Operation {
    Operation::response(201, "Created")
        .with_header("Content-ID", content_id)
        .with_header("Location", location)
        .with_header("Content-Type", "application/atom+xml;type=entry;charset=utf-8")
        .with_body(body)
}

/// A 204 response with nothing but a correlation id.
#[must_use]
pub fn no_content_response(content_id: &str) -> Operation {
    Operation::response(204, "No Content").with_header("Content-ID", content_id)
}

/// A retrieval request against a resource path.
#[must_use]
pub fn get_request(uri: &str) -> Operation {
    Operation::request(Method::Get, uri)
}

/// Packs retrievals plus at most one changeset into a request payload.
///
/// Returns the raw bytes and the batch boundary token to hand a reader.
#[must_use]
pub fn request_batch(retrievals: &[Operation], changes: &[Operation]) -> (Vec<u8>, String) {
    assemble(BatchWriter::request(Vec::new()), retrievals, changes)
}

/// Packs retrievals plus at most one changeset into a response payload.
///
/// Returns the raw bytes and the batch boundary token to hand a reader.
#[must_use]
pub fn response_batch(retrievals: &[Operation], changes: &[Operation]) -> (Vec<u8>, String) {
    assemble(BatchWriter::response(Vec::new()), retrievals, changes)
}

fn assemble(
    mut writer: BatchWriter<Vec<u8>>,
    retrievals: &[Operation],
    changes: &[Operation],
) -> (Vec<u8>, String) {
    for op in retrievals {
        writer.write_operation(op).expect("operation writes");
    }
    if !changes.is_empty() {
        writer.begin_changeset().expect("changeset opens");
        for op in changes {
            writer.write_operation(op).expect("operation writes");
        }
        writer.end_changeset().expect("changeset closes");
    }
    let boundary = writer.boundary().to_string();
    writer.finish().expect("batch terminates");
    (writer.into_inner(), boundary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedwire_envelope::{BatchReader, BatchState};

    #[test]
    fn built_response_opens_and_terminates() {
        let (payload, boundary) = response_batch(
            &[feed_response(b"<feed/>".to_vec())],
            &[
                created_response("1", "http://host/sample.svc/Orders(9)", b"<entry/>".to_vec()),
                no_content_response("2"),
            ],
        );

        let mut reader = BatchReader::new(payload.as_slice(), &boundary).unwrap();
        let mut states = Vec::new();
        while reader.advance().unwrap() {
            states.push(reader.state());
        }
        assert_eq!(
            states,
            vec![
                BatchState::GetResponse,
                BatchState::BeginChangeSet,
                BatchState::ChangeResponse,
                BatchState::ChangeResponse,
                BatchState::EndChangeSet,
            ]
        );
        assert_eq!(reader.state(), BatchState::EndBatch);
    }

    #[test]
    fn changeset_is_omitted_when_empty() {
        let (payload, boundary) = request_batch(&[get_request("http://host/sample.svc/Customers")], &[]);
        let mut reader = BatchReader::new(payload.as_slice(), &boundary).unwrap();
        assert!(reader.advance().unwrap());
        assert_eq!(reader.state(), BatchState::Get);
        assert!(!reader.advance().unwrap());
    }
}
