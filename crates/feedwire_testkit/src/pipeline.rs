//! End-to-end harness over the envelope, parser and materializer.
//!
//! Drives the full client path: a batch payload is split into
//! operations, feed-bearing parts stream through the parser, and every
//! parsed entry lands in one shared entity graph.

use std::io::{BufReader, Read};

use feedwire_atom::FeedParser;
use feedwire_envelope::{BatchReader, BatchState, Headers};
use feedwire_graph::{
    EntityGraph, EntityHandle, MaterializeOptions, Materializer, TypeToken,
};
use url::Url;

use crate::fixtures::{sample_model, SampleModel};

/// What one batch part turned into.
#[derive(Debug)]
pub struct OperationOutcome {
    /// HTTP-style status of the part.
    pub status: u16,
    /// Correlation id, when the part carried one.
    pub content_id: Option<String>,
    /// Entities materialized from the part, in pull order.
    pub handles: Vec<EntityHandle>,
    /// Continuation of the part's top-level feed, if one was declared.
    pub next: Option<Url>,
    /// Raw body of parts that were not materialized.
    pub body: Option<Vec<u8>>,
}

/// Accumulates whole batch responses into one entity graph.
pub struct PipelineHarness {
    /// The sample model the harness materializes against.
    pub model: SampleModel,
    /// The graph every response lands in.
    pub graph: EntityGraph,
}

impl PipelineHarness {
    /// Creates a harness over a fresh graph and the sample model.
    #[must_use]
    pub fn new() -> Self {
        Self {
            model: sample_model(),
            graph: EntityGraph::new(),
        }
    }

    /// Materializes one standalone document into the graph.
    pub fn materialize(
        &mut self,
        xml: &str,
        expected: TypeToken,
        options: MaterializeOptions,
    ) -> Vec<EntityHandle> {
        let parser = FeedParser::new(xml.as_bytes());
        let mut materializer = Materializer::with_options(
            parser,
            &mut self.graph,
            &self.model.registry,
            expected,
            options,
        );
        let mut handles = Vec::new();
        while let Some(result) = materializer.read().expect("document materializes") {
            handles.push(result.as_entity().expect("default plans produce entities"));
        }
        handles
    }

    /// Decodes a response payload, materializing every retrieval part.
    ///
    /// Retrieval responses carrying a syndication content type stream
    /// straight into the graph against `expected`; everything else keeps
    /// its raw body in the outcome for the caller to correlate.
    pub fn drain_response(
        &mut self,
        payload: &[u8],
        boundary: &str,
        expected: TypeToken,
        options: &MaterializeOptions,
    ) -> Vec<OperationOutcome> {
        let mut reader = BatchReader::new(payload, boundary).expect("payload opens");
        let mut outcomes = Vec::new();
        while reader.advance().expect("payload advances") {
            let state = reader.state();
            if !state.is_operation() {
                continue;
            }
            let status = reader.status_code().expect("response parts carry a status");
            let content_id = reader.content_id().map(str::to_string);
            let mut handles = Vec::new();
            let mut next = None;
            let mut body = None;

            if state == BatchState::GetResponse && is_syndication(reader.headers()) {
                let content = reader.content_stream().expect("content opens");
                let parser = FeedParser::new(BufReader::new(content));
                let mut materializer = Materializer::with_options(
                    parser,
                    &mut self.graph,
                    &self.model.registry,
                    expected,
                    options.clone(),
                );
                while let Some(result) = materializer.read().expect("part materializes") {
                    handles.push(result.as_entity().expect("default plans produce entities"));
                }
                next = materializer.next_page().cloned();
            } else {
                let mut bytes = Vec::new();
                reader
                    .content_stream()
                    .expect("content opens")
                    .read_to_end(&mut bytes)
                    .expect("content drains");
                if !bytes.is_empty() {
                    body = Some(bytes);
                }
            }

            outcomes.push(OperationOutcome {
                status,
                content_id,
                handles,
                next,
                body,
            });
        }
        outcomes
    }
}

impl Default for PipelineHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn is_syndication(headers: &Headers) -> bool {
    headers
        .get("Content-Type")
        .is_some_and(|value| value.contains("atom+xml"))
}
