//! Batch reader state machine.

/// Position of a batch reader within the envelope.
///
/// One `advance` call moves the reader to the next state. Operation
/// states remain current while the operation's headers and content are
/// being consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// Nothing has been consumed yet.
    StartBatch,

    /// Positioned on a retrieval request part.
    Get,

    /// Positioned on a retrieval response part.
    GetResponse,

    /// Positioned on an insert request part.
    Post,

    /// Positioned on a full-update request part.
    Put,

    /// Positioned on a partial-update request part.
    Merge,

    /// Positioned on a delete request part.
    Delete,

    /// Positioned on a change response part.
    ChangeResponse,

    /// A changeset scope was just opened.
    BeginChangeSet,

    /// The changeset scope was just closed.
    EndChangeSet,

    /// The terminating batch boundary was consumed. Terminal.
    EndBatch,
}

impl BatchState {
    /// Returns true if the reader is positioned on an operation part.
    #[must_use]
    pub const fn is_operation(self) -> bool {
        matches!(
            self,
            Self::Get
                | Self::GetResponse
                | Self::Post
                | Self::Put
                | Self::Merge
                | Self::Delete
                | Self::ChangeResponse
        )
    }

    /// Returns true if the state is an operation that may carry content.
    #[must_use]
    pub const fn allows_content(self) -> bool {
        matches!(
            self,
            Self::GetResponse | Self::Post | Self::Put | Self::Merge | Self::ChangeResponse
        )
    }

    /// Returns true if the state only occurs inside a changeset scope.
    #[must_use]
    pub const fn is_change_operation(self) -> bool {
        matches!(
            self,
            Self::Post | Self::Put | Self::Merge | Self::Delete | Self::ChangeResponse
        )
    }
}

/// HTTP-style method of a batched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Retrieve a resource.
    Get,
    /// Insert a resource.
    Post,
    /// Replace a resource.
    Put,
    /// Merge changes into a resource.
    Merge,
    /// Delete a resource.
    Delete,
}

impl Method {
    /// The wire spelling of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Merge => "MERGE",
            Self::Delete => "DELETE",
        }
    }

    /// Parse a method token. Methods are case-sensitive on the wire.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "MERGE" => Some(Self::Merge),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Returns true if a request with this method may carry a body.
    #[must_use]
    pub const fn allows_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Merge)
    }

    /// Returns true if the method mutates state and belongs in a changeset.
    #[must_use]
    pub const fn is_change(self) -> bool {
        !matches!(self, Self::Get)
    }

    /// The operation state a request part with this method maps to.
    #[must_use]
    pub const fn to_state(self) -> BatchState {
        match self {
            Self::Get => BatchState::Get,
            Self::Post => BatchState::Post,
            Self::Put => BatchState::Put,
            Self::Merge => BatchState::Merge,
            Self::Delete => BatchState::Delete,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
