//! Error types for the version graph

/// Graph mutation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A node with this id is already present
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    /// An edge endpoint is not present in the graph
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// An edge would connect a node to itself
    #[error("self loop on node: {0}")]
    SelfLoop(String),

    /// An edge with this id is already present
    #[error("duplicate edge id: {0}")]
    DuplicateEdge(String),
}

impl GraphError {
    /// Node id the error refers to (edge id for [`GraphError::DuplicateEdge`])
    #[inline]
    #[must_use]
    pub fn subject(&self) -> &str {
        match self {
            Self::DuplicateNode(id)
            | Self::UnknownNode(id)
            | Self::SelfLoop(id)
            | Self::DuplicateEdge(id) => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_error_display() {
        let err = GraphError::UnknownNode("arch-9".to_string());
        assert_eq!(err.to_string(), "unknown node: arch-9");
        assert_eq!(err.subject(), "arch-9");
    }
}
