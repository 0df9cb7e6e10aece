use thiserror::Error;

/// Problems found while turning a parsed config tree into node specs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpecError {
    #[error("spec store is full ({capacity} nodes)")]
    Exhausted { capacity: usize },

    #[error("split container '{id}' (line {line}) must have exactly 2 children, has {count}")]
    SplitArity { id: String, count: usize, line: u32 },

    #[error("template '{name}' not found (line {line})")]
    MissingTemplate { name: String, line: u32 },

    #[error("'import' is not supported inside children (line {line}); use a template and 'type: instance'")]
    ImportNotSupported { line: u32 },

    #[error("line {line}: {message}")]
    Malformed { line: u32, message: String },
}

/// Failures that abort building a scene tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("node pool exhausted ({capacity} nodes)")]
    PoolExhausted { capacity: usize },

    #[error("spec id does not belong to this store")]
    UnknownSpec,
}
