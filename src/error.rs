#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// A mesh, image or settings file is missing or cannot be decoded.
    ResourceLoadFailure,
    /// A shader template failed to render or the resulting module failed validation.
    ShaderCompileFailure,
    /// A render pipeline could not be assembled from its shader modules.
    ShaderLinkFailure,
    /// The window, surface, adapter or device could not be created.
    InitializationFailure,
    InvalidConfiguration,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: String) -> Self {
        Self { kind, message }
    }

    pub fn resource_load(message: String) -> Self {
        Self::new(ErrorKind::ResourceLoadFailure, message)
    }

    pub fn invalid_configuration(message: String) -> Self {
        Self::new(ErrorKind::InvalidConfiguration, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the kind of `error` if it wraps one of ours.
    pub fn kind_of(error: &anyhow::Error) -> Option<ErrorKind> {
        error.downcast_ref::<Error>().map(Error::kind)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}
