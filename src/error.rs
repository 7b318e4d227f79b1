/// Broad category of a pipeline failure.
///
/// Missing values are not errors: they travel through the pipeline as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unparseable dates, duplicate or out-of-order dates, empty regions.
    MalformedInput,
    /// A region has no entry in the population table.
    Lookup,
    /// Invalid window size or environment setting.
    Config,
    /// Input files could not be opened or read.
    Io,
}

impl ErrorKind {
    /// Process exit code for embedding binaries.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Config | ErrorKind::Io => 2,
            ErrorKind::MalformedInput => 3,
            ErrorKind::Lookup => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
    region: Option<String>,
    field: Option<&'static str>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            region: None,
            field: None,
        }
    }

    /// Attach the region the failure belongs to.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Attach the column the failure was detected on.
    pub fn with_field(mut self, field: &'static str) -> Self {
        self.field = Some(field);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn field(&self) -> Option<&'static str> {
        self.field
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        match (&self.region, self.field) {
            (Some(region), Some(field)) => write!(f, " (region `{region}`, field `{field}`)"),
            (Some(region), None) => write!(f, " (region `{region}`)"),
            (None, Some(field)) => write!(f, " (field `{field}`)"),
            (None, None) => Ok(()),
        }
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("region", &self.region)
            .field("field", &self.field)
            .finish()
    }
}

impl std::error::Error for AppError {}
