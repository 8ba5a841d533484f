use caisse_docs::{ExportError, ExportFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum CaisseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid template: {0}")]
    Template(String),

    #[error("Invalid dataset: {0}")]
    Data(String),

    #[error("Failed to render {format}: {message}")]
    Render { format: ExportFormat, message: String },

    #[error("File system error: {0}")]
    FileSystem(String),
}

/// Classification of errors for logging and user display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// The template or dataset handed in by the user is unusable.
    UserError,
    /// A renderer failed while producing the document.
    RenderError,
    /// File system error while saving.
    SystemError,
    /// Invalid or missing configuration.
    ConfigError,
}

impl CaisseError {
    /// Returns the broad error category for routing and display purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::ConfigError,
            Self::Template(_) | Self::Data(_) => ErrorCategory::UserError,
            Self::Render { .. } => ErrorCategory::RenderError,
            Self::FileSystem(_) => ErrorCategory::SystemError,
        }
    }

    /// Returns a user-friendly message (hides internal details).
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(msg) => format!("Configuration invalide : {msg}"),
            Self::Template(msg) => format!("Modèle invalide : {msg}"),
            Self::Data(_) => "Les données du rapport sont illisibles.".into(),
            Self::Render { format, .. } => {
                format!("Le document {} n'a pas pu être généré.", format.extension().to_uppercase())
            }
            Self::FileSystem(_) => {
                "Impossible d'enregistrer le fichier. Vérifiez l'espace disque et les droits.".into()
            }
        }
    }
}

impl From<ExportError> for CaisseError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Render { format, source } => Self::Render {
                format,
                message: format!("{source:#}"),
            },
            ExportError::Io(e) => Self::FileSystem(e.to_string()),
            ExportError::InvalidTemplate(msg) => Self::Template(msg),
        }
    }
}

// ---------------------------------------------------------------------------
// Error classification for anyhow::Error (message-pattern based)
// ---------------------------------------------------------------------------

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Non-critical, log only.
    Low,
    /// Show to user, recoverable.
    Medium,
    /// Operation failed.
    High,
}

/// Fine-grained error category derived from message patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassifiedCategory {
    Network,
    Configuration,
    FileSystem,
    Data,
    Internal,
}

/// Classified error with context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedError {
    pub severity: ErrorSeverity,
    pub category: ClassifiedCategory,
    pub message: String,
    pub user_message: String,
}

/// Classify an `anyhow::Error` into severity, category, and a user-friendly
/// message. A wrapped [`CaisseError`] or [`ExportError`] is classified by its
/// variant; anything else by the text of the error chain.
pub fn classify_error(error: &anyhow::Error) -> ClassifiedError {
    if let Some(err) = error.downcast_ref::<CaisseError>() {
        return classify_typed(err, error);
    }
    if let Some(err) = error.downcast_ref::<ExportError>() {
        let typed = match err {
            ExportError::Render { format, source } => CaisseError::Render {
                format: *format,
                message: format!("{source:#}"),
            },
            ExportError::Io(e) => CaisseError::FileSystem(e.to_string()),
            ExportError::InvalidTemplate(msg) => CaisseError::Template(msg.clone()),
        };
        return classify_typed(&typed, error);
    }

    let msg = format!("{error:#}").to_lowercase();

    let (category, severity, user_msg) = if msg.contains("timeout") || msg.contains("connection") || msg.contains("dns") {
        (
            ClassifiedCategory::Network,
            ErrorSeverity::Medium,
            "Erreur réseau. Vérifiez la connexion.",
        )
    } else if msg.contains("no such file") || (msg.contains("not found") && msg.contains("file")) {
        (
            ClassifiedCategory::FileSystem,
            ErrorSeverity::Medium,
            "Fichier introuvable.",
        )
    } else if msg.contains("permission denied") {
        (
            ClassifiedCategory::FileSystem,
            ErrorSeverity::High,
            "Accès refusé.",
        )
    } else if msg.contains("json") || msg.contains("parse") || msg.contains("dataset") {
        (
            ClassifiedCategory::Data,
            ErrorSeverity::Medium,
            "Les données du rapport sont illisibles.",
        )
    } else if msg.contains("config") {
        (
            ClassifiedCategory::Configuration,
            ErrorSeverity::Medium,
            "Erreur de configuration.",
        )
    } else {
        (
            ClassifiedCategory::Internal,
            ErrorSeverity::High,
            "Une erreur inattendue est survenue.",
        )
    };

    ClassifiedError {
        severity,
        category,
        message: error.to_string(),
        user_message: user_msg.to_string(),
    }
}

fn classify_typed(err: &CaisseError, original: &anyhow::Error) -> ClassifiedError {
    let category = match err {
        CaisseError::Config(_) => ClassifiedCategory::Configuration,
        CaisseError::Template(_) | CaisseError::Data(_) => ClassifiedCategory::Data,
        CaisseError::FileSystem(_) => ClassifiedCategory::FileSystem,
        CaisseError::Render { .. } => ClassifiedCategory::Internal,
    };
    let severity = match err.category() {
        ErrorCategory::UserError | ErrorCategory::ConfigError => ErrorSeverity::Medium,
        ErrorCategory::RenderError | ErrorCategory::SystemError => ErrorSeverity::High,
    };
    ClassifiedError {
        severity,
        category,
        message: original.to_string(),
        user_message: err.user_message(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    // -----------------------------------------------------------------------
    // CaisseError — category mapping
    // -----------------------------------------------------------------------

    #[test]
    fn test_caisse_error_category_config() {
        let err = CaisseError::Config("bad value".into());
        assert_eq!(err.category(), ErrorCategory::ConfigError);
    }

    #[test]
    fn test_caisse_error_category_user() {
        assert_eq!(CaisseError::Template("x".into()).category(), ErrorCategory::UserError);
        assert_eq!(CaisseError::Data("x".into()).category(), ErrorCategory::UserError);
    }

    #[test]
    fn test_caisse_error_user_message_hides_internals() {
        let err = CaisseError::Data("expected value at line 1 column 1".into());
        assert_eq!(err.user_message(), "Les données du rapport sont illisibles.");
    }

    // -----------------------------------------------------------------------
    // From<ExportError>
    // -----------------------------------------------------------------------

    #[test]
    fn test_from_export_render_error() {
        let err: CaisseError = ExportError::Render {
            format: ExportFormat::Xlsx,
            source: anyhow!("Failed to save workbook to buffer"),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::RenderError);
        assert_eq!(err.user_message(), "Le document XLSX n'a pas pu être généré.");
        assert!(err.to_string().contains("Failed to save workbook"));
    }

    #[test]
    fn test_from_export_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CaisseError = ExportError::Io(io).into();
        assert_eq!(err.category(), ErrorCategory::SystemError);
    }

    #[test]
    fn test_from_export_invalid_template() {
        let err: CaisseError = ExportError::InvalidTemplate("no columns".into()).into();
        assert!(matches!(err, CaisseError::Template(ref m) if m == "no columns"));
    }

    // -----------------------------------------------------------------------
    // classify_error
    // -----------------------------------------------------------------------

    #[test]
    fn test_classify_wrapped_export_error() {
        let err = anyhow::Error::new(ExportError::InvalidTemplate("no columns".into()));
        let classified = classify_error(&err);
        assert_eq!(classified.category, ClassifiedCategory::Data);
        assert_eq!(classified.user_message, "Modèle invalide : no columns");
    }

    #[test]
    fn test_classify_wrapped_caisse_error() {
        let err = anyhow::Error::new(CaisseError::FileSystem("disk full".into()));
        let classified = classify_error(&err);
        assert_eq!(classified.category, ClassifiedCategory::FileSystem);
        assert_eq!(classified.severity, ErrorSeverity::High);
    }

    #[test]
    fn test_classify_network_timeout() {
        let classified = classify_error(&anyhow!("request timeout after 10s"));
        assert_eq!(classified.category, ClassifiedCategory::Network);
        assert_eq!(classified.severity, ErrorSeverity::Medium);
    }

    #[test]
    fn test_classify_filesystem_no_such_file() {
        let classified = classify_error(&anyhow!("No such file or directory (os error 2)"));
        assert_eq!(classified.category, ClassifiedCategory::FileSystem);
        assert_eq!(classified.user_message, "Fichier introuvable.");
    }

    #[test]
    fn test_classify_permission_denied() {
        let classified = classify_error(&anyhow!("permission denied: /srv/exports"));
        assert_eq!(classified.category, ClassifiedCategory::FileSystem);
        assert_eq!(classified.severity, ErrorSeverity::High);
    }

    #[test]
    fn test_classify_bad_dataset_uses_context_chain() {
        let err = anyhow!("expected value at line 1 column 1").context("Failed to parse dataset JSON");
        let classified = classify_error(&err);
        assert_eq!(classified.category, ClassifiedCategory::Data);
        assert_eq!(classified.message, "Failed to parse dataset JSON");
    }

    #[test]
    fn test_classify_configuration() {
        let classified = classify_error(&anyhow!("config file is malformed"));
        assert_eq!(classified.category, ClassifiedCategory::Configuration);
    }

    #[test]
    fn test_classify_internal_fallback() {
        let classified = classify_error(&anyhow!("something totally unexpected happened"));
        assert_eq!(classified.category, ClassifiedCategory::Internal);
        assert_eq!(classified.user_message, "Une erreur inattendue est survenue.");
    }

    #[test]
    fn test_classified_error_serde_round_trip() {
        let classified = ClassifiedError {
            severity: ErrorSeverity::High,
            category: ClassifiedCategory::FileSystem,
            message: "denied".into(),
            user_message: "Accès refusé.".into(),
        };
        let json = serde_json::to_string(&classified).unwrap();
        let deserialized: ClassifiedError = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.severity, ErrorSeverity::High);
        assert_eq!(deserialized.category, ClassifiedCategory::FileSystem);
        assert_eq!(deserialized.message, "denied");
    }
}
