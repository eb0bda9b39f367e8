use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SansResult<T> = Result<T, SansError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SansErrorCategory {
    Validation,
    Consistency,
    Measurement,
    Io,
    Internal,
}

impl SansErrorCategory {
    pub const fn exit_status(self) -> ExitStatus {
        match self {
            Self::Validation => ExitStatus {
                exit_code: 2,
                label: "ValidationError",
            },
            Self::Consistency => ExitStatus {
                exit_code: 3,
                label: "ConsistencyError",
            },
            Self::Measurement => ExitStatus {
                exit_code: 4,
                label: "MeasurementError",
            },
            Self::Io => ExitStatus {
                exit_code: 5,
                label: "IoError",
            },
            Self::Internal => ExitStatus {
                exit_code: 6,
                label: "InternalError",
            },
        }
    }

    pub const fn exit_code(self) -> i32 {
        self.exit_status().exit_code
    }

    pub const fn label(self) -> &'static str {
        self.exit_status().label
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    pub exit_code: i32,
    pub label: &'static str,
}

/// Error raised anywhere in a reduction. Every error aborts the invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SansError {
    category: SansErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl SansError {
    pub fn new(
        category: SansErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SansErrorCategory::Validation, placeholder, message)
    }

    pub fn consistency(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SansErrorCategory::Consistency, placeholder, message)
    }

    pub fn measurement(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SansErrorCategory::Measurement, placeholder, message)
    }

    pub fn io(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SansErrorCategory::Io, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SansErrorCategory::Internal, placeholder, message)
    }

    pub const fn category(&self) -> SansErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

impl Display for SansError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.label(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for SansError {}

#[cfg(test)]
mod tests {
    use super::{SansError, SansErrorCategory};

    #[test]
    fn exit_mapping_is_stable() {
        let cases = [
            (SansErrorCategory::Validation, 2, "ValidationError"),
            (SansErrorCategory::Consistency, 3, "ConsistencyError"),
            (SansErrorCategory::Measurement, 4, "MeasurementError"),
            (SansErrorCategory::Io, 5, "IoError"),
            (SansErrorCategory::Internal, 6, "InternalError"),
        ];

        for (category, exit_code, label) in cases {
            let status = category.exit_status();
            assert_eq!(status.exit_code, exit_code);
            assert_eq!(status.label, label);
        }
    }

    #[test]
    fn fatal_error_renders_diagnostic_lines() {
        let error = SansError::validation(
            "VALIDATION.EMPTY_BEAM_REQUIRED",
            "empty beam input workspace is mandatory for transmission calculation",
        );

        assert_eq!(error.exit_code(), 2);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [VALIDATION.EMPTY_BEAM_REQUIRED] empty beam input workspace is mandatory for transmission calculation"
        );
        assert_eq!(error.fatal_exit_line(), "FATAL EXIT CODE: 2");
        assert!(error.to_string().starts_with("ValidationError"));
    }

    #[test]
    fn every_category_exits_non_zero() {
        let errors = [
            SansError::validation("VALIDATION.X", "x"),
            SansError::consistency("CONSISTENCY.X", "x"),
            SansError::measurement("MEASUREMENT.X", "x"),
            SansError::io("IO.X", "x"),
            SansError::internal("INTERNAL.X", "x"),
        ];
        for error in errors {
            assert_ne!(error.exit_code(), 0, "{error}");
            assert!(error.diagnostic_line().starts_with("ERROR: ["));
            assert_eq!(
                error.fatal_exit_line(),
                format!("FATAL EXIT CODE: {}", error.exit_code())
            );
        }
    }
}
