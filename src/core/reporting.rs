//! Non-throwing reporting channel for configuration problems.
//!
//! Configuration mistakes (duplicate computed fields, missing scales,
//! immutable settings) never abort a draw pass. They are reported here with a
//! stable numeric code and the offending operation degrades to a no-op.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Stable error codes surfaced through [`Reporter::error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    ContainerNotSet,
    ScaleNotSet,
    TableMappingDifferentTable,
    TableFieldNameDuplicate,
    TableComputerOutputFieldDuplicate,
    WrongShapesConfig,
}

impl ErrorCode {
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::ContainerNotSet => 1,
            Self::ScaleNotSet => 2,
            Self::TableMappingDifferentTable => 200,
            Self::TableFieldNameDuplicate => 201,
            Self::TableComputerOutputFieldDuplicate => 202,
            Self::WrongShapesConfig => 300,
        }
    }

    #[must_use]
    pub fn describe(self, args: &[String]) -> String {
        let arg = |index: usize| args.get(index).map_or("", String::as_str);
        match self {
            Self::ContainerNotSet => "Container is not set or can not be properly recognized.".to_owned(),
            Self::ScaleNotSet => "Scale is not set. Use scale() method to set it.".to_owned(),
            Self::TableMappingDifferentTable => {
                "Cannot create a computer on the table with the mapping of another table.".to_owned()
            }
            Self::TableFieldNameDuplicate => format!(
                "Cannot create computed field \"{}\" - field name should be unique for the table",
                arg(0)
            ),
            Self::TableComputerOutputFieldDuplicate => format!(
                "Cannot create output field \"{}\" on the computer - field with this name already exists",
                arg(0)
            ),
            Self::WrongShapesConfig => format!(
                "Series \"{}\" of type \"{}\" cannot be drawn, because it requires shapes: {}.",
                arg(0),
                arg(1),
                arg(2)
            ),
        }
    }
}

/// Stable warning codes surfaced through [`Reporter::warning`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningCode {
    TooManyTicks,
    TableAlreadyInTransaction,
    ImmutableMarkerScale,
    ImmutableMarkerLayout,
}

impl WarningCode {
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::TooManyTicks => 20,
            Self::TableAlreadyInTransaction => 101,
            Self::ImmutableMarkerScale => 500,
            Self::ImmutableMarkerLayout => 501,
        }
    }

    #[must_use]
    pub fn describe(self, args: &[String]) -> String {
        let arg = |index: usize| args.get(index).map_or("", String::as_str);
        match self {
            Self::TooManyTicks => format!(
                "Current scale/ticks settings resulted in too many ticks: trying to draw {} ticks, \
                 only {} are drawn.",
                arg(0),
                arg(1)
            ),
            Self::TableAlreadyInTransaction => {
                "Table is already in transaction mode. Calling startTransaction() multiple times does nothing."
                    .to_owned()
            }
            Self::ImmutableMarkerScale => {
                "Scale of this marker can't be changed once the marker is created.".to_owned()
            }
            Self::ImmutableMarkerLayout => {
                "Layout of this marker can't be changed once the marker is created.".to_owned()
            }
        }
    }
}

/// One entry emitted through the reporting channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Report {
    Error { code: ErrorCode, args: Vec<String> },
    Warning { code: WarningCode, args: Vec<String> },
}

impl Report {
    #[must_use]
    pub fn is_error(&self, code: ErrorCode) -> bool {
        matches!(self, Self::Error { code: reported, .. } if *reported == code)
    }

    #[must_use]
    pub fn is_warning(&self, code: WarningCode) -> bool {
        matches!(self, Self::Warning { code: reported, .. } if *reported == code)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error { code, args } => {
                write!(f, "Error: {}\nDescription: {}", code.code(), code.describe(args))
            }
            Self::Warning { code, args } => {
                write!(f, "Warning: {}\nDescription: {}", code.code(), code.describe(args))
            }
        }
    }
}

/// Sink for configuration errors and warnings.
///
/// Entities hold an `Rc<dyn Reporter>` handed to them at construction, so
/// tests can observe reports without any global state.
pub trait Reporter {
    fn report(&self, report: Report);

    fn error(&self, code: ErrorCode, args: &[&str]) {
        self.report(Report::Error {
            code,
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
        });
    }

    fn warning(&self, code: WarningCode, args: &[&str]) {
        self.report(Report::Warning {
            code,
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
        });
    }
}

/// Default reporter forwarding every entry to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, report: Report) {
        match &report {
            Report::Error { code, args } => {
                error!(code = code.code(), description = %code.describe(args), "chart configuration error");
            }
            Report::Warning { code, args } => {
                warn!(code = code.code(), description = %code.describe(args), "chart configuration warning");
            }
        }
    }
}

/// Reporter that keeps every entry in memory.
///
/// Cloning shares the underlying log.
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    reports: Rc<RefCell<Vec<Report>>>,
}

impl RecordingReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn reports(&self) -> Vec<Report> {
        self.reports.borrow().clone()
    }

    #[must_use]
    pub fn count_errors(&self, code: ErrorCode) -> usize {
        self.reports
            .borrow()
            .iter()
            .filter(|report| report.is_error(code))
            .count()
    }

    #[must_use]
    pub fn count_warnings(&self, code: WarningCode) -> usize {
        self.reports
            .borrow()
            .iter()
            .filter(|report| report.is_warning(code))
            .count()
    }

    pub fn clear(&self) {
        self.reports.borrow_mut().clear();
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, report: Report) {
        self.reports.borrow_mut().push(report);
    }
}

/// Shared reporter handle.
pub type SharedReporter = Rc<dyn Reporter>;

#[must_use]
pub fn default_reporter() -> SharedReporter {
    Rc::new(TracingReporter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_reporter_shares_log_between_clones() {
        let reporter = RecordingReporter::new();
        let handle: SharedReporter = Rc::new(reporter.clone());
        handle.error(ErrorCode::TableComputerOutputFieldDuplicate, &["result"]);
        handle.warning(WarningCode::TooManyTicks, &["600", "500"]);

        assert_eq!(reporter.count_errors(ErrorCode::TableComputerOutputFieldDuplicate), 1);
        assert_eq!(reporter.count_warnings(WarningCode::TooManyTicks), 1);
        assert_eq!(reporter.reports().len(), 2);
    }

    #[test]
    fn duplicate_output_description_names_field() {
        let text = ErrorCode::TableComputerOutputFieldDuplicate.describe(&["result".to_owned()]);
        assert!(text.contains("\"result\""));
        assert_eq!(ErrorCode::TableComputerOutputFieldDuplicate.code(), 202);
    }
}
