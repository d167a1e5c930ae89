//! Purpose: Translate plugin status out-parameters into structured errors.
//! Exports: `StatusCode`, `FailureSource`, `translate`.
//! Role: The only place plugin status integers become `Error` values.
//! Invariants: Reason and suggestion are fetched only for `ERROR_REFER_REASON`.
//! Invariants: Null or empty plugin strings become empty text, never a failure.
use super::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatusCode {
    Success,
    NullObject,
    UnknownOption,
    ReferReason,
    Unknown(i32),
}

impl StatusCode {
    pub const SUCCESS: i32 = 0;
    pub const ERROR_NULL_OBJECT: i32 = -1;
    pub const ERROR_UNKNOWN_OPTION: i32 = -2;
    pub const ERROR_REFER_REASON: i32 = -3;

    pub fn raw(self) -> i32 {
        match self {
            StatusCode::Success => Self::SUCCESS,
            StatusCode::NullObject => Self::ERROR_NULL_OBJECT,
            StatusCode::UnknownOption => Self::ERROR_UNKNOWN_OPTION,
            StatusCode::ReferReason => Self::ERROR_REFER_REASON,
            StatusCode::Unknown(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        self == StatusCode::Success
    }
}

impl From<i32> for StatusCode {
    fn from(value: i32) -> Self {
        match value {
            Self::SUCCESS => StatusCode::Success,
            Self::ERROR_NULL_OBJECT => StatusCode::NullObject,
            Self::ERROR_UNKNOWN_OPTION => StatusCode::UnknownOption,
            Self::ERROR_REFER_REASON => StatusCode::ReferReason,
            other => StatusCode::Unknown(other),
        }
    }
}

/// The plugin a status came from, able to explain itself on request.
pub trait FailureSource {
    fn plugin_name(&self) -> &str;
    fn failure_reason(&self) -> Option<String>;
    fn recovery_suggestion(&self) -> Option<String>;
}

pub fn translate(status: impl Into<StatusCode>, source: &dyn FailureSource) -> Option<Error> {
    let status = status.into();
    let name = source.plugin_name();
    let err = match status {
        StatusCode::Success => return None,
        StatusCode::NullObject => Error::new(ErrorKind::NullObject)
            .with_message(format!("The plugin {name} tried passing nullptr")),
        StatusCode::UnknownOption => Error::new(ErrorKind::UnknownOption)
            .with_message(format!("The plugin {name} cannot recognize option")),
        StatusCode::ReferReason => Error::new(ErrorKind::ReferReason)
            .with_message(source.failure_reason().unwrap_or_default())
            .with_suggestion(source.recovery_suggestion().unwrap_or_default()),
        StatusCode::Unknown(code) => Error::new(ErrorKind::UnknownStatus)
            .with_message(format!("The plugin {name} received unknown error {code}")),
    };
    Some(err.with_status(status.raw()))
}

#[cfg(test)]
mod tests {
    use super::{FailureSource, StatusCode, translate};
    use crate::core::error::ErrorKind;
    use std::cell::Cell;

    struct Spy {
        reason: Option<&'static str>,
        suggestion: Option<&'static str>,
        queries: Cell<usize>,
    }

    impl Spy {
        fn new(reason: Option<&'static str>, suggestion: Option<&'static str>) -> Self {
            Self {
                reason,
                suggestion,
                queries: Cell::new(0),
            }
        }
    }

    impl FailureSource for Spy {
        fn plugin_name(&self) -> &str {
            "libspy.so"
        }

        fn failure_reason(&self) -> Option<String> {
            self.queries.set(self.queries.get() + 1);
            self.reason.map(str::to_string)
        }

        fn recovery_suggestion(&self) -> Option<String> {
            self.queries.set(self.queries.get() + 1);
            self.suggestion.map(str::to_string)
        }
    }

    #[test]
    fn success_is_not_an_error() {
        let spy = Spy::new(Some("x"), None);
        assert!(translate(0, &spy).is_none());
        assert_eq!(spy.queries.get(), 0);
    }

    #[test]
    fn fixed_messages_do_not_query_the_plugin() {
        let spy = Spy::new(Some("x"), Some("y"));
        let err = translate(-1, &spy).expect("error");
        assert_eq!(err.kind(), ErrorKind::NullObject);
        assert_eq!(err.message(), Some("The plugin libspy.so tried passing nullptr"));

        let err = translate(-2, &spy).expect("error");
        assert_eq!(err.kind(), ErrorKind::UnknownOption);
        assert_eq!(err.message(), Some("The plugin libspy.so cannot recognize option"));
        assert_eq!(err.status(), Some(-2));

        let err = translate(-42, &spy).expect("error");
        assert_eq!(err.kind(), ErrorKind::UnknownStatus);
        assert_eq!(
            err.message(),
            Some("The plugin libspy.so received unknown error -42")
        );
        assert_eq!(spy.queries.get(), 0);
    }

    #[test]
    fn refer_reason_fetches_reason_and_suggestion() {
        let spy = Spy::new(Some("bad header"), Some("re-export the file"));
        let err = translate(StatusCode::ReferReason, &spy).expect("error");
        assert_eq!(err.kind(), ErrorKind::ReferReason);
        assert_eq!(err.message(), Some("bad header"));
        assert_eq!(err.suggestion(), Some("re-export the file"));
        assert_eq!(spy.queries.get(), 2);
    }

    #[test]
    fn null_reason_becomes_empty_text() {
        let spy = Spy::new(None, None);
        let err = translate(-3, &spy).expect("error");
        assert_eq!(err.message(), Some(""));
        assert!(err.suggestion().is_none());
    }
}
