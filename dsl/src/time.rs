//! Time and date literal elements.
//!
//! See section 2.2.3.
use time::{Date, Duration, PrimitiveDateTime, Time};

use crate::core::{Located, NodeId, SourceSpan};

/// A duration literal such as `T#1d2h3m`.
///
/// See section 2.2.3.1.
#[derive(Debug, PartialEq, Clone)]
pub struct DurationLiteral {
    pub id: NodeId,
    pub span: SourceSpan,
    pub interval: Duration,
    /// A duration written with a leading minus, e.g. `T#-1s`.
    pub is_neg: bool,
}

impl DurationLiteral {
    pub fn new(id: NodeId, interval: Duration) -> Self {
        Self {
            id,
            span: SourceSpan::default(),
            interval,
            is_neg: false,
        }
    }
}

impl Located for DurationLiteral {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// A date literal such as `D#1984-06-25`.
#[derive(Debug, PartialEq, Clone)]
pub struct DateLiteral {
    pub id: NodeId,
    pub span: SourceSpan,
    pub date: Date,
}

impl Located for DateLiteral {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// A time of day literal such as `TOD#15:36:55.36`.
#[derive(Debug, PartialEq, Clone)]
pub struct TimeOfDayLiteral {
    pub id: NodeId,
    pub span: SourceSpan,
    pub time: Time,
}

impl Located for TimeOfDayLiteral {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}

/// A date and time literal such as `DT#1984-06-25-15:36:55.36`.
#[derive(Debug, PartialEq, Clone)]
pub struct DateAndTimeLiteral {
    pub id: NodeId,
    pub span: SourceSpan,
    pub value: PrimitiveDateTime,
}

impl Located for DateAndTimeLiteral {
    fn span(&self) -> SourceSpan {
        self.span.clone()
    }
}
