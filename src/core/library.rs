use std::fmt;
use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

// CirculationRule names the business rules a circulation transaction can reject a request for.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum CirculationRule {
    ItemNotAvailable,
    AlreadyReturned,
    DuplicateHold,
    BorrowerNotEligible,
    ItemAlreadyAvailable,
    HoldLimitReached,
    IllegalTransition,
}

impl Display for CirculationRule {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            CirculationRule::ItemNotAvailable => write!(f, "ItemNotAvailable"),
            CirculationRule::AlreadyReturned => write!(f, "AlreadyReturned"),
            CirculationRule::DuplicateHold => write!(f, "DuplicateHold"),
            CirculationRule::BorrowerNotEligible => write!(f, "BorrowerNotEligible"),
            CirculationRule::ItemAlreadyAvailable => write!(f, "ItemAlreadyAvailable"),
            CirculationRule::HoldLimitReached => write!(f, "HoldLimitReached"),
            CirculationRule::IllegalTransition => write!(f, "IllegalTransition"),
        }
    }
}

// ErrorKind groups errors by how a caller is expected to react to them.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Contention,
    Infrastructure,
}

#[derive(Debug)]
pub enum LibraryError {
    Database {
        message: String,
        reason_code: Option<String>,
        retryable: bool,
    },
    NotFound {
        message: String,
    },
    // the item lock is held elsewhere or the backing store is throttling; safe to retry
    CurrentlyUnavailable {
        message: String,
        reason_code: Option<String>,
        retryable: bool,
    },
    Validation {
        message: String,
        reason_code: Option<String>,
    },
    BusinessRule {
        rule: CirculationRule,
        message: String,
    },
    Serialization {
        message: String,
    },
    Runtime {
        message: String,
        reason_code: Option<String>,
    },
}

impl LibraryError {
    pub fn database(message: &str, reason_code: Option<String>, retryable: bool) -> LibraryError {
        LibraryError::Database { message: message.to_string(), reason_code, retryable }
    }

    pub fn not_found(message: &str) -> LibraryError {
        LibraryError::NotFound { message: message.to_string() }
    }

    pub fn unavailable(message: &str, reason_code: Option<String>, retryable: bool) -> LibraryError {
        LibraryError::CurrentlyUnavailable { message: message.to_string(), reason_code, retryable }
    }

    pub fn busy(message: &str) -> LibraryError {
        LibraryError::unavailable(message, Some("LockTimeout".to_string()), true)
    }

    pub fn database_or_unavailable(message: &str, reason: Option<String>, retryable: bool) -> LibraryError {
        if retryable {
            LibraryError::unavailable(
                format!("ddb database unavailable error {:?} {:?}", message, reason).as_str(), reason, true)
        } else if let Some(ref reason_val) = reason {
            if reason_val.as_str().contains("404") {
                LibraryError::not_found(
                    format!("not found error {:?} {:?}", message, reason).as_str())
            } else {
                LibraryError::database(
                    format!("ddb database error {:?} {:?}", message, reason).as_str(), reason, false)
            }
        } else {
            LibraryError::database(
                format!("ddb database error {:?} {:?}", message, reason).as_str(), reason, false)
        }
    }

    pub fn validation(message: &str, reason_code: Option<String>) -> LibraryError {
        LibraryError::Validation { message: message.to_string(), reason_code }
    }

    pub fn business(rule: CirculationRule, message: &str) -> LibraryError {
        LibraryError::BusinessRule { rule, message: message.to_string() }
    }

    pub fn item_not_available(message: &str) -> LibraryError {
        LibraryError::business(CirculationRule::ItemNotAvailable, message)
    }

    pub fn already_returned(message: &str) -> LibraryError {
        LibraryError::business(CirculationRule::AlreadyReturned, message)
    }

    pub fn duplicate_hold(message: &str) -> LibraryError {
        LibraryError::business(CirculationRule::DuplicateHold, message)
    }

    pub fn borrower_not_eligible(message: &str) -> LibraryError {
        LibraryError::business(CirculationRule::BorrowerNotEligible, message)
    }

    pub fn item_already_available(message: &str) -> LibraryError {
        LibraryError::business(CirculationRule::ItemAlreadyAvailable, message)
    }

    pub fn hold_limit_reached(message: &str) -> LibraryError {
        LibraryError::business(CirculationRule::HoldLimitReached, message)
    }

    pub fn illegal_transition(message: &str) -> LibraryError {
        LibraryError::business(CirculationRule::IllegalTransition, message)
    }

    pub fn serialization(message: &str) -> LibraryError {
        LibraryError::Serialization { message: message.to_string() }
    }

    pub fn runtime(message: &str, reason_code: Option<String>) -> LibraryError {
        LibraryError::Runtime { message: message.to_string(), reason_code }
    }

    pub fn retryable(&self) -> bool {
        match self {
            LibraryError::Database { retryable, .. } => { *retryable }
            LibraryError::NotFound { .. } => { false }
            LibraryError::CurrentlyUnavailable { retryable, .. } => { *retryable }
            LibraryError::Validation { .. } => { false }
            LibraryError::BusinessRule { .. } => { false }
            LibraryError::Serialization { .. } => { false }
            LibraryError::Runtime { .. } => { false }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LibraryError::Database { .. } => { ErrorKind::Infrastructure }
            LibraryError::NotFound { .. } => { ErrorKind::NotFound }
            LibraryError::CurrentlyUnavailable { .. } => { ErrorKind::Contention }
            LibraryError::Validation { .. } => { ErrorKind::Validation }
            LibraryError::BusinessRule { .. } => { ErrorKind::Conflict }
            LibraryError::Serialization { .. } => { ErrorKind::Infrastructure }
            LibraryError::Runtime { .. } => { ErrorKind::Infrastructure }
        }
    }

    // returns the violated business rule if this is a business-rule rejection
    pub fn rule(&self) -> Option<CirculationRule> {
        match self {
            LibraryError::BusinessRule { rule, .. } => Some(*rule),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LibraryError {
    fn from(err: serde_json::Error) -> Self {
        LibraryError::serialization(format!("invalid json: {}", err).as_str())
    }
}

impl From<String> for LibraryError {
    fn from(err: String) -> Self {
        LibraryError::serialization(format!("malformed record: {}", err).as_str())
    }
}

impl Display for LibraryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::Database { message, reason_code, .. } |
            LibraryError::CurrentlyUnavailable { message, reason_code, .. } |
            LibraryError::Validation { message, reason_code } |
            LibraryError::Runtime { message, reason_code } => match reason_code {
                Some(reason) => write!(f, "{} [{}]", message, reason),
                None => write!(f, "{}", message),
            },
            LibraryError::BusinessRule { rule, message } => write!(f, "{}: {}", rule, message),
            LibraryError::NotFound { message } |
            LibraryError::Serialization { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for LibraryError {}

// result type of every circulation operation
pub type LibraryResult<T> = Result<T, LibraryError>;

// One page of a scan; next_page is the opaque token to resume from, None on the last page.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub page: Option<String>,
    pub page_size: usize,
    pub next_page: Option<String>,
    pub records: Vec<T>,
}

impl<T> PaginatedResult<T> {
    pub fn new(page: Option<&str>, page_size: usize,
               next_page: Option<String>, records: Vec<T>) -> Self {
        PaginatedResult {
            page: page.map(str::to_string),
            page_size,
            next_page,
            records,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum ItemStatus {
    Available,
    Loaned,
    Reserved,
}

impl From<String> for ItemStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Loaned" => ItemStatus::Loaned,
            "Reserved" => ItemStatus::Reserved,
            _ => ItemStatus::Available,
        }
    }
}

impl Display for ItemStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ItemStatus::Available => write!(f, "Available"),
            ItemStatus::Loaned => write!(f, "Loaned"),
            ItemStatus::Reserved => write!(f, "Reserved"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum ItemKind {
    Game,
    Book,
    Film,
    Disc,
}

impl From<String> for ItemKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Game" => ItemKind::Game,
            "Film" => ItemKind::Film,
            "Disc" => ItemKind::Disc,
            _ => ItemKind::Book,
        }
    }
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ItemKind::Game => write!(f, "Game"),
            ItemKind::Book => write!(f, "Book"),
            ItemKind::Film => write!(f, "Film"),
            ItemKind::Disc => write!(f, "Disc"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum LoanStatus {
    Active,
    Overdue,
    Returned,
}

impl LoanStatus {
    // an open loan keeps the item in the borrower's possession
    pub fn is_open(&self) -> bool {
        matches!(self, LoanStatus::Active | LoanStatus::Overdue)
    }
}

impl From<String> for LoanStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Active" => LoanStatus::Active,
            "Overdue" => LoanStatus::Overdue,
            "Returned" => LoanStatus::Returned,
            _ => LoanStatus::Active,
        }
    }
}

impl Display for LoanStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            LoanStatus::Active => write!(f, "Active"),
            LoanStatus::Overdue => write!(f, "Overdue"),
            LoanStatus::Returned => write!(f, "Returned"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum ReservationStatus {
    Waiting,
    Ready,
    Expired,
    Cancelled,
    Fulfilled,
}

impl ReservationStatus {
    // waiting and ready holds still occupy a place in the item's queue
    pub fn is_live(&self) -> bool {
        matches!(self, ReservationStatus::Waiting | ReservationStatus::Ready)
    }

    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        matches!((self, next),
            (ReservationStatus::Waiting, ReservationStatus::Ready) |
            (ReservationStatus::Waiting, ReservationStatus::Cancelled) |
            (ReservationStatus::Ready, ReservationStatus::Fulfilled) |
            (ReservationStatus::Ready, ReservationStatus::Expired) |
            (ReservationStatus::Ready, ReservationStatus::Cancelled))
    }
}

impl From<String> for ReservationStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Waiting" => ReservationStatus::Waiting,
            "Ready" => ReservationStatus::Ready,
            "Expired" => ReservationStatus::Expired,
            "Cancelled" => ReservationStatus::Cancelled,
            "Fulfilled" => ReservationStatus::Fulfilled,
            _ => ReservationStatus::Waiting,
        }
    }
}

impl Display for ReservationStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ReservationStatus::Waiting => write!(f, "Waiting"),
            ReservationStatus::Ready => write!(f, "Ready"),
            ReservationStatus::Expired => write!(f, "Expired"),
            ReservationStatus::Cancelled => write!(f, "Cancelled"),
            ReservationStatus::Fulfilled => write!(f, "Fulfilled"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum MemberStanding {
    Active,
    Suspended,
    Inactive,
}

impl From<String> for MemberStanding {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Active" => MemberStanding::Active,
            "Suspended" => MemberStanding::Suspended,
            _ => MemberStanding::Inactive,
        }
    }
}

impl Display for MemberStanding {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            MemberStanding::Active => write!(f, "Active"),
            MemberStanding::Suspended => write!(f, "Suspended"),
            MemberStanding::Inactive => write!(f, "Inactive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::library::{CirculationRule, ErrorKind, ItemStatus, LibraryError, LoanStatus, ReservationStatus};

    #[tokio::test]
    async fn test_should_create_database_error() {
        assert!(matches!(LibraryError::database("test", None, false), LibraryError::Database{ message: _, reason_code: _, retryable: _ }));
    }

    #[tokio::test]
    async fn test_should_create_not_found_error() {
        assert!(matches!(LibraryError::not_found("test"), LibraryError::NotFound{ message: _ }));
    }

    #[tokio::test]
    async fn test_should_create_busy_error() {
        let err = LibraryError::busy("test");
        assert!(matches!(err, LibraryError::CurrentlyUnavailable{ retryable: true, .. }));
        assert_eq!(ErrorKind::Contention, err.kind());
    }

    #[tokio::test]
    async fn test_should_create_business_errors() {
        assert_eq!(Some(CirculationRule::ItemNotAvailable), LibraryError::item_not_available("t").rule());
        assert_eq!(Some(CirculationRule::AlreadyReturned), LibraryError::already_returned("t").rule());
        assert_eq!(Some(CirculationRule::DuplicateHold), LibraryError::duplicate_hold("t").rule());
        assert_eq!(Some(CirculationRule::BorrowerNotEligible), LibraryError::borrower_not_eligible("t").rule());
        assert_eq!(Some(CirculationRule::ItemAlreadyAvailable), LibraryError::item_already_available("t").rule());
        assert_eq!(Some(CirculationRule::HoldLimitReached), LibraryError::hold_limit_reached("t").rule());
        assert_eq!(Some(CirculationRule::IllegalTransition), LibraryError::illegal_transition("t").rule());
        assert_eq!(ErrorKind::Conflict, LibraryError::duplicate_hold("t").kind());
        assert_eq!(None, LibraryError::not_found("t").rule());
    }

    #[tokio::test]
    async fn test_should_create_database_or_unavailable_error() {
        assert!(matches!(LibraryError::database_or_unavailable("test", None, true), LibraryError::CurrentlyUnavailable{ message: _, reason_code: _, retryable: _ }));
        assert!(matches!(LibraryError::database_or_unavailable("test", Some("404".to_string()), false), LibraryError::NotFound{ message: _ }));
        assert!(matches!(LibraryError::database_or_unavailable("test", Some("500".to_string()), false), LibraryError::Database{ message: _, reason_code: _, retryable: _ }));
        assert!(matches!(LibraryError::database_or_unavailable("test", None, false), LibraryError::Database{ message: _, reason_code: _, retryable: _ }));
    }

    #[tokio::test]
    async fn test_should_create_retryable_error() {
        assert_eq!(false, LibraryError::database("test", None, false).retryable());
        assert_eq!(false, LibraryError::not_found("test").retryable());
        assert_eq!(false, LibraryError::unavailable("test", None, false).retryable());
        assert_eq!(true, LibraryError::unavailable("test", None, true).retryable());
        assert_eq!(true, LibraryError::busy("test").retryable());
        assert_eq!(false, LibraryError::validation("test", None).retryable());
        assert_eq!(false, LibraryError::already_returned("test").retryable());
        assert_eq!(false, LibraryError::serialization("test").retryable());
        assert_eq!(false, LibraryError::runtime("test", None).retryable());
    }

    #[tokio::test]
    async fn test_should_format_statuses() {
        for status in vec![ItemStatus::Available, ItemStatus::Loaned, ItemStatus::Reserved] {
            assert_eq!(status, ItemStatus::from(status.to_string()));
        }
        for status in vec![LoanStatus::Active, LoanStatus::Overdue, LoanStatus::Returned] {
            assert_eq!(status, LoanStatus::from(status.to_string()));
        }
        for status in vec![ReservationStatus::Waiting, ReservationStatus::Ready, ReservationStatus::Expired,
                           ReservationStatus::Cancelled, ReservationStatus::Fulfilled] {
            assert_eq!(status, ReservationStatus::from(status.to_string()));
        }
    }

    #[tokio::test]
    async fn test_should_only_allow_legal_reservation_transitions() {
        use ReservationStatus::*;
        let all = [Waiting, Ready, Expired, Cancelled, Fulfilled];
        let legal = [(Waiting, Ready), (Waiting, Cancelled), (Ready, Fulfilled), (Ready, Expired), (Ready, Cancelled)];
        for from in all {
            for to in all {
                assert_eq!(legal.contains(&(from, to)), from.can_transition_to(to), "{} -> {}", from, to);
            }
        }
    }
}
