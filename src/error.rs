/// Domain errors surfaced by the store, the attendance state machine and
/// the certificate pipeline. The web layer maps each variant to an HTTP
/// status; nothing here is transport-specific.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("event {0} not found")]
    EventNotFound(i64),

    #[error("participant {0} not found")]
    ParticipantNotFound(i64),

    #[error("already registered for this event")]
    AlreadyRegistered,

    #[error("maximum registrations limit reached")]
    CapacityExceeded,

    #[error("invalid attendance code")]
    InvalidCode,

    #[error("not registered in this event")]
    NotRegistered,

    #[error("not within the event timeline")]
    OutsideEventWindow,

    #[error("attendance already marked for today")]
    AlreadyMarkedToday,

    #[error("feedback already submitted for this event")]
    FeedbackExists,

    #[error("event has not been attended")]
    NotAttended,

    #[error("certificate template not configured")]
    TemplateMissing,

    #[error("not eligible for a certificate")]
    NotEligible,

    #[error("account revoked")]
    AccountRevoked,

    #[error("email already in use")]
    EmailTaken,

    #[error("max registrations can't be less than already registered")]
    CapacityBelowRegistered,

    #[error("{0}")]
    Validation(String),

    #[error("failed to read certificate asset: {0}")]
    AssetRead(std::io::Error),

    #[error("invalid certificate template: {0}")]
    BadTemplate(String),

    #[error("invalid font file")]
    BadFont,

    #[error(transparent)]
    Db(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
