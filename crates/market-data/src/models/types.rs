use std::borrow::Cow;

/// Source identifier - mostly static constants like "TENCENT"
pub type SourceId = Cow<'static, str>;

/// Human-readable source name shown in statuses and tried lists
pub type SourceName = Cow<'static, str>;
