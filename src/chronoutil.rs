use {
    crate::{constants::*, SignatureError},
    chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc},
    lazy_static::lazy_static,
    regex::Regex,
    std::str::FromStr,
};

lazy_static! {
    /// ISO 8601 basic format, UTC only, as used by `X-Amz-Date`.
    static ref ISO_8601_BASIC_REGEX: Regex = Regex::new(
        r"(?x)^
        (?P<year>\d{4})
        (?P<month>0[1-9]|1[0-2])
        (?P<day>0[1-9]|[12][0-9]|3[01])
        T
        (?P<hour>[01][0-9]|2[0-3])
        (?P<minute>[0-5][0-9])
        (?P<second>[0-5][0-9])
        Z$").unwrap();
}

/// Parse and format timestamps in the forms used by the signing process.
pub(crate) trait AmzDate: Sized {
    /// Parse a `YYYYMMDD'T'HHMMSS'Z'` timestamp.
    fn parse_amz_date(s: &str) -> Result<Self, SignatureError>;

    /// Format as `YYYYMMDD'T'HHMMSS'Z'`. Sub-second precision is dropped.
    fn to_amz_date(&self) -> String;
}

impl AmzDate for DateTime<Utc> {
    fn parse_amz_date(s: &str) -> Result<Self, SignatureError> {
        let invalid = || SignatureError::InvalidRequest(format!("Date must be in ISO-8601 'basic format'. Got '{}'", s));
        let cap = ISO_8601_BASIC_REGEX.captures(s).ok_or_else(invalid)?;

        // The regex guarantees each group is present and numeric.
        let field = |name: &str| u32::from_str(&cap[name]).map_err(|_| invalid());

        let year = i32::from_str(&cap["year"]).map_err(|_| invalid())?;
        let naive_date = NaiveDate::from_ymd_opt(year, field("month")?, field("day")?).ok_or_else(invalid)?;
        let naive_time = NaiveTime::from_hms_opt(field("hour")?, field("minute")?, field("second")?).ok_or_else(invalid)?;

        Ok(NaiveDateTime::new(naive_date, naive_time).and_utc())
    }

    fn to_amz_date(&self) -> String {
        self.format(ISO8601_COMPACT_FORMAT).to_string()
    }
}
