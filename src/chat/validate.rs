use chrono::{NaiveDate, Utc};

/// Recoverable input rejections; the conversant is re-prompted for the same
/// field and the Display text is shown verbatim.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    #[error("Invalid format (YYYY-MM-DD)")]
    Format,
    #[error("Date is in the past")]
    Past,
}

/// Parses an ISO calendar date. Unless `allow_past` is set, days before the
/// current UTC day are rejected; the current day itself is accepted.
pub fn validate_date(input: &str, allow_past: bool) -> Result<NaiveDate, DateError> {
    let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| DateError::Format)?;
    if !allow_past && date < Utc::now().date_naive() {
        return Err(DateError::Past);
    }
    Ok(date)
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("Invalid email")]
pub struct EmailError;

/// Accepts `local@domain.tld`: a non-empty local part, a dotted domain, and
/// an alphabetic top-level domain of at least two characters.
pub fn validate_email(input: &str) -> Result<(), EmailError> {
    let (local, domain) = input.split_once('@').ok_or(EmailError)?;
    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    if !local_ok {
        return Err(EmailError);
    }
    let (host, tld) = domain.rsplit_once('.').ok_or(EmailError)?;
    let host_ok = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ".-".contains(c));
    if !host_ok {
        return Err(EmailError);
    }
    if tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(EmailError);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn date_format_is_strict() {
        assert_eq!(validate_date("06/01/2026", false), Err(DateError::Format));
        assert_eq!(validate_date("2026-6-1x", false), Err(DateError::Format));
        assert_eq!(validate_date("not a date", false), Err(DateError::Format));
    }

    #[test]
    fn past_dates_are_rejected_but_today_is_accepted() {
        assert_eq!(validate_date("2000-01-01", false), Err(DateError::Past));
        let today = Utc::now().date_naive();
        let input = format!("{:04}-{:02}-{:02}", today.year(), today.month(), today.day());
        assert_eq!(validate_date(&input, false), Ok(today));
    }

    #[test]
    fn allow_past_relaxes_the_check() {
        assert!(validate_date("2000-01-01", true).is_ok());
    }

    #[test]
    fn emails_need_local_domain_and_tld() {
        assert!(validate_email("john.doe@company.com").is_ok());
        assert!(validate_email("j+tag@sub.company.org").is_ok());
        assert_eq!(validate_email("no-at-sign"), Err(EmailError));
        assert_eq!(validate_email("@company.com"), Err(EmailError));
        assert_eq!(validate_email("john@company"), Err(EmailError));
        assert_eq!(validate_email("john@.c"), Err(EmailError));
        assert_eq!(validate_email("john doe@company.com"), Err(EmailError));
        assert_eq!(validate_email("john@company.c0m"), Err(EmailError));
    }
}
