use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Days,
  Local,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;
use regex::Regex;

pub const TIMEZONE_ENV_VAR: &str =
  "TASKBOARD_TIMEZONE";

const ISO_DATE_FORMAT: &str =
  "%Y-%m-%d";

/// Which calendar "today" is computed
/// in. `Local` follows the host clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
  Local,
  Named(Tz)
}

impl Zone {
  /// Environment wins over the config
  /// key; an unparsable id falls back to
  /// the host zone.
  pub fn resolve(
    config_value: Option<&str>
  ) -> Self {
    if let Ok(raw) =
      std::env::var(TIMEZONE_ENV_VAR)
      && let Some(tz) =
        parse_timezone(&raw, TIMEZONE_ENV_VAR)
    {
      return Zone::Named(tz);
    }

    if let Some(raw) = config_value
      && let Some(tz) =
        parse_timezone(raw, "config:timezone")
    {
      return Zone::Named(tz);
    }

    Zone::Local
  }

  #[must_use]
  pub fn today(
    &self,
    now: DateTime<Utc>
  ) -> NaiveDate {
    match self {
      | Zone::Local => {
        now
          .with_timezone(&Local)
          .date_naive()
      }
      | Zone::Named(tz) => {
        now.with_timezone(tz).date_naive()
      }
    }
  }
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::debug!(
        source,
        timezone = %trimmed,
        "configured timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::warn!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id; using local time"
      );
      None
    }
  }
}

/// Parses a due date typed by the user.
/// Empty input means "no due date".
#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_due_date(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<Option<NaiveDate>> {
  let token = input.trim();
  if token.is_empty() {
    return Ok(None);
  }

  match token
    .to_ascii_lowercase()
    .as_str()
  {
    | "today" => return Ok(Some(today)),
    | "tomorrow" => {
      return shift_days(today, 1).map(Some);
    }
    | "yesterday" => {
      return shift_days(today, -1).map(Some);
    }
    | _ => {}
  }

  let rel_re = Regex::new(r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dw])$")
        .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;

  if let Some(caps) =
    rel_re.captures(token)
  {
    let num: i64 = caps["num"]
      .parse()
      .context("invalid relative date amount")?;
    let days = match &caps["unit"] {
      | "w" => num.saturating_mul(7),
      | _ => num
    };
    let signed = if &caps["sign"] == "-" {
      -days
    } else {
      days
    };
    return shift_days(today, signed)
      .map(Some);
  }

  NaiveDate::parse_from_str(
    token,
    ISO_DATE_FORMAT
  )
  .map(Some)
  .map_err(|_| {
    anyhow!(
      "invalid due date: {token} \
       (expected YYYY-MM-DD, today, \
       tomorrow or +Nd)"
    )
  })
}

fn shift_days(
  date: NaiveDate,
  days: i64
) -> anyhow::Result<NaiveDate> {
  let magnitude = Days::new(days.unsigned_abs());
  let shifted = if days >= 0 {
    date.checked_add_days(magnitude)
  } else {
    date.checked_sub_days(magnitude)
  };
  shifted.ok_or_else(|| {
    anyhow!(
      "date out of range: {date} \
       shifted by {days} days"
    )
  })
}

/// Display form used in task rows, e.g.
/// `Jun 15, 2023`.
#[must_use]
pub fn format_display_date(
  date: NaiveDate
) -> String {
  date.format("%b %-d, %Y").to_string()
}

#[must_use]
pub fn format_iso_date(
  date: NaiveDate
) -> String {
  date
    .format(ISO_DATE_FORMAT)
    .to_string()
}

pub mod due_date_serde {
  use chrono::NaiveDate;
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  use super::ISO_DATE_FORMAT;

  pub fn serialize<S>(
    date: &Option<NaiveDate>,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    match date {
      | Some(value) => {
        serializer.serialize_str(
          &value
            .format(ISO_DATE_FORMAT)
            .to_string()
        )
      }
      | None => serializer.serialize_none()
    }
  }

  /// `null`, a missing field and `""`
  /// all read as no due date.
  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<Option<NaiveDate>, D::Error>
  where
    D: Deserializer<'de>
  {
    let opt =
      Option::<String>::deserialize(
        deserializer
      )?;
    match opt.as_deref().map(str::trim) {
      | None | Some("") => Ok(None),
      | Some(raw) => NaiveDate::parse_from_str(raw, ISO_DATE_FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    NaiveDate,
    TimeZone,
    Utc
  };

  use super::{
    Zone,
    format_display_date,
    parse_due_date
  };

  fn day(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .unwrap()
  }

  #[test]
  fn parses_iso_and_keywords() {
    let today = day(2026, 2, 16);
    assert_eq!(
      parse_due_date("2023-06-15", today)
        .unwrap(),
      Some(day(2023, 6, 15))
    );
    assert_eq!(
      parse_due_date("today", today)
        .unwrap(),
      Some(today)
    );
    assert_eq!(
      parse_due_date("Tomorrow", today)
        .unwrap(),
      Some(day(2026, 2, 17))
    );
    assert_eq!(
      parse_due_date("", today).unwrap(),
      None
    );
  }

  #[test]
  fn parses_relative_offsets() {
    let today = day(2026, 2, 27);
    assert_eq!(
      parse_due_date("+3d", today)
        .unwrap(),
      Some(day(2026, 3, 2))
    );
    assert_eq!(
      parse_due_date("+1w", today)
        .unwrap(),
      Some(day(2026, 3, 6))
    );
    assert_eq!(
      parse_due_date("-2d", today)
        .unwrap(),
      Some(day(2026, 2, 25))
    );
  }

  #[test]
  fn rejects_garbage() {
    assert!(
      parse_due_date(
        "next blue moon",
        day(2026, 1, 1)
      )
      .is_err()
    );
    assert!(
      parse_due_date(
        "2023-13-01",
        day(2026, 1, 1)
      )
      .is_err()
    );
  }

  #[test]
  fn named_zone_decides_the_calendar_day()
  {
    let now = Utc
      .with_ymd_and_hms(
        2026, 2, 16, 3, 0, 0
      )
      .unwrap();
    let tz: chrono_tz::Tz =
      "America/Mexico_City"
        .parse()
        .unwrap();
    assert_eq!(
      Zone::Named(tz).today(now),
      day(2026, 2, 15)
    );
    assert_eq!(
      Zone::Named(chrono_tz::UTC)
        .today(now),
      day(2026, 2, 16)
    );
  }

  #[test]
  fn display_format_matches_short_month()
  {
    assert_eq!(
      format_display_date(day(
        2023, 6, 5
      )),
      "Jun 5, 2023"
    );
  }
}
