//! ISO-8601 temporal literals: instants, durations and intervals.
//!
//! The parsers here are plain `nom` functions so the expression grammar in
//! `sensorthings-core` can embed them directly. `parse_*` wrappers accept a
//! whole string and report a [`LiteralError`].

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, Months, NaiveDate, NaiveTime, SecondsFormat};
use nom::branch::alt;
use nom::bytes::complete::take_while_m_n;
use nom::character::complete::{char, digit1, one_of};
use nom::combinator::{all_consuming, map, opt, recognize};
use nom::error::{VerboseError, VerboseErrorKind};
use nom::sequence::{pair, preceded, separated_pair, tuple};
use thiserror::Error;

pub type IResult<'a, O> = nom::IResult<&'a str, O, VerboseError<&'a str>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("invalid date-time literal '{0}'")]
    DateTime(String),
    #[error("invalid date literal '{0}'")]
    Date(String),
    #[error("invalid time literal '{0}'")]
    Time(String),
    #[error("invalid duration literal '{0}'")]
    Duration(String),
    #[error("number literal '{0}' is out of range")]
    Number(String),
    #[error("invalid interval literal '{literal}': {reason}")]
    Interval {
        literal: String,
        reason: &'static str,
    },
}

/// Builds a recoverable parse error carrying a static context message.
pub fn failure<'a>(input: &'a str, context: &'static str) -> nom::Err<VerboseError<&'a str>> {
    nom::Err::Error(VerboseError {
        errors: vec![(input, VerboseErrorKind::Context(context))],
    })
}

/// An ISO-8601 duration such as `P1DT2H` or `-PT0.5S`.
///
/// Calendar components are kept apart from the clock components, so `P1M`
/// stays one month rather than a fixed number of days.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IsoDuration {
    pub negative: bool,
    pub years: u32,
    pub months: u32,
    pub weeks: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: f64,
}

impl IsoDuration {
    pub fn is_zero(&self) -> bool {
        self.years == 0
            && self.months == 0
            && self.weeks == 0
            && self.days == 0
            && self.hours == 0
            && self.minutes == 0
            && self.seconds == 0.0
    }

    fn calendar_months(&self) -> u32 {
        self.years.saturating_mul(12).saturating_add(self.months)
    }

    fn clock_delta(&self) -> Option<Duration> {
        let days = i64::from(self.weeks) * 7 + i64::from(self.days);
        let whole = self.seconds.trunc() as i64;
        let nanos = (self.seconds.fract() * 1e9).round() as i64;
        Duration::try_days(days)?
            .checked_add(&Duration::try_hours(i64::from(self.hours))?)?
            .checked_add(&Duration::try_minutes(i64::from(self.minutes))?)?
            .checked_add(&Duration::try_seconds(whole)?)?
            .checked_add(&Duration::nanoseconds(nanos))
    }

    /// Moves `instant` forward by this duration (backward when negative).
    pub fn add_to(&self, instant: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        if self.negative {
            self.shift_back(instant)
        } else {
            self.shift_forward(instant)
        }
    }

    /// Moves `instant` backward by this duration (forward when negative).
    pub fn subtract_from(&self, instant: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        if self.negative {
            self.shift_forward(instant)
        } else {
            self.shift_back(instant)
        }
    }

    fn shift_forward(&self, instant: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        instant
            .checked_add_months(Months::new(self.calendar_months()))?
            .checked_add_signed(self.clock_delta()?)
    }

    fn shift_back(&self, instant: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        instant
            .checked_sub_months(Months::new(self.calendar_months()))?
            .checked_sub_signed(self.clock_delta()?)
    }
}

impl fmt::Display for IsoDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        f.write_str("P")?;
        if self.is_zero() {
            return f.write_str("T0S");
        }
        for (value, designator) in [
            (self.years, 'Y'),
            (self.months, 'M'),
            (self.weeks, 'W'),
            (self.days, 'D'),
        ] {
            if value > 0 {
                write!(f, "{value}{designator}")?;
            }
        }
        if self.hours > 0 || self.minutes > 0 || self.seconds > 0.0 {
            f.write_str("T")?;
            if self.hours > 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes > 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if self.seconds > 0.0 {
                write!(f, "{}S", self.seconds)?;
            }
        }
        Ok(())
    }
}

/// One side of an [`Interval`].
#[derive(Debug, Clone, PartialEq)]
pub enum TimeBound {
    Instant(DateTime<FixedOffset>),
    Duration(IsoDuration),
}

impl fmt::Display for TimeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeBound::Instant(instant) => f.write_str(&format_date_time(instant)),
            TimeBound::Duration(duration) => write!(f, "{duration}"),
        }
    }
}

/// An ISO-8601 interval `<start>/<end>`; at least one side is an instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    start: TimeBound,
    end: TimeBound,
}

impl Interval {
    pub fn new(start: TimeBound, end: TimeBound) -> Result<Self, LiteralError> {
        let interval = Self { start, end };
        match (&interval.start, &interval.end) {
            (TimeBound::Duration(_), TimeBound::Duration(_)) => Err(LiteralError::Interval {
                literal: interval.to_string(),
                reason: "at least one side must be an instant",
            }),
            (TimeBound::Instant(start), TimeBound::Instant(end)) if start > end => {
                Err(LiteralError::Interval {
                    literal: interval.to_string(),
                    reason: "start lies after end",
                })
            }
            _ => Ok(interval),
        }
    }

    pub fn start(&self) -> &TimeBound {
        &self.start
    }

    pub fn end(&self) -> &TimeBound {
        &self.end
    }

    /// Resolves duration sides against the instant side.
    pub fn bounds(&self) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
        match (&self.start, &self.end) {
            (TimeBound::Instant(start), TimeBound::Instant(end)) => Some((*start, *end)),
            (TimeBound::Instant(start), TimeBound::Duration(length)) => {
                Some((*start, length.add_to(*start)?))
            }
            (TimeBound::Duration(length), TimeBound::Instant(end)) => {
                Some((length.subtract_from(*end)?, *end))
            }
            (TimeBound::Duration(_), TimeBound::Duration(_)) => None,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start, self.end)
    }
}

pub fn format_date_time(instant: &DateTime<FixedOffset>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn two_digits(input: &str) -> IResult<&str> {
    take_while_m_n(2, 2, is_digit)(input)
}

fn date_text(input: &str) -> IResult<&str> {
    recognize(tuple((
        take_while_m_n(4, 4, is_digit),
        char('-'),
        two_digits,
        char('-'),
        two_digits,
    )))(input)
}

fn time_text(input: &str) -> IResult<&str> {
    recognize(tuple((
        two_digits,
        char(':'),
        two_digits,
        opt(tuple((char(':'), two_digits, opt(pair(char('.'), digit1))))),
    )))(input)
}

fn offset_text(input: &str) -> IResult<&str> {
    alt((
        recognize(char('Z')),
        recognize(tuple((one_of("+-"), two_digits, char(':'), two_digits))),
    ))(input)
}

/// `2012-12-03T10:15:00Z`, `2012-12-03T10:15+01:00`, with optional fraction.
pub fn date_time(input: &str) -> IResult<DateTime<FixedOffset>> {
    let (rest, raw) = recognize(tuple((date_text, char('T'), time_text, offset_text)))(input)?;
    match to_date_time(raw) {
        Some(instant) => Ok((rest, instant)),
        None => Err(failure(input, "invalid date-time")),
    }
}

fn to_date_time(raw: &str) -> Option<DateTime<FixedOffset>> {
    let t = raw.find('T')?;
    let minutes_end = t + 6;
    let normalized = if raw.as_bytes().get(minutes_end) == Some(&b':') {
        raw.to_string()
    } else {
        format!("{}:00{}", &raw[..minutes_end], &raw[minutes_end..])
    };
    DateTime::parse_from_rfc3339(&normalized).ok()
}

pub fn date(input: &str) -> IResult<NaiveDate> {
    let (rest, raw) = date_text(input)?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(day) => Ok((rest, day)),
        Err(_) => Err(failure(input, "invalid date")),
    }
}

pub fn time_of_day(input: &str) -> IResult<NaiveTime> {
    let (rest, raw) = time_text(input)?;
    let format = if raw.contains('.') {
        "%H:%M:%S%.f"
    } else if raw.len() > 5 {
        "%H:%M:%S"
    } else {
        "%H:%M"
    };
    match NaiveTime::parse_from_str(raw, format) {
        Ok(time) => Ok((rest, time)),
        Err(_) => Err(failure(input, "invalid time of day")),
    }
}

fn duration_component<'a>(designator: char) -> impl FnMut(&'a str) -> IResult<'a, u32> {
    move |input| {
        let (rest, digits) = digit1(input)?;
        let (rest, _) = char(designator)(rest)?;
        match digits.parse::<u32>() {
            Ok(value) => Ok((rest, value)),
            Err(_) => Err(failure(input, "duration component out of range")),
        }
    }
}

fn duration_seconds(input: &str) -> IResult<f64> {
    let (rest, digits) = recognize(pair(digit1, opt(pair(char('.'), digit1))))(input)?;
    let (rest, _) = char('S')(rest)?;
    match digits.parse::<f64>() {
        Ok(value) => Ok((rest, value)),
        Err(_) => Err(failure(input, "invalid seconds")),
    }
}

/// `P1Y2M3W4DT5H6M7.5S`; every component is optional but one must be present.
pub fn duration(input: &str) -> IResult<IsoDuration> {
    let (rest, negative) = opt(char('-'))(input)?;
    let (rest, _) = char('P')(rest)?;
    let (rest, years) = opt(duration_component('Y'))(rest)?;
    let (rest, months) = opt(duration_component('M'))(rest)?;
    let (rest, weeks) = opt(duration_component('W'))(rest)?;
    let (rest, days) = opt(duration_component('D'))(rest)?;
    let (rest, clock) = opt(preceded(
        char('T'),
        tuple((
            opt(duration_component('H')),
            opt(duration_component('M')),
            opt(duration_seconds),
        )),
    ))(rest)?;

    if let Some((None, None, None)) = clock {
        return Err(failure(input, "duration has an empty time part"));
    }
    let (hours, minutes, seconds) = clock.unwrap_or((None, None, None));
    if [years, months, weeks, days, hours, minutes].iter().all(Option::is_none) && seconds.is_none()
    {
        return Err(failure(input, "duration has no components"));
    }

    Ok((
        rest,
        IsoDuration {
            negative: negative.is_some(),
            years: years.unwrap_or(0),
            months: months.unwrap_or(0),
            weeks: weeks.unwrap_or(0),
            days: days.unwrap_or(0),
            hours: hours.unwrap_or(0),
            minutes: minutes.unwrap_or(0),
            seconds: seconds.unwrap_or(0.0),
        },
    ))
}

/// `<instant>/<instant>`, `<instant>/<duration>` or `<duration>/<instant>`.
pub fn interval(input: &str) -> IResult<Interval> {
    let (rest, (start, end)) = alt((
        separated_pair(
            map(date_time, TimeBound::Instant),
            char('/'),
            alt((
                map(date_time, TimeBound::Instant),
                map(duration, TimeBound::Duration),
            )),
        ),
        separated_pair(
            map(duration, TimeBound::Duration),
            char('/'),
            map(date_time, TimeBound::Instant),
        ),
    ))(input)?;
    match Interval::new(start, end) {
        Ok(interval) => Ok((rest, interval)),
        Err(LiteralError::Interval { reason, .. }) => Err(nom::Err::Failure(VerboseError {
            errors: vec![(input, VerboseErrorKind::Context(reason))],
        })),
        Err(_) => Err(failure(input, "invalid interval")),
    }
}

pub fn parse_date_time(text: &str) -> Result<DateTime<FixedOffset>, LiteralError> {
    all_consuming(date_time)(text)
        .map(|(_, instant)| instant)
        .map_err(|_| LiteralError::DateTime(text.to_string()))
}

pub fn parse_duration(text: &str) -> Result<IsoDuration, LiteralError> {
    all_consuming(duration)(text)
        .map(|(_, duration)| duration)
        .map_err(|_| LiteralError::Duration(text.to_string()))
}

pub fn parse_interval(text: &str) -> Result<Interval, LiteralError> {
    match all_consuming(interval)(text) {
        Ok((_, interval)) => Ok(interval),
        Err(nom::Err::Failure(err)) => {
            let reason = err
                .errors
                .iter()
                .find_map(|(_, kind)| match kind {
                    VerboseErrorKind::Context(reason) => Some(*reason),
                    _ => None,
                })
                .unwrap_or("malformed interval");
            Err(LiteralError::Interval {
                literal: text.to_string(),
                reason,
            })
        }
        Err(_) => Err(LiteralError::Interval {
            literal: text.to_string(),
            reason: "malformed interval",
        }),
    }
}
