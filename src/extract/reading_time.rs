use crate::post::ReadingTime;

/// Estimates reading time from the raw body.
///
/// Words are whitespace-separated tokens of the *untransformed* HTML, so
/// markup counts toward the total. The estimate is
/// `max(1, ceil(words / words_per_minute))`. A `words_per_minute` of zero is
/// treated as one.
///
/// # Examples
///
/// ```
/// use blogwire::extract::estimate_reading_time;
///
/// assert_eq!(estimate_reading_time("", 200).minutes, 1);
/// assert_eq!(estimate_reading_time(&"word ".repeat(201), 200).minutes, 2);
/// ```
pub fn estimate_reading_time(body: &str, words_per_minute: usize) -> ReadingTime {
    let words = body.split_whitespace().count();
    let minutes = words.div_ceil(words_per_minute.max(1));
    ReadingTime::from_minutes(u32::try_from(minutes).unwrap_or(u32::MAX))
}
