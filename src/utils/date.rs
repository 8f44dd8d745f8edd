//! Plain UTC date-times for ordering entries and stamping output.
//!
//! Content dates arrive as `YYYY-MM-DD` or RFC 3339 `YYYY-MM-DDTHH:MM:SSZ`
//! metadata strings. No timezone handling: everything is UTC.

/// A validated UTC date-time.
///
/// Field order gives the derived `Ord` chronological meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateTimeUtc {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTimeUtc {
    /// Parse `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SSZ`; `None` on any invalid
    /// shape or out-of-range component.
    pub fn parse(s: &str) -> Option<Self> {
        let (date, time) = match s.split_once('T') {
            Some((date, time)) => (date, Some(time.strip_suffix('Z')?)),
            None => (s, None),
        };

        let mut fields = date.splitn(3, '-');
        let year = parse_component(fields.next()?, 4)?;
        let month = parse_component(fields.next()?, 2)? as u8;
        let day = parse_component(fields.next()?, 2)? as u8;

        let (hour, minute, second) = match time {
            None => (0, 0, 0),
            Some(t) => {
                let mut fields = t.splitn(3, ':');
                (
                    parse_component(fields.next()?, 2)? as u8,
                    parse_component(fields.next()?, 2)? as u8,
                    parse_component(fields.next()?, 2)? as u8,
                )
            }
        };

        let dt = Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        };
        dt.is_valid().then_some(dt)
    }

    fn is_valid(&self) -> bool {
        (1..=12).contains(&self.month)
            && self.day >= 1
            && self.day <= days_in_month(self.year, self.month)
            && self.hour <= 23
            && self.minute <= 59
            && self.second <= 59
    }

    /// RFC 2822 form required by RSS `pubDate` (`Mon, 15 Jan 2024 10:30:45 GMT`).
    pub fn to_rfc2822(self) -> String {
        const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
        const MONTHS: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];

        format!(
            "{}, {:02} {} {:04} {:02}:{:02}:{:02} GMT",
            WEEKDAYS[self.weekday()],
            self.day,
            MONTHS[(self.month - 1) as usize],
            self.year,
            self.hour,
            self.minute,
            self.second
        )
    }

    /// `YYYY-MM-DD`, as used by sitemap `lastmod` and the site manifest.
    pub fn to_ymd(self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }

    /// Day of week, 0 = Sunday (Sakamoto's method).
    fn weekday(self) -> usize {
        const OFFSETS: [i32; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];
        let mut y = i32::from(self.year);
        if self.month < 3 {
            y -= 1;
        }
        let w = y + y / 4 - y / 100 + y / 400
            + OFFSETS[(self.month - 1) as usize]
            + i32::from(self.day);
        (w % 7) as usize
    }
}

fn is_leap_year(year: u16) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Parse a fixed-width ASCII decimal component.
fn parse_component(s: &str, width: usize) -> Option<u16> {
    if s.len() != width || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
