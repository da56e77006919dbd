use jiff::{Timestamp, Zoned, tz::TimeZone};

/// Source of "now" for relative dates and offset-less date literals.
pub trait Clock {
    fn now(&self) -> Zoned;
}

/// Wall clock in the system time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Zoned {
        Timestamp::now().to_zoned(TimeZone::system())
    }
}

/// Wall clock viewed in a configured time zone.
#[derive(Debug, Clone)]
pub struct TimeZoneClock(pub TimeZone);

impl Clock for TimeZoneClock {
    fn now(&self) -> Zoned {
        Timestamp::now().to_zoned(self.0.clone())
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone)]
pub struct FixedClock(pub Zoned);

impl Clock for FixedClock {
    fn now(&self) -> Zoned {
        self.0.clone()
    }
}

impl<F> Clock for F
where
    F: Fn() -> Zoned,
{
    fn now(&self) -> Zoned {
        self()
    }
}
