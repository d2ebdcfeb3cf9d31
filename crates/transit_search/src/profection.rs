//! Annual profections: the ascendant advances one sign per year of life.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use transit_ephem::{ZodiacSign, datetime_to_jd};

use crate::detector::{Detector, EdgeTrigger, Frame, ScanContext};
use crate::error::ScanError;
use crate::event::{EventDetail, EventKind, ProfectionDetail, TransitEvent};
use crate::natal::NatalContext;

/// Birthday in `year` at the birth time of day. Feb 29 births fall on
/// Feb 28 in common years.
pub fn anniversary(birth: DateTime<Utc>, year: i32) -> Option<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year, birth.month(), birth.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 2, 28))?;
    Some(date.and_time(birth.time()).and_utc())
}

/// Completed years of life at `instant`; `None` before birth.
pub fn age_at(birth: DateTime<Utc>, instant: DateTime<Utc>) -> Option<u32> {
    if instant < birth {
        return None;
    }
    let mut age = instant.year() - birth.year();
    if anniversary(birth, instant.year()).is_some_and(|a| instant < a) {
        age -= 1;
    }
    u32::try_from(age).ok()
}

/// Profected house, sign and lord for a year of life.
pub fn profection(natal: &NatalContext, age: u32) -> ProfectionDetail {
    let offset = (age % 12) as usize;
    let sign = ZodiacSign::from_index(usize::from(natal.ascendant_sign().index()) + offset);
    ProfectionDetail {
        age,
        house: offset as u8 + 1,
        sign,
        lord: sign.traditional_ruler(),
    }
}

/// Fires once per birth anniversary inside the scanned range.
pub struct ProfectionDetector {
    trigger: EdgeTrigger<()>,
}

impl ProfectionDetector {
    pub fn new() -> Self {
        Self {
            trigger: EdgeTrigger::new(),
        }
    }
}

impl Default for ProfectionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for ProfectionDetector {
    fn name(&self) -> &'static str {
        "profections"
    }

    fn observe(
        &mut self,
        ctx: &ScanContext<'_>,
        frame: &Frame,
        out: &mut Vec<TransitEvent>,
    ) -> Result<(), ScanError> {
        let Some(step) = self.trigger.step(frame.jd_utc, ()) else {
            return Ok(());
        };
        let birth = ctx.natal.birth();
        let first_year = ctx.instant(step.prev_jd).year().max(birth.year());
        let last_year = ctx.instant(step.jd).year();
        for year in first_year..=last_year {
            let Some(at) = anniversary(birth, year) else {
                continue;
            };
            let jd = datetime_to_jd(&at);
            if jd <= step.prev_jd || jd > step.jd {
                continue;
            }
            let Ok(age) = u32::try_from(year - birth.year()) else {
                continue;
            };
            let detail = profection(ctx.natal, age);
            out.push(TransitEvent::new(
                EventKind::ProfectionStart,
                jd,
                at,
                EventDetail::Profection(detail),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::natal::HouseCusps;
    use chrono::TimeZone;
    use std::collections::BTreeMap;
    use transit_ephem::Body;

    fn natal(birth: DateTime<Utc>) -> NatalContext {
        // ASC at 15° Aries
        NatalContext::new(birth, BTreeMap::new(), HouseCusps::equal(15.0).unwrap()).unwrap()
    }

    #[test]
    fn leap_day_birth_uses_feb_28() {
        let birth = Utc.with_ymd_and_hms(1996, 2, 29, 6, 30, 0).unwrap();
        let a = anniversary(birth, 2023).unwrap();
        assert_eq!(a, Utc.with_ymd_and_hms(2023, 2, 28, 6, 30, 0).unwrap());
        let a = anniversary(birth, 2024).unwrap();
        assert_eq!(a, Utc.with_ymd_and_hms(2024, 2, 29, 6, 30, 0).unwrap());
    }

    #[test]
    fn age_turns_at_birth_time() {
        let birth = Utc.with_ymd_and_hms(1990, 3, 10, 8, 15, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2025, 3, 10, 8, 14, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 3, 10, 8, 15, 0).unwrap();
        assert_eq!(age_at(birth, before), Some(34));
        assert_eq!(age_at(birth, after), Some(35));
        assert_eq!(age_at(birth, Utc.with_ymd_and_hms(1980, 1, 1, 0, 0, 0).unwrap()), None);
    }

    #[test]
    fn houses_cycle_every_twelve_years() {
        let n = natal(Utc.with_ymd_and_hms(1990, 3, 10, 8, 15, 0).unwrap());
        assert_eq!(profection(&n, 0).house, 1);
        assert_eq!(profection(&n, 11).house, 12);
        assert_eq!(profection(&n, 12).house, 1);
        assert_eq!(profection(&n, 30).house, 7);
    }

    #[test]
    fn sign_and_lord_follow_ascendant() {
        let n = natal(Utc.with_ymd_and_hms(1990, 3, 10, 8, 15, 0).unwrap());
        let p = profection(&n, 30);
        assert_eq!(p.sign, ZodiacSign::Libra);
        assert_eq!(p.lord, Body::Venus);
        let p = profection(&n, 9);
        assert_eq!(p.sign, ZodiacSign::Capricorn);
        assert_eq!(p.lord, Body::Saturn);
    }
}
