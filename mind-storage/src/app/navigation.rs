//! Drill-down screen state machine: landing, then year, month, day and detail.
//!
//! Every state keeps the selected date on a real calendar day between
//! 2020-01-01 and today, so the screens never have to re-check the bounds.

use serde::{Deserialize, Serialize};

use crate::date_engine::{
    days_in_month, last_selectable_day, last_selectable_month, next_month, prev_month, CivilDate,
    FIRST_YEAR,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    Landing,
    Year,
    Month,
    Day,
    Detail,
}

impl Screen {
    /// Target of `Back`. Landing and Year have none.
    pub fn parent(self) -> Option<Screen> {
        match self {
            Screen::Landing | Screen::Year => None,
            Screen::Month => Some(Screen::Year),
            Screen::Day => Some(Screen::Month),
            Screen::Detail => Some(Screen::Day),
        }
    }

    pub fn requires_session(self) -> bool {
        self != Screen::Landing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    SelectYear(i32),
    SelectMonth(u8),
    SelectDay(u8),
    /// Previous year on Month, previous month on Day, previous day on Detail.
    Prev,
    Next,
    Back,
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationState {
    pub screen: Screen,
    pub selected_year: i32,
    pub selected_month: u8,
    pub selected_day: u8,
}

impl NavigationState {
    pub fn cold_start(today: CivilDate) -> Self {
        Self::at(Screen::Landing, today)
    }

    /// Returning users land on today's detail, first-time users on the year list.
    pub fn after_login(today: CivilDate, has_entries: bool) -> Self {
        if has_entries {
            Self::at(Screen::Detail, today)
        } else {
            Self::at(Screen::Year, today)
        }
    }

    fn at(screen: Screen, date: CivilDate) -> Self {
        Self {
            screen,
            selected_year: date.year,
            selected_month: date.month,
            selected_day: date.day,
        }
    }

    pub fn selected_date(&self) -> CivilDate {
        CivilDate::new(self.selected_year, self.selected_month, self.selected_day)
    }

    /// Whether a restored state can be shown as is for a signed-in user.
    pub fn is_resumable(&self, today: CivilDate) -> bool {
        let date = self.selected_date();
        self.screen.requires_session() && date.is_valid() && date >= CivilDate::FIRST && date <= today
    }

    /// Next state for `transition`, or `None` when it does not apply here or
    /// would leave the 2020-01-01..=today range.
    pub fn apply(&self, transition: Transition, today: CivilDate) -> Option<Self> {
        match (self.screen, transition) {
            (_, Transition::Logout) if self.screen.requires_session() => {
                Some(Self::cold_start(today))
            }
            (_, Transition::Back) => self.screen.parent().map(|screen| Self { screen, ..*self }),

            (Screen::Year, Transition::SelectYear(year)) => {
                (FIRST_YEAR..=today.year).contains(&year).then(|| {
                    Self::at(
                        Screen::Month,
                        clamp(year, self.selected_month, self.selected_day, today),
                    )
                })
            }
            (Screen::Month, Transition::SelectMonth(month)) => {
                (1..=last_selectable_month(self.selected_year, today))
                    .contains(&month)
                    .then(|| {
                        Self::at(
                            Screen::Day,
                            clamp(self.selected_year, month, self.selected_day, today),
                        )
                    })
            }
            (Screen::Day, Transition::SelectDay(day)) => {
                (1..=last_selectable_day(self.selected_year, self.selected_month, today))
                    .contains(&day)
                    .then(|| {
                        Self::at(
                            Screen::Detail,
                            CivilDate::new(self.selected_year, self.selected_month, day),
                        )
                    })
            }

            (Screen::Month, Transition::Prev) => self.with_year(self.selected_year - 1, today),
            (Screen::Month, Transition::Next) => self.with_year(self.selected_year + 1, today),
            (Screen::Day, Transition::Prev) => {
                let (year, month) = prev_month(self.selected_year, self.selected_month);
                self.with_month(year, month, today)
            }
            (Screen::Day, Transition::Next) => {
                let (year, month) = next_month(self.selected_year, self.selected_month);
                self.with_month(year, month, today)
            }
            (Screen::Detail, Transition::Prev) => {
                self.with_date(self.selected_date().prev_day(), today)
            }
            (Screen::Detail, Transition::Next) => {
                self.with_date(self.selected_date().next_day(), today)
            }

            _ => None,
        }
    }

    pub fn can_apply(&self, transition: Transition, today: CivilDate) -> bool {
        self.apply(transition, today).is_some()
    }

    fn with_year(&self, year: i32, today: CivilDate) -> Option<Self> {
        (FIRST_YEAR..=today.year).contains(&year).then(|| {
            Self::at(
                self.screen,
                clamp(year, self.selected_month, self.selected_day, today),
            )
        })
    }

    fn with_month(&self, year: i32, month: u8, today: CivilDate) -> Option<Self> {
        let first_of_month = CivilDate::new(year, month, 1);
        (first_of_month >= CivilDate::FIRST && first_of_month <= today)
            .then(|| Self::at(self.screen, clamp(year, month, self.selected_day, today)))
    }

    fn with_date(&self, date: CivilDate, today: CivilDate) -> Option<Self> {
        (date >= CivilDate::FIRST && date <= today).then(|| Self::at(self.screen, date))
    }
}

/// Pull month and day back into range for `year`, never past today.
fn clamp(year: i32, month: u8, day: u8, today: CivilDate) -> CivilDate {
    let month = month.clamp(1, last_selectable_month(year, today));
    let day = day.clamp(1, last_selectable_day(year, month, today).min(days_in_month(year, month)));
    CivilDate::new(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TODAY: CivilDate = CivilDate {
        year: 2024,
        month: 6,
        day: 15,
    };

    fn state(screen: Screen, year: i32, month: u8, day: u8) -> NavigationState {
        NavigationState {
            screen,
            selected_year: year,
            selected_month: month,
            selected_day: day,
        }
    }

    #[test]
    fn drill_down_and_back_up() {
        let year = NavigationState::after_login(TODAY, false);
        assert_eq!(year.screen, Screen::Year);

        let month = year.apply(Transition::SelectYear(2023), TODAY).unwrap();
        assert_eq!((month.screen, month.selected_year), (Screen::Month, 2023));

        let day = month.apply(Transition::SelectMonth(2), TODAY).unwrap();
        assert_eq!((day.screen, day.selected_month), (Screen::Day, 2));
        // 15 from today still fits in February.
        assert_eq!(day.selected_day, 15);

        let detail = day.apply(Transition::SelectDay(28), TODAY).unwrap();
        assert_eq!(detail.selected_date(), CivilDate::new(2023, 2, 28));

        let back = detail.apply(Transition::Back, TODAY).unwrap();
        assert_eq!(back.screen, Screen::Day);
        let back = back.apply(Transition::Back, TODAY).unwrap();
        assert_eq!(back.screen, Screen::Month);
        let back = back.apply(Transition::Back, TODAY).unwrap();
        assert_eq!(back.screen, Screen::Year);
        assert_eq!(back.apply(Transition::Back, TODAY), None);
    }

    #[test]
    fn returning_users_land_on_today() {
        let nav = NavigationState::after_login(TODAY, true);
        assert_eq!(nav.screen, Screen::Detail);
        assert_eq!(nav.selected_date(), TODAY);
    }

    #[test]
    fn selections_beyond_today_or_before_2020_are_rejected() {
        let year = state(Screen::Year, 2024, 6, 15);
        assert_eq!(year.apply(Transition::SelectYear(2025), TODAY), None);
        assert_eq!(year.apply(Transition::SelectYear(2019), TODAY), None);

        let month = state(Screen::Month, 2024, 6, 15);
        assert_eq!(month.apply(Transition::SelectMonth(7), TODAY), None);
        assert!(month.can_apply(Transition::SelectMonth(6), TODAY));

        let day = state(Screen::Day, 2024, 6, 15);
        assert_eq!(day.apply(Transition::SelectDay(16), TODAY), None);
        assert_eq!(day.apply(Transition::SelectDay(0), TODAY), None);
    }

    #[test]
    fn month_paging_is_bounded_by_first_year_and_today() {
        let first = state(Screen::Day, 2020, 1, 10);
        assert_eq!(first.apply(Transition::Prev, TODAY), None);

        let current = state(Screen::Day, 2024, 6, 10);
        assert_eq!(current.apply(Transition::Next, TODAY), None);

        let dec = state(Screen::Day, 2023, 12, 31);
        let jan = dec.apply(Transition::Next, TODAY).unwrap();
        assert_eq!((jan.selected_year, jan.selected_month), (2024, 1));
    }

    #[test]
    fn year_paging_clamps_selection_to_today() {
        let month = state(Screen::Month, 2023, 11, 30);
        assert_eq!(month.apply(Transition::Prev, TODAY).unwrap().selected_year, 2022);

        let next = month.apply(Transition::Next, TODAY).unwrap();
        assert_eq!(next.selected_date(), CivilDate::new(2024, 6, 15));
        assert_eq!(next.apply(Transition::Next, TODAY), None);

        let first = state(Screen::Month, 2020, 3, 1);
        assert_eq!(first.apply(Transition::Prev, TODAY), None);
    }

    #[test]
    fn day_stepping_is_bounded_and_crosses_months() {
        let today = state(Screen::Detail, 2024, 6, 15);
        assert_eq!(today.apply(Transition::Next, TODAY), None);

        let first = state(Screen::Detail, 2020, 1, 1);
        assert_eq!(first.apply(Transition::Prev, TODAY), None);

        let march = state(Screen::Detail, 2024, 3, 1);
        assert_eq!(
            march.apply(Transition::Prev, TODAY).unwrap().selected_date(),
            CivilDate::new(2024, 2, 29)
        );
    }

    #[test]
    fn shorter_months_clamp_the_selected_day() {
        let day = state(Screen::Day, 2024, 3, 31);
        let feb = day.apply(Transition::Prev, TODAY).unwrap();
        assert_eq!(feb.selected_date(), CivilDate::new(2024, 2, 29));
    }

    #[test]
    fn logout_returns_to_landing_from_anywhere() {
        let detail = state(Screen::Detail, 2022, 2, 2);
        let landing = detail.apply(Transition::Logout, TODAY).unwrap();
        assert_eq!(landing, NavigationState::cold_start(TODAY));
        assert_eq!(landing.apply(Transition::Logout, TODAY), None);
    }

    #[test]
    fn persisted_state_round_trips_and_is_checked() {
        let nav = state(Screen::Day, 2023, 2, 28);
        let raw = serde_json::to_string(&nav).unwrap();
        assert!(raw.contains("\"screen\":\"day\""));
        let restored: NavigationState = serde_json::from_str(&raw).unwrap();
        assert!(restored.is_resumable(TODAY));

        assert!(!state(Screen::Detail, 2024, 7, 1).is_resumable(TODAY));
        assert!(!state(Screen::Detail, 2023, 2, 29).is_resumable(TODAY));
        assert!(!state(Screen::Landing, 2024, 6, 1).is_resumable(TODAY));
        assert!(!state(Screen::Year, 2019, 12, 31).is_resumable(TODAY));
    }
}
