//! Date/time override control.
//!
//! The parent owns a [`PickerState`]; the picker only reads it and asks for
//! changes through [`update`]. Stored override values are always display
//! form. Conversion to machine form happens only for the native inputs.

use hypertext::{Raw, prelude::*};
use serde::Deserialize;

use crate::datetime::{
    Clock, DisplayStamp, current_stamp, now_machine_time, to_display_date, to_display_time,
    to_machine_date, to_machine_time, today_machine_date,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Override {
    pub enabled: bool,
    /// Display form. Kept while the override is disabled.
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PickerState {
    pub date: Override,
    pub time: Override,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PickerMsg {
    ToggleDate,
    ToggleTime,
    /// Machine-form value from the native date input.
    DateChanged(String),
    /// Machine-form value from the native time input.
    TimeChanged(String),
}

pub fn update(state: &mut PickerState, msg: PickerMsg) {
    match msg {
        PickerMsg::ToggleDate => state.date.enabled = !state.date.enabled,
        PickerMsg::ToggleTime => state.time.enabled = !state.time.enabled,
        PickerMsg::DateChanged(machine) => state.date.value = to_display_date(&machine),
        PickerMsg::TimeChanged(machine) => state.time.value = to_display_time(&machine),
    }
}

/// Value for the native date input: the override, else today.
pub fn date_input_value(state: &PickerState, clock: &impl Clock) -> String {
    let stored = to_machine_date(&state.date.value);
    if stored.is_empty() {
        today_machine_date(clock)
    } else {
        stored
    }
}

/// Value for the native time input: the override, else the current time.
pub fn time_input_value(state: &PickerState, clock: &impl Clock) -> String {
    let stored = to_machine_time(&state.time.value);
    if stored.is_empty() {
        now_machine_time(clock)
    } else {
        stored
    }
}

/// Earliest date the native input offers.
pub fn min_date(clock: &impl Clock) -> String {
    today_machine_date(clock)
}

/// The display-form date and time the picker currently stands for: each
/// enabled override with a value wins, anything else falls back to now.
pub fn resolve(state: &PickerState, clock: &impl Clock) -> DisplayStamp {
    let now = current_stamp(clock);
    let pick = |o: &Override, fallback: String| {
        if o.enabled && !o.value.is_empty() {
            o.value.clone()
        } else {
            fallback
        }
    };

    DisplayStamp {
        date: pick(&state.date, now.date),
        time: pick(&state.time, now.time),
    }
}

// ============================================================================
// Form round trip
// ============================================================================

/// Picker fields as posted by the rendered form.
#[derive(Deserialize, Debug, Default)]
pub struct PickerForm {
    #[serde(default)]
    pub use_custom_date: Option<String>,
    #[serde(default)]
    pub custom_date: String,
    #[serde(default)]
    pub custom_date_input: Option<String>,
    #[serde(default)]
    pub use_custom_time: Option<String>,
    #[serde(default)]
    pub custom_time: String,
    #[serde(default)]
    pub custom_time_input: Option<String>,
}

impl PickerForm {
    /// Rebuild the state from the hidden stored values, then apply the native
    /// inputs only where they differ from what was shown, so an untouched
    /// default does not become an override.
    pub fn into_state(self, clock: &impl Clock) -> PickerState {
        let mut state = PickerState {
            date: Override {
                enabled: self.use_custom_date.is_some(),
                value: self.custom_date,
            },
            time: Override {
                enabled: self.use_custom_time.is_some(),
                value: self.custom_time,
            },
        };

        if let Some(input) = self.custom_date_input {
            if input != date_input_value(&state, clock) {
                update(&mut state, PickerMsg::DateChanged(input));
            }
        }
        if let Some(input) = self.custom_time_input {
            if input != time_input_value(&state, clock) {
                update(&mut state, PickerMsg::TimeChanged(input));
            }
        }

        state
    }
}

// ============================================================================
// Rendering
// ============================================================================

const PICKER_REFRESH: &str = r##"hx-post="/tasks/quick-add/picker" hx-target="#date-time-picker" hx-swap="outerHTML" hx-include="closest form" hx-trigger="change""##;

fn render_toggle(id: &str, name: &str, checked: bool) -> String {
    let checked = if checked { " checked" } else { "" };
    format!(
        r#"<input id="{id}" type="checkbox" class="form-checkbox" name="{name}"{checked} {PICKER_REFRESH}>"#
    )
}

pub fn render_date_time_picker(state: &PickerState, clock: &impl Clock) -> String {
    let date_toggle = render_toggle("use-custom-date", "use_custom_date", state.date.enabled);
    let time_toggle = render_toggle("use-custom-time", "use_custom_time", state.time.enabled);

    let date_input = format!(
        r#"<input type="date" class="form-date-time-input" name="custom_date_input" value="{}" min="{}" {PICKER_REFRESH}>"#,
        date_input_value(state, clock),
        min_date(clock),
    );
    let time_input = format!(
        r#"<input type="time" class="form-date-time-input" name="custom_time_input" value="{}" {PICKER_REFRESH}>"#,
        time_input_value(state, clock),
    );

    maud! {
        div .date-time-picker id="date-time-picker" {
            input type="hidden" name="custom_date" value=(state.date.value);
            input type="hidden" name="custom_time" value=(state.time.value);

            div .form-group {
                div .form-checkbox-group {
                    (Raw::dangerously_create(&date_toggle))
                    label for="use-custom-date" { "Set specific date" }
                }
                @if state.date.enabled {
                    div .form-date-time {
                        (Raw::dangerously_create(&date_input))
                    }
                }
            }

            div .form-group {
                div .form-checkbox-group {
                    (Raw::dangerously_create(&time_toggle))
                    label for="use-custom-time" { "Set specific time (default: current time)" }
                }
                @if state.time.enabled {
                    div .form-date-time {
                        (Raw::dangerously_create(&time_input))
                    }
                }
            }
        }
    }
    .render()
    .into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::FixedClock;
    use chrono::NaiveDate;

    fn clock() -> FixedClock {
        FixedClock(
            NaiveDate::from_ymd_opt(2026, 10, 14)
                .unwrap()
                .and_hms_opt(8, 7, 0)
                .unwrap(),
        )
    }

    #[test]
    fn test_toggle_preserves_override_value() {
        let mut state = PickerState::default();
        update(&mut state, PickerMsg::ToggleDate);
        update(&mut state, PickerMsg::DateChanged("2026-11-02".into()));
        assert_eq!(state.date.value, "November 2, 2026");

        update(&mut state, PickerMsg::ToggleDate);
        assert!(!state.date.enabled);
        assert_eq!(state.date.value, "November 2, 2026");

        update(&mut state, PickerMsg::ToggleDate);
        assert!(state.date.enabled);
        assert_eq!(date_input_value(&state, &clock()), "2026-11-02");
    }

    #[test]
    fn test_input_values_default_to_now() {
        let state = PickerState::default();
        assert_eq!(date_input_value(&state, &clock()), "2026-10-14");
        assert_eq!(time_input_value(&state, &clock()), "08:07");
        assert_eq!(min_date(&clock()), "2026-10-14");
    }

    #[test]
    fn test_time_override_is_stored_in_display_form() {
        let mut state = PickerState::default();
        update(&mut state, PickerMsg::ToggleTime);
        update(&mut state, PickerMsg::TimeChanged("18:45".into()));
        assert_eq!(state.time.value, "6:45 pm");
        assert_eq!(time_input_value(&state, &clock()), "18:45");
    }

    #[test]
    fn test_resolve_prefers_enabled_overrides() {
        let mut state = PickerState {
            date: Override {
                enabled: true,
                value: "December 25, 2026".into(),
            },
            time: Override {
                enabled: false,
                value: "6:45 pm".into(),
            },
        };
        let stamp = resolve(&state, &clock());
        assert_eq!(stamp.date, "December 25, 2026");
        assert_eq!(stamp.time, "8:07 am");

        update(&mut state, PickerMsg::ToggleTime);
        assert_eq!(resolve(&state, &clock()).time, "6:45 pm");
    }

    #[test]
    fn test_form_ignores_untouched_default() {
        let form = PickerForm {
            use_custom_date: Some("on".into()),
            custom_date_input: Some("2026-10-14".into()),
            ..PickerForm::default()
        };
        let state = form.into_state(&clock());
        assert!(state.date.enabled);
        assert_eq!(state.date.value, "");
    }

    #[test]
    fn test_form_applies_changed_input() {
        let form = PickerForm {
            use_custom_date: Some("on".into()),
            custom_date: "November 2, 2026".into(),
            custom_date_input: Some("2026-11-20".into()),
            custom_time: "6:45 pm".into(),
            ..PickerForm::default()
        };
        let state = form.into_state(&clock());
        assert_eq!(state.date.value, "November 20, 2026");
        assert!(!state.time.enabled);
        assert_eq!(state.time.value, "6:45 pm");
    }

    #[test]
    fn test_render_hides_disabled_inputs_but_keeps_values() {
        let state = PickerState {
            date: Override {
                enabled: false,
                value: "November 2, 2026".into(),
            },
            time: Override {
                enabled: true,
                value: String::new(),
            },
        };
        let html = render_date_time_picker(&state, &clock());
        assert!(html.contains("November 2, 2026"));
        assert!(!html.contains(r#"name="custom_date_input""#));
        assert!(html.contains(r#"name="custom_time_input" value="08:07""#));
        assert!(html.contains(r#"name="use_custom_time" checked"#));
    }
}
