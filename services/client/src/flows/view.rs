//! services/client/src/flows/view.rs
//!
//! Pure display rules: which panels are visible for a given state.

use crybaby_core::domain::ViewState;

/// Visibility of each top-level panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panels {
    pub loader: bool,
    pub app_content: bool,
    pub auth_card: bool,
    pub student_panel: bool,
    pub parent_panel: bool,
}

/// Exactly one of the auth card, student panel and parent panel is visible
/// once loading has finished.
pub fn panels_for(state: ViewState) -> Panels {
    let hidden = Panels {
        loader: false,
        app_content: true,
        auth_card: false,
        student_panel: false,
        parent_panel: false,
    };
    match state {
        ViewState::Loading => Panels {
            loader: true,
            app_content: false,
            ..hidden
        },
        ViewState::LoggedOut => Panels {
            auth_card: true,
            ..hidden
        },
        ViewState::StudentView => Panels {
            student_panel: true,
            ..hidden
        },
        ViewState::ParentView => Panels {
            parent_panel: true,
            ..hidden
        },
    }
}

/// Visibility of the calendar form and the external-login button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarControls {
    pub form_visible: bool,
    pub login_button_visible: bool,
}

pub fn calendar_controls(external_login_completed: bool) -> CalendarControls {
    CalendarControls {
        form_visible: external_login_completed,
        login_button_visible: !external_login_completed,
    }
}
