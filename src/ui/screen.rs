use ratatui::Frame;

use lectern::{clock::Clock, sound::SoundPlayer};

use crate::{
    ui::{notes_cursor, settings::render_settings},
    App,
};

/// A UI Screen boundary: responsible for rendering one view of the app
pub trait Screen<C: Clock, P: SoundPlayer> {
    fn render(&self, app: &App<C, P>, f: &mut Frame);
}

/// Timer and notes panes, using the App widget
pub struct MainScreen;

impl<C: Clock, P: SoundPlayer> Screen<C, P> for MainScreen {
    fn render(&self, app: &App<C, P>, f: &mut Frame) {
        let area = f.area();
        f.render_widget(app, area);
        if let Some(position) = notes_cursor(app, area) {
            f.set_cursor_position(position);
        }
    }
}

/// Settings modal drawn over the main screen
pub struct SettingsScreen;

impl<C: Clock, P: SoundPlayer> Screen<C, P> for SettingsScreen {
    fn render(&self, app: &App<C, P>, f: &mut Frame) {
        f.render_widget(app, f.area());
        render_settings(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen<C: Clock, P: SoundPlayer>(app: &App<C, P>) -> Box<dyn Screen<C, P>> {
    match app.settings_modal {
        Some(_) => Box::new(SettingsScreen),
        None => Box::new(MainScreen),
    }
}
