use crate::data::persistence::get_data_dir;
use crate::data::Settings;
use crate::ui::settings_panel::{run_app, App};
use crate::ui::{restore_terminal, setup_terminal};
use anyhow::Result;
use tracing::info;

/// Opens the settings panel. Every change is written as it is made.
pub fn run() -> Result<()> {
    let data_dir = get_data_dir()?;
    let settings = Settings::read_from(&data_dir)?;

    // Restore the terminal before the panic message is printed
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen
        );
        original_hook(info);
    }));

    let mut terminal = setup_terminal()?;
    let mut app = App::new(settings, data_dir);
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;

    info!(
        presets = app.settings.reason_presets.len(),
        enabled = app.settings.enabled,
        "settings panel closed"
    );
    result
}
