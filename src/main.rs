// src/main.rs

use soft_input::core::config::{
    ConfigManagerOperations, CoreConfigManager, SoftInputConfig, get_base_app_config_local_dir,
};
use soft_input::core::models::OwnerWindow;
use soft_input::ffi::APP_NAME;
use soft_input::logging::LOG_FILENAME;
use soft_input::platform_layer::HeadlessDialogFactory;
use soft_input::{ShowRequest, SoftInput, initialize_logging};

use std::sync::Arc;

fn load_config() -> SoftInputConfig {
    match CoreConfigManager::new().load_config(APP_NAME) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Could not load configuration, using defaults: {e}");
            SoftInputConfig::default()
        }
    }
}

/*
 * Walks one session through the headless backend: the scripted user edits
 * the text, moves the selection, hides and restores the field, and confirms.
 */
fn run_scripted(config: SoftInputConfig) -> soft_input::Result<()> {
    let factory = Arc::new(HeadlessDialogFactory::default());
    let user = factory.user();
    let soft_input = SoftInput::with_config(factory, config);

    soft_input.show_soft_input(ShowRequest::new(OwnerWindow(1), "Hello").selection(5, 0))?;
    println!("Input area: {:?}", soft_input.get_input_area()?);

    user.type_text(", world");
    let update = soft_input.poll_edit_field();
    println!(
        "{:?}: '{}'",
        update.state,
        String::from_utf16_lossy(&update.text)
    );

    soft_input.set_input_selection(0, 5);
    user.sync();
    println!("Selection: {:?}", soft_input.get_input_selection());

    soft_input.set_hide_input_field(true);
    println!("Hidden edit rect: {:?}", user.edit_rect());
    soft_input.set_hide_input_field(false);
    println!("Restored edit rect: {:?}", user.edit_rect());

    user.click_ok();
    let update = soft_input.poll_edit_field();
    println!(
        "{:?}: '{}'",
        update.state,
        String::from_utf16_lossy(&update.text)
    );
    Ok(())
}

/*
 * Shows the native dialog over the foreground window and echoes every edit
 * until the user closes it.
 */
#[cfg(target_os = "windows")]
fn run_native(config: SoftInputConfig) -> soft_input::Result<()> {
    use soft_input::platform_layer::{EditFieldState, Win32DialogFactory};
    use std::time::Duration;
    use windows::Win32::UI::WindowsAndMessaging::GetForegroundWindow;

    let owner = OwnerWindow(unsafe { GetForegroundWindow() }.0 as isize);
    let soft_input = SoftInput::with_config(Arc::new(Win32DialogFactory::new()), config);
    soft_input.show_soft_input(ShowRequest::new(owner, "Edit me"))?;
    loop {
        let update = soft_input.poll_edit_field();
        match update.state {
            EditFieldState::None => {}
            EditFieldState::TextUpdated => {
                println!("Text: '{}'", String::from_utf16_lossy(&update.text))
            }
            EditFieldState::EditFinished | EditFieldState::EditCanceled => {
                println!(
                    "{:?}: '{}'",
                    update.state,
                    String::from_utf16_lossy(&update.text)
                );
                return Ok(());
            }
        }
        std::thread::sleep(Duration::from_millis(16));
    }
}

fn main() -> soft_input::Result<()> {
    let config = load_config();
    let log_path = get_base_app_config_local_dir(APP_NAME).map(|dir| dir.join(LOG_FILENAME));
    initialize_logging(config.level_filter(), log_path.as_deref())?;
    log::info!("Demo: Starting.");

    let native = std::env::args().any(|arg| arg == "--native");
    #[cfg(target_os = "windows")]
    if native {
        return run_native(config);
    }
    #[cfg(not(target_os = "windows"))]
    if native {
        log::warn!("Demo: No native dialog backend on this platform; running the script.");
    }
    run_scripted(config)
}
