//! AppleScript sources for driving the Find My app

/// Quote a string as an AppleScript string literal.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Quit the app.
pub fn quit_app(app_name: &str) -> String {
    format!("tell application {} to quit", quoted(app_name))
}

/// Launch the app unless it is already running.
pub fn start_app(app_name: &str) -> String {
    let app = quoted(app_name);
    format!(
        "set appName to {app}\n\
         if application appName is running then\n\
         \treturn 0\n\
         else\n\
         \ttell application appName to reopen\n\
         end if"
    )
}

/// Bring the app to the foreground.
pub fn show_app(app_name: &str) -> String {
    format!(
        "tell application \"System Events\" to tell process {}\n\
         \tset frontmost to true\n\
         end tell",
        quoted(app_name)
    )
}

/// Hide the app's windows.
pub fn hide_app(app_name: &str) -> String {
    format!(
        "tell application \"System Events\" to tell process {}\n\
         \tset visible to false\n\
         end tell",
        quoted(app_name)
    )
}
