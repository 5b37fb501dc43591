/// Requests reaching the GTK thread from the background services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    Show,
    Hide,
    /// The config file changed on disk.
    ConfigReload,
}
