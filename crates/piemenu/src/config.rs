use crate::events::AppEvent;
use crate::sys::exec::{self, ExecCommand};
use async_channel::Sender;
use directories::ProjectDirs;
use notify::{EventKind as FsEventKind, RecommendedWatcher, RecursiveMode, Watcher};
use piemenu_core::{DirectionSpec, EventKind, Item, Options, Pie, PieName, Slice};
use serde::Deserialize;
use serde_with::{NoneAsEmptyString, serde_as};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct ItemConfig {
    pub label: String,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub icon: Option<PathBuf>,
    pub exec: Option<ExecCommand>,
    pub next_pie: Option<PieName>,
    #[serde(default)]
    pub options: Options,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SliceConfig {
    pub direction: Option<DirectionSpec>,
    #[serde(default)]
    pub options: Options,
    #[serde(default)]
    pub items: Vec<ItemConfig>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PieConfig {
    #[serde(default)]
    pub options: Options,
    #[serde(default)]
    pub slices: Vec<SliceConfig>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    pub default_pie: Option<PieName>,
    #[serde(default)]
    pub options: Options,
    #[serde(default)]
    pub pies: BTreeMap<PieName, PieConfig>,
}

impl ItemConfig {
    fn to_item(&self) -> Item {
        let mut item = Item::new(self.label.as_str()).with_options(self.options.clone());
        if let Some(next) = &self.next_pie {
            item = item.with_next_pie(next.clone());
        }
        if let Some(cmd) = self.exec.clone() {
            item = item.on(EventKind::ItemSelect, move |_| {
                if let Err(e) = exec::spawn(&cmd) {
                    log::error!("Failed to run '{}': {}", cmd, e);
                }
            });
        }
        item
    }
}

impl PieConfig {
    pub fn to_pie(&self, name: &PieName) -> Pie {
        let slices = self.slices.iter().map(|cfg| {
            let slice = cfg
                .items
                .iter()
                .fold(Slice::new().with_options(cfg.options.clone()), |slice, item| {
                    slice.with_item(item.to_item())
                });
            match cfg.direction {
                Some(direction) => slice.with_direction(direction),
                None => slice,
            }
        });
        slices.fold(
            Pie::named(name.clone()).with_options(self.options.clone()),
            Pie::with_slice,
        )
    }
}

impl Config {
    /// Global options with `default_pie` folded in.
    pub fn global_options(&self) -> Options {
        let mut options = self.options.clone();
        if let Some(name) = &self.default_pie {
            options.default_pie = Some(name.clone());
        }
        options
    }

    /// A single-item pie that opens the config file, used until one exists.
    pub fn setup() -> Self {
        let name = PieName::from("setup");
        let item = ItemConfig {
            label: "Edit piemenu config".to_string(),
            icon: None,
            exec: Some(ExecCommand::from(SETUP_COMMAND)),
            next_pie: None,
            options: Options::default(),
        };
        let pie = PieConfig {
            options: Options::default(),
            slices: vec![SliceConfig {
                direction: None,
                options: Options::default(),
                items: vec![item],
            }],
        };
        Self {
            default_pie: Some(name.clone()),
            options: Options::default(),
            pies: BTreeMap::from([(name, pie)]),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub const SETUP_COMMAND: &str = "PIEMENU_SETUP";

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("org", "piemenu", "piemenu").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

pub fn load_config() -> Result<Config, ConfigError> {
    let config_path = get_config_path()?;

    let s = config::Config::builder()
        .add_source(config::File::from(config_path).required(false))
        .add_source(config::Environment::with_prefix("PIEMENU"))
        .build()?;

    Ok(s.try_deserialize()?)
}

pub fn load_or_setup() -> Config {
    if let Ok(path) = get_config_path()
        && !path.exists()
    {
        return Config::setup();
    }

    load_config().unwrap_or_else(|e| {
        log::error!("Failed to load config: {}", e);
        Config::setup()
    })
}

pub fn write_default_config() -> std::io::Result<PathBuf> {
    let path =
        get_config_path().map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e))?;
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(&path, DEFAULT_CONFIG)?;
    }
    Ok(path)
}

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

/// Quiet period after a config change before the reload is sent. Editors save in bursts.
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(150);

type FsEvents = async_channel::Receiver<notify::Result<notify::Event>>;

fn watch_config_dir(dir: &Path) -> Result<(RecommendedWatcher, FsEvents), ConfigError> {
    fs_err::create_dir_all(dir)?;
    let (bridge_tx, bridge_rx) = async_channel::unbounded();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    )?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    Ok((watcher, bridge_rx))
}

/// Whether `event` changed the file at `config_path`. Matched by name, since editors that
/// save through a temporary file report the final path only on the rename.
fn touches_config(event: &notify::Event, config_path: &Path) -> bool {
    let changed = matches!(
        event.kind,
        FsEventKind::Modify(_) | FsEventKind::Create(_) | FsEventKind::Remove(_)
    );
    changed
        && event
            .paths
            .iter()
            .any(|p| p.file_name().is_some() && p.file_name() == config_path.file_name())
}

pub async fn run_async_watcher(tx: Sender<AppEvent>) {
    let config_path = match get_config_path() {
        Ok(p) => p,
        Err(e) => {
            log::error!("Config watcher error: {}", e);
            return;
        }
    };
    let Some(config_dir) = config_path.parent() else {
        return;
    };

    // the watcher stops when dropped, keep it for the whole loop
    let (_watcher, events) = match watch_config_dir(config_dir) {
        Ok(watch) => watch,
        Err(e) => {
            log::error!("Failed to watch {}: {}", config_dir.display(), e);
            return;
        }
    };

    while let Ok(res) = events.recv().await {
        match res {
            Ok(event) if touches_config(&event, &config_path) => {
                while let Ok(Ok(_)) = tokio::time::timeout(RELOAD_DEBOUNCE, events.recv()).await {}
                log::debug!("{} changed", config_path.display());
                if tx.send(AppEvent::ConfigReload).await.is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => log::error!("Watch error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use piemenu_core::{Direction, SliceItemLayout};

    #[test]
    fn test_config_deserialization() {
        let json = r#"{
            "default_pie": "main",
            "options": { "timer": true, "timer_delay": 300 },
            "pies": {
                "main": {
                    "options": { "clockwise": false },
                    "slices": [
                        { "direction": "up", "items": [{ "label": "Files", "exec": "nautilus" }] },
                        { "items": [{ "label": "More", "next_pie": "tools" }] }
                    ]
                },
                "tools": {
                    "slices": [{
                        "direction": 45,
                        "options": { "slice_item_layout": "nonOverlapping" },
                        "items": [{ "label": "a", "icon": "" }, { "label": "b", "icon": "/tmp/b.png" }]
                    }]
                }
            }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        let main = &config.pies[&PieName::from("main")];
        assert_eq!(main.options.clockwise, Some(false));
        assert_eq!(
            main.slices[0].direction,
            Some(DirectionSpec::Named(Direction::North))
        );
        assert_eq!(
            main.slices[0].items[0].exec.as_ref().map(|e| e.as_str()),
            Some("nautilus")
        );

        let tools = &config.pies[&PieName::from("tools")];
        assert_eq!(tools.slices[0].direction, Some(DirectionSpec::Degrees(45.0)));
        assert_eq!(
            tools.slices[0].options.slice_item_layout,
            Some(SliceItemLayout::NonOverlapping)
        );
        assert_eq!(tools.slices[0].items[0].icon, None);
        assert_eq!(
            tools.slices[0].items[1].icon,
            Some(PathBuf::from("/tmp/b.png"))
        );
        assert_eq!(
            config.global_options().default_pie,
            Some(PieName::from("main"))
        );
    }

    #[test]
    fn test_pie_conversion() {
        let json = r#"{
            "slices": [
                { "direction": "west", "items": [{ "label": "Run", "exec": "true" }] },
                { "items": [{ "label": "Sub", "next_pie": "sub", "options": { "timer": true } }] }
            ]
        }"#;
        let cfg: PieConfig = serde_json::from_str(json).unwrap();
        let pie = cfg.to_pie(&PieName::from("main"));

        assert_eq!(pie.name, Some(PieName::from("main")));
        assert_eq!(pie.slices.len(), 2);
        assert_eq!(
            pie.slices[0].direction.and_then(|d| d.degrees()),
            Some(180.0)
        );
        assert!(pie.slices[0].items[0].handlers.get(EventKind::ItemSelect).is_some());
        assert!(pie.slices[1].items[0].handlers.is_empty());
        assert_eq!(pie.slices[1].items[0].options.timer, Some(true));
        assert!(pie.slices[1].items[0].options.next_pie.is_some());
    }

    #[test]
    fn test_bundled_default_config_parses() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_CONFIG,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        let default = config.default_pie.clone().unwrap();
        assert!(config.pies.contains_key(&default));
        for pie in config.pies.values() {
            for item in pie.slices.iter().flat_map(|s| &s.items) {
                if let Some(next) = &item.next_pie {
                    assert!(config.pies.contains_key(next), "{next}");
                }
            }
        }
    }

    #[test]
    fn test_reload_only_for_the_config_file() {
        use notify::event::{AccessKind, CreateKind, ModifyKind};

        let config_path = PathBuf::from("/home/u/.config/piemenu/config.toml");
        let event = |kind, path: &str| notify::Event::new(kind).add_path(PathBuf::from(path));

        assert!(touches_config(
            &event(FsEventKind::Modify(ModifyKind::Any), "/home/u/.config/piemenu/config.toml"),
            &config_path
        ));
        assert!(touches_config(
            &event(FsEventKind::Create(CreateKind::File), "/home/u/.config/piemenu/config.toml"),
            &config_path
        ));
        assert!(!touches_config(
            &event(FsEventKind::Modify(ModifyKind::Any), "/home/u/.config/piemenu/.config.toml.swp"),
            &config_path
        ));
        assert!(!touches_config(
            &event(FsEventKind::Access(AccessKind::Any), "/home/u/.config/piemenu/config.toml"),
            &config_path
        ));
    }

    #[test]
    fn test_setup_config_opens_editor() {
        let config = Config::setup();
        let pie = &config.pies[&PieName::from("setup")];
        assert_eq!(
            pie.slices[0].items[0].exec.as_ref().map(|e| e.as_str()),
            Some(SETUP_COMMAND)
        );
    }
}
