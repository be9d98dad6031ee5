use crate::error;
use crate::events::DesktopId;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_COMMAND_SOCKET: &str = "/tmp/wmtiler.sock";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub layout: LayoutConfig,
    pub desktops: DesktopsConfig,
    pub daemon: DaemonConfig,
    // Индекс переопределений по номеру стола - не сериализуется, строится после загрузки
    #[serde(skip)]
    per_desktop_index: BTreeMap<DesktopId, DesktopLayout>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Отступы от краёв экрана и зазор между окнами, в пикселях
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DesktopLayout {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
    pub gap: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LayoutConfig {
    /// Глобальные значения по умолчанию
    pub defaults: DesktopLayout,
    /// Значения по умолчанию для плиточных столов, важнее `defaults`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiled_default: Option<DesktopLayout>,
    /// Переопределения для конкретных столов: ключ - номер стола
    #[serde(default)]
    pub per_desktop: BTreeMap<String, DesktopLayout>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DesktopsConfig {
    /// Пустой набор - определить по числу столов при запуске
    #[serde(default)]
    pub tiled: BTreeSet<DesktopId>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DaemonConfig {
    pub debounce_ms: u64,
    pub poll_interval_ms: u64,
    /// Пустая строка отключает канал команд
    pub command_socket: String,
}

/// Значения из командной строки, перекрывающие файл и окружение
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub tile_desktops: Option<String>,
    pub margin_x: Option<u32>,
    pub margin_left: Option<u32>,
    pub margin_right: Option<u32>,
    pub margin_top: Option<u32>,
    pub margin_bottom: Option<u32>,
    pub gap: Option<u32>,
    pub desktop_configs: Vec<String>,
    pub desktop_default_config: Option<String>,
    pub debounce_ms: Option<u64>,
    pub command_socket: Option<String>,
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            layout: LayoutConfig::default(),
            desktops: DesktopsConfig::default(),
            daemon: DaemonConfig {
                debounce_ms: 200,
                poll_interval_ms: 50,
                command_socket: DEFAULT_COMMAND_SOCKET.to_string(),
            },
            per_desktop_index: BTreeMap::new(),
        }
    }
}

impl DesktopLayout {
    /// Разбор пятёрки `top,right,bottom,left,gap`; двоеточие тоже считается разделителем
    pub fn parse(value: &str) -> Result<Self> {
        let normalized = value.replace(':', ",");
        let mut values = [0u32; 5];
        let mut count = 0;

        for token in normalized.split(',') {
            if count == values.len() {
                anyhow::bail!(
                    "Раскладка должна содержать 5 чисел top,right,bottom,left,gap: {:?}",
                    value
                );
            }
            values[count] = token
                .trim()
                .parse()
                .with_context(|| format!("Неверное значение в раскладке: {:?}", token))?;
            count += 1;
        }

        if count != values.len() {
            anyhow::bail!(
                "Раскладка должна содержать 5 чисел top,right,bottom,left,gap: {:?}",
                value
            );
        }

        let [top, right, bottom, left, gap] = values;
        Ok(Self { top, right, bottom, left, gap })
    }
}

/// Разбор списка столов `1,2,3`. Пустые элементы пропускаются,
/// нечисловые возвращаются отдельно, чтобы вызывающий мог о них предупредить.
pub fn parse_desktop_list(value: &str) -> (BTreeSet<DesktopId>, Vec<String>) {
    let mut desktops = BTreeSet::new();
    let mut rejected = Vec::new();
    for token in value.split(',').map(str::trim) {
        if token.is_empty() {
            continue;
        }
        match token.parse::<DesktopId>() {
            Ok(desktop) => {
                desktops.insert(desktop);
            }
            Err(_) => rejected.push(token.to_string()),
        }
    }
    (desktops, rejected)
}

/// Разбор `N:top,right,bottom,left,gap`
pub fn parse_desktop_config(value: &str) -> Result<(DesktopId, DesktopLayout)> {
    let (desktop, layout) = value
        .split_once(':')
        .with_context(|| format!("Формат --desktop-config: N:top,right,bottom,left,gap, получено {:?}", value))?;
    let desktop = desktop
        .trim()
        .parse()
        .with_context(|| format!("Неверный номер стола: {:?}", desktop))?;
    Ok((desktop, DesktopLayout::parse(layout)?))
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> error::Result<Self> {
        Ok(Self::extract(config_path.as_ref())?)
    }

    fn extract(config_path: &Path) -> Result<Self> {

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("WMTILER_").split("__"));

        let mut config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;
        config.build_indexes()?;

        Ok(config)
    }

    /// Применяет значения командной строки поверх загруженной конфигурации.
    /// Возвращает нераспознанные номера из `--tile-desktops`: они пропущены,
    /// а предупреждение выводит вызывающий, когда логирование уже настроено.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> error::Result<Vec<String>> {
        Ok(self.merge_overrides(overrides)?)
    }

    fn merge_overrides(&mut self, overrides: &ConfigOverrides) -> Result<Vec<String>> {
        let mut rejected = Vec::new();
        if let Some(list) = &overrides.tile_desktops {
            let (desktops, skipped) = parse_desktop_list(list);
            self.desktops.tiled = desktops;
            rejected = skipped;
        }

        // --margin-x задаёт обе стороны, отдельные флаги сторон важнее
        let defaults = &mut self.layout.defaults;
        if let Some(margin) = overrides.margin_x {
            defaults.left = margin;
            defaults.right = margin;
        }
        if let Some(margin) = overrides.margin_left {
            defaults.left = margin;
        }
        if let Some(margin) = overrides.margin_right {
            defaults.right = margin;
        }
        if let Some(margin) = overrides.margin_top {
            defaults.top = margin;
        }
        if let Some(margin) = overrides.margin_bottom {
            defaults.bottom = margin;
        }
        if let Some(gap) = overrides.gap {
            defaults.gap = gap;
        }

        if let Some(value) = &overrides.desktop_default_config {
            self.layout.tiled_default = Some(DesktopLayout::parse(value)?);
        }
        for value in &overrides.desktop_configs {
            let (desktop, layout) = parse_desktop_config(value)?;
            self.layout.per_desktop.insert(desktop.to_string(), layout);
        }

        if let Some(debounce_ms) = overrides.debounce_ms {
            self.daemon.debounce_ms = debounce_ms;
        }
        if let Some(path) = &overrides.command_socket {
            self.daemon.command_socket = path.clone();
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }

        self.validate()?;
        self.build_indexes()?;
        Ok(rejected)
    }

    /// Строит индекс переопределений по номеру стола
    fn build_indexes(&mut self) -> Result<()> {
        self.per_desktop_index = self
            .layout
            .per_desktop
            .iter()
            .map(|(key, layout)| {
                key.trim()
                    .parse::<DesktopId>()
                    .map(|desktop| (desktop, *layout))
                    .with_context(|| format!("Неверный номер стола в layout.per_desktop: {:?}", key))
            })
            .collect::<Result<_>>()?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        if self.daemon.debounce_ms == 0 {
            anyhow::bail!("debounce_ms должно быть больше 0");
        }

        if self.daemon.poll_interval_ms == 0 || self.daemon.poll_interval_ms > 1000 {
            anyhow::bail!(
                "poll_interval_ms должно быть в диапазоне 1..=1000, получено {}",
                self.daemon.poll_interval_ms
            );
        }

        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.daemon.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.daemon.poll_interval_ms)
    }

    pub fn command_socket(&self) -> Option<&Path> {
        let path = self.daemon.command_socket.trim();
        (!path.is_empty()).then(|| Path::new(path))
    }

    /// Параметры раскладки стола: переопределение стола > умолчание плиточных столов > глобальное умолчание
    pub fn layout_for(&self, desktop: DesktopId) -> DesktopLayout {
        if let Some(layout) = self.per_desktop_index.get(&desktop) {
            return *layout;
        }
        self.layout.tiled_default.unwrap_or(self.layout.defaults)
    }

    pub fn should_tile(&self, desktop: DesktopId) -> bool {
        self.desktops.tiled.is_empty() || self.desktops.tiled.contains(&desktop)
    }

    /// Заполняет набор плиточных столов, если пользователь его не задал:
    /// один стол (или неизвестно сколько) - только стол 0, иначе все кроме первого.
    pub fn resolve_tiled_desktops(&mut self, desktop_count: Option<u32>) {
        if !self.desktops.tiled.is_empty() {
            return;
        }
        self.desktops.tiled = match desktop_count {
            Some(count) if count > 1 => (1..count).collect(),
            _ => BTreeSet::from([0]),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TilerError;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.debounce(), Duration::from_millis(200));
        assert_eq!(config.command_socket(), Some(Path::new(DEFAULT_COMMAND_SOCKET)));
    }

    #[test]
    fn test_parse_layout_values() {
        let layout = DesktopLayout::parse("10,20,30,40,5").unwrap();
        assert_eq!(
            layout,
            DesktopLayout { top: 10, right: 20, bottom: 30, left: 40, gap: 5 }
        );

        assert_eq!(DesktopLayout::parse("1:2:3:4:5").unwrap().gap, 5);
        assert!(DesktopLayout::parse("1,2,3,4").is_err());
        assert!(DesktopLayout::parse("1,2,3,4,5,6").is_err());
        assert!(DesktopLayout::parse("1,2,x,4,5").is_err());
        assert!(DesktopLayout::parse("1,2,-3,4,5").is_err());
    }

    #[test]
    fn test_parse_desktop_list_and_config() {
        let (desktops, rejected) = parse_desktop_list("1,,3, 2,abc, -4");
        assert_eq!(desktops, BTreeSet::from([1, 2, 3]));
        assert_eq!(rejected, vec!["abc".to_string(), "-4".to_string()]);

        let (desktop, layout) = parse_desktop_config("2:8,0,8,0,4").unwrap();
        assert_eq!(desktop, 2);
        assert_eq!(layout.top, 8);
        assert_eq!(layout.gap, 4);

        assert!(parse_desktop_config("8,0,8,0,4").is_err());
        assert!(parse_desktop_config("x:8,0,8,0,4").is_err());
    }

    #[test]
    fn test_layout_precedence() {
        let mut config = Config::default();
        let overrides = ConfigOverrides {
            gap: Some(3),
            desktop_configs: vec!["2:1,1,1,1,1".to_string()],
            ..Default::default()
        };
        config.apply_overrides(&overrides).unwrap();

        // Глобальное умолчание
        assert_eq!(config.layout_for(1).gap, 3);

        let overrides = ConfigOverrides {
            desktop_default_config: Some("5,5,5,5,7".to_string()),
            ..Default::default()
        };
        config.apply_overrides(&overrides).unwrap();

        // Умолчание плиточных столов важнее глобального
        assert_eq!(config.layout_for(1).gap, 7);
        // Переопределение стола важнее всего
        assert_eq!(config.layout_for(2).gap, 1);
    }

    #[test]
    fn test_margin_overrides() {
        let mut config = Config::default();
        let overrides = ConfigOverrides {
            margin_x: Some(10),
            margin_right: Some(4),
            margin_top: Some(30),
            ..Default::default()
        };
        config.apply_overrides(&overrides).unwrap();

        let layout = config.layout_for(0);
        assert_eq!(layout.left, 10);
        assert_eq!(layout.right, 4);
        assert_eq!(layout.top, 30);
        assert_eq!(layout.bottom, 0);
    }

    #[test]
    fn test_invalid_overrides_rejected() {
        let mut config = Config::default();
        let overrides = ConfigOverrides {
            debounce_ms: Some(0),
            ..Default::default()
        };
        let error = config.apply_overrides(&overrides).unwrap_err();
        assert!(matches!(error, TilerError::Config(_)));
        assert!(!error.is_fatal());

        let mut config = Config::default();
        let overrides = ConfigOverrides {
            log_level: Some("verbose".to_string()),
            ..Default::default()
        };
        assert!(config.apply_overrides(&overrides).is_err());
    }

    #[test]
    fn test_unparsable_tile_desktops_reported() {
        let mut config = Config::default();
        let overrides = ConfigOverrides {
            tile_desktops: Some("1,abc,3".to_string()),
            ..Default::default()
        };
        let rejected = config.apply_overrides(&overrides).unwrap();

        assert_eq!(rejected, vec!["abc".to_string()]);
        assert_eq!(config.desktops.tiled, BTreeSet::from([1, 3]));

        let rejected = config.apply_overrides(&ConfigOverrides::default()).unwrap();
        assert!(rejected.is_empty());
    }

    #[test]
    fn test_should_tile_and_default_set() {
        let mut config = Config::default();
        assert!(config.should_tile(7));

        config.resolve_tiled_desktops(Some(4));
        assert_eq!(config.desktops.tiled, BTreeSet::from([1, 2, 3]));
        assert!(!config.should_tile(0));
        assert!(config.should_tile(3));

        let mut single = Config::default();
        single.resolve_tiled_desktops(Some(1));
        assert_eq!(single.desktops.tiled, BTreeSet::from([0]));

        let mut unknown = Config::default();
        unknown.resolve_tiled_desktops(None);
        assert_eq!(unknown.desktops.tiled, BTreeSet::from([0]));

        // Явно заданный набор не трогаем
        let mut explicit = Config::default();
        explicit.desktops.tiled = BTreeSet::from([5]);
        explicit.resolve_tiled_desktops(Some(10));
        assert_eq!(explicit.desktops.tiled, BTreeSet::from([5]));
    }

    #[test]
    fn test_empty_socket_disables_channel() {
        let mut config = Config::default();
        config.daemon.command_socket = "  ".to_string();
        assert_eq!(config.command_socket(), None);
    }

    #[test]
    fn test_load_from_file_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "wmtiler.toml",
                r#"
                [layout.defaults]
                top = 24
                gap = 6

                [layout.per_desktop.3]
                left = 100

                [desktops]
                tiled = [1, 3]
                "#,
            )?;
            jail.set_env("WMTILER_DAEMON__DEBOUNCE_MS", "350");

            let config = Config::load("wmtiler.toml").expect("config should load");
            assert_eq!(config.layout_for(1).top, 24);
            assert_eq!(config.layout_for(1).gap, 6);
            assert_eq!(config.layout_for(3).left, 100);
            assert_eq!(config.layout_for(3).gap, 0);
            assert_eq!(config.desktops.tiled, BTreeSet::from([1, 3]));
            assert_eq!(config.daemon.debounce_ms, 350);
            assert_eq!(config.daemon.poll_interval_ms, 50);
            Ok(())
        });
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        figment::Jail::expect_with(|_jail| {
            let config = Config::load("absent.toml").expect("defaults should load");
            assert_eq!(config.layout_for(0), DesktopLayout::default());
            assert_eq!(config.daemon.command_socket, DEFAULT_COMMAND_SOCKET);
            Ok(())
        });
    }

    #[test]
    fn test_bad_per_desktop_key_rejected() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("wmtiler.toml", "[layout.per_desktop.main]\ngap = 1\n")?;
            let error = Config::load("wmtiler.toml").unwrap_err();
            assert!(matches!(error, TilerError::Config(_)));
            Ok(())
        });
    }
}
