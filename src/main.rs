use anyhow::{Context, Result};
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
mod config;
mod error;
mod events;
mod services;
mod utils;

use config::{Config, ConfigOverrides};
use events::Command;
use services::{
    desktop::DesktopSource,
    send_command,
    CommandQueue,
    CommandServer,
    ControlLoop,
    DesktopBackend,
    DryRun,
    Tiler,
    X11Desktop,
};

#[derive(Parser, Debug)]
#[command(name = "wmtiler", version)]
#[command(about = "Раскладывает окна текущего рабочего стола X11 плиткой")]
struct Args {
    /// Работать в фоне и следить за событиями X11
    #[arg(long)]
    daemon: bool,

    /// Номера плиточных столов через запятую
    #[arg(long, value_name = "1,2,3")]
    tile_desktops: Option<String>,

    /// Горизонтальный отступ по умолчанию, слева и справа
    #[arg(long, value_name = "PX")]
    margin_x: Option<u32>,

    #[arg(long, value_name = "PX")]
    margin_left: Option<u32>,

    #[arg(long, value_name = "PX")]
    margin_right: Option<u32>,

    #[arg(long, value_name = "PX")]
    margin_top: Option<u32>,

    #[arg(long, value_name = "PX")]
    margin_bottom: Option<u32>,

    /// Зазор между окнами по умолчанию
    #[arg(long, value_name = "PX")]
    gap: Option<u32>,

    /// Раскладка для отдельного стола (можно повторять)
    #[arg(long, value_name = "N:TOP,RIGHT,BOTTOM,LEFT,GAP")]
    desktop_config: Vec<String>,

    /// Раскладка по умолчанию для плиточных столов
    #[arg(long, value_name = "TOP,RIGHT,BOTTOM,LEFT,GAP")]
    desktop_default_config: Option<String>,

    /// Пауза после последнего события перед перераскладкой
    #[arg(long, value_name = "MS")]
    debounce_ms: Option<u64>,

    /// Путь к UNIX-сокету канала команд
    #[arg(long, value_name = "PATH")]
    command_socket: Option<String>,

    /// Отправить "move-left" запущенному демону
    #[arg(long, conflicts_with_all = ["move_right", "daemon"])]
    move_left: bool,

    /// Отправить "move-right" запущенному демону
    #[arg(long, conflicts_with = "daemon")]
    move_right: bool,

    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "wmtiler.toml")]
    config: String,

    /// Режим сухого запуска (без реальных действий)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            tile_desktops: self.tile_desktops.clone(),
            margin_x: self.margin_x,
            margin_left: self.margin_left,
            margin_right: self.margin_right,
            margin_top: self.margin_top,
            margin_bottom: self.margin_bottom,
            gap: self.gap,
            desktop_configs: self.desktop_config.clone(),
            desktop_default_config: self.desktop_default_config.clone(),
            debounce_ms: self.debounce_ms,
            command_socket: self.command_socket.clone(),
            log_level: self.log_level.clone(),
        }
    }

    fn command(&self) -> Option<Command> {
        if self.move_left {
            Some(Command::MoveLeft)
        } else if self.move_right {
            Some(Command::MoveRight)
        } else {
            None
        }
    }
}

/// Разбор аргументов: `--help`/`--version` завершаются с кодом 0, любая ошибка - с кодом 1
fn parse_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();

    // Ошибки конфигурации прерывают запуск до подключения к X-серверу
    let mut config = Config::load(&args.config)?;
    let rejected_desktops = config.apply_overrides(&args.overrides())?;

    // Инициализация системы логирования
    init_tracing(&config.logging.level)?;

    for token in &rejected_desktops {
        warn!("Не удалось разобрать номер стола: {}", token);
    }

    if let Some(command) = args.command() {
        let path = config
            .command_socket()
            .context("Путь к сокету команд не задан")?;
        send_command(path, command).await?;
        return Ok(());
    }

    info!("Запуск wmtiler v{}", env!("CARGO_PKG_VERSION"));

    let desktop = X11Desktop::connect()?;
    config.resolve_tiled_desktops(desktop.desktop_count()?);
    let config = Arc::new(config);

    if args.dry_run {
        warn!("Режим сухого запуска - реальные действия отключены");
        run(DryRun::new(desktop), config, args.daemon).await
    } else {
        run(desktop, config, args.daemon).await
    }
}

async fn run<B>(mut backend: B, config: Arc<Config>, daemon: bool) -> Result<()>
where
    B: DesktopBackend + 'static,
{
    if daemon {
        return run_daemon(backend, config).await;
    }

    let tiled = Tiler::new(config).tile_current(&mut backend)?;
    info!("Разложено окон: {}", tiled);
    Ok(())
}

async fn run_daemon<B>(backend: B, config: Arc<Config>) -> Result<()>
where
    B: DesktopBackend + 'static,
{
    info!("Режим демона. Плиточные столы: {:?}", config.desktops.tiled);

    let commands = Arc::new(CommandQueue::new());
    let server = match config.command_socket() {
        Some(path) => match CommandServer::start(path, Arc::clone(&commands)) {
            Ok(server) => Some(server),
            Err(e) => {
                warn!("Работаем без канала команд: {}", e);
                None
            }
        },
        None => {
            info!("Канал команд отключён в конфигурации");
            None
        }
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    let mut control = ControlLoop::new(Arc::clone(&config), backend, commands);
    let flag = Arc::clone(&shutdown);
    let mut control_handle = tokio::task::spawn_blocking(move || control.run(&flag));

    // Ожидание сигнала завершения или аварийного выхода цикла управления
    let joined = tokio::select! {
        joined = &mut control_handle => joined,
        _ = shutdown_signal() => {
            info!("Завершение работы...");
            shutdown.store(true, Ordering::SeqCst);
            control_handle.await
        }
    };

    if let Some(server) = server {
        server.stop().await;
    }

    joined.map_err(|e| crate::tiler_error!(internal, "цикл управления аварийно завершился: {}", e))??;

    info!("wmtiler завершил работу");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal as unix_signal, SignalKind};

    let mut terminate = match unix_signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(e) => {
            warn!("Не удалось подписаться на SIGTERM: {}", e);
            let _ = signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = signal::ctrl_c() => info!("Получен сигнал завершения (Ctrl+C)"),
        _ = terminate.recv() => info!("Получен сигнал SIGTERM"),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    Ok(())
}
