use std::{
    env, fs,
    path::{Path, PathBuf},
    thread,
    time::{Duration, SystemTime},
};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use noreel_core::{
    CustomizationScript, Injector, PreferenceStore, ScriptHost, Section,
    prefs::default_data_dir,
    site::{self, Navigation},
};
use tao::{
    dpi::LogicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy},
    keyboard::{Key, ModifiersState},
    window::{Window, WindowBuilder},
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use wry::{PageLoadEvent, WebContext, WebView, WebViewBuilder};

/// Web view profile (cookies, local storage, cache) under the data dir.
const WEBVIEW_DIR: &str = "webview";
const PREFERENCE_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "noreel", version, about = "Instagram without Reels and friends")]
struct Cli {
    /// Where preferences and the web view profile live.
    #[arg(long, env = "NOREEL_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the browser window (default).
    Run {
        #[arg(long, default_value = site::HOME_URL)]
        url: String,
    },
    /// Print the current hiding preferences.
    Show,
    /// Hide or show a section: `noreel set shop on`.
    Set {
        section: Section,
        #[arg(action = clap::ArgAction::Set, value_parser = parse_toggle)]
        hide: bool,
    },
    /// Delete cookies, storage and cache of the embedded browser.
    ClearData,
}

fn parse_toggle(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "hide" | "1" => Ok(true),
        "off" | "false" | "show" | "0" => Ok(false),
        other => Err(format!("expected on or off, got '{other}'")),
    }
}

#[derive(Debug)]
enum UserEvent {
    PageStarted(String),
    PageFinished(String),
    PreferencesTouched,
}

fn main() -> anyhow::Result<()> {
    let rust_log = env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let env_filter = match rust_log.is_empty() {
        true => EnvFilter::builder().parse_lossy("info"),
        false => EnvFilter::builder().parse_lossy(rust_log),
    };
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    let command = cli.command.unwrap_or(Command::Run {
        url: site::HOME_URL.to_string(),
    });
    match command {
        Command::Run { url } => run_shell(&data_dir, &url),
        Command::Show => show_preferences(&data_dir),
        Command::Set { section, hide } => set_preference(&data_dir, section, hide),
        Command::ClearData => clear_data(&data_dir),
    }
}

fn show_preferences(data_dir: &Path) -> anyhow::Result<()> {
    let prefs = PreferenceStore::open(data_dir).context("Failed to load preferences")?;
    println!("Preferences: {}", prefs.path().display());
    for section in Section::ALL {
        let state = if prefs.get(section) { "hidden" } else { "shown" };
        println!("  {section:<8} {state}");
    }
    Ok(())
}

fn set_preference(data_dir: &Path, section: Section, hide: bool) -> anyhow::Result<()> {
    let mut prefs = PreferenceStore::open(data_dir).context("Failed to load preferences")?;
    let changed = prefs
        .set(section, hide)
        .with_context(|| format!("Failed to update {section}"))?;
    let state = if hide { "hidden" } else { "shown" };
    match changed {
        true => println!("{section} is now {state}"),
        false => println!("{section} was already {state}"),
    }
    Ok(())
}

fn clear_data(data_dir: &Path) -> anyhow::Result<()> {
    let profile = data_dir.join(WEBVIEW_DIR);
    if !profile.exists() {
        info!("Nothing to clear at {}", profile.display());
        return Ok(());
    }
    fs::remove_dir_all(&profile)
        .with_context(|| format!("Failed to remove {}", profile.display()))?;
    info!("🧹 Cleared browsing data at {}", profile.display());
    Ok(())
}

struct Shell {
    webview: WebView,
    injector: Injector,
    // Both must outlive the web view.
    _web_context: WebContext,
    _window: Window,
}

impl ScriptHost for Shell {
    fn evaluate(&mut self, script: &CustomizationScript) {
        if let Err(err) = self.webview.evaluate_script(script.source()) {
            warn!("Failed to inject customization: {err}");
        }
    }
}

impl Shell {
    fn run_script(&mut self, script: Option<CustomizationScript>) {
        if let Some(script) = script {
            self.evaluate(&script);
        }
    }

    fn eval_js(&self, js: &str) {
        if let Err(err) = self.webview.evaluate_script(js) {
            warn!("Script evaluation failed: {err}");
        }
    }
}

fn run_shell(data_dir: &Path, start_url: &str) -> anyhow::Result<()> {
    info!("🚀 Starting NoReel");
    info!("📂 Data Directory: {}", data_dir.display());

    if !data_dir.exists() {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data dir {}", data_dir.display()))?;
    }
    let mut prefs = PreferenceStore::open(data_dir).context("Failed to load preferences")?;
    debug!(config = ?prefs.config(), "Loaded preferences");

    let event_loop = EventLoopBuilder::<UserEvent>::with_user_event().build();
    let proxy = event_loop.create_proxy();

    let window = WindowBuilder::new()
        .with_title("NoReel")
        .with_inner_size(LogicalSize::new(430.0, 900.0))
        .build(&event_loop)
        .context("Failed to create window")?;

    let mut web_context = WebContext::new(Some(data_dir.join(WEBVIEW_DIR)));
    let load_proxy = proxy.clone();
    let builder = WebViewBuilder::new_with_web_context(&mut web_context)
        .with_url(start_url)
        .with_user_agent(site::MOBILE_USER_AGENT)
        .with_navigation_handler(|url: String| match site::classify_navigation(&url) {
            Navigation::Stay => true,
            Navigation::OpenExternal(target) => {
                open_external(target.as_str());
                false
            }
        })
        .with_download_started_handler(|url: String, _destination: &mut PathBuf| {
            open_external(&url);
            false
        })
        .with_on_page_load_handler(move |event, url| {
            let event = match event {
                PageLoadEvent::Started => UserEvent::PageStarted(url),
                PageLoadEvent::Finished => UserEvent::PageFinished(url),
            };
            let _ = load_proxy.send_event(event);
        });
    let webview = build_webview(builder, &window)?;

    spawn_preference_watcher(prefs.path().to_path_buf(), proxy);

    let mut shell = Shell {
        webview,
        injector: Injector::new(),
        _web_context: web_context,
        _window: window,
    };
    let mut modifiers = ModifiersState::default();

    info!("✅ Window ready, loading {start_url}");
    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(UserEvent::PageStarted(url)) => {
                debug!("Page started: {url}");
                shell.injector.on_page_started();
            }
            Event::UserEvent(UserEvent::PageFinished(url)) => {
                debug!("Page finished: {url}");
                let script = shell.injector.on_page_ready(prefs.config());
                shell.run_script(script);
            }
            Event::UserEvent(UserEvent::PreferencesTouched) => match prefs.reload() {
                Ok(changed) => {
                    for key in changed {
                        info!("Preference changed: {key}");
                        let script = shell.injector.on_preference_changed(key, prefs.config());
                        shell.run_script(script);
                    }
                }
                Err(err) => warn!("Ignoring unreadable preferences: {err}"),
            },
            Event::WindowEvent {
                event: WindowEvent::Focused(true),
                ..
            } => {
                if let Err(err) = prefs.reload() {
                    warn!("Ignoring unreadable preferences: {err}");
                }
                let script = shell.injector.on_resume(prefs.config());
                shell.run_script(script);
            }
            Event::WindowEvent {
                event: WindowEvent::ModifiersChanged(state),
                ..
            } => modifiers = state,
            Event::WindowEvent {
                event:
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                logical_key,
                                state: ElementState::Pressed,
                                ..
                            },
                        ..
                    },
                ..
            } => match logical_key {
                Key::F5 => shell.eval_js("window.location.reload();"),
                Key::Character(c) if modifiers.control_key() && c.eq_ignore_ascii_case("r") => {
                    shell.eval_js("window.location.reload();")
                }
                Key::ArrowLeft if modifiers.alt_key() => shell.eval_js("window.history.back();"),
                _ => {}
            },
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                info!("👋 Closing NoReel");
                *control_flow = ControlFlow::Exit;
            }
            _ => {}
        }
    })
}

fn build_webview(builder: WebViewBuilder<'_>, window: &Window) -> anyhow::Result<WebView> {
    #[cfg(any(
        target_os = "windows",
        target_os = "macos",
        target_os = "ios",
        target_os = "android"
    ))]
    let webview = builder.build(window);

    #[cfg(not(any(
        target_os = "windows",
        target_os = "macos",
        target_os = "ios",
        target_os = "android"
    )))]
    let webview = {
        use tao::platform::unix::WindowExtUnix;
        use wry::WebViewBuilderExtUnix;
        let vbox = window
            .default_vbox()
            .ok_or_else(|| anyhow!("Window has no GTK container"))?;
        builder.build_gtk(vbox)
    };

    webview.context("Failed to create web view")
}

fn open_external(url: &str) {
    info!("Opening externally: {url}");
    if let Err(err) = open::that_detached(url) {
        error!("Failed to open {url}: {err}");
    }
}

/// Polls the preference file and pokes the event loop when it changes, so
/// `noreel set ...` from another terminal takes effect in a running window.
fn spawn_preference_watcher(path: PathBuf, proxy: EventLoopProxy<UserEvent>) {
    thread::spawn(move || {
        let mut last = modified_at(&path);
        loop {
            thread::sleep(PREFERENCE_POLL_INTERVAL);
            let current = modified_at(&path);
            if current == last {
                continue;
            }
            last = current;
            if proxy.send_event(UserEvent::PreferencesTouched).is_err() {
                break;
            }
        }
    });
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_parse() {
        assert_eq!(parse_toggle("ON"), Ok(true));
        assert_eq!(parse_toggle("hide"), Ok(true));
        assert_eq!(parse_toggle("off"), Ok(false));
        assert!(parse_toggle("maybe").is_err());
    }

    #[test]
    fn cli_parses_set_and_defaults_to_run() {
        let cli = Cli::try_parse_from(["noreel", "set", "threads", "on"]).expect("valid args");
        assert!(matches!(
            cli.command,
            Some(Command::Set {
                section: Section::Threads,
                hide: true
            })
        ));

        let cli = Cli::try_parse_from(["noreel", "--data-dir", "/tmp/x"]).expect("valid args");
        assert!(cli.command.is_none());
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));

        assert!(Cli::try_parse_from(["noreel", "set", "stories", "on"]).is_err());
    }
}
