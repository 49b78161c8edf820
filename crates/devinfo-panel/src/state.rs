use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use devinfo_core::{
    Connector, DeveloperBinder, SnapshotSource, StatusBinder, TrackedApplication,
};
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Connection,
    Developer,
}

impl View {
    pub fn title(self) -> &'static str {
        match self {
            View::Connection => "Connection",
            View::Developer => "Developer",
        }
    }

    pub fn next(self) -> Self {
        match self {
            View::Connection => View::Developer,
            View::Developer => View::Connection,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "connection" | "status" | "conn" => Some(View::Connection),
            "developer" | "dev" => Some(View::Developer),
            _ => None,
        }
    }
}

/// The component currently mounted for the active view.
pub enum Mounted {
    Status(StatusBinder),
    Developer(DeveloperBinder),
}

impl Mounted {
    fn mount<S>(view: View, source: &Arc<S>, descriptor: &TrackedApplication) -> Self
    where
        S: Connector + SnapshotSource + 'static,
    {
        match view {
            View::Connection => {
                Mounted::Status(StatusBinder::mount(source.clone(), descriptor.clone()))
            }
            View::Developer => {
                Mounted::Developer(DeveloperBinder::mount(source.clone(), descriptor.clone()))
            }
        }
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        match self {
            Mounted::Status(binder) => binder.is_pending(),
            Mounted::Developer(binder) => binder.is_pending(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mounted::Status(binder) => binder.state().label(),
            Mounted::Developer(binder) => binder.state().label(),
        }
    }

    async fn changed(&mut self) {
        match self {
            Mounted::Status(binder) => binder.changed().await,
            Mounted::Developer(binder) => binder.changed().await,
        }
    }

    /// Detaches the in-flight attempt; its result is discarded.
    fn unmount(self) {
        let _ = match self {
            Mounted::Status(binder) => binder.unmount(),
            Mounted::Developer(binder) => binder.unmount(),
        };
    }
}

pub struct App<S> {
    source: Arc<S>,
    pub descriptor: TrackedApplication,
    pub service_url: String,
    pub view: View,
    mounted: Option<Mounted>,
    pub mounts: u64,
    pub scroll: u16,
    pub help_open: bool,
    should_quit: bool,
}

impl<S> App<S> {
    pub fn mounted(&self) -> Option<&Mounted> {
        self.mounted.as_ref()
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.mounted.as_ref().is_some_and(Mounted::is_pending)
    }

    pub fn phase_label(&self) -> &'static str {
        self.mounted.as_ref().map_or("unmounted", Mounted::label)
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Resolves once the mounted attempt settles.
    pub async fn mount_changed(&mut self) {
        match self.mounted.as_mut() {
            Some(mounted) => mounted.changed().await,
            None => std::future::pending::<()>().await,
        }
    }

    fn unmount(&mut self) {
        if let Some(previous) = self.mounted.take() {
            previous.unmount();
        }
    }
}

impl<S> App<S>
where
    S: Connector + SnapshotSource + 'static,
{
    pub fn new(
        source: Arc<S>,
        descriptor: TrackedApplication,
        service_url: impl Into<String>,
        view: View,
    ) -> Self {
        let mut app = Self {
            source,
            descriptor,
            service_url: service_url.into(),
            view,
            mounted: None,
            mounts: 0,
            scroll: 0,
            help_open: false,
            should_quit: false,
        };
        app.mount();
        app
    }

    fn mount(&mut self) {
        self.unmount();
        self.mounts += 1;
        self.scroll = 0;
        info!(
            event = "panel_mount",
            view = self.view.title(),
            mount = self.mounts
        );
        self.mounted = Some(Mounted::mount(self.view, &self.source, &self.descriptor));
    }

    pub fn remount(&mut self) {
        self.mount();
    }

    pub fn switch_view(&mut self, view: View) {
        if self.view == view {
            return;
        }
        self.view = view;
        self.mount();
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        if matches!(key.code, KeyCode::Char('?') | KeyCode::F(1)) {
            self.help_open = !self.help_open;
            return;
        }
        if key.code == KeyCode::Esc && self.help_open {
            self.help_open = false;
            return;
        }
        if self.help_open {
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('1') => self.switch_view(View::Connection),
            KeyCode::Char('2') => self.switch_view(View::Developer),
            KeyCode::Tab => self.switch_view(self.view.next()),
            KeyCode::Char('r') => self.remount(),
            KeyCode::Down | KeyCode::Char('j') => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Char('g') => self.scroll = 0,
            _ => {}
        }
    }
}
