//! Built-in handlers, one per supported application.

mod app;
mod documents;
mod entities;
mod notes;
mod os_status;
mod state;
mod webpages;

pub use documents::DocumentApp;
pub use entities::Notifier;
pub use notes::NoteEditor;
pub use os_status::Modifier;
pub use webpages::Browser;

use std::sync::Arc;

use vdm_detect::{ProcessProbe, Software, SysinfoProbe, KNOWN_APPLICATIONS};

use crate::config::{OpsConfig, Platform};
use crate::environment::{RealSystemEnvironment, SystemEnvironment};
use crate::operation::Operation;

/// Everything a handler needs from the outside world.
#[derive(Clone)]
pub struct HandlerContext {
    pub config: OpsConfig,
    pub env: Arc<dyn SystemEnvironment>,
    pub probe: Arc<dyn ProcessProbe>,
}

impl HandlerContext {
    pub fn new(
        config: OpsConfig,
        env: Arc<dyn SystemEnvironment>,
        probe: Arc<dyn ProcessProbe>,
    ) -> Self {
        Self { config, env, probe }
    }

    /// Real process execution and sysinfo-backed discovery.
    pub fn system(config: OpsConfig) -> Self {
        let env = Arc::new(RealSystemEnvironment::new(config.executor_config()));
        Self::new(config, env, Arc::new(SysinfoProbe::new()))
    }
}

/// Process names of `software` on `platform`.
pub(crate) fn process_names(software: Software, platform: Platform) -> Vec<&'static str> {
    let windows = platform == Platform::Windows;
    KNOWN_APPLICATIONS
        .iter()
        .filter(|(name, sw)| *sw == software && name.ends_with(".exe") == windows)
        .map(|(name, _)| *name)
        .collect()
}

/// One handler for every supported application.
pub fn standard_handlers(ctx: &HandlerContext) -> Vec<Arc<dyn Operation>> {
    vec![
        Arc::new(DocumentApp::foxit_reader(ctx.clone())),
        Arc::new(DocumentApp::wps_writer(ctx.clone())),
        Arc::new(DocumentApp::wps_ppt(ctx.clone())),
        Arc::new(Notifier::new(ctx.clone())),
        Arc::new(NoteEditor::gedit(ctx.clone())),
        Arc::new(NoteEditor::typora(ctx.clone())),
        Arc::new(NoteEditor::sublime(ctx.clone())),
        Arc::new(Modifier::new(ctx.clone())),
        Arc::new(Browser::chrome(ctx.clone())),
        Arc::new(Browser::firefox(ctx.clone())),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::environment::RecordingEnvironment;
    use vdm_detect::InMemoryProbe;

    pub(crate) struct Fixture {
        pub ctx: HandlerContext,
        pub env: Arc<RecordingEnvironment>,
        pub probe: Arc<InMemoryProbe>,
    }

    pub(crate) fn fixture(platform: Platform) -> Fixture {
        let probe = Arc::new(InMemoryProbe::new());
        let env = Arc::new(RecordingEnvironment::with_probe(probe.clone()));
        let config = OpsConfig {
            platform,
            launch_settle_ms: 20,
            ..Default::default()
        };
        Fixture {
            ctx: HandlerContext::new(config, env.clone(), probe.clone()),
            env,
            probe,
        }
    }
}
