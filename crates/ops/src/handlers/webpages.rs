//! Web browsers.

use async_trait::async_trait;
use vdm_detect::{OperationDescriptor, Software};
use vdm_state::OperationResult;

use super::app::{AppCore, AppProfile, Launcher, Matcher, Template};
use super::state::HandlerState;
use super::HandlerContext;
use crate::error::OpsResult;
use crate::operation::{Operation, TemplateId};

static PAGES: &[Template] = &[
    Template {
        matcher: Matcher::Schemes(&["http", "https"]),
        id: TemplateId("web-page"),
    },
    Template {
        matcher: Matcher::Schemes(&["file"]),
        id: TemplateId("local-page"),
    },
    Template {
        matcher: Matcher::Extensions(&["html", "htm", "xhtml"]),
        id: TemplateId("local-page"),
    },
];

static CHROME: AppProfile = AppProfile {
    software: Software::Chrome,
    linux: Launcher {
        program: "google-chrome",
        args: &[],
    },
    windows: Launcher {
        program: "chrome.exe",
        args: &[],
    },
    templates: PAGES,
    requires_document: false,
};

static FIREFOX: AppProfile = AppProfile {
    software: Software::Firefox,
    linux: Launcher {
        program: "firefox",
        args: &["--new-tab"],
    },
    windows: Launcher {
        program: "firefox.exe",
        args: &["--new-tab"],
    },
    templates: PAGES,
    requires_document: false,
};

/// Handler for a web browser. The "document" is the page URL.
pub struct Browser {
    core: AppCore,
}

impl Browser {
    pub fn chrome(ctx: HandlerContext) -> Self {
        Self {
            core: AppCore::new(&CHROME, ctx),
        }
    }

    pub fn firefox(ctx: HandlerContext) -> Self {
        Self {
            core: AppCore::new(&FIREFOX, ctx),
        }
    }
}

#[async_trait]
impl Operation for Browser {
    fn descriptor(&self) -> OperationDescriptor {
        self.core.descriptor()
    }

    fn resolve_template(&self, path: &str) -> OpsResult<TemplateId> {
        self.core.resolve_template(path)
    }

    async fn load(&self, code: i32, param: Option<&str>) -> OpsResult<()> {
        self.core.load(code, param).await
    }

    async fn fetch(&self, code: i32) -> OpsResult<OperationResult> {
        self.core.fetch_with(code, |record, url| {
            record.insert("url", url);
        })
    }

    fn snapshot(&self) -> OperationResult {
        self.core.state.snapshot()
    }

    fn validate_state(&self, state: &OperationResult) -> OpsResult<()> {
        HandlerState::validate(state)
    }

    fn restore(&self, state: &OperationResult) -> OpsResult<()> {
        self.core.state.restore(state)
    }

    fn reset(&self) {
        self.core.state.reset();
    }
}
