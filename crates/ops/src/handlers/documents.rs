//! Office document viewers and editors.

use async_trait::async_trait;
use vdm_detect::{OperationDescriptor, Software};
use vdm_state::OperationResult;

use super::app::{AppCore, AppProfile, Launcher, Matcher, Template};
use super::HandlerContext;
use crate::error::OpsResult;
use crate::operation::{Operation, TemplateId};

static FOXIT_READER: AppProfile = AppProfile {
    software: Software::FoxitReader,
    linux: Launcher {
        program: "FoxitReader",
        args: &[],
    },
    windows: Launcher {
        program: "FoxitReader.exe",
        args: &[],
    },
    templates: &[
        Template {
            matcher: Matcher::Extensions(&["pdf"]),
            id: TemplateId("pdf-document"),
        },
        Template {
            matcher: Matcher::Extensions(&["fdf"]),
            id: TemplateId("pdf-form"),
        },
    ],
    requires_document: true,
};

static WPS_WRITER: AppProfile = AppProfile {
    software: Software::WpsWriter,
    linux: Launcher {
        program: "wps",
        args: &[],
    },
    windows: Launcher {
        program: "wps.exe",
        args: &[],
    },
    templates: &[
        Template {
            matcher: Matcher::Extensions(&["doc", "docx", "wps", "rtf"]),
            id: TemplateId("text-document"),
        },
        Template {
            matcher: Matcher::Extensions(&["dotx"]),
            id: TemplateId("document-template"),
        },
    ],
    requires_document: true,
};

static WPS_PPT: AppProfile = AppProfile {
    software: Software::WpsPpt,
    linux: Launcher {
        program: "wpp",
        args: &[],
    },
    windows: Launcher {
        program: "wpp.exe",
        args: &[],
    },
    templates: &[
        Template {
            matcher: Matcher::Extensions(&["ppt", "pptx", "dps"]),
            id: TemplateId("presentation"),
        },
        Template {
            matcher: Matcher::Extensions(&["pps"]),
            id: TemplateId("slide-show"),
        },
    ],
    requires_document: true,
};

/// Handler for an application that always works on a document file.
pub struct DocumentApp {
    core: AppCore,
}

impl DocumentApp {
    pub fn foxit_reader(ctx: HandlerContext) -> Self {
        Self {
            core: AppCore::new(&FOXIT_READER, ctx),
        }
    }

    pub fn wps_writer(ctx: HandlerContext) -> Self {
        Self {
            core: AppCore::new(&WPS_WRITER, ctx),
        }
    }

    pub fn wps_ppt(ctx: HandlerContext) -> Self {
        Self {
            core: AppCore::new(&WPS_PPT, ctx),
        }
    }
}

#[async_trait]
impl Operation for DocumentApp {
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
        self.core.fetch_with(code, |record, document| {
            if let Ok(template) = self.core.resolve_template(document) {
                record.insert("template", template.as_str());
            }
        })
    }

    fn snapshot(&self) -> OperationResult {
        self.core.state.snapshot()
    }

    fn validate_state(&self, state: &OperationResult) -> OpsResult<()> {
        super::state::HandlerState::validate(state)
    }

    fn restore(&self, state: &OperationResult) -> OpsResult<()> {
        self.core.state.restore(state)
    }

    fn reset(&self) {
        self.core.state.reset();
    }
}
