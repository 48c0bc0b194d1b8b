//! Plain-text and markdown editors.

use async_trait::async_trait;
use vdm_detect::{OperationDescriptor, Software};
use vdm_state::OperationResult;

use super::app::{AppCore, AppProfile, Launcher, Matcher, Template};
use super::state::HandlerState;
use super::HandlerContext;
use crate::error::OpsResult;
use crate::operation::{Operation, TemplateId};

const PLAIN_TEXT: &[&str] = &["txt", "text", "log", "conf", "ini", "csv"];
const SOURCE: &[&str] = &[
    "rs", "py", "c", "h", "cpp", "hpp", "js", "ts", "json", "toml", "yaml", "yml", "sh", "xml",
];

static GEDIT: AppProfile = AppProfile {
    software: Software::Gedit,
    linux: Launcher {
        program: "gedit",
        args: &[],
    },
    windows: Launcher {
        program: "gedit.exe",
        args: &[],
    },
    templates: &[Template {
        matcher: Matcher::Extensions(PLAIN_TEXT),
        id: TemplateId("plain-text"),
    }],
    requires_document: false,
};

static TYPORA: AppProfile = AppProfile {
    software: Software::Typora,
    linux: Launcher {
        program: "typora",
        args: &[],
    },
    windows: Launcher {
        program: "Typora.exe",
        args: &[],
    },
    templates: &[Template {
        matcher: Matcher::Extensions(&["md", "markdown"]),
        id: TemplateId("markdown"),
    }],
    requires_document: false,
};

static SUBLIME: AppProfile = AppProfile {
    software: Software::Sublime,
    linux: Launcher {
        program: "sublime_text",
        args: &[],
    },
    windows: Launcher {
        program: "sublime_text.exe",
        args: &[],
    },
    templates: &[
        Template {
            matcher: Matcher::Extensions(PLAIN_TEXT),
            id: TemplateId("plain-text"),
        },
        Template {
            matcher: Matcher::Extensions(&["md", "markdown"]),
            id: TemplateId("markdown"),
        },
        Template {
            matcher: Matcher::Extensions(SOURCE),
            id: TemplateId("source-code"),
        },
    ],
    requires_document: false,
};

/// Handler for a text editor. Opening without a file starts an empty buffer.
pub struct NoteEditor {
    core: AppCore,
}

impl NoteEditor {
    pub fn gedit(ctx: HandlerContext) -> Self {
        Self {
            core: AppCore::new(&GEDIT, ctx),
        }
    }

    pub fn typora(ctx: HandlerContext) -> Self {
        Self {
            core: AppCore::new(&TYPORA, ctx),
        }
    }

    pub fn sublime(ctx: HandlerContext) -> Self {
        Self {
            core: AppCore::new(&SUBLIME, ctx),
        }
    }
}

#[async_trait]
impl Operation for NoteEditor {
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
        HandlerState::validate(state)
    }

    fn restore(&self, state: &OperationResult) -> OpsResult<()> {
        self.core.state.restore(state)
    }

    fn reset(&self) {
        self.core.state.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Platform;
    use crate::environment::{RecordedCall, ScriptedResponse};
    use crate::error::OpsError;
    use crate::handlers::test_support::fixture;

    #[test]
    fn test_sublime_prefers_text_then_markdown_then_source() {
        let fx = fixture(Platform::Linux);
        let sublime = NoteEditor::sublime(fx.ctx);
        assert_eq!(sublime.resolve_template("a.log").unwrap(), TemplateId("plain-text"));
        assert_eq!(sublime.resolve_template("README.md").unwrap(), TemplateId("markdown"));
        assert_eq!(sublime.resolve_template("main.rs").unwrap(), TemplateId("source-code"));
        assert!(sublime.resolve_template("photo.png").is_err());
    }

    #[test]
    fn test_typora_only_markdown() {
        let fx = fixture(Platform::Linux);
        let typora = NoteEditor::typora(fx.ctx);
        assert!(typora.resolve_template("notes.markdown").is_ok());
        assert!(matches!(
            typora.resolve_template("notes.txt"),
            Err(OpsError::UnsupportedFormat { .. })
        ));
    }

    #[tokio::test]
    async fn test_open_without_document_starts_empty_editor() {
        let fx = fixture(Platform::Linux);
        let gedit = NoteEditor::gedit(fx.ctx);
        gedit.load(0, None).await.unwrap();

        assert_eq!(
            fx.env.calls(),
            vec![RecordedCall::Launch {
                program: "gedit".to_string(),
                args: vec![],
            }]
        );
        let state = gedit.fetch(0).await.unwrap();
        assert_eq!(state.get_str("document"), None);
        assert_eq!(state.get_int("instances"), Some(1));
    }

    #[tokio::test]
    async fn test_snapshot_restore_reset() {
        let fx = fixture(Platform::Linux);
        let typora = NoteEditor::typora(fx.ctx.clone());
        typora.load(0, Some("/home/u/todo.md")).await.unwrap();
        typora.fetch(0).await.unwrap();
        let saved = typora.snapshot();
        assert_eq!(saved.get_str("document"), Some("/home/u/todo.md"));
        assert!(saved.get_map("last_fetch").is_some());

        let fresh = NoteEditor::typora(fx.ctx);
        fresh.restore(&saved).unwrap();
        assert_eq!(fresh.snapshot(), saved);
        // cached fetch comes from the restored snapshot
        assert_eq!(fresh.fetch(1).await.unwrap().get_str("template"), Some("markdown"));

        fresh.reset();
        assert_eq!(fresh.snapshot().get_str("document"), None);
    }

    #[test]
    fn test_restore_rejects_malformed_state() {
        let fx = fixture(Platform::Linux);
        let gedit = NoteEditor::gedit(fx.ctx);
        let bad = OperationResult::new().with("last_fetch", "yesterday");
        assert!(matches!(gedit.restore(&bad), Err(OpsError::MalformedState(_))));
    }

    #[tokio::test]
    async fn test_stop_surfaces_slow_terminate_as_timeout() {
        let fx = fixture(Platform::Windows);
        fx.env.respond_terminate(ScriptedResponse::Timeout { seconds: 10 });
        let gedit = NoteEditor::gedit(fx.ctx);
        gedit.load(0, Some(r"C:\notes\todo.txt")).await.unwrap();

        let err = gedit.load(1, None).await.unwrap_err();
        assert!(matches!(err, OpsError::Timeout { seconds: 10 }));
        // still running, so a later fetch sees it
        assert_eq!(gedit.fetch(0).await.unwrap().get_int("running"), Some(1));
    }
}
