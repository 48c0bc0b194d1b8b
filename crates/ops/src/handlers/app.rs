//! Shared behavior for handlers that drive a desktop application process.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};
use vdm_detect::{OperationDescriptor, ProcessInfo, Software};
use vdm_exec::retry_with_timeout;
use vdm_state::OperationResult;

use super::state::StateCell;
use super::{process_names, HandlerContext};
use crate::config::Platform;
use crate::error::{OpsError, OpsResult};
use crate::event::{FetchCode, LoadCode};
use crate::operation::TemplateId;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How a template recognizes a path.
pub(crate) enum Matcher {
    /// Lowercase file extensions, without the dot.
    Extensions(&'static [&'static str]),
    /// URL schemes, without `://`.
    Schemes(&'static [&'static str]),
}

pub(crate) struct Template {
    pub matcher: Matcher,
    pub id: TemplateId,
}

impl Template {
    fn matches(&self, path: &str) -> bool {
        match self.matcher {
            Matcher::Extensions(exts) => Path::new(path)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| exts.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false),
            Matcher::Schemes(schemes) => {
                let lower = path.to_ascii_lowercase();
                schemes.iter().any(|s| {
                    lower
                        .strip_prefix(s)
                        .is_some_and(|rest| rest.starts_with("://"))
                })
            }
        }
    }
}

/// First template in `templates` that accepts `path`.
pub(crate) fn match_template(
    descriptor: OperationDescriptor,
    templates: &[Template],
    path: &str,
) -> OpsResult<TemplateId> {
    templates
        .iter()
        .find(|t| t.matches(path))
        .map(|t| t.id)
        .ok_or_else(|| OpsError::UnsupportedFormat {
            descriptor,
            path: path.to_string(),
        })
}

/// Program and fixed arguments used to start an application.
pub(crate) struct Launcher {
    pub program: &'static str,
    pub args: &'static [&'static str],
}

pub(crate) struct AppProfile {
    pub software: Software,
    pub linux: Launcher,
    pub windows: Launcher,
    pub templates: &'static [Template],
    /// Open without a document is rejected.
    pub requires_document: bool,
}

/// Launch, terminate and inspect one application.
pub(crate) struct AppCore {
    profile: &'static AppProfile,
    descriptor: OperationDescriptor,
    processes: Vec<&'static str>,
    ctx: HandlerContext,
    pub(crate) state: StateCell,
}

impl AppCore {
    pub fn new(profile: &'static AppProfile, ctx: HandlerContext) -> Self {
        let processes = process_names(profile.software, ctx.config.platform);
        Self {
            profile,
            descriptor: OperationDescriptor::of(profile.software),
            processes,
            ctx,
            state: StateCell::default(),
        }
    }

    pub fn descriptor(&self) -> OperationDescriptor {
        self.descriptor
    }

    pub fn resolve_template(&self, path: &str) -> OpsResult<TemplateId> {
        match_template(self.descriptor, self.profile.templates, path)
    }

    fn launcher(&self) -> &'static Launcher {
        match self.ctx.config.platform {
            Platform::Linux => &self.profile.linux,
            Platform::Windows => &self.profile.windows,
        }
    }

    fn running(&self) -> Vec<ProcessInfo> {
        self.ctx.probe.find(&self.processes)
    }

    fn not_running(&self) -> OpsError {
        OpsError::Unavailable {
            descriptor: self.descriptor,
            reason: "application is not running".to_string(),
        }
    }

    pub async fn load(&self, code: i32, param: Option<&str>) -> OpsResult<()> {
        match LoadCode::from_code(code) {
            Some(LoadCode::Open) => self.open(param).await,
            Some(LoadCode::Terminate) => self.terminate().await,
            Some(LoadCode::Restore) => {
                let document = match param {
                    Some(p) => Some(p.to_string()),
                    None => self.state.with(|s| s.document.clone()),
                };
                self.open(document.as_deref()).await
            }
            None => Err(OpsError::InvalidRequest(format!("unknown load code {code}"))),
        }
    }

    async fn open(&self, document: Option<&str>) -> OpsResult<()> {
        match document {
            Some(doc) => {
                self.resolve_template(doc)?;
            }
            None if self.profile.requires_document => {
                return Err(OpsError::InvalidRequest(format!(
                    "{} needs a document to open",
                    self.descriptor
                )));
            }
            None => {}
        }

        let launcher = self.launcher();
        let mut args: Vec<String> = launcher.args.iter().map(|a| a.to_string()).collect();
        args.extend(document.map(str::to_string));

        let pid = self.ctx.env.launch(launcher.program, &args)?;
        info!(descriptor = %self.descriptor, pid, document = ?document, "Application launched");

        self.state.with(|s| {
            s.loads += 1;
            if let Some(doc) = document {
                s.document = Some(doc.to_string());
            }
        });

        let appeared = retry_with_timeout(
            || {
                let found = self.running();
                (!found.is_empty()).then_some(found.len())
            },
            self.ctx.config.launch_settle(),
            POLL_INTERVAL,
        )
        .await;
        match appeared {
            Some(instances) => debug!(descriptor = %self.descriptor, instances, "Application is up"),
            None => warn!(descriptor = %self.descriptor, "Application did not appear after launch"),
        }
        Ok(())
    }

    async fn terminate(&self) -> OpsResult<()> {
        let running = self.running();
        if running.is_empty() {
            return Err(self.not_running());
        }
        for process in &running {
            self.ctx.env.terminate(process.pid).await?;
        }
        self.state.with(|s| s.loads += 1);
        info!(descriptor = %self.descriptor, count = running.len(), "Application terminated");
        Ok(())
    }

    /// Fetch state, letting the caller add category fields while the
    /// document is known.
    pub fn fetch_with(
        &self,
        code: i32,
        decorate: impl FnOnce(&mut OperationResult, &str),
    ) -> OpsResult<OperationResult> {
        match FetchCode::from_code(code) {
            Some(FetchCode::Current) => self.fetch_current(decorate),
            Some(FetchCode::Cached) => Ok(self.fetch_cached()),
            None => Err(OpsError::InvalidRequest(format!("unknown fetch code {code}"))),
        }
    }

    fn fetch_current(
        &self,
        decorate: impl FnOnce(&mut OperationResult, &str),
    ) -> OpsResult<OperationResult> {
        let running = self.running();
        let Some(first) = running.first() else {
            return Err(self.not_running());
        };
        let from_cmd = running.iter().find_map(|p| self.document_in(&p.cmd));

        let record = self.state.with(|s| {
            if from_cmd.is_some() {
                s.document = from_cmd;
            }
            let mut record = OperationResult::new()
                .with("descriptor", self.descriptor.to_string())
                .with("running", 1i64)
                .with("instances", running.len() as i64)
                .with("pid", first.pid);
            if let Some(doc) = &s.document {
                record.insert("document", doc.as_str());
                decorate(&mut record, doc);
            }
            s.last_fetch = Some(record.clone());
            record
        });
        Ok(record)
    }

    fn fetch_cached(&self) -> OperationResult {
        self.state.with(|s| match &s.last_fetch {
            Some(last) => last.clone(),
            None => {
                let mut record = OperationResult::new()
                    .with("descriptor", self.descriptor.to_string())
                    .with("running", 0i64);
                if let Some(doc) = &s.document {
                    record.insert("document", doc.as_str());
                }
                record
            }
        })
    }

    /// Last non-flag argument this application can open.
    fn document_in(&self, cmd: &[String]) -> Option<String> {
        cmd.iter()
            .skip(1)
            .rev()
            .filter(|arg| !arg.starts_with('-'))
            .find(|arg| self.resolve_template(arg).is_ok())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdm_detect::Category;

    static TEXT: &[Template] = &[
        Template {
            matcher: Matcher::Schemes(&["http", "https"]),
            id: TemplateId("web"),
        },
        Template {
            matcher: Matcher::Extensions(&["txt", "md"]),
            id: TemplateId("text"),
        },
    ];

    fn gedit() -> OperationDescriptor {
        OperationDescriptor::new(Category::Notes, Software::Gedit)
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        assert_eq!(
            match_template(gedit(), TEXT, "/home/u/NOTES.TXT").unwrap(),
            TemplateId("text")
        );
    }

    #[test]
    fn test_scheme_match() {
        assert_eq!(
            match_template(gedit(), TEXT, "HTTPS://example.org/a.txt").unwrap(),
            TemplateId("web")
        );
        // "httpx" is not "http"
        assert!(match_template(gedit(), TEXT, "httpx://example.org").is_err());
    }

    #[test]
    fn test_unsupported_format() {
        let err = match_template(gedit(), TEXT, "/tmp/archive.tar.gz").unwrap_err();
        assert!(matches!(err, OpsError::UnsupportedFormat { ref path, .. } if path == "/tmp/archive.tar.gz"));
        assert!(match_template(gedit(), TEXT, "README").is_err());
    }
}
