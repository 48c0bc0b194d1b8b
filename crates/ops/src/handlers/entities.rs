//! Desktop notifications.

use async_trait::async_trait;
use tracing::{debug, info};
use vdm_detect::{OperationDescriptor, Software};
use vdm_state::{OperationResult, StateValue};

use super::app::{match_template, Matcher, Template};
use super::state::{HandlerState, StateCell};
use super::{process_names, HandlerContext};
use crate::config::Platform;
use crate::error::{OpsError, OpsResult};
use crate::event::{FetchCode, LoadCode};
use crate::operation::{Operation, TemplateId};

const SENT: &str = "sent";
const LAST_MESSAGE: &str = "last_message";

static TEMPLATES: &[Template] = &[Template {
    matcher: Matcher::Extensions(&["desktop"]),
    id: TemplateId("desktop-entry"),
}];

/// Sends notifications through the platform notification service.
///
/// The message is the load parameter. There is no application process to
/// stop, so terminate succeeds without doing anything.
pub struct Notifier {
    descriptor: OperationDescriptor,
    daemons: Vec<&'static str>,
    ctx: HandlerContext,
    state: StateCell,
}

impl Notifier {
    pub fn new(ctx: HandlerContext) -> Self {
        Self {
            descriptor: OperationDescriptor::of(Software::Notifier),
            daemons: process_names(Software::Notifier, ctx.config.platform),
            ctx,
            state: StateCell::default(),
        }
    }

    fn command(&self, message: &str) -> (&'static str, Vec<String>) {
        match self.ctx.config.platform {
            Platform::Linux => (
                "notify-send",
                vec![self.ctx.config.notifier_title.clone(), message.to_string()],
            ),
            Platform::Windows => ("msg", vec!["*".to_string(), message.to_string()]),
        }
    }

    async fn send(&self, message: &str) -> OpsResult<()> {
        let (program, args) = self.command(message);
        let output = self.ctx.env.run(program, &args).await?;
        if !output.success {
            return Err(OpsError::Execution(format!(
                "{program} exited with {}: {}",
                output.exit_code,
                output.stderr.trim()
            )));
        }

        self.state.with(|s| {
            s.loads += 1;
            s.document = Some(message.to_string());
            let sent = s.extra.get_int(SENT).unwrap_or(0);
            s.extra.insert(SENT, sent + 1);
            s.extra.insert(LAST_MESSAGE, message);
        });
        info!(descriptor = %self.descriptor, "Notification sent");
        Ok(())
    }

    fn status(&self, probe: bool) -> OperationResult {
        let daemon = if probe {
            self.ctx.probe.find(&self.daemons).into_iter().next()
        } else {
            None
        };

        self.state.with(|s| {
            let mut record = OperationResult::new()
                .with("descriptor", self.descriptor.to_string())
                .with("sent", s.extra.get_int(SENT).unwrap_or(0));
            if let Some(message) = s.extra.get_str(LAST_MESSAGE) {
                record.insert(LAST_MESSAGE, message);
            }
            if probe {
                match &daemon {
                    Some(d) => {
                        record.insert("running", 1i64);
                        record.insert("daemon", d.name.as_str());
                        record.insert("pid", d.pid);
                    }
                    None => record.insert("running", 0i64),
                }
                s.last_fetch = Some(record.clone());
            }
            record
        })
    }
}

#[async_trait]
impl Operation for Notifier {
    fn descriptor(&self) -> OperationDescriptor {
        self.descriptor
    }

    fn resolve_template(&self, path: &str) -> OpsResult<TemplateId> {
        match_template(self.descriptor, TEMPLATES, path)
    }

    async fn load(&self, code: i32, param: Option<&str>) -> OpsResult<()> {
        match LoadCode::from_code(code) {
            Some(LoadCode::Open) => match param {
                Some(message) => self.send(message).await,
                None => Err(OpsError::InvalidRequest(
                    "a notification needs a message".to_string(),
                )),
            },
            Some(LoadCode::Terminate) => {
                debug!(descriptor = %self.descriptor, "Nothing to terminate");
                Ok(())
            }
            Some(LoadCode::Restore) => {
                let message = match param {
                    Some(p) => Some(p.to_string()),
                    None => self
                        .state
                        .with(|s| s.extra.get_str(LAST_MESSAGE).map(str::to_string)),
                };
                match message {
                    Some(m) => self.send(&m).await,
                    None => Err(OpsError::InvalidRequest(
                        "no notification to restore".to_string(),
                    )),
                }
            }
            None => Err(OpsError::InvalidRequest(format!("unknown load code {code}"))),
        }
    }

    async fn fetch(&self, code: i32) -> OpsResult<OperationResult> {
        match FetchCode::from_code(code) {
            Some(FetchCode::Current) => Ok(self.status(true)),
            Some(FetchCode::Cached) => Ok(self.status(false)),
            None => Err(OpsError::InvalidRequest(format!("unknown fetch code {code}"))),
        }
    }

    fn snapshot(&self) -> OperationResult {
        self.state.snapshot()
    }

    fn validate_state(&self, state: &OperationResult) -> OpsResult<()> {
        HandlerState::validate(state)?;
        if let Some(value) = state.get(SENT) {
            if !matches!(value, StateValue::Int(n) if *n >= 0) {
                return Err(OpsError::MalformedState(format!("field '{SENT}' must be a count")));
            }
        }
        if let Some(value) = state.get(LAST_MESSAGE) {
            if !matches!(value, StateValue::Str(_)) {
                return Err(OpsError::MalformedState(format!(
                    "field '{LAST_MESSAGE}' must be text"
                )));
            }
        }
        Ok(())
    }

    fn restore(&self, state: &OperationResult) -> OpsResult<()> {
        self.validate_state(state)?;
        self.state.restore(state)
    }

    fn reset(&self) {
        self.state.reset();
    }
}
