//! Desktop wallpaper.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};
use vdm_detect::{OperationDescriptor, Software};
use vdm_exec::CommandOutput;
use vdm_state::OperationResult;

use super::app::{match_template, Matcher, Template};
use super::state::{HandlerState, StateCell};
use super::HandlerContext;
use crate::config::Platform;
use crate::error::{OpsError, OpsResult};
use crate::event::{FetchCode, LoadCode};
use crate::operation::{Operation, TemplateId};

const GNOME_BACKGROUND: &str = "org.gnome.desktop.background";
const DESKTOP_KEY: &str = r"HKCU\Control Panel\Desktop";

static TEMPLATES: &[Template] = &[Template {
    matcher: Matcher::Extensions(&["png", "jpg", "jpeg", "bmp", "gif", "webp", "svg"]),
    id: TemplateId("wallpaper"),
}];

/// Reads and changes the desktop wallpaper.
pub struct Modifier {
    descriptor: OperationDescriptor,
    ctx: HandlerContext,
    state: StateCell,
}

impl Modifier {
    pub fn new(ctx: HandlerContext) -> Self {
        Self {
            descriptor: OperationDescriptor::of(Software::Modifier),
            ctx,
            state: StateCell::default(),
        }
    }

    async fn run(&self, program: &str, args: &[&str]) -> OpsResult<CommandOutput> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let output = self.ctx.env.run(program, &args).await?;
        if !output.success {
            return Err(OpsError::Execution(format!(
                "{program} exited with {}: {}",
                output.exit_code,
                output.stderr.trim()
            )));
        }
        Ok(output)
    }

    async fn set_wallpaper(&self, path: &str) -> OpsResult<()> {
        self.resolve_template(path)?;
        match self.ctx.config.platform {
            Platform::Linux => {
                let uri = file_uri(path)?;
                self.run("gsettings", &["set", GNOME_BACKGROUND, "picture-uri", uri.as_str()])
                    .await?;
            }
            Platform::Windows => {
                self.run(
                    "reg",
                    &["add", DESKTOP_KEY, "/v", "Wallpaper", "/t", "REG_SZ", "/d", path, "/f"],
                )
                .await?;
                self.run("RUNDLL32.EXE", &["user32.dll,UpdatePerUserSystemParameters"])
                    .await?;
            }
        }

        self.state.with(|s| {
            s.loads += 1;
            s.document = Some(path.to_string());
        });
        info!(descriptor = %self.descriptor, path, "Wallpaper set");
        Ok(())
    }

    async fn current_wallpaper(&self) -> OpsResult<String> {
        let wallpaper = match self.ctx.config.platform {
            Platform::Linux => {
                let out = self
                    .run("gsettings", &["get", GNOME_BACKGROUND, "picture-uri"])
                    .await?;
                parse_gsettings_uri(&out.stdout)
            }
            Platform::Windows => {
                let out = self
                    .run("reg", &["query", DESKTOP_KEY, "/v", "Wallpaper"])
                    .await?;
                parse_reg_value(&out.stdout)
            }
        };

        wallpaper.ok_or_else(|| OpsError::Unavailable {
            descriptor: self.descriptor,
            reason: "no wallpaper configured".to_string(),
        })
    }

    fn record(&self, wallpaper: Option<&str>) -> OperationResult {
        let mut record =
            OperationResult::new().with("descriptor", self.descriptor.to_string());
        if let Some(path) = wallpaper {
            record.insert("wallpaper", path);
        }
        record
    }
}

/// `/a/my b.png` -> `file:///a/my%20b.png`. Values that already are
/// `file://` URIs pass through.
fn file_uri(path: &str) -> OpsResult<String> {
    if path.starts_with("file://") {
        return Ok(path.to_string());
    }
    if !Path::new(path).is_absolute() {
        return Err(OpsError::InvalidRequest(format!(
            "wallpaper path must be absolute: {path}"
        )));
    }
    let encoded: Vec<_> = path.split('/').map(urlencoding::encode).collect();
    Ok(format!("file://{}", encoded.join("/")))
}

/// `'file:///a/my%20b.png'` -> `/a/my b.png`
fn parse_gsettings_uri(stdout: &str) -> Option<String> {
    let value = stdout.trim().trim_matches('\'');
    let Some(path) = value.strip_prefix("file://") else {
        return (!value.is_empty()).then(|| value.to_string());
    };
    let path = urlencoding::decode(path)
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| path.to_string());
    (!path.is_empty()).then_some(path)
}

fn parse_reg_value(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.split_once("REG_SZ"))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl Operation for Modifier {
    fn descriptor(&self) -> OperationDescriptor {
        self.descriptor
    }

    fn resolve_template(&self, path: &str) -> OpsResult<TemplateId> {
        match_template(self.descriptor, TEMPLATES, path)
    }

    async fn load(&self, code: i32, param: Option<&str>) -> OpsResult<()> {
        match LoadCode::from_code(code) {
            Some(LoadCode::Open) => match param {
                Some(path) => self.set_wallpaper(path).await,
                None => Err(OpsError::InvalidRequest(
                    "setting a wallpaper needs an image path".to_string(),
                )),
            },
            Some(LoadCode::Terminate) => {
                debug!(descriptor = %self.descriptor, "Nothing to terminate");
                Ok(())
            }
            Some(LoadCode::Restore) => {
                let path = match param {
                    Some(p) => Some(p.to_string()),
                    None => self.state.with(|s| s.document.clone()),
                };
                match path {
                    Some(p) => self.set_wallpaper(&p).await,
                    None => Err(OpsError::InvalidRequest(
                        "no wallpaper to restore".to_string(),
                    )),
                }
            }
            None => Err(OpsError::InvalidRequest(format!("unknown load code {code}"))),
        }
    }

    async fn fetch(&self, code: i32) -> OpsResult<OperationResult> {
        match FetchCode::from_code(code) {
            Some(FetchCode::Current) => {
                let wallpaper = self.current_wallpaper().await?;
                let record = self.record(Some(wallpaper.as_str()));
                self.state.with(|s| {
                    s.document = Some(wallpaper);
                    s.last_fetch = Some(record.clone());
                });
                Ok(record)
            }
            Some(FetchCode::Cached) => Ok(self.state.with(|s| match &s.last_fetch {
                Some(last) => last.clone(),
                None => self.record(s.document.as_deref()),
            })),
            None => Err(OpsError::InvalidRequest(format!("unknown fetch code {code}"))),
        }
    }

    fn snapshot(&self) -> OperationResult {
        self.state.snapshot()
    }

    fn validate_state(&self, state: &OperationResult) -> OpsResult<()> {
        HandlerState::validate(state)
    }

    fn restore(&self, state: &OperationResult) -> OpsResult<()> {
        self.state.restore(state)
    }

    fn reset(&self) {
        self.state.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{RecordedCall, ScriptedResponse};
    use crate::handlers::test_support::fixture;

    #[test]
    fn test_parse_gsettings() {
        assert_eq!(
            parse_gsettings_uri("'file:///usr/share/backgrounds/warty.jpg'\n").as_deref(),
            Some("/usr/share/backgrounds/warty.jpg")
        );
        assert_eq!(parse_gsettings_uri("''\n"), None);
    }

    #[test]
    fn test_file_uri_percent_encodes_segments() {
        assert_eq!(
            file_uri("/home/u/My Pictures/sun set#1.png").unwrap(),
            "file:///home/u/My%20Pictures/sun%20set%231.png"
        );
        assert_eq!(file_uri("file:///tmp/a.png").unwrap(), "file:///tmp/a.png");
        assert!(matches!(file_uri("bg.png"), Err(OpsError::InvalidRequest(_))));
    }

    #[test]
    fn test_parse_gsettings_decodes_uri() {
        assert_eq!(
            parse_gsettings_uri("'file:///home/u/My%20Pictures/a.png'\n").as_deref(),
            Some("/home/u/My Pictures/a.png")
        );
    }

    #[tokio::test]
    async fn test_relative_path_runs_nothing() {
        let fx = fixture(Platform::Linux);
        let modifier = Modifier::new(fx.ctx);
        assert!(matches!(
            modifier.load(0, Some("wallpapers/a b.png")).await,
            Err(OpsError::InvalidRequest(_))
        ));
        assert!(fx.env.calls().is_empty());
        assert_eq!(modifier.snapshot().get_str("document"), None);
    }

    #[tokio::test]
    async fn test_set_wallpaper_with_space_in_path() {
        let fx = fixture(Platform::Linux);
        let modifier = Modifier::new(fx.ctx);
        modifier.load(0, Some("/home/u/a b.png")).await.unwrap();
        let last = fx.env.calls().pop().unwrap();
        assert!(matches!(last, RecordedCall::Run { ref args, .. } if args.last().map(String::as_str) == Some("file:///home/u/a%20b.png")));
        assert_eq!(modifier.snapshot().get_str("document"), Some("/home/u/a b.png"));
    }

    #[test]
    fn test_parse_reg_query() {
        let out = "\r\nHKEY_CURRENT_USER\\Control Panel\\Desktop\r\n    Wallpaper    REG_SZ    C:\\Users\\u\\bg.jpg\r\n\r\n";
        assert_eq!(parse_reg_value(out).as_deref(), Some(r"C:\Users\u\bg.jpg"));
        assert_eq!(parse_reg_value("ERROR: not found"), None);
    }

    #[tokio::test]
    async fn test_set_wallpaper_linux() {
        let fx = fixture(Platform::Linux);
        let modifier = Modifier::new(fx.ctx);
        modifier.load(0, Some("/home/u/sunset.png")).await.unwrap();

        assert_eq!(
            fx.env.calls(),
            vec![RecordedCall::Run {
                program: "gsettings".to_string(),
                args: vec![
                    "set".to_string(),
                    GNOME_BACKGROUND.to_string(),
                    "picture-uri".to_string(),
                    "file:///home/u/sunset.png".to_string(),
                ],
            }]
        );
        assert_eq!(modifier.snapshot().get_str("document"), Some("/home/u/sunset.png"));
    }

    #[tokio::test]
    async fn test_set_wallpaper_windows_refreshes_desktop() {
        let fx = fixture(Platform::Windows);
        let modifier = Modifier::new(fx.ctx);
        modifier.load(0, Some(r"C:\bg.bmp")).await.unwrap();
        assert_eq!(fx.env.ran(), vec!["reg", "RUNDLL32.EXE"]);
    }

    #[tokio::test]
    async fn test_rejects_non_images() {
        let fx = fixture(Platform::Linux);
        let modifier = Modifier::new(fx.ctx);
        assert!(matches!(
            modifier.load(0, Some("/tmp/a.pdf")).await,
            Err(OpsError::UnsupportedFormat { .. })
        ));
        assert!(fx.env.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_reads_back() {
        let fx = fixture(Platform::Linux);
        fx.env
            .respond("gsettings", ScriptedResponse::ok("'file:///tmp/bg.jpg'\n"));
        let modifier = Modifier::new(fx.ctx);
        let state = modifier.fetch(0).await.unwrap();
        assert_eq!(state.get_str("wallpaper"), Some("/tmp/bg.jpg"));
        assert_eq!(modifier.fetch(1).await.unwrap(), state);
    }

    #[tokio::test]
    async fn test_fetch_unset_is_unavailable() {
        let fx = fixture(Platform::Linux);
        let modifier = Modifier::new(fx.ctx);
        assert!(matches!(
            modifier.fetch(0).await,
            Err(OpsError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_restore_reapplies_previous() {
        let fx = fixture(Platform::Linux);
        fx.env
            .respond("gsettings", ScriptedResponse::ok("'file:///tmp/old.png'\n"));
        let modifier = Modifier::new(fx.ctx);
        modifier.fetch(0).await.unwrap();
        modifier.load(2, None).await.unwrap();

        let last = fx.env.calls().pop().unwrap();
        assert!(matches!(last, RecordedCall::Run { ref args, .. } if args.last().map(String::as_str) == Some("file:///tmp/old.png")));
    }
}
